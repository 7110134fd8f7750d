//! Admin Instructions for the shielded deposit pool

pub mod update_admin;

pub use update_admin::*;
