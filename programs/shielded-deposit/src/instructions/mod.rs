//! Instruction handlers for the shielded deposit pool

pub mod admin;
pub mod complete_deposit;
pub mod initialize;
pub mod instantiate_multi_deposit;
pub mod set_screener_permission;

pub use admin::*;
pub use complete_deposit::*;
pub use initialize::*;
pub use instantiate_multi_deposit::*;
pub use set_screener_permission::*;
