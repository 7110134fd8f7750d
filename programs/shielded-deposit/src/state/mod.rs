//! State account definitions for the shielded deposit pool

use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Allocate, Assign, CreateAccount, Transfer};

pub mod commitment_tree;
pub mod deposit_record;
pub mod pool;
pub mod registry_state;
pub mod screener_permission;

pub use commitment_tree::CommitmentTree;
pub use deposit_record::{DepositRecord, DepositStatus};
pub use pool::{Pool, PoolBalances};
pub use registry_state::RegistryState;
pub use screener_permission::ScreenerPermission;

/// Load a program-owned account that may not exist yet.
///
/// Returns `None` for accounts that were never created (or belong to
/// another program). Existing accounts must deserialize, discriminator
/// included.
pub fn load_program_account<T: AccountDeserialize>(
    info: &AccountInfo,
    program_id: &Pubkey,
) -> Result<Option<T>> {
    if info.owner != program_id || info.data_is_empty() {
        return Ok(None);
    }
    let data = info.try_borrow_data()?;
    let mut slice: &[u8] = &data;
    T::try_deserialize(&mut slice).map(Some)
}

/// Write an account back into its data buffer.
pub fn store_program_account<T: AccountSerialize>(info: &AccountInfo, account: &T) -> Result<()> {
    let mut data = info.try_borrow_mut_data()?;
    let mut writer: &mut [u8] = &mut data;
    account.try_serialize(&mut writer)
}

/// Create the PDA `target` with `space` bytes owned by `owner`.
///
/// `create_account` refuses addresses that already hold lamports, and
/// anyone can send lamports to a PDA before it is created. Such an account
/// is topped up to `rent_exempt` and then allocated and assigned under the
/// PDA signature instead.
pub fn create_program_account<'info>(
    payer: &AccountInfo<'info>,
    target: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    rent_exempt: u64,
    space: usize,
    owner: &Pubkey,
    signer_seeds: &[&[u8]],
) -> Result<()> {
    let signer = &[signer_seeds];
    let current = target.lamports();

    if current == 0 {
        return system_program::create_account(
            CpiContext::new_with_signer(
                system_program.clone(),
                CreateAccount {
                    from: payer.clone(),
                    to: target.clone(),
                },
                signer,
            ),
            rent_exempt,
            space as u64,
            owner,
        );
    }

    let top_up = rent_exempt.max(1).saturating_sub(current);
    if top_up > 0 {
        system_program::transfer(
            CpiContext::new(
                system_program.clone(),
                Transfer {
                    from: payer.clone(),
                    to: target.clone(),
                },
            ),
            top_up,
        )?;
    }
    system_program::allocate(
        CpiContext::new_with_signer(
            system_program.clone(),
            Allocate {
                account_to_allocate: target.clone(),
            },
            signer,
        ),
        space as u64,
    )?;
    system_program::assign(
        CpiContext::new_with_signer(
            system_program.clone(),
            Assign {
                account_to_assign: target.clone(),
            },
            signer,
        ),
        owner,
    )
}
