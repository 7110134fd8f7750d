//! Update Admin Instruction
//!
//! Hands registry administration (screener permissions) to a new key.
//! Only callable by the current admin.

use anchor_lang::prelude::*;

use crate::error::DepositError;
use crate::events::AdminUpdated;
use crate::state::RegistryState;

/// Accounts for update_admin instruction.
#[derive(Accounts)]
pub struct UpdateAdmin<'info> {
    #[account(
        mut,
        seeds = [RegistryState::SEED_PREFIX, state.token_mint.as_ref()],
        bump = state.bump,
        has_one = admin @ DepositError::Unauthorized,
    )]
    pub state: Account<'info, RegistryState>,

    /// Current admin (must sign).
    pub admin: Signer<'info>,
}

pub fn handler(ctx: Context<UpdateAdmin>, new_admin: Pubkey) -> Result<()> {
    let state = &mut ctx.accounts.state;
    let old_admin = state.transfer_admin(new_admin)?;

    emit!(AdminUpdated {
        state: state.key(),
        old_admin,
        new_admin,
        timestamp: Clock::get()?.unix_timestamp,
    });

    msg!("Registry admin updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::test_runtime::{account_list, error_code, install, TestAccount, TestDeployment};

    fn accounts(deployment: &TestDeployment, signer: Pubkey) -> &'static [AccountInfo<'static>] {
        account_list(vec![
            deployment.state_account(),
            TestAccount::system(signer, 1_000_000).signer(),
        ])
    }

    fn parse(infos: &'static [AccountInfo<'static>]) -> Result<UpdateAdmin<'static>> {
        let mut infos = infos;
        UpdateAdmin::try_accounts(
            &crate::ID,
            &mut infos,
            &[],
            &mut UpdateAdminBumps::default(),
            &mut BTreeSet::new(),
        )
    }

    fn update(accounts: &mut UpdateAdmin<'static>, new_admin: Pubkey) -> Result<()> {
        handler(
            Context::new(&crate::ID, accounts, &[], UpdateAdminBumps::default()),
            new_admin,
        )
    }

    #[test]
    fn test_non_admin_signer_is_unauthorized() {
        install();
        let deployment = TestDeployment::new(Pubkey::new_unique());
        let result = parse(accounts(&deployment, Pubkey::new_unique()));
        assert_eq!(error_code(result.map(|_| ())), u32::from(DepositError::Unauthorized));
    }

    #[test]
    fn test_default_or_current_admin_is_rejected() {
        install();
        let admin = Pubkey::new_unique();
        let deployment = TestDeployment::new(admin);
        let mut parsed = parse(accounts(&deployment, admin)).unwrap();

        let zero = update(&mut parsed, Pubkey::default());
        assert_eq!(error_code(zero), u32::from(DepositError::Unauthorized));

        let same = update(&mut parsed, admin);
        assert_eq!(error_code(same), u32::from(DepositError::Unauthorized));
        assert_eq!(parsed.state.admin, admin);
    }

    #[test]
    fn test_admin_hands_over() {
        install();
        let admin = Pubkey::new_unique();
        let deployment = TestDeployment::new(admin);
        let mut parsed = parse(accounts(&deployment, admin)).unwrap();

        let next = Pubkey::new_unique();
        update(&mut parsed, next).unwrap();
        assert_eq!(parsed.state.admin, next);

        // the old admin no longer passes the account checks
        let stale = TestDeployment {
            state: RegistryState::clone(&parsed.state),
            ..deployment
        };
        let result = parse(accounts(&stale, admin));
        assert_eq!(error_code(result.map(|_| ())), u32::from(DepositError::Unauthorized));
    }
}
