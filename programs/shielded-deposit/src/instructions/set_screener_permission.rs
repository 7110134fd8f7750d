//! Set Screener Permission Instruction
//!
//! Grants or revokes a screener's right to attest deposits. Only the
//! registry admin may call it. The permission account is created on first
//! use and overwritten afterwards.

use anchor_lang::prelude::*;

use crate::crypto::ScreenerAddress;
use crate::error::DepositError;
use crate::events::ScreenerPermissionSet;
use crate::state::{RegistryState, ScreenerPermission};

#[derive(Accounts)]
#[instruction(screener: [u8; 20])]
pub struct SetScreenerPermission<'info> {
    #[account(
        seeds = [RegistryState::SEED_PREFIX, state.token_mint.as_ref()],
        bump = state.bump,
        has_one = admin @ DepositError::Unauthorized,
    )]
    pub state: Account<'info, RegistryState>,

    #[account(
        init_if_needed,
        payer = admin,
        space = ScreenerPermission::LEN,
        seeds = [ScreenerPermission::SEED_PREFIX, state.key().as_ref(), screener.as_ref()],
        bump
    )]
    pub screener_permission: Account<'info, ScreenerPermission>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<SetScreenerPermission>,
    screener: ScreenerAddress,
    allowed: bool,
) -> Result<()> {
    let state_key = ctx.accounts.state.key();

    ctx.accounts.screener_permission.set(
        state_key,
        screener,
        allowed,
        ctx.bumps.screener_permission,
    );

    emit!(ScreenerPermissionSet {
        state: state_key,
        screener,
        allowed,
        timestamp: Clock::get()?.unix_timestamp,
    });

    msg!("Screener permission set: allowed = {}", allowed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::test_runtime::{
        account_list, error_code, install, take_invocations, TestAccount, TestDeployment,
    };

    const SCREENER: ScreenerAddress = [0x5c; 20];

    /// Accounts for an update of an already existing permission entry.
    fn accounts(deployment: &TestDeployment, signer: Pubkey) -> &'static [AccountInfo<'static>] {
        let (key, bump) = ScreenerPermission::find_pda(&crate::ID, &deployment.state_key, &SCREENER);
        let permission = ScreenerPermission {
            state: deployment.state_key,
            screener: SCREENER,
            allowed: true,
            bump,
        };
        account_list(vec![
            TestAccount::program_owned(deployment.state_key, &deployment.state, RegistryState::LEN),
            TestAccount::program_owned(key, &permission, ScreenerPermission::LEN).writable(),
            TestAccount::system(signer, 1_000_000_000).signer().writable(),
            TestAccount::program(anchor_lang::system_program::ID),
        ])
    }

    fn parse(
        infos: &'static [AccountInfo<'static>],
    ) -> Result<(SetScreenerPermission<'static>, SetScreenerPermissionBumps)> {
        let mut infos = infos;
        let mut bumps = SetScreenerPermissionBumps::default();
        let accounts = SetScreenerPermission::try_accounts(
            &crate::ID,
            &mut infos,
            &SCREENER,
            &mut bumps,
            &mut BTreeSet::new(),
        )?;
        Ok((accounts, bumps))
    }

    #[test]
    fn test_non_admin_cannot_revoke() {
        install();
        let deployment = TestDeployment::new(Pubkey::new_unique());
        let result = parse(accounts(&deployment, Pubkey::new_unique()));
        assert_eq!(error_code(result.map(|_| ())), u32::from(DepositError::Unauthorized));
        assert!(take_invocations().is_empty());
    }

    #[test]
    fn test_admin_revokes_existing_permission() {
        install();
        let admin = Pubkey::new_unique();
        let deployment = TestDeployment::new(admin);
        let (mut parsed, bumps) = parse(accounts(&deployment, admin)).unwrap();
        assert!(parsed.screener_permission.permits(&deployment.state_key, &SCREENER));

        handler(Context::new(&crate::ID, &mut parsed, &[], bumps), SCREENER, false).unwrap();

        assert!(!parsed.screener_permission.allowed);
        assert!(!parsed.screener_permission.permits(&deployment.state_key, &SCREENER));
        assert!(take_invocations().is_empty());
    }
}
