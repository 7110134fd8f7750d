//! Native runtime for handler tests
//!
//! Serves the clock and rent sysvars off-chain and records every
//! cross-program invocation made on the calling thread, so instruction
//! handlers and account constraints run under `cargo test`.

use std::cell::RefCell;
use std::sync::Once;

use anchor_lang::prelude::*;
use anchor_lang::solana_program::entrypoint::{ProgramResult, SUCCESS};
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::program_pack::Pack;
use anchor_lang::solana_program::program_stubs::{set_syscall_stubs, SyscallStubs};
use anchor_spl::token::spl_token;

use crate::state::{Pool, RegistryState};

/// Clock value every handler sees.
pub const TEST_TIMESTAMP: i64 = 1_700_000_000;

thread_local! {
    static INVOKED: RefCell<Vec<Instruction>> = RefCell::new(Vec::new());
}

struct RecordingStubs;

impl SyscallStubs for RecordingStubs {
    fn sol_invoke_signed(
        &self,
        instruction: &Instruction,
        _account_infos: &[AccountInfo],
        _signers_seeds: &[&[&[u8]]],
    ) -> ProgramResult {
        INVOKED.with(|invoked| invoked.borrow_mut().push(instruction.clone()));
        Ok(())
    }

    fn sol_get_clock_sysvar(&self, var_addr: *mut u8) -> u64 {
        let clock = Clock {
            unix_timestamp: TEST_TIMESTAMP,
            ..Clock::default()
        };
        unsafe { *(var_addr as *mut Clock) = clock };
        SUCCESS
    }

    fn sol_get_rent_sysvar(&self, var_addr: *mut u8) -> u64 {
        unsafe { *(var_addr as *mut Rent) = Rent::default() };
        SUCCESS
    }
}

/// Install the stubs once per test binary and clear this thread's log.
pub fn install() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        set_syscall_stubs(Box::new(RecordingStubs));
    });
    take_invocations();
}

/// Instructions invoked on this thread since the last call.
pub fn take_invocations() -> Vec<Instruction> {
    INVOKED.with(|invoked| std::mem::take(&mut *invoked.borrow_mut()))
}

/// An account as the runtime would hand it to the program.
#[derive(Clone, Debug)]
pub struct TestAccount {
    pub key: Pubkey,
    pub owner: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
    pub is_signer: bool,
    pub is_writable: bool,
    pub executable: bool,
}

impl TestAccount {
    /// A wallet or unused address, owned by the system program.
    pub fn system(key: Pubkey, lamports: u64) -> Self {
        Self {
            key,
            owner: anchor_lang::system_program::ID,
            lamports,
            data: Vec::new(),
            is_signer: false,
            is_writable: false,
            executable: false,
        }
    }

    /// A rent-exempt account of this program holding `account`.
    pub fn program_owned<T: AccountSerialize>(key: Pubkey, account: &T, len: usize) -> Self {
        let mut data = Vec::with_capacity(len);
        account.try_serialize(&mut data).unwrap();
        data.resize(len, 0);
        Self {
            key,
            owner: crate::ID,
            lamports: Rent::default().minimum_balance(len),
            data,
            is_signer: false,
            is_writable: false,
            executable: false,
        }
    }

    /// An initialized SPL token account.
    pub fn token(key: Pubkey, mint: Pubkey, owner: Pubkey, amount: u64) -> Self {
        let state = spl_token::state::Account {
            mint,
            owner,
            amount,
            state: spl_token::state::AccountState::Initialized,
            ..Default::default()
        };
        let mut data = vec![0u8; spl_token::state::Account::LEN];
        state.pack_into_slice(&mut data);
        Self {
            key,
            owner: spl_token::ID,
            lamports: Rent::default().minimum_balance(data.len()),
            data,
            is_signer: false,
            is_writable: true,
            executable: false,
        }
    }

    /// An executable program account.
    pub fn program(key: Pubkey) -> Self {
        Self {
            executable: true,
            ..Self::system(key, 1)
        }
    }

    pub fn signer(mut self) -> Self {
        self.is_signer = true;
        self
    }

    pub fn writable(mut self) -> Self {
        self.is_writable = true;
        self
    }

    /// Leak the account so it lives as long as the handler needs it.
    pub fn info(self) -> AccountInfo<'static> {
        AccountInfo::new(
            Box::leak(Box::new(self.key)),
            self.is_signer,
            self.is_writable,
            Box::leak(Box::new(self.lamports)),
            Box::leak(self.data.into_boxed_slice()),
            Box::leak(Box::new(self.owner)),
            self.executable,
            0,
        )
    }
}

/// Registry and pool of one mint, at their canonical PDAs.
pub struct TestDeployment {
    pub mint: Pubkey,
    pub state_key: Pubkey,
    pub state: RegistryState,
    pub pool_key: Pubkey,
    pub pool: Pool,
    pub vault_key: Pubkey,
}

impl TestDeployment {
    pub fn new(admin: Pubkey) -> Self {
        let mint = Pubkey::new_unique();
        let (state_key, state_bump) =
            Pubkey::find_program_address(&[RegistryState::SEED_PREFIX, mint.as_ref()], &crate::ID);
        let (pool_key, pool_bump) =
            Pubkey::find_program_address(&[Pool::SEED_PREFIX, state_key.as_ref()], &crate::ID);
        let (vault_key, _) =
            Pubkey::find_program_address(&[b"vault", pool_key.as_ref()], &crate::ID);

        Self {
            mint,
            state_key,
            state: RegistryState {
                admin,
                token_mint: mint,
                pool: pool_key,
                commitment_tree: Pubkey::new_unique(),
                next_nonce: 0,
                pending_count: 0,
                completed_count: 0,
                bump: state_bump,
            },
            pool_key,
            pool: Pool {
                state: state_key,
                token_mint: mint,
                vault: vault_key,
                locked_balance: 0,
                shielded_balance: 0,
                bump: pool_bump,
            },
            vault_key,
        }
    }

    pub fn state_account(&self) -> TestAccount {
        TestAccount::program_owned(self.state_key, &self.state, RegistryState::LEN).writable()
    }

    pub fn pool_account(&self) -> TestAccount {
        TestAccount::program_owned(self.pool_key, &self.pool, Pool::LEN).writable()
    }

    pub fn vault_account(&self, amount: u64) -> TestAccount {
        TestAccount::token(self.vault_key, self.mint, self.pool_key, amount)
    }
}

/// Account list in instruction order.
pub fn account_list(accounts: Vec<TestAccount>) -> &'static [AccountInfo<'static>] {
    Box::leak(
        accounts
            .into_iter()
            .map(TestAccount::info)
            .collect::<Vec<_>>()
            .into_boxed_slice(),
    )
}

/// Numeric code of an Anchor error.
pub fn error_code<T: std::fmt::Debug>(result: Result<T>) -> u32 {
    match result.unwrap_err() {
        anchor_lang::error::Error::AnchorError(e) => e.error_code_number,
        other => panic!("unexpected error {other:?}"),
    }
}
