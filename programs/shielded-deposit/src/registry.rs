//! Deposit request registry
//!
//! Protocol core shared by the instruction handlers. Works on already
//! loaded accounts so the whole flow runs (and is tested) without a
//! runtime. Every operation computes its result first and only then
//! writes, so an error leaves all accounts untouched.
//!
//! # Flow
//! ```text
//! open_requests      caller locks value + gas_compensation per request
//!                    records are Pending, nonces consecutive
//! (off-chain)        screener signs encode(DepositRequest)
//! complete_request   signer permitted -> leaf appended, value shielded,
//!                    gas_compensation released, record Completed
//! ```

use anchor_lang::prelude::*;

use crate::codec::{DepositRequest, StealthAddress};
use crate::crypto::{note_commitment, ScreenerAddress, ScreenerSignature, SignatureScheme};
use crate::error::DepositError;
use crate::state::{CommitmentTree, DepositRecord, Pool, PoolBalances, RegistryState};

/// Maximum number of requests opened by one instruction.
pub const MAX_BATCH_SIZE: usize = 8;

/// Requests to be opened together, planned against the current state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositBatch {
    /// Nonce of the first request; the rest follow consecutively
    pub first_nonce: u64,

    pub requests: Vec<DepositRequest>,

    /// Σ(value + gas_compensation), the amount to transfer into the vault
    pub total: u64,

    balances: PoolBalances,
}

impl DepositBatch {
    /// Validate a batch without touching any account.
    ///
    /// # Errors
    /// * `InvalidBatch` - no values or more than `MAX_BATCH_SIZE`
    /// * `InvalidAmount` - a zero value
    /// * `InvalidStealthAddress` - a non-canonical coordinate
    /// * `Overflow` - nonce counter or locked total would overflow
    pub fn plan(
        state: &RegistryState,
        pool: &Pool,
        spender: Pubkey,
        values: &[u64],
        stealth_address: StealthAddress,
        gas_compensation: u64,
    ) -> Result<Self> {
        require!(
            !values.is_empty() && values.len() <= MAX_BATCH_SIZE,
            DepositError::InvalidBatch
        );
        require!(values.iter().all(|&v| v > 0), DepositError::InvalidAmount);
        stealth_address.validate()?;

        let first_nonce = state.next_nonce;
        first_nonce
            .checked_add(values.len() as u64)
            .ok_or(error!(DepositError::Overflow))?;

        let mut requests = Vec::with_capacity(values.len());
        let mut total: u64 = 0;
        for (nonce, &value) in (first_nonce..).zip(values) {
            let request = DepositRequest {
                spender,
                value,
                stealth_address,
                nonce,
                gas_compensation,
            };
            total = total
                .checked_add(request.locked_amount()?)
                .ok_or(error!(DepositError::Overflow))?;
            requests.push(request);
        }

        let balances = pool.after_lock(total)?;

        Ok(Self {
            first_nonce,
            requests,
            total,
            balances,
        })
    }

    pub fn nonces(&self) -> Vec<u64> {
        self.requests.iter().map(|request| request.nonce).collect()
    }

    /// Reserve the nonces and lock the funds.
    ///
    /// Fails with `InvalidBatch` if the nonce counter moved since `plan`.
    pub fn commit(&self, state: &mut RegistryState, pool: &mut Pool) -> Result<()> {
        require!(state.next_nonce == self.first_nonce, DepositError::InvalidBatch);
        state.reserve_nonces(self.requests.len() as u64)?;
        pool.apply(self.balances);
        Ok(())
    }
}

/// Plan and commit a batch in one step.
pub fn open_requests(
    state: &mut RegistryState,
    pool: &mut Pool,
    spender: Pubkey,
    values: &[u64],
    stealth_address: StealthAddress,
    gas_compensation: u64,
) -> Result<DepositBatch> {
    let batch = DepositBatch::plan(state, pool, spender, values, stealth_address, gas_compensation)?;
    batch.commit(state, pool)?;
    Ok(batch)
}

/// Outcome of a completed deposit, returned to the caller and emitted.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositReceipt {
    pub nonce: u64,
    pub leaf_index: u64,
    pub commitment: [u8; 32],
    pub root: [u8; 32],
    pub screener: [u8; 20],
    pub value: u64,
    pub gas_compensation: u64,
}

/// Complete a pending request attested by a permitted screener.
///
/// `record` is `None` when no request exists for `terms.nonce`.
/// `is_permitted` answers for the current permission state of the
/// recovered signer.
///
/// # Errors
/// * `NotFound` / `AlreadyCompleted` - no pending request for the nonce
/// * `Mismatch` - terms differ from the stored request
/// * `InvalidSignature` - malformed signature or signer not permitted
/// * `Full` - the commitment tree has no free leaf
/// * `InsufficientFunds` - the ledger cannot release the locked amount
pub fn complete_request(
    state: &mut RegistryState,
    pool: &mut Pool,
    tree: &mut CommitmentTree,
    record: Option<&mut DepositRecord>,
    terms: &DepositRequest,
    signature: &ScreenerSignature,
    is_permitted: impl Fn(&ScreenerAddress) -> bool,
) -> Result<DepositReceipt> {
    let record = record.ok_or(error!(DepositError::NotFound))?;
    require!(record.is_pending(), DepositError::AlreadyCompleted);
    require!(record.request == *terms, DepositError::Mismatch);

    let screener = SignatureScheme::default().recover(&record.request.encode(), signature)?;
    require!(is_permitted(&screener), DepositError::InvalidSignature);

    let request = record.request;
    let commitment = note_commitment(&request.note());
    require!(!tree.is_full()?, DepositError::Full);
    let balances = pool.after_release(request.value, request.gas_compensation)?;
    let (pending_count, completed_count) = state.counts_after_completion()?;

    // Commit
    let leaf_index = tree.insert_leaf(commitment)?;
    pool.apply(balances);
    state.pending_count = pending_count;
    state.completed_count = completed_count;
    record.mark_completed(leaf_index);

    Ok(DepositReceipt {
        nonce: request.nonce,
        leaf_index,
        commitment,
        root: tree.current_root,
        screener,
        value: request.value,
        gas_compensation: request.gas_compensation,
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::{stealth, Deployment};
    use super::*;
    use crate::crypto::signature::test_keys::TestScreener;
    use crate::state::DepositStatus;

    fn error_code(result: Result<impl std::fmt::Debug>) -> u32 {
        match result.unwrap_err() {
            anchor_lang::error::Error::AnchorError(e) => e.error_code_number,
            other => panic!("unexpected error {other:?}"),
        }
    }

    fn code(error: DepositError) -> u32 {
        u32::from(error)
    }

    #[test]
    fn test_open_assigns_consecutive_nonces() {
        let mut deployment = Deployment::new(2, 4);
        let spender = Pubkey::new_unique();

        assert_eq!(deployment.open(spender, &[1000], stealth(1), 0).unwrap(), vec![0]);
        assert_eq!(deployment.state.next_nonce, 1);

        assert_eq!(
            deployment.open(spender, &[5, 6, 7], stealth(1), 2).unwrap(),
            vec![1, 2, 3]
        );
        assert_eq!(deployment.state.next_nonce, 4);
        assert_eq!(deployment.state.pending_count, 4);
        assert_eq!(deployment.pool.locked_balance, 1000 + 7 + 8 + 9);
    }

    #[test]
    fn test_open_rejects_bad_batches_without_side_effects() {
        let mut deployment = Deployment::new(2, 4);
        let spender = Pubkey::new_unique();

        let empty = deployment.open(spender, &[], stealth(1), 0);
        assert_eq!(error_code(empty), code(DepositError::InvalidBatch));

        let too_many = deployment.open(spender, &[1; MAX_BATCH_SIZE + 1], stealth(1), 0);
        assert_eq!(error_code(too_many), code(DepositError::InvalidBatch));

        let zero = deployment.open(spender, &[10, 0], stealth(1), 0);
        assert_eq!(error_code(zero), code(DepositError::InvalidAmount));

        let overflow = deployment.open(spender, &[u64::MAX, 1], stealth(1), 0);
        assert_eq!(error_code(overflow), code(DepositError::Overflow));

        let mut bad_stealth = stealth(1);
        bad_stealth.h2_y = [0xff; 32];
        let invalid = deployment.open(spender, &[10], bad_stealth, 0);
        assert_eq!(error_code(invalid), code(DepositError::InvalidStealthAddress));

        assert_eq!(deployment.state.next_nonce, 0);
        assert_eq!(deployment.state.pending_count, 0);
        assert_eq!(deployment.pool.locked_balance, 0);
    }

    #[test]
    fn test_nonce_overflow_is_rejected() {
        let mut deployment = Deployment::new(2, 4);
        deployment.state.next_nonce = u64::MAX - 1;
        let result = deployment.open(Pubkey::new_unique(), &[1, 1], stealth(1), 0);
        assert_eq!(error_code(result), code(DepositError::Overflow));
        assert_eq!(deployment.state.next_nonce, u64::MAX - 1);
    }

    #[test]
    fn test_stale_plan_is_an_invalid_batch() {
        let mut deployment = Deployment::new(2, 4);
        let spender = Pubkey::new_unique();
        let stale = DepositBatch::plan(
            &deployment.state,
            &deployment.pool,
            spender,
            &[10, 20],
            stealth(1),
            0,
        )
        .unwrap();
        deployment.open(spender, &[5], stealth(1), 0).unwrap();

        let result = stale.commit(&mut deployment.state, &mut deployment.pool);
        assert_eq!(error_code(result), code(DepositError::InvalidBatch));
        assert_eq!(deployment.state.next_nonce, 1);
        assert_eq!(deployment.pool.locked_balance, 5);
    }

    #[test]
    fn test_complete_happy_path() {
        let mut deployment = Deployment::new(4, 4);
        let screener = TestScreener::new(3);
        deployment.set_permission(screener.address(), true);

        let spender = Pubkey::new_unique();
        deployment.open(spender, &[1000], stealth(2), 9000).unwrap();
        assert_eq!(deployment.pool.locked_balance, 10_000);

        let terms = deployment.records[0].request;
        let signature = screener.sign(&terms.encode());
        let receipt = deployment.complete(&terms, &signature).unwrap();

        assert_eq!(receipt.nonce, 0);
        assert_eq!(receipt.leaf_index, 0);
        assert_eq!(receipt.commitment, note_commitment(&terms.note()));
        assert_eq!(receipt.root, deployment.tree.current_root);
        assert_eq!(receipt.screener, screener.address());
        assert_eq!(deployment.pool.locked_balance, 0);
        assert_eq!(deployment.pool.shielded_balance, 1000);
        assert_eq!(deployment.tree.next_index, 1);
        assert_eq!(deployment.state.pending_count, 0);
        assert_eq!(deployment.state.completed_count, 1);
        assert_eq!(deployment.records[0].status, DepositStatus::Completed);
    }

    #[test]
    fn test_second_completion_fails() {
        let mut deployment = Deployment::new(2, 4);
        let screener = TestScreener::new(4);
        deployment.set_permission(screener.address(), true);
        deployment.open(Pubkey::new_unique(), &[50], stealth(1), 5).unwrap();

        let terms = deployment.records[0].request;
        let signature = screener.sign(&terms.encode());
        deployment.complete(&terms, &signature).unwrap();

        let root = deployment.tree.current_root;
        let again = deployment.complete(&terms, &signature);
        assert_eq!(error_code(again), code(DepositError::AlreadyCompleted));
        assert_eq!(deployment.tree.current_root, root);
        assert_eq!(deployment.tree.next_index, 1);
        assert_eq!(deployment.pool.shielded_balance, 50);
    }

    #[test]
    fn test_unknown_nonce_is_not_found() {
        let mut deployment = Deployment::new(2, 4);
        let screener = TestScreener::new(5);
        deployment.set_permission(screener.address(), true);

        let terms = DepositRequest {
            spender: Pubkey::new_unique(),
            value: 10,
            stealth_address: stealth(1),
            nonce: 3,
            gas_compensation: 0,
        };
        let result = deployment.complete(&terms, &screener.sign(&terms.encode()));
        assert_eq!(error_code(result), code(DepositError::NotFound));
    }

    #[test]
    fn test_value_mismatch() {
        let mut deployment = Deployment::new(2, 4);
        let screener = TestScreener::new(6);
        deployment.set_permission(screener.address(), true);

        let spender = Pubkey::new_unique();
        assert_eq!(deployment.open(spender, &[1000], stealth(1), 0).unwrap(), vec![0]);
        assert_eq!(deployment.state.next_nonce, 1);

        let mut terms = deployment.records[0].request;
        terms.value = 999;
        let result = deployment.complete(&terms, &screener.sign(&terms.encode()));
        assert_eq!(error_code(result), code(DepositError::Mismatch));
        assert!(deployment.records[0].is_pending());
        assert_eq!(deployment.pool.locked_balance, 1000);
    }

    #[test]
    fn test_every_field_is_checked() {
        let mut deployment = Deployment::new(2, 4);
        let screener = TestScreener::new(8);
        deployment.set_permission(screener.address(), true);
        deployment.open(Pubkey::new_unique(), &[77], stealth(1), 3).unwrap();
        let stored = deployment.records[0].request;

        let mut variants = Vec::new();
        let mut t = stored;
        t.spender = Pubkey::new_unique();
        variants.push(t);
        let mut t = stored;
        t.stealth_address = stealth(9);
        variants.push(t);
        let mut t = stored;
        t.gas_compensation = 4;
        variants.push(t);

        for terms in variants {
            let result = deployment.complete(&terms, &screener.sign(&terms.encode()));
            assert_eq!(error_code(result), code(DepositError::Mismatch));
        }
    }

    #[test]
    fn test_unpermitted_and_revoked_screeners() {
        let mut deployment = Deployment::new(2, 4);
        let screener = TestScreener::new(9);
        deployment.open(Pubkey::new_unique(), &[10, 20], stealth(1), 1).unwrap();

        let first = deployment.records[0].request;
        let signature = screener.sign(&first.encode());
        let result = deployment.complete(&first, &signature);
        assert_eq!(error_code(result), code(DepositError::InvalidSignature));

        deployment.set_permission(screener.address(), true);
        let second = deployment.records[1].request;
        let late_signature = screener.sign(&second.encode());

        deployment.set_permission(screener.address(), false);
        let result = deployment.complete(&second, &late_signature);
        assert_eq!(error_code(result), code(DepositError::InvalidSignature));
        assert_eq!(deployment.tree.next_index, 0);

        deployment.set_permission(screener.address(), true);
        assert!(deployment.complete(&second, &late_signature).is_ok());
    }

    #[test]
    fn test_signature_over_other_request_is_rejected() {
        let mut deployment = Deployment::new(2, 4);
        let screener = TestScreener::new(10);
        deployment.set_permission(screener.address(), true);
        deployment.open(Pubkey::new_unique(), &[10, 20], stealth(1), 1).unwrap();

        let first = deployment.records[0].request;
        let second = deployment.records[1].request;
        let result = deployment.complete(&second, &screener.sign(&first.encode()));
        assert_eq!(error_code(result), code(DepositError::InvalidSignature));
    }

    #[test]
    fn test_full_tree_rejects_completion() {
        let mut deployment = Deployment::new(2, 1);
        let screener = TestScreener::new(11);
        deployment.set_permission(screener.address(), true);
        deployment.open(Pubkey::new_unique(), &[1, 2, 3], stealth(1), 0).unwrap();

        for i in 0..2 {
            let terms = deployment.records[i].request;
            deployment.complete(&terms, &screener.sign(&terms.encode())).unwrap();
        }

        let terms = deployment.records[2].request;
        let result = deployment.complete(&terms, &screener.sign(&terms.encode()));
        assert_eq!(error_code(result), code(DepositError::Full));
        assert!(deployment.records[2].is_pending());
        assert_eq!(deployment.pool.locked_balance, 3);
        assert_eq!(deployment.state.completed_count, 2);
    }

    #[test]
    fn test_completion_order_sets_leaf_indices() {
        let mut deployment = Deployment::new(4, 3);
        let screener = TestScreener::new(12);
        deployment.set_permission(screener.address(), true);
        deployment.open(Pubkey::new_unique(), &[1, 2, 3], stealth(1), 0).unwrap();

        for (leaf, nonce) in [2usize, 0, 1].into_iter().enumerate() {
            let terms = deployment.records[nonce].request;
            let receipt = deployment.complete(&terms, &screener.sign(&terms.encode())).unwrap();
            assert_eq!(receipt.leaf_index, leaf as u64);
            assert_eq!(deployment.records[nonce].leaf_index, leaf as u64);
        }
        assert_eq!(deployment.pool.shielded_balance, 6);
    }
}
