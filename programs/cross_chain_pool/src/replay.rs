//! At-most-once processing of cross-chain transfers.
//!
//! A payout is identified by a fingerprint over its asset, amount, receiver
//! and deposit proof. A fingerprint moves `Unseen -> Processed` once and
//! never back.

use std::collections::BTreeSet;

use anchor_lang::prelude::*;
use anchor_lang::solana_program::keccak;

use crate::errors::PoolError;

/// Domain tag mixed into every transfer fingerprint.
pub const TRANSFER_FINGERPRINT_DOMAIN: &[u8] = b"cross_chain_pool:transfer:v1";

#[derive(
    AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Canonical encoding:
    /// `domain || asset(32) || amount_u64_le(8) || receiver(32) || keccak(deposit_proof)(32)`.
    pub fn of_transfer(asset: &Pubkey, amount: u64, receiver: &Pubkey, deposit_proof: &[u8]) -> Self {
        let proof_hash = keccak::hash(deposit_proof);
        let digest = keccak::hashv(&[
            TRANSFER_FINGERPRINT_DOMAIN,
            asset.as_ref(),
            &amount.to_le_bytes(),
            receiver.as_ref(),
            &proof_hash.0,
        ]);
        Self(digest.to_bytes())
    }
}

/// Where processed fingerprints are recorded.
pub trait ReplayRegistry {
    fn is_processed(&self, fingerprint: &Fingerprint) -> bool;

    /// Record the fingerprint. Fails with `AlreadyProcessed` if it is
    /// already recorded.
    fn mark_processed(&mut self, fingerprint: Fingerprint) -> Result<()>;
}

/// In-process set of processed fingerprints. Grows without bound.
#[derive(Clone, Debug, Default)]
pub struct ProcessedTransferSet {
    processed: BTreeSet<Fingerprint>,
}

impl ProcessedTransferSet {
    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}

impl ReplayRegistry for ProcessedTransferSet {
    fn is_processed(&self, fingerprint: &Fingerprint) -> bool {
        self.processed.contains(fingerprint)
    }

    fn mark_processed(&mut self, fingerprint: Fingerprint) -> Result<()> {
        require!(
            self.processed.insert(fingerprint),
            PoolError::AlreadyProcessed
        );
        Ok(())
    }
}
