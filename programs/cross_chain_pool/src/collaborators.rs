//! Interfaces the pool core consumes. The on-chain program backs them with
//! accounts and token CPIs (see `adapters`); tests back them with in-memory
//! doubles.

use anchor_lang::prelude::*;

use crate::events::PoolEvent;

/// Owner, relayer and pause checks.
pub trait Authority {
    fn is_owner(&self, who: &Pubkey) -> bool;
    fn is_authorized_relayer(&self, who: &Pubkey) -> bool;
    fn is_paused(&self) -> bool;
}

/// Moves assets in and out of the reserve. Native and token assets look the
/// same from here.
pub trait AssetVault {
    fn transfer_in(&mut self, asset: &Pubkey, from: &Pubkey, amount: u64) -> Result<()>;
    fn transfer_out(&mut self, asset: &Pubkey, to: &Pubkey, amount: u64) -> Result<()>;
    /// Gross balance the reserve holds of `asset`.
    fn balance_of(&self, asset: &Pubkey) -> Result<u64>;
}

/// Liquidity-provider position bookkeeping.
pub trait LpLedger {
    fn credit_lp_fee(&mut self, asset: &Pubkey, amount: u64) -> Result<()>;
    /// Reverse an earlier `credit_lp_fee` of the same amount.
    fn debit_lp_fee(&mut self, asset: &Pubkey, amount: u64) -> Result<()>;
    fn resolve_asset_for_position(&self, position: &Pubkey) -> Option<Pubkey>;
    fn is_position_owner(&self, position: &Pubkey, who: &Pubkey) -> bool;
}

pub trait EventSink {
    fn publish(&mut self, event: PoolEvent);
}

/// Off-band signed authorization granting the pool transfer rights.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum Permit {
    /// Blanket approval keyed by the holder's permit nonce.
    Nonce {
        nonce: u64,
        expiry: i64,
        allowed: bool,
        signature: Vec<u8>,
    },
    /// Approval for an exact value.
    Value {
        value: u64,
        deadline: i64,
        signature: Vec<u8>,
    },
}

pub trait PermitVerifier {
    /// Accept or reject `permit` as granting `amount` of `asset` from `owner`.
    fn verify(&self, owner: &Pubkey, asset: &Pubkey, amount: u64, permit: &Permit) -> Result<()>;
}

/// Collaborators handed to every state-mutating pool call.
pub struct Env<'a> {
    pub authority: &'a dyn Authority,
    pub vault: &'a mut dyn AssetVault,
    pub lp_ledger: &'a mut dyn LpLedger,
    pub events: &'a mut dyn EventSink,
}
