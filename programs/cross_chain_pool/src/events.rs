//! Events emitted by the cross-chain pool program.
//! Relayers and indexers consume these to drive the cross-chain workflow.

use anchor_lang::prelude::*;

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRecorded {
    pub depositor: Pubkey,
    pub asset: Pubkey,
    /// Recipient on destination chain (opaque; 32 bytes).
    pub receiver: [u8; 32],
    pub to_chain_id: u64,
    /// Amount to deliver on the destination chain: deposit plus reward.
    pub amount: u64,
    pub reward: u64,
    pub tag: String,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardApplied {
    pub asset: Pubkey,
    pub depositor: Pubkey,
    pub reward: u64,
    pub incentive_pool_remaining: u64,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutCompleted {
    pub asset: Pubkey,
    pub amount: u64,
    pub amount_delivered: u64,
    pub receiver: Pubkey,
    pub deposit_proof: Vec<u8>,
    pub from_chain_id: u64,
    pub lp_fee: u64,
    pub transfer_fee: u64,
    pub gas_fee: u64,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasFeeWithdrawn {
    pub asset: Pubkey,
    pub relayer: Pubkey,
    pub amount: u64,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityAdded {
    pub asset: Pubkey,
    pub position: Pubkey,
    pub provider: Pubkey,
    pub amount: u64,
    pub provided_liquidity: u64,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityRemoved {
    pub asset: Pubkey,
    pub position: Pubkey,
    pub provider: Pubkey,
    pub amount: u64,
    pub provided_liquidity: u64,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetConfigured {
    pub asset: Pubkey,
    pub min_cap: u64,
    pub max_cap: u64,
    pub transfer_overhead: u64,
    pub equilibrium_fee_bps: u64,
    pub max_fee_bps: u64,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRemoved {
    pub asset: Pubkey,
}

/// Everything the pool core can publish. The on-chain sink maps each
/// variant to `emit!`; tests collect them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    DepositRecorded(DepositRecorded),
    RewardApplied(RewardApplied),
    PayoutCompleted(PayoutCompleted),
    GasFeeWithdrawn(GasFeeWithdrawn),
    LiquidityAdded(LiquidityAdded),
    LiquidityRemoved(LiquidityRemoved),
    AssetConfigured(AssetConfigured),
    AssetRemoved(AssetRemoved),
}
