//! Gas reimbursement owed to relayers.
//!
//! Every payout credits the relayer that executed it with the execution cost
//! it paid, priced in the transferred asset. The ledger keeps two views of
//! the same debt: the per-asset total (earmarked out of free liquidity) and
//! each relayer's claimable share. The per-asset total always equals the sum
//! of the shares.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::errors::PoolError;

/// `(execution_cost_units + transfer_overhead + base_gas) * unit_gas_price`
pub fn reimbursement(
    execution_cost_units: u64,
    transfer_overhead: u64,
    base_gas: u64,
    unit_gas_price: u64,
) -> Result<u64> {
    let units = execution_cost_units
        .checked_add(transfer_overhead)
        .and_then(|v| v.checked_add(base_gas))
        .ok_or(PoolError::MathOverflow)?;
    units
        .checked_mul(unit_gas_price)
        .ok_or_else(|| error!(PoolError::MathOverflow))
}

/// Relayer entries one asset may hold. Withdrawn entries stay at zero, so
/// this also caps how many distinct relayers an asset ever reimburses.
pub const MAX_RELAYERS_PER_ASSET: usize = 16;

/// A credit with its new totals already computed. Applying it cannot fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingCredit {
    asset: Pubkey,
    relayer: Pubkey,
    total: u64,
    share: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct GasFeeLedger {
    by_asset: BTreeMap<Pubkey, u64>,
    by_relayer: BTreeMap<Pubkey, BTreeMap<Pubkey, u64>>,
}

impl GasFeeLedger {
    /// Total unredeemed reimbursement for `asset` across all relayers.
    pub fn accumulated(&self, asset: &Pubkey) -> u64 {
        self.by_asset.get(asset).copied().unwrap_or(0)
    }

    /// What `relayer` may withdraw in `asset`.
    pub fn claimable(&self, asset: &Pubkey, relayer: &Pubkey) -> u64 {
        self.by_relayer
            .get(asset)
            .and_then(|shares| shares.get(relayer))
            .copied()
            .unwrap_or(0)
    }

    /// Serialized size of a ledger covering `assets` assets, each with a
    /// full relayer table.
    pub const fn max_len(assets: usize) -> usize {
        (4 + assets * (32 + 8)) + (4 + assets * (32 + 4 + MAX_RELAYERS_PER_ASSET * (32 + 8)))
    }

    pub fn credit(&mut self, asset: &Pubkey, relayer: &Pubkey, amount: u64) -> Result<()> {
        let pending = self.prepare_credit(asset, relayer, amount)?;
        self.apply(pending);
        Ok(())
    }

    /// Check and compute a credit without touching the ledger.
    pub fn prepare_credit(&self, asset: &Pubkey, relayer: &Pubkey, amount: u64) -> Result<PendingCredit> {
        let shares = self.by_relayer.get(asset);
        let known = shares.map_or(false, |s| s.contains_key(relayer));
        let entries = shares.map_or(0, |s| s.len());
        require!(
            known || entries < MAX_RELAYERS_PER_ASSET,
            PoolError::GasLedgerFull
        );

        let total = self
            .accumulated(asset)
            .checked_add(amount)
            .ok_or(PoolError::MathOverflow)?;
        let share = self
            .claimable(asset, relayer)
            .checked_add(amount)
            .ok_or(PoolError::MathOverflow)?;
        Ok(PendingCredit {
            asset: *asset,
            relayer: *relayer,
            total,
            share,
        })
    }

    pub fn apply(&mut self, credit: PendingCredit) {
        self.by_asset.insert(credit.asset, credit.total);
        self.by_relayer
            .entry(credit.asset)
            .or_default()
            .insert(credit.relayer, credit.share);
    }

    /// Zero the relayer's share and release it from the asset total.
    /// The entry is kept at zero.
    pub fn take(&mut self, asset: &Pubkey, relayer: &Pubkey) -> Result<u64> {
        let amount = self.claimable(asset, relayer);
        require!(amount > 0, PoolError::NothingToWithdraw);

        let total = self
            .accumulated(asset)
            .checked_sub(amount)
            .ok_or(PoolError::MathOverflow)?;
        self.by_asset.insert(*asset, total);
        self.by_relayer
            .entry(*asset)
            .or_default()
            .insert(*relayer, 0);
        Ok(amount)
    }

    pub fn is_consistent(&self, asset: &Pubkey) -> bool {
        let shares: u128 = self
            .by_relayer
            .get(asset)
            .map(|shares| shares.values().map(|v| *v as u128).sum())
            .unwrap_or(0);
        shares == self.accumulated(asset) as u128
    }
}
