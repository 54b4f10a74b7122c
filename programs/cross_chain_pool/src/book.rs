//! The pool's owned state: asset registry, incentive pool, gas fee ledger
//! and base gas, plus the reentrancy guard that serializes mutating calls.
//!
//! Every mutating entry point runs inside [`PoolBook::guarded`], which
//! rejects nested calls and clears the guard on every exit path. Deposit and
//! payout live in their own modules.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::collaborators::{AssetVault, Authority, Env, EventSink};
use crate::errors::PoolError;
use crate::events::{AssetConfigured, AssetRemoved, GasFeeWithdrawn, LiquidityAdded, LiquidityRemoved, PoolEvent};
use crate::fee_curve;
use crate::gas_ledger::GasFeeLedger;
use crate::guard::ReentrancyGuard;
use crate::incentive;
use crate::liquidity;
use crate::registry::{AssetConfig, AssetParams, AssetRegistry, FeeParameters, MAX_ASSETS};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolBook {
    pub registry: AssetRegistry,
    /// Reward funds per asset. Never negative; rewards never exceed it.
    pub incentive_pool: BTreeMap<Pubkey, u64>,
    pub gas_fees: GasFeeLedger,
    /// Fixed execution cost units added to every payout's reimbursement.
    pub base_gas: u64,
    pub guard: ReentrancyGuard,
}

impl PoolBook {
    /// Serialized size with every map at its bound. Incentive pool and gas
    /// ledger entries only ever exist for registered assets.
    pub const MAX_LEN: usize = AssetRegistry::MAX_LEN
        + (4 + MAX_ASSETS * (32 + 8))
        + GasFeeLedger::max_len(MAX_ASSETS)
        + 8
        + 1;

    pub fn new(base_gas: u64) -> Self {
        Self {
            base_gas,
            ..Self::default()
        }
    }

    /// Run `op` with the reentrancy guard held.
    pub(crate) fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.guard.enter()?;
        let out = op(self);
        self.guard.exit();
        out
    }

    // --- Queries ---

    pub fn is_supported(&self, asset: &Pubkey) -> bool {
        self.registry.is_supported(asset)
    }

    pub fn fee_parameters(&self, asset: &Pubkey) -> Result<FeeParameters> {
        self.registry.fee_parameters(asset)
    }

    pub fn incentive_pool(&self, asset: &Pubkey) -> u64 {
        self.incentive_pool.get(asset).copied().unwrap_or(0)
    }

    pub fn gas_fee_accumulated(&self, asset: &Pubkey) -> u64 {
        self.gas_fees.accumulated(asset)
    }

    pub fn gas_fee_claimable(&self, asset: &Pubkey, relayer: &Pubkey) -> u64 {
        self.gas_fees.claimable(asset, relayer)
    }

    /// Free liquidity given the reserve's gross balance.
    pub(crate) fn free_liquidity_at(&self, asset: &Pubkey, gross_balance: u64) -> Result<u64> {
        liquidity::free_liquidity(
            gross_balance,
            self.gas_fees.accumulated(asset),
            self.incentive_pool(asset),
        )
    }

    pub fn current_free_liquidity(&self, asset: &Pubkey, vault: &dyn AssetVault) -> Result<u64> {
        self.free_liquidity_at(asset, vault.balance_of(asset)?)
    }

    /// Fee rate a payout of `amount` would be charged right now.
    pub fn transfer_fee_bps(&self, asset: &Pubkey, amount: u64, vault: &dyn AssetVault) -> Result<u64> {
        let config = self.registry.supported(asset)?;
        let liquidity = self.current_free_liquidity(asset, vault)?;
        fee_curve::transfer_fee_bps(config, amount, liquidity)
    }

    /// Reward a deposit of `amount` would earn right now.
    pub fn reward_amount(&self, asset: &Pubkey, amount: u64, vault: &dyn AssetVault) -> Result<u64> {
        let config = self.registry.supported(asset)?;
        let liquidity = self.current_free_liquidity(asset, vault)?;
        incentive::reward_amount(config, amount, liquidity, self.incentive_pool(asset))
    }

    // --- Registry administration (owner only) ---

    pub fn add_supported_asset(
        &mut self,
        authority: &dyn Authority,
        events: &mut dyn EventSink,
        caller: &Pubkey,
        asset: Pubkey,
        params: AssetParams,
    ) -> Result<()> {
        self.guarded(|book| {
            require!(authority.is_owner(caller), PoolError::UnauthorizedOwner);
            let config = *book.registry.add(asset, params)?;
            msg!("asset {} supported", asset);
            events.publish(configured(asset, &config));
            Ok(())
        })
    }

    pub fn remove_supported_asset(
        &mut self,
        authority: &dyn Authority,
        events: &mut dyn EventSink,
        caller: &Pubkey,
        asset: &Pubkey,
    ) -> Result<()> {
        self.guarded(|book| {
            require!(authority.is_owner(caller), PoolError::UnauthorizedOwner);
            book.registry.remove(asset)?;
            msg!("asset {} removed", asset);
            events.publish(PoolEvent::AssetRemoved(AssetRemoved { asset: *asset }));
            Ok(())
        })
    }

    pub fn update_asset_caps(
        &mut self,
        authority: &dyn Authority,
        events: &mut dyn EventSink,
        caller: &Pubkey,
        asset: &Pubkey,
        min_cap: u64,
        max_cap: u64,
    ) -> Result<()> {
        self.guarded(|book| {
            require!(authority.is_owner(caller), PoolError::UnauthorizedOwner);
            book.registry.update_caps(asset, min_cap, max_cap)?;
            book.publish_configured(asset, events)
        })
    }

    pub fn update_fee_parameters(
        &mut self,
        authority: &dyn Authority,
        events: &mut dyn EventSink,
        caller: &Pubkey,
        asset: &Pubkey,
        equilibrium_fee_bps: u64,
        max_fee_bps: u64,
    ) -> Result<()> {
        self.guarded(|book| {
            require!(authority.is_owner(caller), PoolError::UnauthorizedOwner);
            book.registry
                .update_fee_parameters(asset, equilibrium_fee_bps, max_fee_bps)?;
            book.publish_configured(asset, events)
        })
    }

    pub fn update_transfer_overhead(
        &mut self,
        authority: &dyn Authority,
        events: &mut dyn EventSink,
        caller: &Pubkey,
        asset: &Pubkey,
        transfer_overhead: u64,
    ) -> Result<()> {
        self.guarded(|book| {
            require!(authority.is_owner(caller), PoolError::UnauthorizedOwner);
            book.registry.update_transfer_overhead(asset, transfer_overhead)?;
            book.publish_configured(asset, events)
        })
    }

    pub fn set_base_gas(&mut self, authority: &dyn Authority, caller: &Pubkey, base_gas: u64) -> Result<()> {
        self.guarded(|book| {
            require!(authority.is_owner(caller), PoolError::UnauthorizedOwner);
            book.base_gas = base_gas;
            msg!("base gas set to {}", base_gas);
            Ok(())
        })
    }

    fn publish_configured(&self, asset: &Pubkey, events: &mut dyn EventSink) -> Result<()> {
        let config = self.registry.supported(asset)?;
        events.publish(configured(*asset, config));
        Ok(())
    }

    // --- Liquidity top-up and removal ---

    /// Add `amount` to the reserve on behalf of an LP position and raise the
    /// asset's provided liquidity by the same amount.
    pub fn add_liquidity(
        &mut self,
        env: &mut Env<'_>,
        provider: &Pubkey,
        position: &Pubkey,
        amount: u64,
    ) -> Result<u64> {
        self.guarded(|book| {
            require!(!env.authority.is_paused(), PoolError::Paused);
            require!(amount > 0, PoolError::ZeroAmount);
            let asset = env
                .lp_ledger
                .resolve_asset_for_position(position)
                .ok_or(PoolError::UnknownPosition)?;
            require!(
                env.lp_ledger.is_position_owner(position, provider),
                PoolError::NotPositionOwner
            );
            book.registry.supported(&asset)?;

            env.vault.transfer_in(&asset, provider, amount)?;
            let provided_liquidity = book.registry.increase_provided_liquidity(&asset, amount)?;

            env.events.publish(PoolEvent::LiquidityAdded(LiquidityAdded {
                asset,
                position: *position,
                provider: *provider,
                amount,
                provided_liquidity,
            }));
            Ok(provided_liquidity)
        })
    }

    /// Pay `amount` out of free liquidity to the owner of an LP position and
    /// lower the asset's provided liquidity.
    pub fn remove_liquidity(
        &mut self,
        env: &mut Env<'_>,
        provider: &Pubkey,
        position: &Pubkey,
        amount: u64,
    ) -> Result<u64> {
        self.guarded(|book| {
            require!(!env.authority.is_paused(), PoolError::Paused);
            require!(amount > 0, PoolError::ZeroAmount);
            let asset = env
                .lp_ledger
                .resolve_asset_for_position(position)
                .ok_or(PoolError::UnknownPosition)?;
            require!(
                env.lp_ledger.is_position_owner(position, provider),
                PoolError::NotPositionOwner
            );
            let provided = book.registry.supported(&asset)?.provided_liquidity;
            let free = book.current_free_liquidity(&asset, &*env.vault)?;
            require!(
                amount <= free && amount <= provided,
                PoolError::InsufficientLiquidity
            );

            env.vault.transfer_out(&asset, provider, amount)?;
            let provided_liquidity = book.registry.decrease_provided_liquidity(&asset, amount)?;

            env.events.publish(PoolEvent::LiquidityRemoved(LiquidityRemoved {
                asset,
                position: *position,
                provider: *provider,
                amount,
                provided_liquidity,
            }));
            Ok(provided_liquidity)
        })
    }

    // --- Gas fee withdrawal ---

    /// Withdraw everything `relayer` has earned in `asset`. Allowed while
    /// paused; only the caller's own share is touched.
    pub fn withdraw_gas_fee(&mut self, env: &mut Env<'_>, relayer: &Pubkey, asset: &Pubkey) -> Result<u64> {
        self.guarded(|book| {
            let amount = book.gas_fees.take(asset, relayer)?;
            if let Err(err) = env.vault.transfer_out(asset, relayer, amount) {
                book.gas_fees.credit(asset, relayer, amount)?;
                return Err(err);
            }
            msg!("relayer {} withdrew {} gas fee", relayer, amount);
            env.events.publish(PoolEvent::GasFeeWithdrawn(GasFeeWithdrawn {
                asset: *asset,
                relayer: *relayer,
                amount,
            }));
            Ok(amount)
        })
    }
}

fn configured(asset: Pubkey, config: &AssetConfig) -> PoolEvent {
    PoolEvent::AssetConfigured(AssetConfigured {
        asset,
        min_cap: config.min_cap,
        max_cap: config.max_cap,
        transfer_overhead: config.transfer_overhead,
        equilibrium_fee_bps: config.equilibrium_fee_bps,
        max_fee_bps: config.max_fee_bps,
    })
}
