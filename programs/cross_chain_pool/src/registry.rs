//! Per-asset configuration: support flag, transfer caps, fee-curve
//! parameters, gas overhead and the provided (target) liquidity level.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::errors::PoolError;
use crate::fee_curve::FEE_DENOMINATOR;

/// Assets the registry can hold, removed ones included.
pub const MAX_ASSETS: usize = 12;

/// Configuration for one supported asset.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssetConfig {
    pub supported: bool,
    /// Smallest transfer accepted. Invariant: min_cap < max_cap.
    pub min_cap: u64,
    pub max_cap: u64,
    /// Target reserve level. Only moved by liquidity add/remove.
    pub provided_liquidity: u64,
    /// Extra execution cost units charged on every payout of this asset.
    pub transfer_overhead: u64,
    /// Fee rate at or above the target level (basis points x 10).
    pub equilibrium_fee_bps: u64,
    /// Fee rate approached as the reserve drains (basis points x 10).
    pub max_fee_bps: u64,
}

impl AssetConfig {
    pub const LEN: usize = 1 + 8 * 6;

    pub fn check_cap(&self, amount: u64) -> Result<()> {
        require!(
            self.min_cap <= amount && amount <= self.max_cap,
            PoolError::AmountOutOfCapRange
        );
        Ok(())
    }

    pub fn fee_parameters(&self) -> FeeParameters {
        FeeParameters {
            equilibrium_fee_bps: self.equilibrium_fee_bps,
            max_fee_bps: self.max_fee_bps,
        }
    }
}

/// Admin-supplied parameters for adding or re-enabling an asset.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssetParams {
    pub min_cap: u64,
    pub max_cap: u64,
    pub transfer_overhead: u64,
    pub equilibrium_fee_bps: u64,
    pub max_fee_bps: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeParameters {
    pub equilibrium_fee_bps: u64,
    pub max_fee_bps: u64,
}

pub fn validate_caps(min_cap: u64, max_cap: u64) -> Result<()> {
    require!(min_cap < max_cap, PoolError::InvalidCapRange);
    Ok(())
}

/// `equilibrium == max` would collapse the curve's denominator onto the
/// provided-liquidity term alone, so it is refused here.
pub fn validate_fee_parameters(equilibrium_fee_bps: u64, max_fee_bps: u64) -> Result<()> {
    require!(
        equilibrium_fee_bps > 0
            && equilibrium_fee_bps < max_fee_bps
            && max_fee_bps <= FEE_DENOMINATOR,
        PoolError::InvalidFeeParameters
    );
    Ok(())
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetRegistry {
    assets: BTreeMap<Pubkey, AssetConfig>,
}

impl AssetRegistry {
    pub const MAX_LEN: usize = 4 + MAX_ASSETS * (32 + AssetConfig::LEN);

    pub fn get(&self, asset: &Pubkey) -> Option<&AssetConfig> {
        self.assets.get(asset)
    }

    pub fn is_supported(&self, asset: &Pubkey) -> bool {
        self.assets.get(asset).map_or(false, |c| c.supported)
    }

    /// Config of a supported asset, or `AssetNotSupported`.
    pub fn supported(&self, asset: &Pubkey) -> Result<&AssetConfig> {
        self.assets
            .get(asset)
            .filter(|c| c.supported)
            .ok_or_else(|| error!(PoolError::AssetNotSupported))
    }

    fn supported_mut(&mut self, asset: &Pubkey) -> Result<&mut AssetConfig> {
        self.assets
            .get_mut(asset)
            .filter(|c| c.supported)
            .ok_or_else(|| error!(PoolError::AssetNotSupported))
    }

    pub fn fee_parameters(&self, asset: &Pubkey) -> Result<FeeParameters> {
        Ok(self.supported(asset)?.fee_parameters())
    }

    /// Add a new asset or re-enable a removed one. Provided liquidity of a
    /// previously known asset is kept.
    pub fn add(&mut self, asset: Pubkey, params: AssetParams) -> Result<&AssetConfig> {
        validate_caps(params.min_cap, params.max_cap)?;
        validate_fee_parameters(params.equilibrium_fee_bps, params.max_fee_bps)?;
        require!(
            self.assets.contains_key(&asset) || self.assets.len() < MAX_ASSETS,
            PoolError::TooManyAssets
        );

        let config = self.assets.entry(asset).or_default();
        config.supported = true;
        config.min_cap = params.min_cap;
        config.max_cap = params.max_cap;
        config.transfer_overhead = params.transfer_overhead;
        config.equilibrium_fee_bps = params.equilibrium_fee_bps;
        config.max_fee_bps = params.max_fee_bps;
        Ok(&*config)
    }

    pub fn remove(&mut self, asset: &Pubkey) -> Result<()> {
        self.supported_mut(asset)?.supported = false;
        Ok(())
    }

    pub fn update_caps(&mut self, asset: &Pubkey, min_cap: u64, max_cap: u64) -> Result<()> {
        validate_caps(min_cap, max_cap)?;
        let config = self.supported_mut(asset)?;
        config.min_cap = min_cap;
        config.max_cap = max_cap;
        Ok(())
    }

    pub fn update_fee_parameters(
        &mut self,
        asset: &Pubkey,
        equilibrium_fee_bps: u64,
        max_fee_bps: u64,
    ) -> Result<()> {
        validate_fee_parameters(equilibrium_fee_bps, max_fee_bps)?;
        let config = self.supported_mut(asset)?;
        config.equilibrium_fee_bps = equilibrium_fee_bps;
        config.max_fee_bps = max_fee_bps;
        Ok(())
    }

    pub fn update_transfer_overhead(&mut self, asset: &Pubkey, overhead: u64) -> Result<()> {
        self.supported_mut(asset)?.transfer_overhead = overhead;
        Ok(())
    }

    pub fn increase_provided_liquidity(&mut self, asset: &Pubkey, amount: u64) -> Result<u64> {
        let config = self.supported_mut(asset)?;
        config.provided_liquidity = config
            .provided_liquidity
            .checked_add(amount)
            .ok_or(PoolError::MathOverflow)?;
        Ok(config.provided_liquidity)
    }

    pub fn decrease_provided_liquidity(&mut self, asset: &Pubkey, amount: u64) -> Result<u64> {
        let config = self.supported_mut(asset)?;
        config.provided_liquidity = config
            .provided_liquidity
            .checked_sub(amount)
            .ok_or(PoolError::InsufficientLiquidity)?;
        Ok(config.provided_liquidity)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::pool_err;

    fn params() -> AssetParams {
        AssetParams {
            min_cap: 10,
            max_cap: 1_000,
            transfer_overhead: 500,
            equilibrium_fee_bps: 100,
            max_fee_bps: 2_000,
        }
    }

    #[test]
    fn add_then_query() {
        let mut registry = AssetRegistry::default();
        let asset = Pubkey::new_unique();
        registry.add(asset, params()).unwrap();

        assert!(registry.is_supported(&asset));
        assert_eq!(
            registry.fee_parameters(&asset).unwrap(),
            FeeParameters {
                equilibrium_fee_bps: 100,
                max_fee_bps: 2_000
            }
        );
        assert!(!registry.is_supported(&Pubkey::new_unique()));
    }

    #[test]
    fn caps_must_stay_ordered() {
        let mut registry = AssetRegistry::default();
        let asset = Pubkey::new_unique();
        registry.add(asset, params()).unwrap();

        assert_eq!(
            registry.update_caps(&asset, 50, 50).unwrap_err(),
            pool_err(PoolError::InvalidCapRange)
        );
        assert_eq!(
            registry.update_caps(&asset, 60, 50).unwrap_err(),
            pool_err(PoolError::InvalidCapRange)
        );
        let config = registry.get(&asset).unwrap();
        assert!(config.min_cap < config.max_cap);

        registry.update_caps(&asset, 1, 2).unwrap();
        assert_eq!(registry.get(&asset).unwrap().max_cap, 2);
    }

    #[test]
    fn degenerate_fee_parameters_rejected() {
        for (eq, max) in [(0, 100), (100, 0), (100, 100), (200, 100), (10, FEE_DENOMINATOR + 1)] {
            assert_eq!(
                validate_fee_parameters(eq, max).unwrap_err(),
                pool_err(PoolError::InvalidFeeParameters)
            );
        }
        assert!(validate_fee_parameters(1, FEE_DENOMINATOR).is_ok());
    }

    #[test]
    fn remove_keeps_provided_liquidity() {
        let mut registry = AssetRegistry::default();
        let asset = Pubkey::new_unique();
        registry.add(asset, params()).unwrap();
        registry.increase_provided_liquidity(&asset, 700).unwrap();

        registry.remove(&asset).unwrap();
        assert!(!registry.is_supported(&asset));
        assert_eq!(
            registry.supported(&asset).unwrap_err(),
            pool_err(PoolError::AssetNotSupported)
        );

        registry.add(asset, params()).unwrap();
        assert_eq!(registry.get(&asset).unwrap().provided_liquidity, 700);
    }

    #[test]
    fn registry_is_bounded() {
        let mut registry = AssetRegistry::default();
        let first = Pubkey::new_unique();
        registry.add(first, params()).unwrap();
        for _ in 1..MAX_ASSETS {
            registry.add(Pubkey::new_unique(), params()).unwrap();
        }

        assert_eq!(
            registry.add(Pubkey::new_unique(), params()).unwrap_err(),
            pool_err(PoolError::TooManyAssets)
        );
        assert_eq!(registry.len(), MAX_ASSETS);

        // Removed assets keep their slot and can come back.
        registry.remove(&first).unwrap();
        registry.add(first, params()).unwrap();
        assert_eq!(registry.len(), MAX_ASSETS);
    }

    #[test]
    fn provided_liquidity_cannot_go_negative() {
        let mut registry = AssetRegistry::default();
        let asset = Pubkey::new_unique();
        registry.add(asset, params()).unwrap();
        registry.increase_provided_liquidity(&asset, 5).unwrap();

        assert_eq!(
            registry.decrease_provided_liquidity(&asset, 6).unwrap_err(),
            pool_err(PoolError::InsufficientLiquidity)
        );
        assert_eq!(registry.decrease_provided_liquidity(&asset, 5).unwrap(), 0);
    }

    #[test]
    fn check_cap_is_inclusive() {
        let mut registry = AssetRegistry::default();
        let asset = Pubkey::new_unique();
        let config = *registry.add(asset, params()).unwrap();

        assert!(config.check_cap(10).is_ok());
        assert!(config.check_cap(1_000).is_ok());
        assert!(config.check_cap(9).is_err());
        assert!(config.check_cap(1_001).is_err());
    }
}
