//! Rebalancing rewards paid to deposits that refill a depleted reserve.
//!
//! The incentive pool is funded by the fee surplus collected while the
//! reserve sits below its target. A deposit earns a share of that pool
//! proportional to how much of the deficit it closes; a deposit that closes
//! the whole gap takes the entire pool.

use anchor_lang::prelude::*;

use crate::errors::PoolError;
use crate::registry::AssetConfig;

/// Reward for depositing `amount` given the reserve's current free liquidity
/// and incentive pool balance. Never exceeds `incentive_pool`.
pub fn reward_amount(
    config: &AssetConfig,
    amount: u64,
    free_liquidity: u64,
    incentive_pool: u64,
) -> Result<u64> {
    if free_liquidity >= config.provided_liquidity {
        return Ok(0);
    }
    let deficit = config.provided_liquidity - free_liquidity;
    if amount >= deficit {
        return Ok(incentive_pool);
    }

    // u128 keeps the full product, so the floor is taken once at the end.
    let reward = (amount as u128)
        .checked_mul(incentive_pool as u128)
        .ok_or(PoolError::MathOverflow)?
        / deficit as u128;
    u64::try_from(reward).map_err(|_| error!(PoolError::MathOverflow))
}
