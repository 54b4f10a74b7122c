//! Liquidity-dependent transfer fee.
//!
//! The curve prices a payout by how far it would pull the reserve below its
//! provided (target) level:
//!
//! ```text
//! fee = L * Fe * Fmax / (Fe * L + (Fmax - Fe) * R)
//! ```
//!
//! with `L` the provided liquidity, `R` the liquidity left after the
//! transfer, `Fe` the equilibrium fee and `Fmax` the max fee. At `R == L`
//! the fee is exactly `Fe`; as `R` falls toward zero it climbs to `Fmax`.
//! Rates are basis points scaled by ten, so `FEE_DENOMINATOR` is 100_000.

use anchor_lang::prelude::*;

use crate::errors::PoolError;
use crate::registry::AssetConfig;

/// One unit of fee rate is 1/100_000 of the amount (basis points x 10).
pub const FEE_DENOMINATOR: u64 = 100_000;

/// Fee rate for transferring `amount` out of a reserve that currently holds
/// `current_liquidity` of free liquidity.
pub fn transfer_fee_bps(config: &AssetConfig, amount: u64, current_liquidity: u64) -> Result<u64> {
    let resulting = current_liquidity
        .checked_sub(amount)
        .ok_or(PoolError::InsufficientBalance)?;

    let provided = config.provided_liquidity as u128;
    let fe = config.equilibrium_fee_bps as u128;
    let fmax = config.max_fee_bps as u128;

    let numerator = provided
        .checked_mul(fe)
        .and_then(|v| v.checked_mul(fmax))
        .ok_or(PoolError::MathOverflow)?;
    let spread = fmax.checked_sub(fe).ok_or(PoolError::DegenerateFeeCurve)?;
    let denominator = fe
        .checked_mul(provided)
        .and_then(|v| v.checked_add(spread.checked_mul(resulting as u128)?))
        .ok_or(PoolError::MathOverflow)?;
    require!(denominator != 0, PoolError::DegenerateFeeCurve);

    u64::try_from(numerator / denominator).map_err(|_| error!(PoolError::MathOverflow))
}

/// `amount * rate / FEE_DENOMINATOR`, floored.
pub fn fee_amount(amount: u64, fee_bps: u64) -> Result<u64> {
    let fee = (amount as u128)
        .checked_mul(fee_bps as u128)
        .ok_or(PoolError::MathOverflow)?
        / FEE_DENOMINATOR as u128;
    u64::try_from(fee).map_err(|_| error!(PoolError::MathOverflow))
}

/// How a charged fee is divided between liquidity providers and the
/// incentive pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeeSplit {
    pub fee_bps: u64,
    /// Total fee taken from the transfer.
    pub total: u64,
    /// Share credited to liquidity providers, never above the equilibrium rate.
    pub lp_fee: u64,
    /// Surplus above the equilibrium rate, routed to the incentive pool.
    pub incentive: u64,
}

/// Cap the LP share at the equilibrium rate and send the rest of the fee to
/// the incentive pool. `lp_fee + incentive == total` always holds.
///
/// The incentive share is the remainder of the total rather than
/// `amount * (fee_bps - equilibrium) / FEE_DENOMINATOR` floored on its own,
/// so it can be one unit larger than that product. The charged fee is never
/// left partly unaccounted.
pub fn split_fee(config: &AssetConfig, amount: u64, fee_bps: u64) -> Result<FeeSplit> {
    let total = fee_amount(amount, fee_bps)?;
    let lp_fee = if fee_bps > config.equilibrium_fee_bps {
        fee_amount(amount, config.equilibrium_fee_bps)?
    } else {
        total
    };
    Ok(FeeSplit {
        fee_bps,
        total,
        lp_fee,
        incentive: total - lp_fee,
    })
}
