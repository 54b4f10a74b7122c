//! Free liquidity: the part of the reserve that backs transfers, after the
//! amounts earmarked for relayer gas reimbursement and rebalancing rewards.

use anchor_lang::prelude::*;

use crate::errors::PoolError;

/// `gross_balance - gas_fees_owed - incentive_pool`. A reserve holding less
/// than its earmarks is reported rather than clamped to zero.
pub fn free_liquidity(gross_balance: u64, gas_fees_owed: u64, incentive_pool: u64) -> Result<u64> {
    gross_balance
        .checked_sub(gas_fees_owed)
        .and_then(|v| v.checked_sub(incentive_pool))
        .ok_or_else(|| error!(PoolError::InsufficientReserve))
}
