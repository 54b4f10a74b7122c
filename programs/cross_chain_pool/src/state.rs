//! Program state accounts for the cross-chain pool.
//!
//! One config and one pool state per program. Each supported asset has an
//! `AssetLedger` naming its vault; each processed payout leaves a
//! `ProcessedTransfer` record behind, keyed by its fingerprint.

use anchor_lang::prelude::*;

use crate::book::PoolBook;
use crate::errors::PoolError;

/// Global protocol config. Single instance per program.
#[account]
#[derive(Default)]
pub struct Config {
    /// Authority that administers assets, relayers, base gas and pause.
    pub owner: Pubkey,
    /// Relayers allowed to execute payouts.
    pub relayers: Vec<Pubkey>,
    /// When true, deposits, payouts and liquidity changes are refused.
    pub paused: bool,
    pub bump: u8,
}

impl Config {
    pub const SEED: &'static [u8] = b"config";
    pub const MAX_RELAYERS: usize = 8;
    pub const LEN: usize = 32 + (4 + 32 * Self::MAX_RELAYERS) + 1 + 1;

    pub fn set_relayer(&mut self, relayer: Pubkey, authorized: bool) -> Result<()> {
        let known = self.relayers.iter().position(|r| *r == relayer);
        match (known, authorized) {
            (None, true) => {
                require!(
                    self.relayers.len() < Self::MAX_RELAYERS,
                    PoolError::TooManyRelayers
                );
                self.relayers.push(relayer);
            }
            (Some(index), false) => {
                self.relayers.swap_remove(index);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Accounting state of the pool. Also the PDA that owns every asset vault.
#[account]
#[derive(Default)]
pub struct PoolState {
    pub book: PoolBook,
    pub bump: u8,
}

impl PoolState {
    pub const SEED: &'static [u8] = b"pool_state";
    /// Must stay within the 10_240 bytes an account can be created with
    /// through CPI, discriminator included.
    pub const LEN: usize = PoolBook::MAX_LEN + 1;
}

/// Per-asset accounts: the vault holding the reserve and the LP fees
/// accrued to providers of this asset.
#[account]
#[derive(Default)]
pub struct AssetLedger {
    pub mint: Pubkey,
    /// Token account owned by the pool state PDA.
    pub vault: Pubkey,
    pub total_lp_fees: u64,
    pub bump: u8,
}

impl AssetLedger {
    pub const SEED: &'static [u8] = b"asset";
    pub const LEN: usize = 32 + 32 + 8 + 1;
}

/// A provider's liquidity position in one asset.
#[account]
#[derive(Default)]
pub struct LpPosition {
    pub owner: Pubkey,
    pub asset: Pubkey,
    pub supplied: u64,
    pub bump: u8,
}

impl LpPosition {
    pub const SEED: &'static [u8] = b"position";
    pub const LEN: usize = 32 + 32 + 8 + 1;
}

/// Replay record for one payout fingerprint. Once `processed` is set the
/// account is never closed.
#[account]
#[derive(Default)]
pub struct ProcessedTransfer {
    pub fingerprint: [u8; 32],
    pub processed: bool,
    pub bump: u8,
}

impl ProcessedTransfer {
    pub const SEED: &'static [u8] = b"processed";
    pub const LEN: usize = 32 + 1 + 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::pool_err;

    #[test]
    fn relayer_set_is_bounded_and_idempotent() {
        let mut config = Config::default();
        let first = Pubkey::new_unique();
        config.set_relayer(first, true).unwrap();
        config.set_relayer(first, true).unwrap();
        assert_eq!(config.relayers, vec![first]);

        for _ in 1..Config::MAX_RELAYERS {
            config.set_relayer(Pubkey::new_unique(), true).unwrap();
        }
        assert_eq!(
            config.set_relayer(Pubkey::new_unique(), true).unwrap_err(),
            pool_err(PoolError::TooManyRelayers)
        );

        config.set_relayer(first, false).unwrap();
        assert!(!config.relayers.contains(&first));
        assert_eq!(config.relayers.len(), Config::MAX_RELAYERS - 1);
    }

    #[test]
    fn pool_state_fits_a_cpi_created_account() {
        assert!(8 + PoolState::LEN <= 10_240);
    }
}
