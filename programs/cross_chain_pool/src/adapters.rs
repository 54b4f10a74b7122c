//! Account-backed implementations of the pool collaborators.

use anchor_lang::prelude::*;
use anchor_spl::token::{self, TokenAccount, Transfer};

use crate::collaborators::{AssetVault, Authority, EventSink, LpLedger};
use crate::errors::PoolError;
use crate::events::PoolEvent;
use crate::replay::{Fingerprint, ReplayRegistry};
use crate::state::{AssetLedger, Config, LpPosition, PoolState, ProcessedTransfer};

pub struct ConfigAuthority<'a>(pub &'a Config);

impl Authority for ConfigAuthority<'_> {
    fn is_owner(&self, who: &Pubkey) -> bool {
        self.0.owner == *who
    }

    fn is_authorized_relayer(&self, who: &Pubkey) -> bool {
        self.0.relayers.contains(who)
    }

    fn is_paused(&self) -> bool {
        self.0.paused
    }
}

/// SPL token vault of one asset plus the single outside token account an
/// instruction moves funds to or from. Native SOL goes through its wrapped
/// mint.
pub struct TokenVault<'a, 'info> {
    pub mint: Pubkey,
    pub vault: &'a mut Account<'info, TokenAccount>,
    pub party_account: &'a Account<'info, TokenAccount>,
    /// Signs inbound transfers.
    pub party_authority: AccountInfo<'info>,
    /// Pool state PDA; signs outbound transfers.
    pub pool_authority: AccountInfo<'info>,
    pub pool_bump: u8,
    pub token_program: AccountInfo<'info>,
}

impl TokenVault<'_, '_> {
    fn check_party(&self, asset: &Pubkey, party: &Pubkey) -> Result<()> {
        require_keys_eq!(*asset, self.mint, PoolError::InvalidVaultAccount);
        require_keys_eq!(self.party_account.mint, self.mint, PoolError::InvalidVaultAccount);
        require_keys_eq!(self.party_account.owner, *party, PoolError::InvalidVaultAccount);
        Ok(())
    }
}

impl AssetVault for TokenVault<'_, '_> {
    fn transfer_in(&mut self, asset: &Pubkey, from: &Pubkey, amount: u64) -> Result<()> {
        self.check_party(asset, from)?;
        let cpi_accounts = Transfer {
            from: self.party_account.to_account_info(),
            to: self.vault.to_account_info(),
            authority: self.party_authority.clone(),
        };
        token::transfer(
            CpiContext::new(self.token_program.clone(), cpi_accounts),
            amount,
        )?;
        self.vault.reload()
    }

    fn transfer_out(&mut self, asset: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        self.check_party(asset, to)?;
        let bump = [self.pool_bump];
        let seeds = &[PoolState::SEED, &bump[..]];
        let signer = &[&seeds[..]];
        let cpi_accounts = Transfer {
            from: self.vault.to_account_info(),
            to: self.party_account.to_account_info(),
            authority: self.pool_authority.clone(),
        };
        token::transfer(
            CpiContext::new_with_signer(self.token_program.clone(), cpi_accounts, signer),
            amount,
        )?;
        self.vault.reload()
    }

    fn balance_of(&self, asset: &Pubkey) -> Result<u64> {
        require_keys_eq!(*asset, self.mint, PoolError::InvalidVaultAccount);
        Ok(self.vault.amount)
    }
}

/// LP fees accrue on the asset ledger; positions resolve to their asset.
pub struct AccountLpLedger<'a> {
    pub asset_ledger: &'a mut AssetLedger,
    pub position: Option<(Pubkey, &'a LpPosition)>,
}

impl LpLedger for AccountLpLedger<'_> {
    fn credit_lp_fee(&mut self, asset: &Pubkey, amount: u64) -> Result<()> {
        require_keys_eq!(*asset, self.asset_ledger.mint, PoolError::InvalidVaultAccount);
        self.asset_ledger.total_lp_fees = self
            .asset_ledger
            .total_lp_fees
            .checked_add(amount)
            .ok_or(PoolError::MathOverflow)?;
        Ok(())
    }

    fn debit_lp_fee(&mut self, asset: &Pubkey, amount: u64) -> Result<()> {
        require_keys_eq!(*asset, self.asset_ledger.mint, PoolError::InvalidVaultAccount);
        self.asset_ledger.total_lp_fees = self
            .asset_ledger
            .total_lp_fees
            .checked_sub(amount)
            .ok_or(PoolError::MathOverflow)?;
        Ok(())
    }

    fn resolve_asset_for_position(&self, position: &Pubkey) -> Option<Pubkey> {
        match self.position {
            Some((key, data)) if key == *position => Some(data.asset),
            _ => None,
        }
    }

    fn is_position_owner(&self, position: &Pubkey, who: &Pubkey) -> bool {
        matches!(self.position, Some((key, data)) if key == *position && data.owner == *who)
    }
}

/// The replay record PDA derived from one fingerprint.
pub struct ProcessedTransferRecord<'a> {
    pub record: &'a mut ProcessedTransfer,
    pub bump: u8,
}

impl ReplayRegistry for ProcessedTransferRecord<'_> {
    fn is_processed(&self, fingerprint: &Fingerprint) -> bool {
        self.record.processed && self.record.fingerprint == fingerprint.0
    }

    fn mark_processed(&mut self, fingerprint: Fingerprint) -> Result<()> {
        require!(!self.record.processed, PoolError::AlreadyProcessed);
        self.record.fingerprint = fingerprint.0;
        self.record.processed = true;
        self.record.bump = self.bump;
        Ok(())
    }
}

/// Publishes pool events to the transaction log.
pub struct ProgramLog;

impl EventSink for ProgramLog {
    fn publish(&mut self, event: PoolEvent) {
        match event {
            PoolEvent::DepositRecorded(e) => emit!(e),
            PoolEvent::RewardApplied(e) => emit!(e),
            PoolEvent::PayoutCompleted(e) => emit!(e),
            PoolEvent::GasFeeWithdrawn(e) => emit!(e),
            PoolEvent::LiquidityAdded(e) => emit!(e),
            PoolEvent::LiquidityRemoved(e) => emit!(e),
            PoolEvent::AssetConfigured(e) => emit!(e),
            PoolEvent::AssetRemoved(e) => emit!(e),
        }
    }
}
