//! # Cross-Chain Pool Program
//!
//! Accounting core of a cross-chain transfer pool. Depositors lock funds
//! here for delivery on another chain; an authorized relayer pays
//! recipients out of the shared reserve for transfers arriving from other
//! chains.
//!
//! ## Pricing
//! - Payouts pay a liquidity fee that rises as the reserve is drawn below
//!   its provided level (`fee_curve`).
//! - Fee above the equilibrium rate funds an incentive pool that rewards
//!   deposits refilling a depleted reserve (`incentive`).
//! - Relayers are reimbursed for execution cost out of each payout and
//!   withdraw their share later (`gas_ledger`).
//!
//! ## Security
//! - Every payout is fingerprinted and processed at most once (`replay`)
//! - Role-based access (owner, relayers) and an emergency pause
//! - A reentrancy guard around every mutating pool operation (`guard`)
//!
//! The accounting itself lives in [`book::PoolBook`] and talks to the chain
//! only through the traits in [`collaborators`]; [`adapters`] backs them
//! with accounts and token CPIs.

pub mod adapters;
pub mod book;
pub mod collaborators;
pub mod deposit;
pub mod errors;
pub mod events;
pub mod fee_curve;
pub mod gas_ledger;
pub mod guard;
pub mod incentive;
pub mod liquidity;
pub mod payout;
pub mod registry;
pub mod replay;
pub mod state;

#[cfg(test)]
mod test_utils;

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use adapters::{AccountLpLedger, ConfigAuthority, ProcessedTransferRecord, ProgramLog, TokenVault};
use book::PoolBook;
use collaborators::Env;
use deposit::DepositRequest;
use errors::PoolError;
use payout::PayoutRequest;
use registry::AssetParams;
use state::{AssetLedger, Config, LpPosition, PoolState, ProcessedTransfer};

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

#[program]
pub mod cross_chain_pool {
    use super::*;

    /// Create the global config and the pool state. Called once.
    pub fn initialize(ctx: Context<Initialize>, base_gas: u64) -> Result<()> {
        let config = &mut ctx.accounts.config;
        config.owner = ctx.accounts.owner.key();
        config.relayers = Vec::new();
        config.paused = false;
        config.bump = ctx.bumps.config;

        let pool_state = &mut ctx.accounts.pool_state;
        pool_state.book = PoolBook::new(base_gas);
        pool_state.bump = ctx.bumps.pool_state;
        Ok(())
    }

    /// Authorize or revoke a relayer. Owner-only.
    pub fn set_relayer(ctx: Context<UpdateConfig>, relayer: Pubkey, authorized: bool) -> Result<()> {
        ctx.accounts.config.set_relayer(relayer, authorized)?;
        msg!("relayer {} authorized: {}", relayer, authorized);
        Ok(())
    }

    /// Pause or resume deposits, payouts and liquidity changes. Owner-only
    /// (circuit breaker). Gas fee withdrawal stays open.
    pub fn set_paused(ctx: Context<UpdateConfig>, paused: bool) -> Result<()> {
        ctx.accounts.config.paused = paused;
        msg!("pool paused: {}", paused);
        Ok(())
    }

    pub fn set_base_gas(ctx: Context<AdministerPool>, base_gas: u64) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let authority = ConfigAuthority(&accounts.config);
        accounts
            .pool_state
            .book
            .set_base_gas(&authority, &accounts.owner.key(), base_gas)
    }

    /// Support a new asset (or re-enable a removed one) and bind its vault.
    /// The vault must already exist and be owned by the pool state PDA.
    pub fn add_supported_asset(ctx: Context<AddSupportedAsset>, params: AssetParams) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let mint = accounts.mint.key();

        let asset_ledger = &mut accounts.asset_ledger;
        asset_ledger.mint = mint;
        asset_ledger.vault = accounts.vault.key();
        asset_ledger.bump = ctx.bumps.asset_ledger;

        let authority = ConfigAuthority(&accounts.config);
        accounts.pool_state.book.add_supported_asset(
            &authority,
            &mut ProgramLog,
            &accounts.owner.key(),
            mint,
            params,
        )
    }

    pub fn update_asset_caps(ctx: Context<AdministerAsset>, min_cap: u64, max_cap: u64) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let authority = ConfigAuthority(&accounts.config);
        accounts.pool_state.book.update_asset_caps(
            &authority,
            &mut ProgramLog,
            &accounts.owner.key(),
            &accounts.mint.key(),
            min_cap,
            max_cap,
        )
    }

    pub fn update_fee_parameters(
        ctx: Context<AdministerAsset>,
        equilibrium_fee_bps: u64,
        max_fee_bps: u64,
    ) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let authority = ConfigAuthority(&accounts.config);
        accounts.pool_state.book.update_fee_parameters(
            &authority,
            &mut ProgramLog,
            &accounts.owner.key(),
            &accounts.mint.key(),
            equilibrium_fee_bps,
            max_fee_bps,
        )
    }

    pub fn update_transfer_overhead(ctx: Context<AdministerAsset>, transfer_overhead: u64) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let authority = ConfigAuthority(&accounts.config);
        accounts.pool_state.book.update_transfer_overhead(
            &authority,
            &mut ProgramLog,
            &accounts.owner.key(),
            &accounts.mint.key(),
            transfer_overhead,
        )
    }

    pub fn remove_supported_asset(ctx: Context<AdministerAsset>) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let authority = ConfigAuthority(&accounts.config);
        accounts.pool_state.book.remove_supported_asset(
            &authority,
            &mut ProgramLog,
            &accounts.owner.key(),
            &accounts.mint.key(),
        )
    }

    /// Supply liquidity through the provider's position in this asset,
    /// raising the asset's provided (target) liquidity.
    pub fn add_liquidity(ctx: Context<AddLiquidity>, amount: u64) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let provider = accounts.provider.key();
        let mint = accounts.asset_ledger.mint;

        let position = &mut accounts.position;
        if position.owner == Pubkey::default() {
            position.owner = provider;
            position.asset = mint;
            position.bump = ctx.bumps.position;
        }
        let position_key = position.key();

        {
            let authority = ConfigAuthority(&accounts.config);
            let mut vault = TokenVault {
                mint,
                vault: &mut accounts.vault,
                party_account: &accounts.provider_token_account,
                party_authority: accounts.provider.to_account_info(),
                pool_authority: accounts.pool_state.to_account_info(),
                pool_bump: accounts.pool_state.bump,
                token_program: accounts.token_program.to_account_info(),
            };
            let position_data: &LpPosition = &accounts.position;
            let mut lp_ledger = AccountLpLedger {
                asset_ledger: &mut accounts.asset_ledger,
                position: Some((position_key, position_data)),
            };
            let mut env = Env {
                authority: &authority,
                vault: &mut vault,
                lp_ledger: &mut lp_ledger,
                events: &mut ProgramLog,
            };
            accounts
                .pool_state
                .book
                .add_liquidity(&mut env, &provider, &position_key, amount)?;
        }

        accounts.position.supplied = accounts
            .position
            .supplied
            .checked_add(amount)
            .ok_or(PoolError::MathOverflow)?;
        Ok(())
    }

    /// Withdraw supplied liquidity back to the position owner.
    pub fn remove_liquidity(ctx: Context<RemoveLiquidity>, amount: u64) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        require!(
            accounts.position.supplied >= amount,
            PoolError::InsufficientLiquidity
        );
        let provider = accounts.provider.key();
        let mint = accounts.asset_ledger.mint;
        let position_key = accounts.position.key();

        {
            let authority = ConfigAuthority(&accounts.config);
            let mut vault = TokenVault {
                mint,
                vault: &mut accounts.vault,
                party_account: &accounts.provider_token_account,
                party_authority: accounts.provider.to_account_info(),
                pool_authority: accounts.pool_state.to_account_info(),
                pool_bump: accounts.pool_state.bump,
                token_program: accounts.token_program.to_account_info(),
            };
            let position_data: &LpPosition = &accounts.position;
            let mut lp_ledger = AccountLpLedger {
                asset_ledger: &mut accounts.asset_ledger,
                position: Some((position_key, position_data)),
            };
            let mut env = Env {
                authority: &authority,
                vault: &mut vault,
                lp_ledger: &mut lp_ledger,
                events: &mut ProgramLog,
            };
            accounts
                .pool_state
                .book
                .remove_liquidity(&mut env, &provider, &position_key, amount)?;
        }

        accounts.position.supplied -= amount;
        Ok(())
    }

    /// Lock funds for delivery on `to_chain_id`. Emits DepositRecorded with
    /// the amount to deliver, including any rebalancing reward.
    pub fn deposit(
        ctx: Context<Deposit>,
        amount: u64,
        receiver: [u8; 32],
        to_chain_id: u64,
        tag: String,
    ) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let depositor = accounts.depositor.key();
        let mint = accounts.asset_ledger.mint;

        let authority = ConfigAuthority(&accounts.config);
        let mut vault = TokenVault {
            mint,
            vault: &mut accounts.vault,
            party_account: &accounts.depositor_token_account,
            party_authority: accounts.depositor.to_account_info(),
            pool_authority: accounts.pool_state.to_account_info(),
            pool_bump: accounts.pool_state.bump,
            token_program: accounts.token_program.to_account_info(),
        };
        let mut lp_ledger = AccountLpLedger {
            asset_ledger: &mut accounts.asset_ledger,
            position: None,
        };
        let mut env = Env {
            authority: &authority,
            vault: &mut vault,
            lp_ledger: &mut lp_ledger,
            events: &mut ProgramLog,
        };
        accounts.pool_state.book.deposit(
            &mut env,
            &depositor,
            DepositRequest {
                asset: mint,
                amount,
                receiver,
                to_chain_id,
                tag,
            },
        )?;
        Ok(())
    }

    /// Deliver a transfer that arrived from `from_chain_id`. Relayer-only.
    /// `fingerprint` seeds the replay record and must match the transfer.
    #[allow(clippy::too_many_arguments)]
    pub fn payout(
        ctx: Context<Payout>,
        fingerprint: [u8; 32],
        amount: u64,
        receiver: Pubkey,
        deposit_proof: Vec<u8>,
        from_chain_id: u64,
        execution_cost_units: u64,
        unit_gas_price: u64,
    ) -> Result<()> {
        let record_bump = ctx.bumps.processed_transfer;
        let accounts = &mut *ctx.accounts;
        let relayer = accounts.relayer.key();
        let mint = accounts.asset_ledger.mint;

        let request = PayoutRequest {
            asset: mint,
            amount,
            receiver,
            deposit_proof,
            from_chain_id,
            execution_cost_units,
            unit_gas_price,
        };
        require!(
            request.fingerprint().0 == fingerprint,
            PoolError::FingerprintMismatch
        );

        let authority = ConfigAuthority(&accounts.config);
        let mut vault = TokenVault {
            mint,
            vault: &mut accounts.vault,
            party_account: &accounts.receiver_token_account,
            party_authority: accounts.relayer.to_account_info(),
            pool_authority: accounts.pool_state.to_account_info(),
            pool_bump: accounts.pool_state.bump,
            token_program: accounts.token_program.to_account_info(),
        };
        let mut lp_ledger = AccountLpLedger {
            asset_ledger: &mut accounts.asset_ledger,
            position: None,
        };
        let mut replay = ProcessedTransferRecord {
            record: &mut accounts.processed_transfer,
            bump: record_bump,
        };
        let mut env = Env {
            authority: &authority,
            vault: &mut vault,
            lp_ledger: &mut lp_ledger,
            events: &mut ProgramLog,
        };
        accounts
            .pool_state
            .book
            .payout(&mut env, &mut replay, &relayer, request)?;
        Ok(())
    }

    /// Withdraw the calling relayer's accumulated gas reimbursement.
    pub fn withdraw_gas_fee(ctx: Context<WithdrawGasFee>) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let relayer = accounts.relayer.key();
        let mint = accounts.asset_ledger.mint;

        let authority = ConfigAuthority(&accounts.config);
        let mut vault = TokenVault {
            mint,
            vault: &mut accounts.vault,
            party_account: &accounts.relayer_token_account,
            party_authority: accounts.relayer.to_account_info(),
            pool_authority: accounts.pool_state.to_account_info(),
            pool_bump: accounts.pool_state.bump,
            token_program: accounts.token_program.to_account_info(),
        };
        let mut lp_ledger = AccountLpLedger {
            asset_ledger: &mut accounts.asset_ledger,
            position: None,
        };
        let mut env = Env {
            authority: &authority,
            vault: &mut vault,
            lp_ledger: &mut lp_ledger,
            events: &mut ProgramLog,
        };
        accounts
            .pool_state
            .book
            .withdraw_gas_fee(&mut env, &relayer, &mint)?;
        Ok(())
    }
}

// --- Account structs and validation ---

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(
        init,
        payer = owner,
        space = 8 + Config::LEN,
        seeds = [Config::SEED],
        bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        init,
        payer = owner,
        space = 8 + PoolState::LEN,
        seeds = [PoolState::SEED],
        bump
    )]
    pub pool_state: Account<'info, PoolState>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct UpdateConfig<'info> {
    #[account(
        mut,
        seeds = [Config::SEED],
        bump = config.bump,
        constraint = config.owner == owner.key() @ PoolError::UnauthorizedOwner
    )]
    pub config: Account<'info, Config>,

    pub owner: Signer<'info>,
}

#[derive(Accounts)]
pub struct AdministerPool<'info> {
    #[account(seeds = [Config::SEED], bump = config.bump)]
    pub config: Account<'info, Config>,

    #[account(mut, seeds = [PoolState::SEED], bump = pool_state.bump)]
    pub pool_state: Account<'info, PoolState>,

    pub owner: Signer<'info>,
}

#[derive(Accounts)]
pub struct AddSupportedAsset<'info> {
    #[account(seeds = [Config::SEED], bump = config.bump)]
    pub config: Account<'info, Config>,

    #[account(mut, seeds = [PoolState::SEED], bump = pool_state.bump)]
    pub pool_state: Account<'info, PoolState>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub mint: Account<'info, Mint>,

    #[account(
        constraint = vault.mint == mint.key() @ PoolError::InvalidVaultAccount,
        constraint = vault.owner == pool_state.key() @ PoolError::InvalidVaultAccount
    )]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + AssetLedger::LEN,
        seeds = [AssetLedger::SEED, mint.key().as_ref()],
        bump
    )]
    pub asset_ledger: Account<'info, AssetLedger>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct AdministerAsset<'info> {
    #[account(seeds = [Config::SEED], bump = config.bump)]
    pub config: Account<'info, Config>,

    #[account(mut, seeds = [PoolState::SEED], bump = pool_state.bump)]
    pub pool_state: Account<'info, PoolState>,

    pub owner: Signer<'info>,

    pub mint: Account<'info, Mint>,
}

#[derive(Accounts)]
pub struct AddLiquidity<'info> {
    #[account(seeds = [Config::SEED], bump = config.bump)]
    pub config: Account<'info, Config>,

    #[account(mut, seeds = [PoolState::SEED], bump = pool_state.bump)]
    pub pool_state: Account<'info, PoolState>,

    #[account(mut)]
    pub provider: Signer<'info>,

    #[account(
        mut,
        seeds = [AssetLedger::SEED, asset_ledger.mint.as_ref()],
        bump = asset_ledger.bump
    )]
    pub asset_ledger: Account<'info, AssetLedger>,

    #[account(mut, constraint = vault.key() == asset_ledger.vault @ PoolError::InvalidVaultAccount)]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = provider_token_account.mint == asset_ledger.mint,
        constraint = provider_token_account.owner == provider.key()
    )]
    pub provider_token_account: Account<'info, TokenAccount>,

    #[account(
        init_if_needed,
        payer = provider,
        space = 8 + LpPosition::LEN,
        seeds = [LpPosition::SEED, asset_ledger.mint.as_ref(), provider.key().as_ref()],
        bump
    )]
    pub position: Account<'info, LpPosition>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct RemoveLiquidity<'info> {
    #[account(seeds = [Config::SEED], bump = config.bump)]
    pub config: Account<'info, Config>,

    #[account(mut, seeds = [PoolState::SEED], bump = pool_state.bump)]
    pub pool_state: Account<'info, PoolState>,

    pub provider: Signer<'info>,

    #[account(
        mut,
        seeds = [AssetLedger::SEED, asset_ledger.mint.as_ref()],
        bump = asset_ledger.bump
    )]
    pub asset_ledger: Account<'info, AssetLedger>,

    #[account(mut, constraint = vault.key() == asset_ledger.vault @ PoolError::InvalidVaultAccount)]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = provider_token_account.mint == asset_ledger.mint,
        constraint = provider_token_account.owner == provider.key()
    )]
    pub provider_token_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        seeds = [LpPosition::SEED, asset_ledger.mint.as_ref(), provider.key().as_ref()],
        bump = position.bump,
        constraint = position.owner == provider.key() @ PoolError::NotPositionOwner
    )]
    pub position: Account<'info, LpPosition>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct Deposit<'info> {
    #[account(seeds = [Config::SEED], bump = config.bump)]
    pub config: Account<'info, Config>,

    #[account(mut, seeds = [PoolState::SEED], bump = pool_state.bump)]
    pub pool_state: Account<'info, PoolState>,

    pub depositor: Signer<'info>,

    #[account(
        mut,
        seeds = [AssetLedger::SEED, asset_ledger.mint.as_ref()],
        bump = asset_ledger.bump
    )]
    pub asset_ledger: Account<'info, AssetLedger>,

    #[account(mut, constraint = vault.key() == asset_ledger.vault @ PoolError::InvalidVaultAccount)]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = depositor_token_account.mint == asset_ledger.mint,
        constraint = depositor_token_account.owner == depositor.key()
    )]
    pub depositor_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
#[instruction(fingerprint: [u8; 32])]
pub struct Payout<'info> {
    #[account(seeds = [Config::SEED], bump = config.bump)]
    pub config: Account<'info, Config>,

    #[account(mut, seeds = [PoolState::SEED], bump = pool_state.bump)]
    pub pool_state: Account<'info, PoolState>,

    #[account(mut)]
    pub relayer: Signer<'info>,

    #[account(
        mut,
        seeds = [AssetLedger::SEED, asset_ledger.mint.as_ref()],
        bump = asset_ledger.bump
    )]
    pub asset_ledger: Account<'info, AssetLedger>,

    #[account(mut, constraint = vault.key() == asset_ledger.vault @ PoolError::InvalidVaultAccount)]
    pub vault: Account<'info, TokenAccount>,

    #[account(mut, constraint = receiver_token_account.mint == asset_ledger.mint)]
    pub receiver_token_account: Account<'info, TokenAccount>,

    /// PDA: ["processed", fingerprint]. Created on first sight of a transfer.
    #[account(
        init_if_needed,
        payer = relayer,
        space = 8 + ProcessedTransfer::LEN,
        seeds = [ProcessedTransfer::SEED, fingerprint.as_ref()],
        bump
    )]
    pub processed_transfer: Account<'info, ProcessedTransfer>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct WithdrawGasFee<'info> {
    #[account(seeds = [Config::SEED], bump = config.bump)]
    pub config: Account<'info, Config>,

    #[account(mut, seeds = [PoolState::SEED], bump = pool_state.bump)]
    pub pool_state: Account<'info, PoolState>,

    pub relayer: Signer<'info>,

    #[account(
        mut,
        seeds = [AssetLedger::SEED, asset_ledger.mint.as_ref()],
        bump = asset_ledger.bump
    )]
    pub asset_ledger: Account<'info, AssetLedger>,

    #[account(mut, constraint = vault.key() == asset_ledger.vault @ PoolError::InvalidVaultAccount)]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = relayer_token_account.mint == asset_ledger.mint,
        constraint = relayer_token_account.owner == relayer.key()
    )]
    pub relayer_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}
