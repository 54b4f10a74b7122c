//! In-memory collaborators and a pool harness for unit tests.

use std::collections::{BTreeMap, BTreeSet};

use anchor_lang::prelude::*;

use crate::book::PoolBook;
use crate::collaborators::{AssetVault, Authority, Env, EventSink, LpLedger, Permit, PermitVerifier};
use crate::deposit::{DepositReceipt, DepositRequest};
use crate::errors::PoolError;
use crate::events::PoolEvent;
use crate::payout::{PayoutReceipt, PayoutRequest};
use crate::registry::AssetParams;
use crate::replay::ProcessedTransferSet;

pub fn pool_err(err: PoolError) -> anchor_lang::error::Error {
    err.into()
}

pub struct MockAuthority {
    pub owner: Pubkey,
    pub relayers: BTreeSet<Pubkey>,
    pub paused: bool,
}

impl Authority for MockAuthority {
    fn is_owner(&self, who: &Pubkey) -> bool {
        self.owner == *who
    }

    fn is_authorized_relayer(&self, who: &Pubkey) -> bool {
        self.relayers.contains(who)
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}

/// Reserve balances per asset plus outside holders' balances.
#[derive(Default)]
pub struct MemoryVault {
    reserves: BTreeMap<Pubkey, u64>,
    holders: BTreeMap<(Pubkey, Pubkey), u64>,
    /// Makes every transfer fail, as a reverting token would.
    pub fail_transfers: bool,
}

impl MemoryVault {
    pub fn reserve(&self, asset: &Pubkey) -> u64 {
        self.reserves.get(asset).copied().unwrap_or(0)
    }

    pub fn holder(&self, asset: &Pubkey, who: &Pubkey) -> u64 {
        self.holders.get(&(*asset, *who)).copied().unwrap_or(0)
    }

    pub fn fund_holder(&mut self, asset: &Pubkey, who: &Pubkey, amount: u64) {
        *self.holders.entry((*asset, *who)).or_default() += amount;
    }
}

impl AssetVault for MemoryVault {
    fn transfer_in(&mut self, asset: &Pubkey, from: &Pubkey, amount: u64) -> Result<()> {
        require!(!self.fail_transfers, PoolError::TransferFailed);
        let held = self.holder(asset, from);
        require!(held >= amount, PoolError::TransferFailed);
        self.holders.insert((*asset, *from), held - amount);
        *self.reserves.entry(*asset).or_default() += amount;
        Ok(())
    }

    fn transfer_out(&mut self, asset: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        require!(!self.fail_transfers, PoolError::TransferFailed);
        let reserve = self.reserve(asset);
        require!(reserve >= amount, PoolError::TransferFailed);
        self.reserves.insert(*asset, reserve - amount);
        self.fund_holder(asset, to, amount);
        Ok(())
    }

    fn balance_of(&self, asset: &Pubkey) -> Result<u64> {
        Ok(self.reserve(asset))
    }
}

#[derive(Default)]
pub struct MemoryLpLedger {
    fees: BTreeMap<Pubkey, u64>,
    /// position -> (asset, owner)
    positions: BTreeMap<Pubkey, (Pubkey, Pubkey)>,
    /// Makes every fee credit fail with `MathOverflow`.
    pub fail_credits: bool,
}

impl MemoryLpLedger {
    pub fn fees(&self, asset: &Pubkey) -> u64 {
        self.fees.get(asset).copied().unwrap_or(0)
    }
}

impl LpLedger for MemoryLpLedger {
    fn credit_lp_fee(&mut self, asset: &Pubkey, amount: u64) -> Result<()> {
        require!(!self.fail_credits, PoolError::MathOverflow);
        *self.fees.entry(*asset).or_default() += amount;
        Ok(())
    }

    fn debit_lp_fee(&mut self, asset: &Pubkey, amount: u64) -> Result<()> {
        let fees = self.fees(asset);
        require!(fees >= amount, PoolError::MathOverflow);
        self.fees.insert(*asset, fees - amount);
        Ok(())
    }

    fn resolve_asset_for_position(&self, position: &Pubkey) -> Option<Pubkey> {
        self.positions.get(position).map(|(asset, _)| *asset)
    }

    fn is_position_owner(&self, position: &Pubkey, who: &Pubkey) -> bool {
        self.positions
            .get(position)
            .map_or(false, |(_, owner)| owner == who)
    }
}

#[derive(Default)]
pub struct EventLog {
    pub events: Vec<PoolEvent>,
}

impl EventSink for EventLog {
    fn publish(&mut self, event: PoolEvent) {
        self.events.push(event);
    }
}

/// Accepts value permits covering the amount and nonce permits marked
/// allowed; anything unsigned is rejected.
pub struct StubPermitVerifier;

impl PermitVerifier for StubPermitVerifier {
    fn verify(&self, _owner: &Pubkey, _asset: &Pubkey, amount: u64, permit: &Permit) -> Result<()> {
        let ok = match permit {
            Permit::Nonce {
                allowed, signature, ..
            } => *allowed && !signature.is_empty(),
            Permit::Value {
                value, signature, ..
            } => *value >= amount && !signature.is_empty(),
        };
        require!(ok, PoolError::PermitRejected);
        Ok(())
    }
}

/// A pool with one supported asset, one owner and one authorized relayer.
pub struct Harness {
    pub book: PoolBook,
    pub authority: MockAuthority,
    pub vault: MemoryVault,
    pub lp: MemoryLpLedger,
    pub events: EventLog,
    pub replay: ProcessedTransferSet,
    pub asset: Pubkey,
    pub relayer: Pubkey,
}

impl Harness {
    pub const REMOTE_RECEIVER: [u8; 32] = [7; 32];
    pub const REMOTE_CHAIN: u64 = 137;

    pub fn asset_params() -> AssetParams {
        AssetParams {
            min_cap: 1,
            max_cap: 10_000,
            transfer_overhead: 0,
            equilibrium_fee_bps: 10,
            max_fee_bps: 200,
        }
    }

    pub fn payout_params() -> AssetParams {
        AssetParams {
            min_cap: 1,
            max_cap: 1_000_000,
            transfer_overhead: 500,
            equilibrium_fee_bps: 100,
            max_fee_bps: 2_000,
        }
    }

    pub fn new() -> Self {
        Self::with_params(Self::asset_params(), 0)
    }

    pub fn with_params(params: AssetParams, base_gas: u64) -> Self {
        let asset = Pubkey::new_unique();
        let relayer = Pubkey::new_unique();
        let mut book = PoolBook::new(base_gas);
        book.registry.add(asset, params).unwrap();

        Self {
            book,
            authority: MockAuthority {
                owner: Pubkey::new_unique(),
                relayers: BTreeSet::from([relayer]),
                paused: false,
            },
            vault: MemoryVault::default(),
            lp: MemoryLpLedger::default(),
            events: EventLog::default(),
            replay: ProcessedTransferSet::default(),
            asset,
            relayer,
        }
    }

    pub fn set_provided_liquidity(&mut self, amount: u64) {
        self.book
            .registry
            .increase_provided_liquidity(&self.asset, amount)
            .unwrap();
    }

    /// Put `amount` straight into the reserve, bypassing any ledger.
    pub fn seed_reserve(&mut self, amount: u64) {
        self.vault.reserves.insert(self.asset, amount);
    }

    pub fn funded_depositor(&mut self, amount: u64) -> Pubkey {
        let depositor = Pubkey::new_unique();
        self.vault.fund_holder(&self.asset, &depositor, amount);
        depositor
    }

    pub fn open_position(&mut self, owner: Pubkey) -> Pubkey {
        let position = Pubkey::new_unique();
        self.lp.positions.insert(position, (self.asset, owner));
        position
    }

    pub fn deposit_request(&self, amount: u64) -> DepositRequest {
        DepositRequest {
            asset: self.asset,
            amount,
            receiver: Self::REMOTE_RECEIVER,
            to_chain_id: Self::REMOTE_CHAIN,
            tag: "test".to_string(),
        }
    }

    pub fn payout_request(&self, amount: u64, receiver: Pubkey, proof: &[u8]) -> PayoutRequest {
        PayoutRequest {
            asset: self.asset,
            amount,
            receiver,
            deposit_proof: proof.to_vec(),
            from_chain_id: Self::REMOTE_CHAIN,
            execution_cost_units: 1_000,
            unit_gas_price: 2,
        }
    }

    pub fn deposit(&mut self, depositor: &Pubkey, amount: u64) -> Result<DepositReceipt> {
        let request = self.deposit_request(amount);
        self.deposit_with(depositor, request)
    }

    pub fn deposit_with(&mut self, depositor: &Pubkey, request: DepositRequest) -> Result<DepositReceipt> {
        let mut env = Env {
            authority: &self.authority,
            vault: &mut self.vault,
            lp_ledger: &mut self.lp,
            events: &mut self.events,
        };
        self.book.deposit(&mut env, depositor, request)
    }

    pub fn deposit_with_permit(
        &mut self,
        verifier: &dyn PermitVerifier,
        depositor: &Pubkey,
        permit: &Permit,
        request: DepositRequest,
    ) -> Result<DepositReceipt> {
        let mut env = Env {
            authority: &self.authority,
            vault: &mut self.vault,
            lp_ledger: &mut self.lp,
            events: &mut self.events,
        };
        self.book
            .deposit_with_permit(&mut env, verifier, depositor, permit, request)
    }

    pub fn payout(&mut self, request: PayoutRequest) -> Result<PayoutReceipt> {
        let relayer = self.relayer;
        let mut env = Env {
            authority: &self.authority,
            vault: &mut self.vault,
            lp_ledger: &mut self.lp,
            events: &mut self.events,
        };
        self.book.payout(&mut env, &mut self.replay, &relayer, request)
    }

    pub fn withdraw_gas_fee(&mut self, relayer: &Pubkey) -> Result<u64> {
        let asset = self.asset;
        let mut env = Env {
            authority: &self.authority,
            vault: &mut self.vault,
            lp_ledger: &mut self.lp,
            events: &mut self.events,
        };
        self.book.withdraw_gas_fee(&mut env, relayer, &asset)
    }

    pub fn add_liquidity(&mut self, provider: &Pubkey, position: &Pubkey, amount: u64) -> Result<u64> {
        let mut env = Env {
            authority: &self.authority,
            vault: &mut self.vault,
            lp_ledger: &mut self.lp,
            events: &mut self.events,
        };
        self.book.add_liquidity(&mut env, provider, position, amount)
    }

    pub fn remove_liquidity(&mut self, provider: &Pubkey, position: &Pubkey, amount: u64) -> Result<u64> {
        let mut env = Env {
            authority: &self.authority,
            vault: &mut self.vault,
            lp_ledger: &mut self.lp,
            events: &mut self.events,
        };
        self.book.remove_liquidity(&mut env, provider, position, amount)
    }
}
