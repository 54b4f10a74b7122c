//! Outbound payouts: a relayer delivers a cross-chain transfer from the
//! reserve, net of the liquidity fee and its own gas reimbursement.
//!
//! Ordering within one payout:
//!
//! 1. relayer, pause, support, cap and receiver checks
//! 2. replay check on the transfer fingerprint
//! 3. fee rate from the fee curve, split into LP fee and incentive surplus
//! 4. gas reimbursement from execution cost, asset overhead and base gas
//! 5. delivered amount and reserve sufficiency
//! 6. LP fee credited, fingerprint recorded, then the asset transfer
//! 7. incentive pool and gas ledger updated from totals computed up front;
//!    signal published
//!
//! Everything that can fail runs before funds move. A failed LP credit
//! leaves no trace. If the transfer fails the LP credit is reversed and the
//! fingerprint stays consumed; every other ledger is left as it was.

use anchor_lang::prelude::*;

use crate::book::PoolBook;
use crate::collaborators::Env;
use crate::errors::PoolError;
use crate::events::{PayoutCompleted, PoolEvent};
use crate::fee_curve::{self, FeeSplit};
use crate::gas_ledger;
use crate::replay::{Fingerprint, ReplayRegistry};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayoutRequest {
    pub asset: Pubkey,
    pub amount: u64,
    pub receiver: Pubkey,
    pub deposit_proof: Vec<u8>,
    pub from_chain_id: u64,
    /// Execution cost the relayer paid, in cost units.
    pub execution_cost_units: u64,
    /// Price of one cost unit, in units of `asset`.
    pub unit_gas_price: u64,
}

impl PayoutRequest {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_transfer(&self.asset, self.amount, &self.receiver, &self.deposit_proof)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayoutReceipt {
    pub fingerprint: Fingerprint,
    pub fee: FeeSplit,
    pub gas_fee: u64,
    pub amount_delivered: u64,
}

impl PoolBook {
    pub fn payout(
        &mut self,
        env: &mut Env<'_>,
        replay: &mut dyn ReplayRegistry,
        relayer: &Pubkey,
        request: PayoutRequest,
    ) -> Result<PayoutReceipt> {
        self.guarded(|book| book.settle_payout(env, replay, relayer, request))
    }

    fn settle_payout(
        &mut self,
        env: &mut Env<'_>,
        replay: &mut dyn ReplayRegistry,
        relayer: &Pubkey,
        request: PayoutRequest,
    ) -> Result<PayoutReceipt> {
        require!(
            env.authority.is_authorized_relayer(relayer),
            PoolError::UnauthorizedRelayer
        );
        require!(!env.authority.is_paused(), PoolError::Paused);
        let config = *self.registry.supported(&request.asset)?;
        config.check_cap(request.amount)?;
        require!(request.receiver != Pubkey::default(), PoolError::ZeroReceiver);

        let fingerprint = request.fingerprint();
        require!(!replay.is_processed(&fingerprint), PoolError::AlreadyProcessed);

        let balance = env.vault.balance_of(&request.asset)?;
        let liquidity = self.free_liquidity_at(&request.asset, balance)?;
        let fee_bps = fee_curve::transfer_fee_bps(&config, request.amount, liquidity)?;
        let fee = fee_curve::split_fee(&config, request.amount, fee_bps)?;

        let gas_fee = gas_ledger::reimbursement(
            request.execution_cost_units,
            config.transfer_overhead,
            self.base_gas,
            request.unit_gas_price,
        )?;
        let deductions = fee.total.checked_add(gas_fee).ok_or(PoolError::MathOverflow)?;
        let amount_delivered = request
            .amount
            .checked_sub(deductions)
            .ok_or(PoolError::FeeExceedsAmount)?;
        require!(balance >= amount_delivered, PoolError::InsufficientReserve);

        let incentive_pool = self
            .incentive_pool(&request.asset)
            .checked_add(fee.incentive)
            .ok_or(PoolError::MathOverflow)?;
        let gas_credit = self
            .gas_fees
            .prepare_credit(&request.asset, relayer, gas_fee)?;

        env.lp_ledger.credit_lp_fee(&request.asset, fee.lp_fee)?;
        let delivered = replay.mark_processed(fingerprint).and_then(|()| {
            env.vault
                .transfer_out(&request.asset, &request.receiver, amount_delivered)
        });
        if let Err(err) = delivered {
            env.lp_ledger.debit_lp_fee(&request.asset, fee.lp_fee)?;
            return Err(err);
        }

        self.incentive_pool.insert(request.asset, incentive_pool);
        self.gas_fees.apply(gas_credit);

        msg!(
            "payout {} of {} from chain {}: fee {} gas {}",
            amount_delivered,
            request.asset,
            request.from_chain_id,
            fee.total,
            gas_fee
        );
        env.events.publish(PoolEvent::PayoutCompleted(PayoutCompleted {
            asset: request.asset,
            amount: request.amount,
            amount_delivered,
            receiver: request.receiver,
            deposit_proof: request.deposit_proof,
            from_chain_id: request.from_chain_id,
            lp_fee: fee.lp_fee,
            transfer_fee: fee.total,
            gas_fee,
        }));

        Ok(PayoutReceipt {
            fingerprint,
            fee,
            gas_fee,
            amount_delivered,
        })
    }
}
