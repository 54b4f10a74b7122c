//! Inbound deposits: lock funds on this chain for delivery elsewhere.

use anchor_lang::prelude::*;

use crate::book::PoolBook;
use crate::collaborators::{Env, Permit, PermitVerifier};
use crate::errors::PoolError;
use crate::events::{DepositRecorded, PoolEvent, RewardApplied};
use crate::incentive;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositRequest {
    pub asset: Pubkey,
    pub amount: u64,
    /// Recipient on the destination chain.
    pub receiver: [u8; 32],
    pub to_chain_id: u64,
    pub tag: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositReceipt {
    /// Amount to deliver on the destination chain (`amount + reward`).
    pub recorded_amount: u64,
    pub reward: u64,
}

impl PoolBook {
    /// Pull `amount` from `depositor` into the reserve and record the
    /// transfer intent. A deposit into a reserve below its target earns a
    /// share of the incentive pool, added to the delivered amount.
    pub fn deposit(
        &mut self,
        env: &mut Env<'_>,
        depositor: &Pubkey,
        request: DepositRequest,
    ) -> Result<DepositReceipt> {
        self.guarded(|book| book.record_deposit(env, depositor, request))
    }

    /// Same as [`PoolBook::deposit`], gated on a signed permit granting the
    /// pool transfer rights over the depositor's funds.
    pub fn deposit_with_permit(
        &mut self,
        env: &mut Env<'_>,
        verifier: &dyn PermitVerifier,
        depositor: &Pubkey,
        permit: &Permit,
        request: DepositRequest,
    ) -> Result<DepositReceipt> {
        self.guarded(|book| {
            verifier.verify(depositor, &request.asset, request.amount, permit)?;
            book.record_deposit(env, depositor, request)
        })
    }

    fn record_deposit(
        &mut self,
        env: &mut Env<'_>,
        depositor: &Pubkey,
        request: DepositRequest,
    ) -> Result<DepositReceipt> {
        require!(!env.authority.is_paused(), PoolError::Paused);
        let config = *self.registry.supported(&request.asset)?;
        require!(request.amount != 0, PoolError::ZeroAmount);
        config.check_cap(request.amount)?;
        require!(request.receiver != [0u8; 32], PoolError::ZeroReceiver);

        // Priced against the reserve before the deposit lands.
        let pool_balance = self.incentive_pool(&request.asset);
        let liquidity = self.current_free_liquidity(&request.asset, &*env.vault)?;
        let reward = incentive::reward_amount(&config, request.amount, liquidity, pool_balance)?;
        let recorded_amount = request
            .amount
            .checked_add(reward)
            .ok_or(PoolError::MathOverflow)?;

        env.vault
            .transfer_in(&request.asset, depositor, request.amount)?;

        if reward > 0 {
            let remaining = pool_balance
                .checked_sub(reward)
                .ok_or(PoolError::MathOverflow)?;
            self.incentive_pool.insert(request.asset, remaining);
            env.events.publish(PoolEvent::RewardApplied(RewardApplied {
                asset: request.asset,
                depositor: *depositor,
                reward,
                incentive_pool_remaining: remaining,
            }));
        }

        msg!(
            "deposit {} of {} to chain {} (reward {})",
            request.amount,
            request.asset,
            request.to_chain_id,
            reward
        );
        env.events.publish(PoolEvent::DepositRecorded(DepositRecorded {
            depositor: *depositor,
            asset: request.asset,
            receiver: request.receiver,
            to_chain_id: request.to_chain_id,
            amount: recorded_amount,
            reward,
            tag: request.tag,
        }));

        Ok(DepositReceipt {
            recorded_amount,
            reward,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{pool_err, Harness, StubPermitVerifier};

    /// provided 1000, free liquidity 800, incentive pool 50 -> deficit 200.
    fn depleted() -> Harness {
        let mut h = Harness::new();
        h.set_provided_liquidity(1_000);
        h.seed_reserve(850);
        h.book.incentive_pool.insert(h.asset, 50);
        h
    }

    #[test]
    fn partial_refill_pays_proportional_reward() {
        let mut h = depleted();
        let depositor = h.funded_depositor(1_000);

        let receipt = h.deposit(&depositor, 50).unwrap();
        assert_eq!(
            receipt,
            DepositReceipt {
                recorded_amount: 62,
                reward: 12
            }
        );
        assert_eq!(h.book.incentive_pool(&h.asset), 38);
        assert_eq!(h.vault.reserve(&h.asset), 900);
        assert_eq!(h.vault.holder(&h.asset, &depositor), 950);
    }

    #[test]
    fn closing_the_deficit_drains_the_pool() {
        let mut h = depleted();
        let depositor = h.funded_depositor(1_000);

        let receipt = h.deposit(&depositor, 300).unwrap();
        assert_eq!(receipt.reward, 50);
        assert_eq!(receipt.recorded_amount, 350);
        assert_eq!(h.book.incentive_pool(&h.asset), 0);
    }

    #[test]
    fn deposit_emits_reward_and_intent() {
        let mut h = depleted();
        let depositor = h.funded_depositor(1_000);
        h.deposit(&depositor, 50).unwrap();

        assert_eq!(
            h.events.events,
            vec![
                PoolEvent::RewardApplied(RewardApplied {
                    asset: h.asset,
                    depositor,
                    reward: 12,
                    incentive_pool_remaining: 38,
                }),
                PoolEvent::DepositRecorded(DepositRecorded {
                    depositor,
                    asset: h.asset,
                    receiver: Harness::REMOTE_RECEIVER,
                    to_chain_id: Harness::REMOTE_CHAIN,
                    amount: 62,
                    reward: 12,
                    tag: "test".to_string(),
                }),
            ]
        );
    }

    #[test]
    fn balanced_reserve_pays_no_reward() {
        let mut h = Harness::new();
        h.set_provided_liquidity(1_000);
        h.seed_reserve(1_050);
        h.book.incentive_pool.insert(h.asset, 50);
        let depositor = h.funded_depositor(100);

        let receipt = h.deposit(&depositor, 100).unwrap();
        assert_eq!(receipt.reward, 0);
        assert_eq!(receipt.recorded_amount, 100);
        assert_eq!(h.book.incentive_pool(&h.asset), 50);
        assert_eq!(h.events.events.len(), 1);
    }

    #[test]
    fn validation_failures_leave_state_untouched() {
        let mut h = depleted();
        let depositor = h.funded_depositor(100_000);
        let before = h.book.clone();

        let mut request = h.deposit_request(0);
        assert_eq!(
            h.deposit_with(&depositor, request.clone()).unwrap_err(),
            pool_err(PoolError::ZeroAmount)
        );

        request.amount = 20_000;
        assert_eq!(
            h.deposit_with(&depositor, request.clone()).unwrap_err(),
            pool_err(PoolError::AmountOutOfCapRange)
        );

        request.amount = 50;
        request.receiver = [0; 32];
        assert_eq!(
            h.deposit_with(&depositor, request.clone()).unwrap_err(),
            pool_err(PoolError::ZeroReceiver)
        );

        request.receiver = Harness::REMOTE_RECEIVER;
        request.asset = Pubkey::new_unique();
        assert_eq!(
            h.deposit_with(&depositor, request).unwrap_err(),
            pool_err(PoolError::AssetNotSupported)
        );

        assert_eq!(h.book, before);
        assert!(h.events.events.is_empty());
    }

    #[test]
    fn failed_transfer_keeps_incentive_pool() {
        let mut h = depleted();
        // Depositor holds nothing, so the pull fails.
        let depositor = Pubkey::new_unique();

        assert_eq!(
            h.deposit(&depositor, 50).unwrap_err(),
            pool_err(PoolError::TransferFailed)
        );
        assert_eq!(h.book.incentive_pool(&h.asset), 50);
        assert_eq!(h.vault.reserve(&h.asset), 850);
        assert!(!h.book.guard.is_entered());
    }

    #[test]
    fn paused_pool_refuses_deposits() {
        let mut h = depleted();
        let depositor = h.funded_depositor(1_000);
        h.authority.paused = true;

        assert_eq!(
            h.deposit(&depositor, 50).unwrap_err(),
            pool_err(PoolError::Paused)
        );
    }

    #[test]
    fn permit_gates_deposit() {
        let mut h = depleted();
        let depositor = h.funded_depositor(1_000);
        let request = h.deposit_request(50);
        let granted = Permit::Value {
            value: 50,
            deadline: 100,
            signature: vec![1; 64],
        };
        let denied = Permit::Nonce {
            nonce: 0,
            expiry: 100,
            allowed: false,
            signature: vec![1; 64],
        };

        assert_eq!(
            h.deposit_with_permit(&StubPermitVerifier, &depositor, &denied, request.clone())
                .unwrap_err(),
            pool_err(PoolError::PermitRejected)
        );
        assert_eq!(h.book.incentive_pool(&h.asset), 50);

        let receipt = h
            .deposit_with_permit(&StubPermitVerifier, &depositor, &granted, request)
            .unwrap();
        assert_eq!(receipt.reward, 12);
    }
}
