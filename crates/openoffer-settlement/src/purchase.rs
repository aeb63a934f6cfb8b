//! Purchase settlement.
//!
//! One purchaser's purchase, in order:
//! 1. Read the caller's allocation (zero means no allocation)
//! 2. Price it at the caller's rate
//! 3. Clear the allocation before any value moves
//! 4. Pull the payment from the caller into custody, forward it to the treasury
//! 5. Hand the sale asset to the vesting vault for the beneficiary
//!
//! Any failure leaves partial effects behind; the engine's checkpoint
//! rollback is what makes the whole sequence all-or-nothing.

use std::time::Duration;

use openoffer_ledger::{AssetLedger, VestingDeposit, VestingVault};
use openoffer_types::{AccountId, Amount, CallContext, OfferError, Rate, Result, Timestamp};
use serde::{Deserialize, Serialize};

use crate::allocation_ledger::AllocationLedger;
use crate::rate_table::RateTable;
use crate::terms::OfferTerms;

/// Summary of one committed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub purchaser: AccountId,
    pub beneficiary: AccountId,
    /// Sale asset handed to vesting.
    pub sale_amount: Amount,
    /// Payment asset collected and forwarded to the treasury.
    pub payment_cost: Amount,
    pub rate_index: usize,
    pub rate: Rate,
    pub vesting_duration: Duration,
    pub settled_at: Timestamp,
}

/// Borrowed view of everything a purchase touches.
pub struct PurchaseSettlement<'a, L, V> {
    pub terms: &'a OfferTerms,
    pub rates: &'a RateTable,
    pub allocations: &'a mut AllocationLedger,
    pub ledger: &'a mut L,
    pub vesting: &'a mut V,
}

impl<L: AssetLedger, V: VestingVault> PurchaseSettlement<'_, L, V> {
    /// Settle `ctx.caller`'s whole allocation for `beneficiary`.
    ///
    /// # Errors
    /// `NullIdentity` for a null beneficiary, `NoAllocation`,
    /// `PaymentTransferFailed`, `VestingDepositFailed`, or arithmetic errors
    /// from pricing.
    pub fn execute(self, ctx: CallContext, beneficiary: AccountId) -> Result<PurchaseReceipt> {
        let purchaser = ctx.caller;
        if beneficiary.is_null() {
            return Err(OfferError::NullIdentity {
                role: "beneficiary",
            });
        }

        let (sale_amount, rate_index) = self.allocations.allocation_of(purchaser);
        if sale_amount == 0 {
            return Err(OfferError::NoAllocation(purchaser));
        }
        let rate = self.rates.get(rate_index)?;
        let payment_cost = rate.cost_of(sale_amount, self.terms.decimals)?;
        tracing::debug!(
            purchaser = %purchaser,
            sale_amount = %sale_amount,
            rate = %rate,
            payment_cost = %payment_cost,
            "Purchase priced"
        );

        // Record first: the allocation is gone before any collaborator runs.
        self.allocations.clear(purchaser)?;

        collect_payment(self.ledger, self.terms, purchaser, payment_cost).map_err(|source| {
            OfferError::PaymentTransferFailed {
                purchaser,
                cost: payment_cost,
                source: Box::new(source),
            }
        })?;

        self.vesting
            .deposit(
                self.ledger,
                VestingDeposit {
                    depositor: self.terms.custody,
                    asset: self.terms.sale_asset,
                    beneficiary,
                    amount: sale_amount,
                    duration: self.terms.vesting_duration,
                    start: ctx.now,
                },
            )
            .map_err(|source| OfferError::VestingDepositFailed {
                beneficiary,
                source: Box::new(source),
            })?;

        Ok(PurchaseReceipt {
            purchaser,
            beneficiary,
            sale_amount,
            payment_cost,
            rate_index,
            rate,
            vesting_duration: self.terms.vesting_duration,
            settled_at: ctx.now,
        })
    }
}

/// Pull `cost` from `purchaser` into custody, then forward it to the treasury.
fn collect_payment<L: AssetLedger>(
    ledger: &mut L,
    terms: &OfferTerms,
    purchaser: AccountId,
    cost: Amount,
) -> Result<()> {
    ledger.transfer_from(
        terms.payment_asset,
        terms.custody,
        purchaser,
        terms.custody,
        cost,
    )?;
    ledger.transfer(terms.payment_asset, terms.custody, terms.treasury, cost)
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use openoffer_ledger::{InMemoryLedger, InMemoryVesting};
    use openoffer_types::{AssetDecimals, AssetId};
    use rust_decimal::Decimal;

    use super::*;

    const E18: u128 = 1_000_000_000_000_000_000;

    struct Fixture {
        terms: OfferTerms,
        rates: RateTable,
        allocations: AllocationLedger,
        ledger: InMemoryLedger,
        vesting: InMemoryVesting,
        buyer: AccountId,
    }

    impl Fixture {
        fn new() -> Self {
            let buyer = AccountId::random();
            let terms = OfferTerms {
                payment_asset: AssetId::from_symbol("USDC"),
                sale_asset: AssetId::from_symbol("SALE"),
                decimals: AssetDecimals::default(),
                custody: AccountId::from_label("custody"),
                treasury: AccountId::from_label("treasury"),
                vesting: AccountId::from_label("vesting"),
                vesting_duration: Duration::from_secs(100),
                offer_expiration_delay: Duration::from_secs(1000),
                allocations_total: 10 * E18,
                total_cost: 15_000_000,
            };
            let rates = RateTable::new(vec![Rate::new(Decimal::new(15, 1))]).unwrap();
            let allocations = AllocationLedger::new(&[buyer], &[10 * E18], &[0], 10 * E18, 1).unwrap();

            let mut ledger = InMemoryLedger::new();
            ledger
                .mint(terms.sale_asset, terms.custody, 10 * E18)
                .unwrap();
            ledger
                .approve(terms.sale_asset, terms.custody, terms.vesting, 10 * E18)
                .unwrap();
            ledger
                .mint(terms.payment_asset, buyer, 15_000_000)
                .unwrap();

            Self {
                vesting: InMemoryVesting::new(terms.vesting),
                terms,
                rates,
                allocations,
                ledger,
                buyer,
            }
        }

        fn approve_payment(&mut self, amount: Amount) {
            self.ledger
                .approve(self.terms.payment_asset, self.buyer, self.terms.custody, amount)
                .unwrap();
        }

        fn execute(&mut self, caller: AccountId, beneficiary: AccountId) -> Result<PurchaseReceipt> {
            PurchaseSettlement {
                terms: &self.terms,
                rates: &self.rates,
                allocations: &mut self.allocations,
                ledger: &mut self.ledger,
                vesting: &mut self.vesting,
            }
            .execute(
                CallContext::new(caller, DateTime::from_timestamp(50, 0).unwrap()),
                beneficiary,
            )
        }
    }

    #[test]
    fn settles_payment_and_vesting() {
        let mut f = Fixture::new();
        f.approve_payment(15_000_000);
        let beneficiary = AccountId::random();
        let receipt = f.execute(f.buyer, beneficiary).unwrap();

        assert_eq!(receipt.sale_amount, 10 * E18);
        assert_eq!(receipt.payment_cost, 15_000_000);
        assert_eq!(receipt.beneficiary, beneficiary);
        assert_eq!(
            f.ledger.balance_of(f.terms.payment_asset, f.terms.treasury),
            15_000_000
        );
        assert_eq!(f.ledger.balance_of(f.terms.payment_asset, f.terms.custody), 0);
        assert_eq!(f.ledger.balance_of(f.terms.sale_asset, f.terms.custody), 0);
        assert_eq!(
            f.vesting.total_deposited(f.terms.sale_asset, beneficiary),
            10 * E18
        );
        assert_eq!(f.allocations.allocation_of(f.buyer), (0, 0));
    }

    #[test]
    fn unknown_caller_has_no_allocation() {
        let mut f = Fixture::new();
        let stranger = AccountId::random();
        let err = f.execute(stranger, stranger).unwrap_err();
        assert!(matches!(err, OfferError::NoAllocation(p) if p == stranger));
    }

    #[test]
    fn missing_approval_is_payment_failure() {
        let mut f = Fixture::new();
        let err = f.execute(f.buyer, f.buyer).unwrap_err();
        match err {
            OfferError::PaymentTransferFailed { cost, source, .. } => {
                assert_eq!(cost, 15_000_000);
                assert!(matches!(*source, OfferError::InsufficientAllowance { .. }));
            }
            other => panic!("expected PaymentTransferFailed, got {other:?}"),
        }
    }

    #[test]
    fn null_beneficiary_rejected() {
        let mut f = Fixture::new();
        f.approve_payment(15_000_000);
        let err = f.execute(f.buyer, AccountId::NULL).unwrap_err();
        assert!(matches!(
            err,
            OfferError::NullIdentity {
                role: "beneficiary"
            }
        ));
        assert_eq!(f.allocations.allocation_of(f.buyer).0, 10 * E18);
    }

    #[test]
    fn vesting_refusal_is_wrapped() {
        let mut f = Fixture::new();
        f.approve_payment(15_000_000);
        f.ledger
            .approve(f.terms.sale_asset, f.terms.custody, f.terms.vesting, 0)
            .unwrap();
        let err = f.execute(f.buyer, f.buyer).unwrap_err();
        assert!(matches!(err, OfferError::VestingDepositFailed { .. }));
    }
}
