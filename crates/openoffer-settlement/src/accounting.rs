//! Sale accounting and custody invariant checker.
//!
//! Invariants checked after every committed purchase:
//! ```text
//! sold + outstanding == allocations_total
//! held(sale_asset, custody) >= outstanding
//! ```
//!
//! A violation means value left custody without a matching allocation being
//! spent. The engine fails the operation and rolls it back.

use openoffer_types::{Amount, OfferError, Result};
use serde::{Deserialize, Serialize};

/// Running totals for one offer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleAccounting {
    /// Sale asset handed to vesting.
    sold: Amount,
    /// Payment asset forwarded to the treasury.
    revenue: Amount,
    /// Sale asset swept back to the treasury.
    recovered: Amount,
    purchases: u64,
}

impl SaleAccounting {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one purchase.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if a running total would exceed `u128`.
    pub fn record_purchase(&mut self, sale_amount: Amount, payment_cost: Amount) -> Result<()> {
        let sold = self
            .sold
            .checked_add(sale_amount)
            .ok_or_else(|| OfferError::overflow("sold total"))?;
        let revenue = self
            .revenue
            .checked_add(payment_cost)
            .ok_or_else(|| OfferError::overflow("revenue total"))?;
        self.sold = sold;
        self.revenue = revenue;
        self.purchases += 1;
        Ok(())
    }

    /// Record a recovery sweep.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the recovered total would exceed `u128`.
    pub fn record_recovery(&mut self, amount: Amount) -> Result<()> {
        self.recovered = self
            .recovered
            .checked_add(amount)
            .ok_or_else(|| OfferError::overflow("recovered total"))?;
        Ok(())
    }

    /// Verify both custody invariants.
    ///
    /// # Errors
    /// [`OfferError::CustodyInvariantViolation`] if either fails.
    pub fn verify(&self, allocations_total: Amount, outstanding: Amount, held: Amount) -> Result<()> {
        if self.sold.checked_add(outstanding) != Some(allocations_total) {
            return Err(OfferError::CustodyInvariantViolation {
                reason: format!(
                    "sold {} + outstanding {outstanding} != allocations total {allocations_total}",
                    self.sold
                ),
            });
        }
        if held < outstanding {
            return Err(OfferError::CustodyInvariantViolation {
                reason: format!("held {held} < outstanding allocations {outstanding}"),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn sold(&self) -> Amount {
        self.sold
    }

    #[must_use]
    pub fn revenue(&self) -> Amount {
        self.revenue
    }

    #[must_use]
    pub fn recovered(&self) -> Amount {
        self.recovered
    }

    #[must_use]
    pub fn purchases(&self) -> u64 {
        self.purchases
    }
}
