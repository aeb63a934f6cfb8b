//! Immutable table of purchase rates.
//!
//! Purchasers do not carry their own price; each one points into this table
//! by index. The table is fixed at construction and every entry is strictly
//! positive.

use openoffer_types::{Amount, AssetDecimals, OfferError, Rate, Result};
use rust_decimal::Decimal;

/// Ordered, non-empty sequence of positive rates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTable {
    rates: Vec<Rate>,
}

impl RateTable {
    /// Build a table, rejecting an empty list and any non-positive rate.
    ///
    /// # Errors
    /// `EmptyRateTable` or `NonPositiveRate`.
    pub fn new(rates: Vec<Rate>) -> Result<Self> {
        if rates.is_empty() {
            return Err(OfferError::EmptyRateTable);
        }
        if let Some((index, rate)) = rates.iter().enumerate().find(|(_, r)| !r.is_positive()) {
            return Err(OfferError::NonPositiveRate {
                index,
                rate: rate.price(),
            });
        }
        Ok(Self { rates })
    }

    /// Rate at `index`.
    ///
    /// # Errors
    /// `RateIndexOutOfRange` if `index >= len()`.
    pub fn get(&self, index: usize) -> Result<Rate> {
        self.rates
            .get(index)
            .copied()
            .ok_or(OfferError::RateIndexOutOfRange {
                index,
                len: self.rates.len(),
            })
    }

    /// Payment-asset cost of `amount` sale-asset units at rate `index`.
    ///
    /// # Errors
    /// `RateIndexOutOfRange` or `ArithmeticOverflow`.
    pub fn convert(&self, amount: Amount, index: usize, decimals: AssetDecimals) -> Result<Amount> {
        self.get(index)?.cost_of(amount, decimals)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Always `false` for a constructed table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Prices in table order.
    pub fn prices(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.rates.iter().map(Rate::price)
    }
}
