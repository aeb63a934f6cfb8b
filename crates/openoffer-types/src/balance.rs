//! Amount and decimal-scale types.
//!
//! Every ledger quantity is an integer count of the asset's smallest unit
//! (e.g. `1 USDC = 10^6` units, `1 SALE = 10^18` units).

use serde::{Deserialize, Serialize};

use crate::constants;

/// A quantity in an asset's smallest unit.
pub type Amount = u128;

/// Decimal places of the two assets taking part in the offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDecimals {
    /// Decimals of the asset being sold.
    pub sale: u32,
    /// Decimals of the asset used for payment.
    pub payment: u32,
}

impl AssetDecimals {
    /// Smallest units in one whole unit of the sale asset.
    #[must_use]
    pub fn sale_unit(&self) -> Option<Amount> {
        10u128.checked_pow(self.sale)
    }

    /// Smallest units in one whole unit of the payment asset.
    #[must_use]
    pub fn payment_unit(&self) -> Option<Amount> {
        10u128.checked_pow(self.payment)
    }
}

impl Default for AssetDecimals {
    fn default() -> Self {
        Self {
            sale: constants::DEFAULT_SALE_DECIMALS,
            payment: constants::DEFAULT_PAYMENT_DECIMALS,
        }
    }
}

/// Convert a whole-unit count into smallest units, e.g. `units(360, 18)`.
///
/// Returns `None` on overflow.
#[must_use]
pub fn units(whole: u128, decimals: u32) -> Option<Amount> {
    10u128.checked_pow(decimals)?.checked_mul(whole)
}
