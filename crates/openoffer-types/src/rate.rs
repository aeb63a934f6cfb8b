//! Exchange rates and the sale → payment cost conversion.
//!
//! A [`Rate`] is the price of one *whole* sale-asset unit expressed in whole
//! payment-asset units, e.g. `0.92` USDC per token. It is stored as a
//! `rust_decimal::Decimal` so decimal prices are exact.
//!
//! ## Conversion
//!
//! For a price `m × 10^-s` and an amount in sale-asset smallest units:
//!
//! ```text
//! cost = floor(amount × m × 10^payment_decimals / 10^(s + sale_decimals))
//! ```
//!
//! The product `amount × m` is held in 256 bits and divided down before it is
//! narrowed back to `u128`, so only a cost that itself exceeds `u128` fails.
//! No floating point and no intermediate decimal rounding. Truncation is toward zero, so the payee
//! never receives a fractional-unit surplus.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{constants, Amount, AssetDecimals, OfferError, Result};

/// Payment-asset price of one whole sale-asset unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(Decimal);

impl Rate {
    /// Wrap a price. Positivity is validated by the rate table, not here.
    #[must_use]
    pub fn new(price: Decimal) -> Self {
        Self(price)
    }

    #[must_use]
    pub fn price(&self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Payment cost, in payment-asset smallest units, of `amount` sale-asset
    /// smallest units at this rate.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the final cost does not fit `u128` or the rate
    /// is negative.
    pub fn cost_of(&self, amount: Amount, decimals: AssetDecimals) -> Result<Amount> {
        let price = self.0.normalize();
        let mantissa = u128::try_from(price.mantissa())
            .map_err(|_| OfferError::overflow(format!("negative rate {price}")))?;

        let product = Wide::mul(amount, mantissa);
        let up = decimals.payment;
        let down = price.scale() + decimals.sale;

        let cost = if down >= up {
            let mut shift = down - up;
            let mut value = product;
            while shift > 0 {
                let step = shift.min(constants::MAX_DECIMAL_EXPONENT);
                value = value.div_floor(10u128.pow(step));
                shift -= step;
            }
            value.narrow()
        } else {
            let factor = 10u128
                .checked_pow(up - down)
                .ok_or_else(|| OfferError::overflow("payment scale factor"))?;
            product.narrow().and_then(|p| p.checked_mul(factor))
        };
        cost.ok_or_else(|| OfferError::overflow(format!("{amount} × {price}")))
    }
}

/// Unsigned 256-bit intermediate for `amount × mantissa`, held as two
/// 128-bit halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Wide {
    hi: u128,
    lo: u128,
}

impl Wide {
    const LOW_64: u128 = (1 << 64) - 1;

    fn mul(a: u128, b: u128) -> Self {
        let (a_hi, a_lo) = (a >> 64, a & Self::LOW_64);
        let (b_hi, b_lo) = (b >> 64, b & Self::LOW_64);

        let lo_lo = a_lo * b_lo;
        let lo_hi = a_lo * b_hi;
        let hi_lo = a_hi * b_lo;
        let hi_hi = a_hi * b_hi;

        // Each term is below 2^64, so the sum cannot overflow.
        let middle = (lo_lo >> 64) + (lo_hi & Self::LOW_64) + (hi_lo & Self::LOW_64);
        Self {
            hi: hi_hi + (lo_hi >> 64) + (hi_lo >> 64) + (middle >> 64),
            lo: (middle << 64) | (lo_lo & Self::LOW_64),
        }
    }

    /// `floor(self / divisor)` by binary long division. `divisor` is non-zero.
    fn div_floor(self, divisor: u128) -> Self {
        let mut quotient = Self { hi: 0, lo: 0 };
        let mut remainder: u128 = 0;
        for bit in (0..256u32).rev() {
            let next = if bit >= 128 {
                (self.hi >> (bit - 128)) & 1
            } else {
                (self.lo >> bit) & 1
            };
            // The shifted remainder may need 129 bits; `carry` is the top one.
            let carry = remainder >> 127;
            remainder = (remainder << 1) | next;
            if carry == 1 || remainder >= divisor {
                remainder = remainder.wrapping_sub(divisor);
                if bit >= 128 {
                    quotient.hi |= 1 << (bit - 128);
                } else {
                    quotient.lo |= 1 << bit;
                }
            }
        }
        quotient
    }

    fn narrow(self) -> Option<u128> {
        (self.hi == 0).then_some(self.lo)
    }
}

impl From<Decimal> for Rate {
    fn from(price: Decimal) -> Self {
        Self(price)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
