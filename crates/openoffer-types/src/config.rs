//! Construction parameters for an offer.
//!
//! [`OfferConfig`] is plain data: it can be built in code or loaded from
//! JSON. Semantic validation (positivity, uniqueness, sums) happens when the
//! settlement engine is constructed from it; the checks here are only the
//! ones that need no other component.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, AssetDecimals, AssetId, OfferError, Rate, Result};

/// Everything needed to construct one offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferConfig {
    /// Rate table, indexed by each purchaser's `rate_index`.
    pub rates: Vec<Rate>,
    /// Length of the vesting schedule created for each purchase.
    pub vesting_duration: Duration,
    /// How long the offer stays open after it starts.
    pub offer_expiration_delay: Duration,
    /// Allowlisted purchasers.
    pub purchasers: Vec<AccountId>,
    /// Sale-asset allocation for each purchaser, in smallest units.
    pub allocations: Vec<Amount>,
    /// Rate index for each purchaser.
    pub rate_indices: Vec<usize>,
    /// Declared sum of `allocations`; the amount required to start.
    pub allocations_total: Amount,
    pub payment_asset: AssetId,
    pub sale_asset: AssetId,
    /// Vesting collaborator's account in the asset ledger.
    pub vesting: AccountId,
    /// Receives payments and recovered inventory.
    pub treasury: AccountId,
    /// The engine's own custody account in the asset ledger.
    pub custody: AccountId,
    #[serde(default)]
    pub decimals: AssetDecimals,
}

impl OfferConfig {
    /// Parse a JSON document.
    ///
    /// # Errors
    /// `Serialization` on malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `Serialization` on malformed JSON.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Identity and duration checks that need nothing but this struct.
    ///
    /// # Errors
    /// `ZeroDuration` or `NullIdentity`.
    pub fn validate_parameters(&self) -> Result<()> {
        // Schedules vest per whole second.
        if self.vesting_duration.as_secs() == 0 {
            return Err(OfferError::ZeroDuration {
                field: "vesting_duration",
            });
        }
        if self.vesting_duration.subsec_nanos() != 0 {
            return Err(OfferError::InvalidConfig(format!(
                "vesting_duration must be whole seconds, got {:?}",
                self.vesting_duration
            )));
        }
        if self.offer_expiration_delay.is_zero() {
            return Err(OfferError::ZeroDuration {
                field: "offer_expiration_delay",
            });
        }
        if self.payment_asset.is_null() {
            return Err(OfferError::NullIdentity {
                role: "payment_asset",
            });
        }
        if self.sale_asset.is_null() {
            return Err(OfferError::NullIdentity { role: "sale_asset" });
        }
        if self.payment_asset == self.sale_asset {
            return Err(OfferError::InvalidConfig(
                "payment_asset and sale_asset must differ".to_string(),
            ));
        }
        if self.vesting.is_null() {
            return Err(OfferError::NullIdentity { role: "vesting" });
        }
        if self.treasury.is_null() {
            return Err(OfferError::NullIdentity { role: "treasury" });
        }
        if self.custody.is_null() {
            return Err(OfferError::NullIdentity { role: "custody" });
        }
        if self.decimals.sale_unit().is_none() || self.decimals.payment_unit().is_none() {
            return Err(OfferError::InvalidConfig(format!(
                "asset decimals out of range: {:?}",
                self.decimals
            )));
        }
        Ok(())
    }
}

/// Sample offer for tests: three purchasers, 110/120/130 whole tokens at
/// rates `[1.0, 1.5]` with indices `[0, 1, 0]`, vesting 100s, expiry 1000s.
/// **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl OfferConfig {
    pub fn sample() -> Self {
        use rust_decimal::Decimal;

        let whole = |n: u128| crate::units(n, crate::constants::DEFAULT_SALE_DECIMALS).unwrap();
        Self {
            rates: vec![Rate::new(Decimal::new(10, 1)), Rate::new(Decimal::new(15, 1))],
            vesting_duration: Duration::from_secs(100),
            offer_expiration_delay: Duration::from_secs(1000),
            purchasers: vec![
                AccountId::from_label("purchaser-1"),
                AccountId::from_label("purchaser-2"),
                AccountId::from_label("purchaser-3"),
            ],
            allocations: vec![whole(110), whole(120), whole(130)],
            rate_indices: vec![0, 1, 0],
            allocations_total: whole(360),
            payment_asset: AssetId::from_symbol("USDC"),
            sale_asset: AssetId::from_symbol("SALE"),
            vesting: AccountId::from_label("vesting"),
            treasury: AccountId::from_label("treasury"),
            custody: AccountId::from_label("custody"),
            decimals: AssetDecimals::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_passes_parameter_checks() {
        OfferConfig::sample().validate_parameters().unwrap();
    }

    #[test]
    fn zero_vesting_duration_rejected() {
        let mut cfg = OfferConfig::sample();
        cfg.vesting_duration = Duration::ZERO;
        let err = cfg.validate_parameters().unwrap_err();
        assert!(matches!(
            err,
            OfferError::ZeroDuration {
                field: "vesting_duration"
            }
        ));
    }

    #[test]
    fn sub_second_vesting_duration_rejected() {
        let mut cfg = OfferConfig::sample();
        cfg.vesting_duration = Duration::from_millis(500);
        assert!(matches!(
            cfg.validate_parameters().unwrap_err(),
            OfferError::ZeroDuration {
                field: "vesting_duration"
            }
        ));
    }

    #[test]
    fn fractional_vesting_duration_rejected() {
        let mut cfg = OfferConfig::sample();
        cfg.vesting_duration = Duration::from_millis(1_500);
        assert!(matches!(
            cfg.validate_parameters().unwrap_err(),
            OfferError::InvalidConfig(_)
        ));
    }

    #[test]
    fn zero_expiration_delay_rejected() {
        let mut cfg = OfferConfig::sample();
        cfg.offer_expiration_delay = Duration::ZERO;
        assert!(matches!(
            cfg.validate_parameters().unwrap_err(),
            OfferError::ZeroDuration {
                field: "offer_expiration_delay"
            }
        ));
    }

    #[test]
    fn null_identities_rejected() {
        let cases: [(fn(&mut OfferConfig), &str); 5] = [
            (|c| c.payment_asset = AssetId::NULL, "payment_asset"),
            (|c| c.sale_asset = AssetId::NULL, "sale_asset"),
            (|c| c.vesting = AccountId::NULL, "vesting"),
            (|c| c.treasury = AccountId::NULL, "treasury"),
            (|c| c.custody = AccountId::NULL, "custody"),
        ];
        for (mutate, expected) in cases {
            let mut cfg = OfferConfig::sample();
            mutate(&mut cfg);
            match cfg.validate_parameters().unwrap_err() {
                OfferError::NullIdentity { role } => assert_eq!(role, expected),
                other => panic!("expected NullIdentity for {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn same_asset_twice_rejected() {
        let mut cfg = OfferConfig::sample();
        cfg.payment_asset = cfg.sale_asset;
        assert!(matches!(
            cfg.validate_parameters().unwrap_err(),
            OfferError::InvalidConfig(_)
        ));
    }

    #[test]
    fn json_roundtrip() {
        let cfg = OfferConfig::sample();
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let back = OfferConfig::from_json_str(&json).unwrap();
        assert_eq!(back.rates, cfg.rates);
        assert_eq!(back.purchasers, cfg.purchasers);
        assert_eq!(back.allocations, cfg.allocations);
        assert_eq!(back.allocations_total, cfg.allocations_total);
        assert_eq!(back.vesting_duration, cfg.vesting_duration);
    }

    #[test]
    fn decimals_default_when_omitted() {
        // Allocations exceed u64, so stay on the string path (no `Value`).
        let json = serde_json::to_string(&OfferConfig::sample()).unwrap();
        let trimmed = json.replace(r#","decimals":{"sale":18,"payment":6}"#, "");
        assert_ne!(json, trimmed);
        let cfg = OfferConfig::from_json_str(&trimmed).unwrap();
        assert_eq!(cfg.decimals, AssetDecimals::default());
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = OfferConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, OfferError::Serialization(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = OfferConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, OfferError::Io(_)));
    }
}
