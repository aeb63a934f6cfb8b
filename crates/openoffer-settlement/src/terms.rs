//! Fixed parameters of one offer, resolved at construction.

use std::time::Duration;

use openoffer_types::{AccountId, Amount, AssetDecimals, AssetId, OfferConfig};
use serde::{Deserialize, Serialize};

/// Who and what the offer moves value between. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferTerms {
    pub payment_asset: AssetId,
    pub sale_asset: AssetId,
    pub decimals: AssetDecimals,
    /// The engine's own account in the asset ledger.
    pub custody: AccountId,
    pub treasury: AccountId,
    /// The vesting vault's account in the asset ledger.
    pub vesting: AccountId,
    pub vesting_duration: Duration,
    pub offer_expiration_delay: Duration,
    /// Sale asset the engine must hold before it can start.
    pub allocations_total: Amount,
    /// Payment asset raised if every allocation is purchased.
    pub total_cost: Amount,
}

impl OfferTerms {
    pub(crate) fn from_config(config: &OfferConfig, total_cost: Amount) -> Self {
        Self {
            payment_asset: config.payment_asset,
            sale_asset: config.sale_asset,
            decimals: config.decimals,
            custody: config.custody,
            treasury: config.treasury,
            vesting: config.vesting,
            vesting_duration: config.vesting_duration,
            offer_expiration_delay: config.offer_expiration_delay,
            allocations_total: config.allocations_total,
            total_cost,
        }
    }
}
