//! Unsold inventory recovery.
//!
//! After expiry, whatever sale asset is still in custody (unpurchased
//! allocations plus any surplus the funder over-sent) goes to the treasury
//! in one sweep. Timing gates live in the lifecycle; this module only moves
//! the balance.

use openoffer_ledger::AssetLedger;
use openoffer_types::{Amount, OfferError, Result};

use crate::terms::OfferTerms;

/// Transfer the full custody balance of the sale asset to the treasury.
///
/// # Errors
/// `NothingToRecover` if custody holds none, or the ledger's error.
pub fn sweep_unsold<L: AssetLedger>(ledger: &mut L, terms: &OfferTerms) -> Result<Amount> {
    let held = ledger.balance_of(terms.sale_asset, terms.custody);
    if held == 0 {
        return Err(OfferError::NothingToRecover);
    }
    ledger.transfer(terms.sale_asset, terms.custody, terms.treasury, held)?;
    Ok(held)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use openoffer_ledger::InMemoryLedger;
    use openoffer_types::{AccountId, AssetDecimals, AssetId};

    use super::*;

    fn terms() -> OfferTerms {
        OfferTerms {
            payment_asset: AssetId::from_symbol("USDC"),
            sale_asset: AssetId::from_symbol("SALE"),
            decimals: AssetDecimals::default(),
            custody: AccountId::from_label("custody"),
            treasury: AccountId::from_label("treasury"),
            vesting: AccountId::from_label("vesting"),
            vesting_duration: Duration::from_secs(100),
            offer_expiration_delay: Duration::from_secs(1000),
            allocations_total: 360,
            total_cost: 360,
        }
    }

    #[test]
    fn sweeps_everything_to_treasury() {
        let terms = terms();
        let mut ledger = InMemoryLedger::new();
        ledger.mint(terms.sale_asset, terms.custody, 250).unwrap();

        assert_eq!(sweep_unsold(&mut ledger, &terms).unwrap(), 250);
        assert_eq!(ledger.balance_of(terms.sale_asset, terms.custody), 0);
        assert_eq!(ledger.balance_of(terms.sale_asset, terms.treasury), 250);
    }

    #[test]
    fn empty_custody_has_nothing_to_recover() {
        let terms = terms();
        let mut ledger = InMemoryLedger::new();
        // Payment-asset balance is irrelevant.
        ledger.mint(terms.payment_asset, terms.custody, 5).unwrap();
        assert!(matches!(
            sweep_unsold(&mut ledger, &terms).unwrap_err(),
            OfferError::NothingToRecover
        ));
    }

    #[test]
    fn second_sweep_finds_nothing() {
        let terms = terms();
        let mut ledger = InMemoryLedger::new();
        ledger.mint(terms.sale_asset, terms.custody, 1).unwrap();
        sweep_unsold(&mut ledger, &terms).unwrap();
        assert!(matches!(
            sweep_unsold(&mut ledger, &terms).unwrap_err(),
            OfferError::NothingToRecover
        ));
    }
}
