//! # openoffer-settlement
//!
//! **Settlement Plane**: allocation bookkeeping, rate conversion, offer
//! lifecycle, purchase settlement, and unsold recovery for one allowlisted
//! fixed-rate offer.
//!
//! ## Architecture
//!
//! [`FundingEngine`] owns one offer and runs every operation atomically
//! against an asset ledger and a vesting vault:
//! 1. **RateTable**: immutable positive rates, indexed per purchaser
//! 2. **AllocationLedger**: one spend-once allocation per purchaser
//! 3. **OfferLifecycle**: unstarted → active, expiry derived from time
//! 4. **PurchaseSettlement**: clear allocation → collect payment → vest
//! 5. **Recovery**: sweep unsold inventory to the treasury after expiry
//! 6. **SaleAccounting**: custody invariant after every purchase
//!
//! ## Offer Flow
//!
//! ```text
//! new(config) → fund custody → start (or first purchase)
//!     → execute_purchase × N → expiry → recover_unsold_tokens
//! ```

pub mod accounting;
pub mod allocation_ledger;
pub mod engine;
pub mod lifecycle;
pub mod purchase;
pub mod rate_table;
pub mod recovery;
pub mod terms;

pub use accounting::SaleAccounting;
pub use allocation_ledger::AllocationLedger;
pub use engine::FundingEngine;
pub use lifecycle::OfferLifecycle;
pub use purchase::{PurchaseReceipt, PurchaseSettlement};
pub use rate_table::RateTable;
pub use recovery::sweep_unsold;
pub use terms::OfferTerms;
