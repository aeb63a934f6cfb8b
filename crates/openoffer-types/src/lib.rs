//! # openoffer-types
//!
//! Shared types, errors, and configuration for the **OpenOffer** settlement
//! engine.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`AssetId`], [`ReceiptId`]
//! - **Amounts**: [`Amount`], [`AssetDecimals`], [`units`]
//! - **Rates**: [`Rate`] and the exact sale → payment cost conversion
//! - **Offer model**: [`OfferPhase`], [`OfferStatus`], [`Funder`], [`CallContext`]
//! - **Notifications**: [`OfferEvent`], [`EventReceipt`]
//! - **Configuration**: [`OfferConfig`]
//! - **Errors**: [`OfferError`] with `OO_ERR_` prefix codes, [`ErrorCategory`]
//! - **Constants**: defaults and domain separators

pub mod balance;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod offer;
pub mod rate;
pub mod receipt;

// Re-export all primary types at crate root for ergonomic imports:
//   use openoffer_types::{AccountId, OfferConfig, OfferError, ...};

pub use balance::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use offer::*;
pub use rate::*;
pub use receipt::*;

// Constants are accessed via `openoffer_types::constants::FOO`
// (not re-exported to avoid name collisions).
