//! Offer lifecycle and allocation records.
//!
//! An offer has exactly two stored phases:
//!
//! ```text
//!   ┌───────────┐  start (funded)  ┌──────────────────────┐
//!   │ UNSTARTED ├─────────────────▶│ ACTIVE { started_at } │
//!   └───────────┘                  └──────────────────────┘
//! ```
//!
//! *Expired* is not stored: it is `Active && now >= started_at + delay`,
//! evaluated fresh from the caller-supplied clock on every read.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount};

/// Caller-supplied timestamp. Must be non-decreasing across operations.
pub type Timestamp = DateTime<Utc>;

/// Stored lifecycle phase of the offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferPhase {
    /// Constructed, possibly funded, not yet opened.
    Unstarted,
    /// Opened at `started_at`. Purchases are legal until the deadline.
    Active { started_at: Timestamp },
}

impl OfferPhase {
    #[must_use]
    pub fn started_at(&self) -> Option<Timestamp> {
        match self {
            Self::Unstarted => None,
            Self::Active { started_at } => Some(*started_at),
        }
    }

    /// `started_at + expiration_delay`, or `None` while unstarted.
    ///
    /// A deadline past the representable range also yields `None`: such an
    /// offer never expires.
    #[must_use]
    pub fn deadline(&self, expiration_delay: TimeDelta) -> Option<Timestamp> {
        self.started_at()?.checked_add_signed(expiration_delay)
    }

    /// Observable status at `now` given the expiration delay.
    #[must_use]
    pub fn status(&self, now: Timestamp, expiration_delay: TimeDelta) -> OfferStatus {
        match (self, self.deadline(expiration_delay)) {
            (Self::Unstarted, _) => OfferStatus::Unstarted,
            (Self::Active { .. }, Some(deadline)) if now >= deadline => OfferStatus::Expired,
            (Self::Active { .. }, _) => OfferStatus::Active,
        }
    }
}

impl fmt::Display for OfferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unstarted => write!(f, "UNSTARTED"),
            Self::Active { .. } => write!(f, "ACTIVE"),
        }
    }
}

/// Derived, point-in-time view of the offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferStatus {
    Unstarted,
    Active,
    Expired,
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unstarted => write!(f, "UNSTARTED"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// One allowlisted purchaser's allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Funder {
    pub purchaser: AccountId,
    /// Sale-asset smallest units still purchasable. Zero once purchased.
    pub sale_allocation: Amount,
    /// Index into the rate table.
    pub rate_index: usize,
}

impl Funder {
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.sale_allocation == 0
    }
}

/// Who is calling, and when. Supplied by the host for every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountId,
    pub now: Timestamp,
}

impl CallContext {
    #[must_use]
    pub fn new(caller: AccountId, now: Timestamp) -> Self {
        Self { caller, now }
    }
}
