//! Offer lifecycle: unstarted → active, with expiry derived from time.
//!
//! Only the start transition is stored. Whether an active offer has expired
//! is always computed from `started_at`, the expiration delay, and the
//! caller-supplied `now`, so there is no expiry transition to miss.

use std::time::Duration;

use chrono::TimeDelta;
use openoffer_types::{Amount, OfferError, OfferPhase, OfferStatus, Result, Timestamp};

/// Phase tracker for one offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferLifecycle {
    phase: OfferPhase,
    expiration_delay: TimeDelta,
}

impl OfferLifecycle {
    /// A fresh, unstarted lifecycle.
    ///
    /// # Errors
    /// `ZeroDuration` for a zero delay, `InvalidConfig` if the delay does not
    /// fit a signed time span.
    pub fn new(expiration_delay: Duration) -> Result<Self> {
        if expiration_delay.is_zero() {
            return Err(OfferError::ZeroDuration {
                field: "offer_expiration_delay",
            });
        }
        let expiration_delay = TimeDelta::from_std(expiration_delay).map_err(|_| {
            OfferError::InvalidConfig(format!(
                "offer_expiration_delay {expiration_delay:?} is out of range"
            ))
        })?;
        Ok(Self {
            phase: OfferPhase::Unstarted,
            expiration_delay,
        })
    }

    #[must_use]
    pub fn phase(&self) -> OfferPhase {
        self.phase
    }

    #[must_use]
    pub fn expiration_delay(&self) -> TimeDelta {
        self.expiration_delay
    }

    /// Open the offer at `now`, provided `held` covers `required`.
    ///
    /// # Errors
    /// `AlreadyStarted` or `InsufficientFunding`.
    pub fn start(&mut self, now: Timestamp, held: Amount, required: Amount) -> Result<()> {
        if self.started() {
            return Err(OfferError::AlreadyStarted);
        }
        if held < required {
            return Err(OfferError::InsufficientFunding { required, held });
        }
        self.phase = OfferPhase::Active { started_at: now };
        Ok(())
    }

    #[must_use]
    pub fn started(&self) -> bool {
        matches!(self.phase, OfferPhase::Active { .. })
    }

    /// `true` once `now` reaches the deadline.
    #[must_use]
    pub fn expired(&self, now: Timestamp) -> bool {
        self.status(now) == OfferStatus::Expired
    }

    #[must_use]
    pub fn status(&self, now: Timestamp) -> OfferStatus {
        self.phase.status(now, self.expiration_delay)
    }

    /// `started_at + expiration_delay`; `None` while unstarted.
    #[must_use]
    pub fn deadline(&self) -> Option<Timestamp> {
        self.phase.deadline(self.expiration_delay)
    }

    /// Gate for purchases.
    ///
    /// # Errors
    /// `NotStarted` or `OfferExpired`.
    pub fn ensure_open(&self, now: Timestamp) -> Result<()> {
        match self.status(now) {
            OfferStatus::Unstarted => Err(OfferError::NotStarted),
            OfferStatus::Active => Ok(()),
            OfferStatus::Expired => Err(OfferError::OfferExpired),
        }
    }

    /// Gate for recovery.
    ///
    /// # Errors
    /// `NotStarted` or `NotExpired`.
    pub fn ensure_expired(&self, now: Timestamp) -> Result<()> {
        match self.status(now) {
            OfferStatus::Unstarted => Err(OfferError::NotStarted),
            OfferStatus::Active => Err(OfferError::NotExpired),
            OfferStatus::Expired => Ok(()),
        }
    }
}
