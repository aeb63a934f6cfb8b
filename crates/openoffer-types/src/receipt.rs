//! Offer notifications and their audit receipts.
//!
//! Every committed state change emits an [`OfferEvent`]. The engine wraps
//! each one in an [`EventReceipt`] carrying a SHA-256 hash of the
//! JSON-encoded event, forming an append-only audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{constants, AccountId, Amount, ReceiptId, Result};

/// A notification emitted by the settlement engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferEvent {
    /// The offer opened.
    OfferStarted { started_at: DateTime<Utc> },
    /// A purchaser paid and their tokens were handed to the vesting vault.
    PurchaseExecuted {
        purchaser: AccountId,
        beneficiary: AccountId,
        sale_amount: Amount,
        payment_cost: Amount,
    },
    /// Unsold inventory was swept to the treasury.
    TokensRecovered { treasury: AccountId, amount: Amount },
}

impl OfferEvent {
    /// Short uppercase tag for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OfferStarted { .. } => "OFFER_STARTED",
            Self::PurchaseExecuted { .. } => "PURCHASE_EXECUTED",
            Self::TokensRecovered { .. } => "TOKENS_RECOVERED",
        }
    }
}

impl std::fmt::Display for OfferEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// An event together with its position and content hash in the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventReceipt {
    pub id: ReceiptId,
    /// Zero-based position in the trail.
    pub sequence: u64,
    pub event: OfferEvent,
    /// `SHA-256(domain || sequence || json(event))`.
    pub payload_hash: [u8; 32],
    /// Caller-supplied time of the operation that produced the event.
    pub issued_at: DateTime<Utc>,
}

impl EventReceipt {
    /// Build a receipt for `event` at position `sequence`.
    ///
    /// # Errors
    /// `Serialization` if the event cannot be JSON-encoded.
    pub fn issue(sequence: u64, event: OfferEvent, issued_at: DateTime<Utc>) -> Result<Self> {
        let payload_hash = Self::hash(sequence, &event)?;
        Ok(Self {
            id: ReceiptId::new(),
            sequence,
            event,
            payload_hash,
            issued_at,
        })
    }

    /// Recompute the hash and compare against the stored one.
    #[must_use]
    pub fn verify(&self) -> bool {
        Self::hash(self.sequence, &self.event).is_ok_and(|h| h == self.payload_hash)
    }

    #[must_use]
    pub fn payload_hash_hex(&self) -> String {
        hex::encode(self.payload_hash)
    }

    fn hash(sequence: u64, event: &OfferEvent) -> Result<[u8; 32]> {
        use sha2::{Digest, Sha256};
        let payload = serde_json::to_vec(event)?;
        let mut hasher = Sha256::new();
        hasher.update(constants::RECEIPT_DOMAIN);
        hasher.update(sequence.to_le_bytes());
        hasher.update(&payload);
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        Ok(out)
    }
}
