//! Identifiers used throughout OpenOffer.
//!
//! Accounts and assets are 32-byte identities (the width of an on-chain
//! address or public key). The all-zero value is the *null identity* and is
//! rejected wherever a real party or asset is required.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Identity of a party holding balances: purchaser, treasury, vesting vault,
/// or the engine's own custody account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// The null identity.
    pub const NULL: Self = Self([0u8; 32]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Deterministic identity derived from a human-readable label.
    ///
    /// `SHA-256("openoffer:account:v1:" || label)`. Never yields the null identity
    /// in practice; callers still validate with [`AccountId::is_null`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        Self(derive(b"openoffer:account:v1:", label))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// First four bytes, hex encoded. For log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acct:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// Identity of a fungible asset (the sale asset or the payment asset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AssetId(pub [u8; 32]);

impl AssetId {
    /// The null asset.
    pub const NULL: Self = Self([0u8; 32]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Deterministic asset identity from a ticker symbol (e.g. `"USDC"`).
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Self {
        Self(derive(b"openoffer:asset:v1:", symbol))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// ReceiptId
// ---------------------------------------------------------------------------

/// Unique identifier for an event receipt. UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ReceiptId(pub Uuid);

impl ReceiptId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ReceiptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rcpt:{}", self.0)
    }
}

fn derive(domain: &[u8], label: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(label.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Random identities for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl AccountId {
    pub fn random() -> Self {
        let mut bytes: [u8; 32] = rand::random();
        // Keep clear of the null identity.
        bytes[0] |= 1;
        Self(bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_account_is_null() {
        assert!(AccountId::NULL.is_null());
        assert!(AssetId::NULL.is_null());
    }

    #[test]
    fn labelled_accounts_are_deterministic() {
        let a = AccountId::from_label("treasury");
        let b = AccountId::from_label("treasury");
        assert_eq!(a, b);
        assert_ne!(a, AccountId::from_label("vesting"));
        assert!(!a.is_null());
    }

    #[test]
    fn asset_symbols_do_not_collide_with_accounts() {
        let asset = AssetId::from_symbol("USDC");
        let account = AccountId::from_label("USDC");
        assert_ne!(asset.0, account.0);
    }

    #[test]
    fn random_account_is_never_null() {
        for _ in 0..64 {
            assert!(!AccountId::random().is_null());
        }
    }

    #[test]
    fn display_prefixes() {
        assert!(format!("{}", AccountId::from_label("x")).starts_with("acct:"));
        assert!(format!("{}", AssetId::from_symbol("x")).starts_with("asset:"));
        assert!(format!("{}", ReceiptId::new()).starts_with("rcpt:"));
    }

    #[test]
    fn receipt_ids_are_time_ordered() {
        let a = ReceiptId::new();
        let b = ReceiptId::new();
        assert!(a < b);
    }
}
