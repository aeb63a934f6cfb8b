//! System-wide constants for the OpenOffer settlement engine.

/// Default decimals of the sale asset (18, the common fungible-token scale).
pub const DEFAULT_SALE_DECIMALS: u32 = 18;

/// Default decimals of the payment asset (6, stablecoin scale).
pub const DEFAULT_PAYMENT_DECIMALS: u32 = 6;

/// Largest power of ten representable in `u128` (10^38).
pub const MAX_DECIMAL_EXPONENT: u32 = 38;

/// Domain separator for event receipt payload hashes.
pub const RECEIPT_DOMAIN: &[u8] = b"openoffer:receipt:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenOffer";
