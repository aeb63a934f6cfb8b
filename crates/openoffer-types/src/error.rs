//! Error types for the OpenOffer settlement engine.
//!
//! All errors use the `OO_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by category:
//! - 1xx: Configuration errors (bad construction arguments)
//! - 2xx: Lifecycle errors (wrong phase, funding, expiry, clock)
//! - 3xx: Authorization errors (no allocation for caller)
//! - 4xx: Transfer errors (collaborator ledger or vesting refused)
//! - 5xx: Exhausted errors (nothing left to recover)
//! - 9xx: Internal errors

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AccountId, Amount, AssetId};

/// Coarse classification of an [`OfferError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Lifecycle,
    Authorization,
    Transfer,
    Exhausted,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Lifecycle => write!(f, "LIFECYCLE"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::Transfer => write!(f, "TRANSFER"),
            Self::Exhausted => write!(f, "EXHAUSTED"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Central error enum for all OpenOffer operations.
#[derive(Debug, Error)]
pub enum OfferError {
    // =================================================================
    // Configuration Errors (1xx)
    // =================================================================
    /// The rate table must contain at least one rate.
    #[error("OO_ERR_100: Rate table is empty")]
    EmptyRateTable,

    /// A rate is zero or negative.
    #[error("OO_ERR_101: Rate at index {index} must be greater than 0, got {rate}")]
    NonPositiveRate { index: usize, rate: Decimal },

    /// Purchasers, allocations and rate indices differ in length.
    #[error(
        "OO_ERR_102: purchasers, allocations, rate indices lengths must be equal \
         ({purchasers}, {allocations}, {rate_indices})"
    )]
    LengthMismatch {
        purchasers: usize,
        allocations: usize,
        rate_indices: usize,
    },

    /// A required identity is the null identity.
    #[error("OO_ERR_103: {role} cannot be the null identity")]
    NullIdentity { role: &'static str },

    /// The same purchaser appears twice in the allowlist.
    #[error("OO_ERR_104: Allocation has already been set for {0}")]
    DuplicatePurchaser(AccountId),

    /// A purchaser was listed with a zero allocation.
    #[error("OO_ERR_105: Zero allocation for purchaser {0}")]
    ZeroAllocation(AccountId),

    /// A purchaser's rate index points outside the rate table.
    #[error("OO_ERR_106: Rate index {index} for {purchaser} is out of bounds (table has {len})")]
    RateIndexOutOfBounds {
        purchaser: AccountId,
        index: usize,
        len: usize,
    },

    /// The declared total does not equal the sum of allocations.
    #[error("OO_ERR_107: Allocations total {declared} does not equal the sum of allocations {actual}")]
    AllocationSumMismatch { declared: Amount, actual: Amount },

    /// A duration parameter is zero.
    #[error("OO_ERR_108: {field} must be greater than 0")]
    ZeroDuration { field: &'static str },

    /// Configuration could not be parsed or is otherwise invalid.
    #[error("OO_ERR_109: Invalid configuration: {0}")]
    InvalidConfig(String),

    // =================================================================
    // Lifecycle Errors (2xx)
    // =================================================================
    /// `start` was called on an offer that is already active.
    #[error("OO_ERR_200: Offer has already started")]
    AlreadyStarted,

    /// The engine does not yet hold the full sale-asset total.
    #[error("OO_ERR_201: Insufficient sale asset balance to start offer: need {required}, have {held}")]
    InsufficientFunding { required: Amount, held: Amount },

    /// Purchases are closed once the offer has expired.
    #[error("OO_ERR_202: Purchases cannot be made after the offer has expired")]
    OfferExpired,

    /// The operation requires a started offer.
    #[error("OO_ERR_203: Offer has not yet started")]
    NotStarted,

    /// The operation requires an expired offer.
    #[error("OO_ERR_204: Offer has not yet expired")]
    NotExpired,

    /// A caller supplied a timestamp earlier than one already observed.
    #[error("OO_ERR_205: Clock regression: {now} is before last observed {last}")]
    ClockRegression {
        now: chrono::DateTime<chrono::Utc>,
        last: chrono::DateTime<chrono::Utc>,
    },

    // =================================================================
    // Authorization Errors (3xx)
    // =================================================================
    /// The caller has no (remaining) allocation.
    #[error("OO_ERR_300: {0} does not have a sale allocation")]
    NoAllocation(AccountId),

    /// The allocation was already cleared by an earlier purchase.
    #[error("OO_ERR_301: Allocation for {0} has already been cleared")]
    AlreadyCleared(AccountId),

    // =================================================================
    // Transfer Errors (4xx)
    // =================================================================
    /// Ledger balance too small for a transfer.
    #[error("OO_ERR_400: Insufficient balance of {asset} for {account}: need {needed}, have {available}")]
    InsufficientBalance {
        asset: AssetId,
        account: AccountId,
        needed: Amount,
        available: Amount,
    },

    /// Ledger allowance too small for a delegated transfer.
    #[error(
        "OO_ERR_401: Insufficient allowance of {asset} from {owner} to {spender}: \
         need {needed}, have {available}"
    )]
    InsufficientAllowance {
        asset: AssetId,
        owner: AccountId,
        spender: AccountId,
        needed: Amount,
        available: Amount,
    },

    /// Pulling payment from the purchaser failed.
    #[error("OO_ERR_402: Payment transfer of {cost} from {purchaser} failed: {source}")]
    PaymentTransferFailed {
        purchaser: AccountId,
        cost: Amount,
        #[source]
        source: Box<OfferError>,
    },

    /// The vesting collaborator refused the deposit.
    #[error("OO_ERR_403: Vesting deposit for {beneficiary} failed: {source}")]
    VestingDepositFailed {
        beneficiary: AccountId,
        #[source]
        source: Box<OfferError>,
    },

    /// The vesting collaborator already holds a schedule for this beneficiary.
    #[error("OO_ERR_404: Vesting schedule already exists for {beneficiary} in {asset}")]
    VestingScheduleExists { asset: AssetId, beneficiary: AccountId },

    /// Vesting deposit with zero amount or zero duration.
    #[error("OO_ERR_405: Invalid vesting deposit: {reason}")]
    InvalidVestingDeposit { reason: String },

    /// Nothing has vested (or everything vested was already released).
    #[error("OO_ERR_406: Nothing vested to release for {beneficiary}")]
    NothingVested { beneficiary: AccountId },

    // =================================================================
    // Exhausted Errors (5xx)
    // =================================================================
    /// The engine holds no sale asset to sweep.
    #[error("OO_ERR_500: There are no sale tokens to recover")]
    NothingToRecover,

    // =================================================================
    // Internal (9xx)
    // =================================================================
    /// Rate lookup outside the table. Unreachable after validated construction.
    #[error("OO_ERR_900: Rate index {index} out of range (table has {len})")]
    RateIndexOutOfRange { index: usize, len: usize },

    /// Checked arithmetic overflowed.
    #[error("OO_ERR_901: Arithmetic overflow: {context}")]
    ArithmeticOverflow { context: String },

    /// Held sale asset no longer covers outstanding allocations.
    #[error("OO_ERR_902: Custody invariant violation: {reason}")]
    CustodyInvariantViolation { reason: String },

    /// Serialization / deserialization error.
    #[error("OO_ERR_903: Serialization error: {0}")]
    Serialization(String),

    /// I/O error (reading configuration).
    #[error("OO_ERR_904: I/O error: {0}")]
    Io(String),
}

impl OfferError {
    /// Classify this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyRateTable
            | Self::NonPositiveRate { .. }
            | Self::LengthMismatch { .. }
            | Self::NullIdentity { .. }
            | Self::DuplicatePurchaser(_)
            | Self::ZeroAllocation(_)
            | Self::RateIndexOutOfBounds { .. }
            | Self::AllocationSumMismatch { .. }
            | Self::ZeroDuration { .. }
            | Self::InvalidConfig(_) => ErrorCategory::Configuration,

            Self::AlreadyStarted
            | Self::InsufficientFunding { .. }
            | Self::OfferExpired
            | Self::NotStarted
            | Self::NotExpired
            | Self::ClockRegression { .. } => ErrorCategory::Lifecycle,

            Self::NoAllocation(_) | Self::AlreadyCleared(_) => ErrorCategory::Authorization,

            Self::InsufficientBalance { .. }
            | Self::InsufficientAllowance { .. }
            | Self::PaymentTransferFailed { .. }
            | Self::VestingDepositFailed { .. }
            | Self::VestingScheduleExists { .. }
            | Self::InvalidVestingDeposit { .. }
            | Self::NothingVested { .. } => ErrorCategory::Transfer,

            Self::NothingToRecover => ErrorCategory::Exhausted,

            Self::RateIndexOutOfRange { .. }
            | Self::ArithmeticOverflow { .. }
            | Self::CustodyInvariantViolation { .. }
            | Self::Serialization(_)
            | Self::Io(_) => ErrorCategory::Internal,
        }
    }

    /// Shorthand for [`OfferError::ArithmeticOverflow`].
    #[must_use]
    pub fn overflow(context: impl Into<String>) -> Self {
        Self::ArithmeticOverflow {
            context: context.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OfferError>;

impl From<std::io::Error> for OfferError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for OfferError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = OfferError::NoAllocation(AccountId::from_label("stranger"));
        let msg = format!("{err}");
        assert!(msg.starts_with("OO_ERR_300"), "Got: {msg}");
    }

    #[test]
    fn insufficient_funding_display() {
        let err = OfferError::InsufficientFunding {
            required: 360,
            held: 100,
        };
        let msg = format!("{err}");
        assert!(msg.contains("OO_ERR_201"));
        assert!(msg.contains("360"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn payment_failure_keeps_source() {
        let inner = OfferError::InsufficientAllowance {
            asset: AssetId::from_symbol("USDC"),
            owner: AccountId::from_label("alice"),
            spender: AccountId::from_label("engine"),
            needed: 10,
            available: 0,
        };
        let err = OfferError::PaymentTransferFailed {
            purchaser: AccountId::from_label("alice"),
            cost: 10,
            source: Box::new(inner),
        };
        let source = std::error::Error::source(&err).expect("source is set");
        assert!(source.to_string().starts_with("OO_ERR_401"));
        assert_eq!(err.category(), ErrorCategory::Transfer);
    }

    #[test]
    fn categories_follow_code_groups() {
        assert_eq!(OfferError::EmptyRateTable.category(), ErrorCategory::Configuration);
        assert_eq!(OfferError::AlreadyStarted.category(), ErrorCategory::Lifecycle);
        assert_eq!(OfferError::OfferExpired.category(), ErrorCategory::Lifecycle);
        assert_eq!(
            OfferError::NoAllocation(AccountId::NULL).category(),
            ErrorCategory::Authorization
        );
        assert_eq!(OfferError::NothingToRecover.category(), ErrorCategory::Exhausted);
        assert_eq!(
            OfferError::RateIndexOutOfRange { index: 3, len: 2 }.category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn all_errors_have_oo_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(OfferError::EmptyRateTable),
            Box::new(OfferError::ZeroDuration {
                field: "vesting_duration",
            }),
            Box::new(OfferError::NotExpired),
            Box::new(OfferError::NothingToRecover),
            Box::new(OfferError::Io("disk".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("OO_ERR_"),
                "Error missing OO_ERR_ prefix: {msg}"
            );
        }
    }
}
