//! # openoffer-ledger
//!
//! **Collaborator plane**: the asset ledger and vesting vault the settlement
//! engine moves value through.
//!
//! ## Architecture
//!
//! 1. **AssetLedger**: balance, transfer, and allowance primitives per asset
//! 2. **VestingVault**: pulls deposited tokens and tracks release schedules
//! 3. **Checkpoint**: snapshot/rollback so the engine can run each operation
//!    all-or-nothing across collaborators
//!
//! ## Purchase Flow
//!
//! ```text
//! purchaser ──transfer_from──► custody ──transfer──► treasury
//! custody ──(vault pulls via allowance)──► VestingVault ──release──► beneficiary
//! ```
//!
//! The in-memory implementations are complete and used by the engine's tests;
//! any other ledger or vault can be plugged in through the traits.

pub mod asset_ledger;
pub mod checkpoint;
pub mod vesting;

pub use asset_ledger::{AssetLedger, InMemoryLedger};
pub use checkpoint::Checkpoint;
pub use vesting::{InMemoryVesting, VestingDeposit, VestingSchedule, VestingVault};
