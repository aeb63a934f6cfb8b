//! Vesting vault: holds purchased tokens and releases them over time.
//!
//! The settlement engine hands each purchase to a [`VestingVault`] as a
//! [`VestingDeposit`]. The vault pulls the tokens from the depositor through
//! the asset ledger (the depositor must have approved the vault's account
//! beforehand) and records a schedule for the beneficiary.
//!
//! [`InMemoryVesting`] releases linearly: nothing before the schedule start,
//! everything at `start + duration`, a floor-rounded pro-rata share between.

use std::collections::HashMap;
use std::time::Duration;

use openoffer_types::{AccountId, Amount, AssetId, OfferError, Result, Timestamp};

use crate::asset_ledger::AssetLedger;
use crate::checkpoint::Checkpoint;

/// One hand-off of tokens into vesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VestingDeposit {
    /// Account the tokens are pulled from.
    pub depositor: AccountId,
    pub asset: AssetId,
    /// Account that will receive the tokens as they vest.
    pub beneficiary: AccountId,
    pub amount: Amount,
    pub duration: Duration,
    /// Schedule start.
    pub start: Timestamp,
}

/// Receives deposits and tracks per-beneficiary schedules.
pub trait VestingVault {
    /// The vault's own account in the asset ledger. Depositors approve this
    /// account before calling [`VestingVault::deposit`].
    fn account(&self) -> AccountId;

    /// Pull `deposit.amount` from the depositor and open a schedule.
    ///
    /// # Errors
    /// `InvalidVestingDeposit`, `VestingScheduleExists`, or whatever the
    /// ledger returns for the pull.
    fn deposit(&mut self, ledger: &mut dyn AssetLedger, deposit: VestingDeposit) -> Result<()>;

    /// Total ever deposited for `beneficiary` in `asset`.
    fn total_deposited(&self, asset: AssetId, beneficiary: AccountId) -> Amount;

    /// Duration of `beneficiary`'s schedule, if one exists.
    fn schedule_duration(&self, asset: AssetId, beneficiary: AccountId) -> Option<Duration>;
}

/// A single linear schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VestingSchedule {
    pub total: Amount,
    pub released: Amount,
    pub start: Timestamp,
    pub duration: Duration,
}

impl VestingSchedule {
    /// Amount vested at `at`, ignoring what has been released.
    #[must_use]
    pub fn vested_at(&self, at: Timestamp) -> Amount {
        let duration = u128::from(self.duration.as_secs());
        let elapsed = (at - self.start).num_seconds();
        if elapsed <= 0 {
            return 0;
        }
        let elapsed = u128::from(elapsed.unsigned_abs());
        if duration == 0 || elapsed >= duration {
            return self.total;
        }
        // total * elapsed / duration, split so the product cannot overflow.
        let whole = self.total / duration;
        let rest = self.total % duration;
        whole * elapsed + rest * elapsed / duration
    }

    /// Vested but not yet released at `at`.
    #[must_use]
    pub fn releasable_at(&self, at: Timestamp) -> Amount {
        self.vested_at(at).saturating_sub(self.released)
    }
}

/// In-memory [`VestingVault`] with linear schedules.
#[derive(Debug, Clone)]
pub struct InMemoryVesting {
    account: AccountId,
    schedules: HashMap<(AssetId, AccountId), VestingSchedule>,
}

impl InMemoryVesting {
    #[must_use]
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            schedules: HashMap::new(),
        }
    }

    #[must_use]
    pub fn schedule(&self, asset: AssetId, beneficiary: AccountId) -> Option<&VestingSchedule> {
        self.schedules.get(&(asset, beneficiary))
    }

    /// Amount of `beneficiary`'s deposit vested at `at`.
    #[must_use]
    pub fn vested_amount(&self, asset: AssetId, beneficiary: AccountId, at: Timestamp) -> Amount {
        self.schedule(asset, beneficiary)
            .map_or(0, |s| s.vested_at(at))
    }

    /// Amount that [`InMemoryVesting::release`] would pay out at `at`.
    #[must_use]
    pub fn releasable(&self, asset: AssetId, beneficiary: AccountId, at: Timestamp) -> Amount {
        self.schedule(asset, beneficiary)
            .map_or(0, |s| s.releasable_at(at))
    }

    /// Pay out everything vested and unreleased to the beneficiary.
    ///
    /// # Errors
    /// `NothingVested` if the releasable amount is zero, or the ledger's
    /// error if the transfer fails.
    pub fn release(
        &mut self,
        ledger: &mut dyn AssetLedger,
        asset: AssetId,
        beneficiary: AccountId,
        now: Timestamp,
    ) -> Result<Amount> {
        let amount = self.releasable(asset, beneficiary, now);
        if amount == 0 {
            return Err(OfferError::NothingVested { beneficiary });
        }
        ledger.transfer(asset, self.account, beneficiary, amount)?;
        if let Some(schedule) = self.schedules.get_mut(&(asset, beneficiary)) {
            schedule.released += amount;
        }

        tracing::debug!(
            beneficiary = %beneficiary,
            asset = %asset,
            amount = %amount,
            "Vested tokens released"
        );
        Ok(amount)
    }
}

impl VestingVault for InMemoryVesting {
    fn account(&self) -> AccountId {
        self.account
    }

    fn deposit(&mut self, ledger: &mut dyn AssetLedger, deposit: VestingDeposit) -> Result<()> {
        if deposit.amount == 0 {
            return Err(OfferError::InvalidVestingDeposit {
                reason: "amount must be positive".to_string(),
            });
        }
        if deposit.duration.as_secs() == 0 {
            return Err(OfferError::InvalidVestingDeposit {
                reason: "duration must be at least one second".to_string(),
            });
        }
        let key = (deposit.asset, deposit.beneficiary);
        if self.schedules.contains_key(&key) {
            return Err(OfferError::VestingScheduleExists {
                asset: deposit.asset,
                beneficiary: deposit.beneficiary,
            });
        }

        ledger.transfer_from(
            deposit.asset,
            self.account,
            deposit.depositor,
            self.account,
            deposit.amount,
        )?;
        self.schedules.insert(
            key,
            VestingSchedule {
                total: deposit.amount,
                released: 0,
                start: deposit.start,
                duration: deposit.duration,
            },
        );

        tracing::debug!(
            beneficiary = %deposit.beneficiary,
            amount = %deposit.amount,
            duration_secs = deposit.duration.as_secs(),
            "Vesting schedule opened"
        );
        Ok(())
    }

    fn total_deposited(&self, asset: AssetId, beneficiary: AccountId) -> Amount {
        self.schedule(asset, beneficiary).map_or(0, |s| s.total)
    }

    fn schedule_duration(&self, asset: AssetId, beneficiary: AccountId) -> Option<Duration> {
        self.schedule(asset, beneficiary).map(|s| s.duration)
    }
}

impl Checkpoint for InMemoryVesting {
    type Snapshot = HashMap<(AssetId, AccountId), VestingSchedule>;

    fn checkpoint(&self) -> Self::Snapshot {
        self.schedules.clone()
    }

    fn rollback(&mut self, snapshot: Self::Snapshot) {
        self.schedules = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::asset_ledger::InMemoryLedger;

    fn t(secs: i64) -> Timestamp {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn sale() -> AssetId {
        AssetId::from_symbol("SALE")
    }

    struct Fixture {
        ledger: InMemoryLedger,
        vault: InMemoryVesting,
        depositor: AccountId,
        beneficiary: AccountId,
    }

    fn setup(funds: Amount) -> Fixture {
        let depositor = AccountId::random();
        let vault = InMemoryVesting::new(AccountId::from_label("vesting"));
        let mut ledger = InMemoryLedger::new();
        ledger.mint(sale(), depositor, funds).unwrap();
        ledger
            .approve(sale(), depositor, vault.account(), funds)
            .unwrap();
        Fixture {
            ledger,
            vault,
            depositor,
            beneficiary: AccountId::random(),
        }
    }

    fn deposit(f: &Fixture, amount: Amount, duration: u64, start: i64) -> VestingDeposit {
        VestingDeposit {
            depositor: f.depositor,
            asset: sale(),
            beneficiary: f.beneficiary,
            amount,
            duration: Duration::from_secs(duration),
            start: t(start),
        }
    }

    #[test]
    fn deposit_pulls_tokens_and_opens_schedule() {
        let mut f = setup(1_000);
        let d = deposit(&f, 1_000, 100, 0);
        f.vault.deposit(&mut f.ledger, d).unwrap();

        assert_eq!(f.ledger.balance_of(sale(), f.depositor), 0);
        assert_eq!(f.ledger.balance_of(sale(), f.vault.account()), 1_000);
        assert_eq!(f.vault.total_deposited(sale(), f.beneficiary), 1_000);
        assert_eq!(
            f.vault.schedule_duration(sale(), f.beneficiary),
            Some(Duration::from_secs(100))
        );
    }

    #[test]
    fn deposit_without_allowance_fails_cleanly() {
        let mut f = setup(1_000);
        f.ledger
            .approve(sale(), f.depositor, f.vault.account(), 0)
            .unwrap();
        let d = deposit(&f, 500, 100, 0);
        let err = f.vault.deposit(&mut f.ledger, d).unwrap_err();
        assert!(matches!(err, OfferError::InsufficientAllowance { .. }));
        assert_eq!(f.vault.total_deposited(sale(), f.beneficiary), 0);
        assert!(f.vault.schedule(sale(), f.beneficiary).is_none());
    }

    #[test]
    fn zero_amount_or_duration_rejected() {
        let mut f = setup(1_000);
        let d = deposit(&f, 0, 100, 0);
        assert!(matches!(
            f.vault.deposit(&mut f.ledger, d).unwrap_err(),
            OfferError::InvalidVestingDeposit { .. }
        ));
        let d = deposit(&f, 10, 0, 0);
        assert!(matches!(
            f.vault.deposit(&mut f.ledger, d).unwrap_err(),
            OfferError::InvalidVestingDeposit { .. }
        ));
    }

    #[test]
    fn second_schedule_for_same_beneficiary_rejected() {
        let mut f = setup(1_000);
        let d = deposit(&f, 400, 100, 0);
        f.vault.deposit(&mut f.ledger, d).unwrap();
        let err = f.vault.deposit(&mut f.ledger, d).unwrap_err();
        assert!(matches!(err, OfferError::VestingScheduleExists { .. }));
        assert_eq!(f.ledger.balance_of(sale(), f.depositor), 600);
    }

    #[test]
    fn linear_vesting_curve() {
        let mut f = setup(1_000);
        let d = deposit(&f, 1_000, 100, 50);
        f.vault.deposit(&mut f.ledger, d).unwrap();

        assert_eq!(f.vault.vested_amount(sale(), f.beneficiary, t(0)), 0);
        assert_eq!(f.vault.vested_amount(sale(), f.beneficiary, t(50)), 0);
        assert_eq!(f.vault.vested_amount(sale(), f.beneficiary, t(75)), 250);
        assert_eq!(f.vault.vested_amount(sale(), f.beneficiary, t(150)), 1_000);
        assert_eq!(f.vault.vested_amount(sale(), f.beneficiary, t(9_999)), 1_000);
    }

    #[test]
    fn vesting_rounds_down() {
        let schedule = VestingSchedule {
            total: 10,
            released: 0,
            start: t(0),
            duration: Duration::from_secs(3),
        };
        assert_eq!(schedule.vested_at(t(1)), 3);
        assert_eq!(schedule.vested_at(t(2)), 6);
        assert_eq!(schedule.vested_at(t(3)), 10);
    }

    #[test]
    fn vesting_large_totals_do_not_overflow() {
        let schedule = VestingSchedule {
            total: u128::MAX,
            released: 0,
            start: t(0),
            duration: Duration::from_secs(2),
        };
        assert_eq!(schedule.vested_at(t(1)), u128::MAX / 2);
    }

    #[test]
    fn release_pays_out_incrementally() {
        let mut f = setup(1_000);
        let d = deposit(&f, 1_000, 100, 0);
        f.vault.deposit(&mut f.ledger, d).unwrap();

        let first = f
            .vault
            .release(&mut f.ledger, sale(), f.beneficiary, t(40))
            .unwrap();
        assert_eq!(first, 400);
        let second = f
            .vault
            .release(&mut f.ledger, sale(), f.beneficiary, t(100))
            .unwrap();
        assert_eq!(second, 600);
        assert_eq!(f.ledger.balance_of(sale(), f.beneficiary), 1_000);
        assert_eq!(f.ledger.balance_of(sale(), f.vault.account()), 0);
    }

    #[test]
    fn release_with_nothing_vested_fails() {
        let mut f = setup(1_000);
        let d = deposit(&f, 1_000, 100, 10);
        f.vault.deposit(&mut f.ledger, d).unwrap();
        let err = f
            .vault
            .release(&mut f.ledger, sale(), f.beneficiary, t(5))
            .unwrap_err();
        assert!(matches!(err, OfferError::NothingVested { .. }));

        let stranger = AccountId::random();
        let err = f
            .vault
            .release(&mut f.ledger, sale(), stranger, t(500))
            .unwrap_err();
        assert!(matches!(err, OfferError::NothingVested { .. }));
    }

    #[test]
    fn rollback_forgets_schedule() {
        let mut f = setup(1_000);
        let snapshot = f.vault.checkpoint();
        let d = deposit(&f, 1_000, 100, 0);
        f.vault.deposit(&mut f.ledger, d).unwrap();
        f.vault.rollback(snapshot);
        assert_eq!(f.vault.total_deposited(sale(), f.beneficiary), 0);
    }
}
