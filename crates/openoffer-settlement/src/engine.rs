//! Funding engine: the single owner of one offer's state.
//!
//! [`FundingEngine`] ties the rate table, allocation ledger, lifecycle, and
//! accounting to an asset ledger and a vesting vault, and exposes the
//! offer's public operations. Every mutating operation runs through
//! `atomically`:
//!
//! ```text
//! savepoint(state, ledger, vesting, trail) → check clock → run
//!     Ok  → keep everything, events and receipts appended
//!     Err → restore all four, the attempt leaves no trace
//! ```
//!
//! The engine takes no locks. A host that shares it between threads wraps it
//! in a mutex, which serialises operations into a transaction order.

use std::time::Duration;

use openoffer_ledger::{AssetLedger, Checkpoint, VestingVault};
use openoffer_types::{
    AccountId, Amount, CallContext, EventReceipt, Funder, OfferConfig, OfferError, OfferEvent,
    OfferPhase, OfferStatus, Rate, Result, Timestamp, constants,
};

use crate::accounting::SaleAccounting;
use crate::allocation_ledger::AllocationLedger;
use crate::lifecycle::OfferLifecycle;
use crate::purchase::{PurchaseReceipt, PurchaseSettlement};
use crate::rate_table::RateTable;
use crate::recovery;
use crate::terms::OfferTerms;

/// Mutable offer state owned by the engine.
#[derive(Debug, Clone)]
struct OfferState {
    lifecycle: OfferLifecycle,
    allocations: AllocationLedger,
    accounting: SaleAccounting,
    /// Latest `now` seen by a committed operation.
    last_seen: Option<Timestamp>,
}

/// Everything needed to undo one operation.
struct Savepoint<LS, VS> {
    state: OfferState,
    ledger: LS,
    vesting: VS,
    trail_len: usize,
}

/// Settlement engine for one allowlisted, fixed-rate offer.
pub struct FundingEngine<L, V> {
    terms: OfferTerms,
    rates: RateTable,
    state: OfferState,
    events: Vec<OfferEvent>,
    receipts: Vec<EventReceipt>,
    ledger: L,
    vesting: V,
}

impl<L, V> FundingEngine<L, V>
where
    L: AssetLedger + Checkpoint,
    V: VestingVault + Checkpoint,
{
    /// Validate `config`, build the offer, and grant the custody approvals.
    ///
    /// Custody approves the treasury for the full payment cost and the full
    /// sale total, and the vesting vault for the full sale total.
    ///
    /// # Errors
    /// Any configuration error, `ArithmeticOverflow` if an allocation cannot
    /// be priced, or the ledger's error if an approval fails.
    pub fn new(config: OfferConfig, mut ledger: L, vesting: V) -> Result<Self> {
        config.validate_parameters()?;
        if vesting.account() != config.vesting {
            return Err(OfferError::InvalidConfig(format!(
                "vesting vault account {} does not match configured {}",
                vesting.account(),
                config.vesting
            )));
        }

        let rates = RateTable::new(config.rates.clone())?;
        let allocations = AllocationLedger::new(
            &config.purchasers,
            &config.allocations,
            &config.rate_indices,
            config.allocations_total,
            rates.len(),
        )?;
        let lifecycle = OfferLifecycle::new(config.offer_expiration_delay)?;

        // Pricing every allocation up front surfaces overflow at construction
        // instead of at purchase time.
        let mut total_cost: Amount = 0;
        for funder in allocations.iter() {
            let cost = rates.convert(funder.sale_allocation, funder.rate_index, config.decimals)?;
            total_cost = total_cost
                .checked_add(cost)
                .ok_or_else(|| OfferError::overflow("total payment cost"))?;
        }
        let terms = OfferTerms::from_config(&config, total_cost);

        ledger.approve(terms.payment_asset, terms.custody, terms.treasury, total_cost)?;
        ledger.approve(
            terms.sale_asset,
            terms.custody,
            terms.treasury,
            terms.allocations_total,
        )?;
        ledger.approve(
            terms.sale_asset,
            terms.custody,
            terms.vesting,
            terms.allocations_total,
        )?;

        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            purchasers = allocations.len(),
            rates = rates.len(),
            allocations_total = %terms.allocations_total,
            total_cost = %total_cost,
            custody = %terms.custody,
            treasury = %terms.treasury,
            "Offer constructed"
        );

        Ok(Self {
            terms,
            rates,
            state: OfferState {
                lifecycle,
                allocations,
                accounting: SaleAccounting::new(),
                last_seen: None,
            },
            events: Vec::new(),
            receipts: Vec::new(),
            ledger,
            vesting,
        })
    }

    // ----- Operations -----

    /// Open the offer. Anyone may call it once custody holds the full total.
    ///
    /// # Errors
    /// `AlreadyStarted`, `InsufficientFunding`, or `ClockRegression`.
    pub fn start(&mut self, ctx: CallContext) -> Result<Timestamp> {
        self.atomically("start", ctx.now, |engine| engine.open(ctx))
    }

    /// Buy the caller's whole allocation, vesting it to `beneficiary`.
    ///
    /// Starts the offer first if it has not started yet.
    ///
    /// # Errors
    /// `InsufficientFunding` (implicit start), `OfferExpired`,
    /// `NoAllocation`, `PaymentTransferFailed`, `VestingDepositFailed`,
    /// `CustodyInvariantViolation`, or `ClockRegression`.
    pub fn execute_purchase(
        &mut self,
        ctx: CallContext,
        beneficiary: AccountId,
    ) -> Result<PurchaseReceipt> {
        self.atomically("execute_purchase", ctx.now, |engine| {
            // Lifecycle gates run before the allocation lookup.
            if !engine.state.lifecycle.started() {
                engine.open(ctx)?;
            }
            engine.state.lifecycle.ensure_open(ctx.now)?;

            let receipt = PurchaseSettlement {
                terms: &engine.terms,
                rates: &engine.rates,
                allocations: &mut engine.state.allocations,
                ledger: &mut engine.ledger,
                vesting: &mut engine.vesting,
            }
            .execute(ctx, beneficiary)?;

            engine
                .state
                .accounting
                .record_purchase(receipt.sale_amount, receipt.payment_cost)?;
            engine.verify_custody()?;
            engine.emit(
                OfferEvent::PurchaseExecuted {
                    purchaser: receipt.purchaser,
                    beneficiary: receipt.beneficiary,
                    sale_amount: receipt.sale_amount,
                    payment_cost: receipt.payment_cost,
                },
                ctx.now,
            )?;

            tracing::info!(
                purchaser = %receipt.purchaser,
                beneficiary = %receipt.beneficiary,
                sale_amount = %receipt.sale_amount,
                payment_cost = %receipt.payment_cost,
                outstanding = %engine.state.allocations.outstanding(),
                "Purchase executed"
            );
            Ok(receipt)
        })
    }

    /// Sweep the unsold sale asset to the treasury after expiry.
    ///
    /// # Errors
    /// `NotStarted`, `NotExpired`, `NothingToRecover`, or `ClockRegression`.
    pub fn recover_unsold_tokens(&mut self, ctx: CallContext) -> Result<Amount> {
        self.atomically("recover_unsold_tokens", ctx.now, |engine| {
            engine.state.lifecycle.ensure_expired(ctx.now)?;
            let amount = recovery::sweep_unsold(&mut engine.ledger, &engine.terms)?;
            engine.state.accounting.record_recovery(amount)?;
            engine.emit(
                OfferEvent::TokensRecovered {
                    treasury: engine.terms.treasury,
                    amount,
                },
                ctx.now,
            )?;

            tracing::info!(
                caller = %ctx.caller,
                treasury = %engine.terms.treasury,
                amount = %amount,
                "Unsold tokens recovered"
            );
            Ok(amount)
        })
    }

    // ----- Queries -----

    #[must_use]
    pub fn offer_started(&self) -> bool {
        self.state.lifecycle.started()
    }

    #[must_use]
    pub fn offer_expired(&self, now: Timestamp) -> bool {
        self.state.lifecycle.expired(now)
    }

    #[must_use]
    pub fn status(&self, now: Timestamp) -> OfferStatus {
        self.state.lifecycle.status(now)
    }

    #[must_use]
    pub fn phase(&self) -> OfferPhase {
        self.state.lifecycle.phase()
    }

    /// `started_at + offer_expiration_delay`; `None` while unstarted.
    #[must_use]
    pub fn deadline(&self) -> Option<Timestamp> {
        self.state.lifecycle.deadline()
    }

    /// Remaining allocation and its payment cost. `(0, 0)` for unknown or
    /// already-purchased purchasers.
    ///
    /// # Errors
    /// Pricing errors; unreachable for a constructed engine.
    pub fn get_allocation(&self, purchaser: AccountId) -> Result<(Amount, Amount)> {
        let (amount, rate_index) = self.state.allocations.allocation_of(purchaser);
        if amount == 0 {
            return Ok((0, 0));
        }
        let cost = self
            .rates
            .convert(amount, rate_index, self.terms.decimals)?;
        Ok((amount, cost))
    }

    /// # Errors
    /// `RateIndexOutOfRange`.
    pub fn rate(&self, index: usize) -> Result<Rate> {
        self.rates.get(index)
    }

    #[must_use]
    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    #[must_use]
    pub fn funder(&self, purchaser: AccountId) -> Option<&Funder> {
        self.state.allocations.funder(purchaser)
    }

    /// All allocation records in construction order.
    pub fn funders(&self) -> impl Iterator<Item = &Funder> {
        self.state.allocations.iter()
    }

    #[must_use]
    pub fn vesting_duration(&self) -> Duration {
        self.terms.vesting_duration
    }

    #[must_use]
    pub fn offer_expiration_delay(&self) -> Duration {
        self.terms.offer_expiration_delay
    }

    #[must_use]
    pub fn allocations_total(&self) -> Amount {
        self.terms.allocations_total
    }

    /// Sum of allocations not yet purchased.
    #[must_use]
    pub fn outstanding(&self) -> Amount {
        self.state.allocations.outstanding()
    }

    /// Sale asset currently in custody.
    #[must_use]
    pub fn held_sale_balance(&self) -> Amount {
        self.ledger
            .balance_of(self.terms.sale_asset, self.terms.custody)
    }

    #[must_use]
    pub fn terms(&self) -> &OfferTerms {
        &self.terms
    }

    #[must_use]
    pub fn accounting(&self) -> &SaleAccounting {
        &self.state.accounting
    }

    /// Committed events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[OfferEvent] {
        &self.events
    }

    /// Audit receipts, one per committed event.
    #[must_use]
    pub fn receipts(&self) -> &[EventReceipt] {
        &self.receipts
    }

    // ----- Collaborator access -----

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct ledger access for the host: funding custody, purchaser
    /// approvals. Custody drained this way is caught by the next purchase.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    #[must_use]
    pub fn vesting(&self) -> &V {
        &self.vesting
    }

    pub fn vesting_mut(&mut self) -> &mut V {
        &mut self.vesting
    }

    /// Split into collaborators, e.g. to release vested tokens.
    pub fn ledger_and_vesting_mut(&mut self) -> (&mut L, &mut V) {
        (&mut self.ledger, &mut self.vesting)
    }

    #[must_use]
    pub fn into_parts(self) -> (L, V) {
        (self.ledger, self.vesting)
    }

    // ----- Internals -----

    fn open(&mut self, ctx: CallContext) -> Result<Timestamp> {
        let held = self.held_sale_balance();
        self.state
            .lifecycle
            .start(ctx.now, held, self.terms.allocations_total)?;
        self.emit(OfferEvent::OfferStarted { started_at: ctx.now }, ctx.now)?;

        tracing::info!(
            caller = %ctx.caller,
            started_at = %ctx.now,
            held = %held,
            deadline = ?self.deadline(),
            "Offer started"
        );
        Ok(ctx.now)
    }

    fn verify_custody(&self) -> Result<()> {
        self.state.accounting.verify(
            self.terms.allocations_total,
            self.state.allocations.outstanding(),
            self.held_sale_balance(),
        )
    }

    fn observe_clock(&mut self, now: Timestamp) -> Result<()> {
        match self.state.last_seen {
            Some(last) if now < last => Err(OfferError::ClockRegression { now, last }),
            _ => {
                self.state.last_seen = Some(now);
                Ok(())
            }
        }
    }

    fn emit(&mut self, event: OfferEvent, now: Timestamp) -> Result<()> {
        let sequence = u64::try_from(self.receipts.len())
            .map_err(|_| OfferError::overflow("receipt sequence"))?;
        let receipt = EventReceipt::issue(sequence, event.clone(), now)?;
        self.events.push(event);
        self.receipts.push(receipt);
        Ok(())
    }

    fn atomically<T>(
        &mut self,
        operation: &'static str,
        now: Timestamp,
        op: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let savepoint = self.savepoint();
        let result = self.observe_clock(now).and_then(|()| op(self));
        if let Err(err) = &result {
            self.restore(savepoint);
            tracing::warn!(
                operation,
                error = %err,
                category = %err.category(),
                "Operation rejected"
            );
        }
        result
    }

    fn savepoint(&self) -> Savepoint<L::Snapshot, V::Snapshot> {
        Savepoint {
            state: self.state.clone(),
            ledger: self.ledger.checkpoint(),
            vesting: self.vesting.checkpoint(),
            trail_len: self.events.len(),
        }
    }

    fn restore(&mut self, savepoint: Savepoint<L::Snapshot, V::Snapshot>) {
        let discarded = self.events.len() - savepoint.trail_len;
        self.state = savepoint.state;
        self.ledger.rollback(savepoint.ledger);
        self.vesting.rollback(savepoint.vesting);
        self.events.truncate(savepoint.trail_len);
        self.receipts.truncate(savepoint.trail_len);
        tracing::debug!(discarded_events = discarded, "Rolled back to savepoint");
    }
}
