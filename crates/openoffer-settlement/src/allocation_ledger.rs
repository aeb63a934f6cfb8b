//! Allocation ledger: who may buy, how much, and at which rate.
//!
//! Each purchaser has exactly one [`Funder`] record, created at construction.
//! A successful purchase clears it to zero and it stays that way: an
//! allocation can be spent once and never re-created. A cleared entry and
//! an unknown purchaser both read as a zero allocation.

use std::collections::HashMap;

use openoffer_types::{AccountId, Amount, Funder, OfferError, Result};

/// Purchaser → allocation record, in construction order.
#[derive(Debug, Clone)]
pub struct AllocationLedger {
    funders: Vec<Funder>,
    /// Purchaser → position in `funders`.
    index: HashMap<AccountId, usize>,
    total: Amount,
}

impl AllocationLedger {
    /// Build the ledger from parallel sequences and the declared total.
    ///
    /// `rate_count` is the length of the rate table the indices point into.
    ///
    /// # Errors
    /// `LengthMismatch`, `NullIdentity`, `DuplicatePurchaser`,
    /// `ZeroAllocation`, `RateIndexOutOfBounds`, `AllocationSumMismatch`,
    /// or `ArithmeticOverflow` if the allocations do not sum within `u128`.
    pub fn new(
        purchasers: &[AccountId],
        allocations: &[Amount],
        rate_indices: &[usize],
        declared_total: Amount,
        rate_count: usize,
    ) -> Result<Self> {
        if purchasers.len() != allocations.len() || purchasers.len() != rate_indices.len() {
            return Err(OfferError::LengthMismatch {
                purchasers: purchasers.len(),
                allocations: allocations.len(),
                rate_indices: rate_indices.len(),
            });
        }

        let mut funders = Vec::with_capacity(purchasers.len());
        let mut index = HashMap::with_capacity(purchasers.len());
        let mut sum: Amount = 0;

        for ((&purchaser, &allocation), &rate_index) in
            purchasers.iter().zip(allocations).zip(rate_indices)
        {
            if purchaser.is_null() {
                return Err(OfferError::NullIdentity { role: "purchaser" });
            }
            if allocation == 0 {
                return Err(OfferError::ZeroAllocation(purchaser));
            }
            if rate_index >= rate_count {
                return Err(OfferError::RateIndexOutOfBounds {
                    purchaser,
                    index: rate_index,
                    len: rate_count,
                });
            }
            if index.insert(purchaser, funders.len()).is_some() {
                return Err(OfferError::DuplicatePurchaser(purchaser));
            }
            sum = sum
                .checked_add(allocation)
                .ok_or_else(|| OfferError::overflow("sum of allocations"))?;
            funders.push(Funder {
                purchaser,
                sale_allocation: allocation,
                rate_index,
            });
        }

        if sum != declared_total {
            return Err(OfferError::AllocationSumMismatch {
                declared: declared_total,
                actual: sum,
            });
        }

        Ok(Self {
            funders,
            index,
            total: declared_total,
        })
    }

    /// Remaining allocation and rate index. `(0, 0)` for unknown purchasers.
    #[must_use]
    pub fn allocation_of(&self, purchaser: AccountId) -> (Amount, usize) {
        self.funder(purchaser)
            .map_or((0, 0), |f| (f.sale_allocation, f.rate_index))
    }

    #[must_use]
    pub fn funder(&self, purchaser: AccountId) -> Option<&Funder> {
        self.index.get(&purchaser).map(|&i| &self.funders[i])
    }

    /// Zero `purchaser`'s allocation and return the record as it was.
    ///
    /// # Errors
    /// `NoAllocation` for an unknown purchaser, `AlreadyCleared` if the
    /// allocation was already spent.
    pub fn clear(&mut self, purchaser: AccountId) -> Result<Funder> {
        let slot = *self
            .index
            .get(&purchaser)
            .ok_or(OfferError::NoAllocation(purchaser))?;
        let funder = &mut self.funders[slot];
        if funder.is_cleared() {
            return Err(OfferError::AlreadyCleared(purchaser));
        }
        let before = *funder;
        funder.sale_allocation = 0;
        Ok(before)
    }

    /// Declared total across all purchasers.
    #[must_use]
    pub fn total(&self) -> Amount {
        self.total
    }

    /// Sum of allocations not yet purchased.
    #[must_use]
    pub fn outstanding(&self) -> Amount {
        self.funders.iter().map(|f| f.sale_allocation).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.funders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.funders.is_empty()
    }

    /// Records in construction order.
    pub fn iter(&self) -> impl Iterator<Item = &Funder> {
        self.funders.iter()
    }
}
