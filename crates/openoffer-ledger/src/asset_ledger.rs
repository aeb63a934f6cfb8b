//! Fungible asset ledger.
//!
//! [`AssetLedger`] is the boundary the settlement engine uses to move value:
//! balance query, transfer, delegated transfer against a prior approval, and
//! approval granting. [`InMemoryLedger`] is the reference implementation,
//! tracking per-(asset, account) balances and per-(asset, owner, spender)
//! allowances. Every mutation validates first and writes second, so a failed
//! call leaves the ledger unchanged.

use std::collections::HashMap;

use openoffer_types::{AccountId, Amount, AssetId, OfferError, Result};

use crate::checkpoint::Checkpoint;

/// Balance, transfer, and allowance primitives over any number of assets.
pub trait AssetLedger {
    /// Balance of `account` in `asset`.
    fn balance_of(&self, asset: AssetId, account: AccountId) -> Amount;

    /// Amount `spender` may still move out of `owner`'s balance.
    fn allowance(&self, asset: AssetId, owner: AccountId, spender: AccountId) -> Amount;

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    /// `InsufficientBalance` if `from` holds less than `amount`.
    fn transfer(&mut self, asset: AssetId, from: AccountId, to: AccountId, amount: Amount)
    -> Result<()>;

    /// Move `amount` from `owner` to `to` on behalf of `spender`, consuming
    /// allowance.
    ///
    /// # Errors
    /// `InsufficientAllowance` or `InsufficientBalance`.
    fn transfer_from(
        &mut self,
        asset: AssetId,
        spender: AccountId,
        owner: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<()>;

    /// Set `spender`'s allowance over `owner`'s balance to `amount`
    /// (overwrites any previous allowance).
    fn approve(
        &mut self,
        asset: AssetId,
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
    ) -> Result<()>;
}

/// In-memory multi-asset ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: HashMap<(AssetId, AccountId), Amount>,
    allowances: HashMap<(AssetId, AccountId, AccountId), Amount>,
    supply: HashMap<AssetId, Amount>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` new units of `asset` in `to`'s balance.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if balance or supply would exceed `u128`.
    pub fn mint(&mut self, asset: AssetId, to: AccountId, amount: Amount) -> Result<()> {
        let supply = self
            .supply
            .get(&asset)
            .copied()
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or_else(|| OfferError::overflow(format!("supply of {asset}")))?;
        let balance = self
            .balance_of(asset, to)
            .checked_add(amount)
            .ok_or_else(|| OfferError::overflow(format!("balance of {to}")))?;

        self.supply.insert(asset, supply);
        self.balances.insert((asset, to), balance);
        Ok(())
    }

    /// Total units of `asset` ever minted.
    #[must_use]
    pub fn total_supply(&self, asset: AssetId) -> Amount {
        self.supply.get(&asset).copied().unwrap_or_default()
    }

    /// Sum of every account's balance of `asset`. Equals `total_supply`
    /// unless the ledger is corrupt.
    #[must_use]
    pub fn circulating(&self, asset: AssetId) -> Amount {
        self.balances
            .iter()
            .filter(|((a, _), _)| *a == asset)
            .map(|(_, amount)| *amount)
            .sum()
    }
}

impl AssetLedger for InMemoryLedger {
    fn balance_of(&self, asset: AssetId, account: AccountId) -> Amount {
        self.balances
            .get(&(asset, account))
            .copied()
            .unwrap_or_default()
    }

    fn allowance(&self, asset: AssetId, owner: AccountId, spender: AccountId) -> Amount {
        self.allowances
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn transfer(
        &mut self,
        asset: AssetId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<()> {
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(OfferError::InsufficientBalance {
                asset,
                account: from,
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(asset, to)
            .checked_add(amount)
            .ok_or_else(|| OfferError::overflow(format!("balance of {to}")))?;

        self.balances.insert((asset, from), available - amount);
        self.balances.insert((asset, to), credited);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        asset: AssetId,
        spender: AccountId,
        owner: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<()> {
        let allowed = self.allowance(asset, owner, spender);
        if allowed < amount {
            return Err(OfferError::InsufficientAllowance {
                asset,
                owner,
                spender,
                needed: amount,
                available: allowed,
            });
        }
        self.transfer(asset, owner, to, amount)?;
        self.allowances
            .insert((asset, owner, spender), allowed - amount);
        Ok(())
    }

    fn approve(
        &mut self,
        asset: AssetId,
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.allowances.insert((asset, owner, spender), amount);
        Ok(())
    }
}

impl Checkpoint for InMemoryLedger {
    type Snapshot = Self;

    fn checkpoint(&self) -> Self {
        self.clone()
    }

    fn rollback(&mut self, snapshot: Self) {
        *self = snapshot;
    }
}
