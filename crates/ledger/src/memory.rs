//! In-memory ledger with allowances
//!
//! Balances and allowances are kept per asset. The whole ledger serializes to
//! a JSON snapshot so the CLI can persist it between runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ecoctl_core::{Address, Amount, AssetRef};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerResult, TransferError};
use crate::service::TransferService;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct AssetBook {
    balances: BTreeMap<Address, Amount>,
    /// owner -> spender -> remaining allowance
    allowances: BTreeMap<Address, BTreeMap<Address, Amount>>,
}

impl AssetBook {
    fn balance(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|by_spender| by_spender.get(spender))
            .copied()
            .unwrap_or_default()
    }
}

/// Reference [`TransferService`] held entirely in memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryLedger {
    assets: BTreeMap<AssetRef, AssetBook>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an asset with no holders. Registering twice is a no-op.
    pub fn register_asset(&mut self, asset: AssetRef) {
        self.assets.entry(asset).or_default();
    }

    pub fn has_asset(&self, asset: &AssetRef) -> bool {
        self.assets.contains_key(asset)
    }

    /// Credit new units to `to`
    pub fn mint(&mut self, asset: &AssetRef, to: &Address, amount: Amount) -> LedgerResult<Amount> {
        let book = self.book_mut(asset)?;
        let updated = book
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow(to.clone()))?;
        book.balances.insert(to.clone(), updated);
        tracing::debug!(asset = %asset, holder = %to, amount = %amount, "Minted");
        Ok(updated)
    }

    /// Grant an allowance that is never consumed
    pub fn approve_unlimited(
        &mut self,
        asset: &AssetRef,
        owner: &Address,
        spender: &Address,
    ) -> LedgerResult<()> {
        self.approve(asset, owner, spender, Amount::MAX)
    }

    /// Load a snapshot, or start empty when the file does not exist yet
    pub fn load(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path).map_err(|e| TransferError::Storage(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| TransferError::Storage(e.to_string()))
    }

    /// Write a snapshot (temp file + rename, so a crash never leaves half a file)
    pub fn save(&self, path: impl AsRef<Path>) -> LedgerResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| TransferError::Storage(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| TransferError::Storage(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| TransferError::Storage(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| TransferError::Storage(e.to_string()))
    }

    fn book(&self, asset: &AssetRef) -> LedgerResult<&AssetBook> {
        self.assets
            .get(asset)
            .ok_or_else(|| TransferError::UnknownAsset(asset.clone()))
    }

    fn book_mut(&mut self, asset: &AssetRef) -> LedgerResult<&mut AssetBook> {
        self.assets
            .get_mut(asset)
            .ok_or_else(|| TransferError::UnknownAsset(asset.clone()))
    }
}

impl TransferService for MemoryLedger {
    fn balance_of(&self, asset: &AssetRef, holder: &Address) -> LedgerResult<Amount> {
        Ok(self.book(asset)?.balance(holder))
    }

    fn allowance(&self, asset: &AssetRef, owner: &Address, spender: &Address) -> LedgerResult<Amount> {
        Ok(self.book(asset)?.allowance(owner, spender))
    }

    fn approve(&mut self, asset: &AssetRef, owner: &Address, spender: &Address, amount: Amount) -> LedgerResult<()> {
        let book = self.book_mut(asset)?;
        book.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
        tracing::debug!(asset = %asset, owner = %owner, spender = %spender, amount = %amount, "Allowance set");
        Ok(())
    }

    fn transfer(
        &mut self,
        asset: &AssetRef,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        let book = self.book_mut(asset)?;

        // Validate everything before touching any balance
        let available = book.balance(from);
        let debited = available
            .checked_sub(amount)
            .ok_or_else(|| TransferError::InsufficientBalance {
                holder: from.clone(),
                available,
                required: amount,
            })?;

        let remaining_allowance = if spender != from {
            let granted = book.allowance(from, spender);
            if granted == Amount::MAX {
                None
            } else {
                let left = granted
                    .checked_sub(amount)
                    .ok_or_else(|| TransferError::InsufficientAllowance {
                        owner: from.clone(),
                        spender: spender.clone(),
                        available: granted,
                        required: amount,
                    })?;
                Some(left)
            }
        } else {
            None
        };

        if from == to {
            if let Some(left) = remaining_allowance {
                book.allowances
                    .entry(from.clone())
                    .or_default()
                    .insert(spender.clone(), left);
            }
            return Ok(());
        }

        let credited = book
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow(to.clone()))?;

        book.balances.insert(from.clone(), debited);
        book.balances.insert(to.clone(), credited);
        if let Some(left) = remaining_allowance {
            book.allowances
                .entry(from.clone())
                .or_default()
                .insert(spender.clone(), left);
        }

        tracing::debug!(
            asset = %asset,
            from = %from,
            to = %to,
            amount = %amount,
            "Transfer applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn eco() -> AssetRef {
        AssetRef::from("ECO")
    }

    fn amount(units: u64) -> Amount {
        Amount::from_units(units)
    }

    fn funded(holder: &str, units: u64) -> MemoryLedger {
        let mut ledger = MemoryLedger::new();
        ledger.register_asset(eco());
        ledger.mint(&eco(), &Address::from(holder), amount(units)).unwrap();
        ledger
    }

    #[test]
    fn test_unknown_asset() {
        let ledger = MemoryLedger::new();
        let result = ledger.balance_of(&eco(), &Address::from("A"));
        assert_eq!(result, Err(TransferError::UnknownAsset(eco())));
    }

    #[test]
    fn test_owner_transfer_needs_no_allowance() {
        let mut ledger = funded("A", 100);
        let a = Address::from("A");
        let b = Address::from("B");

        ledger.transfer(&eco(), &a, &a, &b, amount(40)).unwrap();

        assert_eq!(ledger.balance_of(&eco(), &a).unwrap(), amount(60));
        assert_eq!(ledger.balance_of(&eco(), &b).unwrap(), amount(40));
    }

    #[test]
    fn test_spender_without_allowance_rejected() {
        let mut ledger = funded("A", 100);
        let a = Address::from("A");
        let escrow = Address::from("ESCROW");

        let err = ledger.transfer(&eco(), &escrow, &a, &escrow, amount(10)).unwrap_err();
        assert!(matches!(err, TransferError::InsufficientAllowance { .. }));
        assert!(err.is_shortfall());
        assert_eq!(ledger.balance_of(&eco(), &a).unwrap(), amount(100));
    }

    #[test]
    fn test_allowance_is_consumed() {
        let mut ledger = funded("A", 100);
        let a = Address::from("A");
        let escrow = Address::from("ESCROW");
        ledger.approve(&eco(), &a, &escrow, amount(30)).unwrap();

        ledger.transfer(&eco(), &escrow, &a, &escrow, amount(20)).unwrap();
        assert_eq!(ledger.allowance(&eco(), &a, &escrow).unwrap(), amount(10));

        let err = ledger.transfer(&eco(), &escrow, &a, &escrow, amount(20)).unwrap_err();
        assert!(matches!(err, TransferError::InsufficientAllowance { .. }));
        assert_eq!(ledger.balance_of(&eco(), &escrow).unwrap(), amount(20));
    }

    #[test]
    fn test_unlimited_allowance_not_consumed() {
        let mut ledger = funded("A", 100);
        let a = Address::from("A");
        let escrow = Address::from("ESCROW");
        ledger.approve_unlimited(&eco(), &a, &escrow).unwrap();

        ledger.transfer(&eco(), &escrow, &a, &escrow, amount(70)).unwrap();
        assert_eq!(ledger.allowance(&eco(), &a, &escrow).unwrap(), Amount::MAX);
    }

    #[test]
    fn test_insufficient_balance_changes_nothing() {
        let mut ledger = funded("A", 100);
        let a = Address::from("A");
        let escrow = Address::from("ESCROW");
        ledger.approve(&eco(), &a, &escrow, amount(500)).unwrap();

        let err = ledger.transfer(&eco(), &escrow, &a, &escrow, amount(101)).unwrap_err();
        assert!(matches!(err, TransferError::InsufficientBalance { .. }));
        assert_eq!(ledger.balance_of(&eco(), &a).unwrap(), amount(100));
        assert_eq!(ledger.allowance(&eco(), &a, &escrow).unwrap(), amount(500));
    }

    #[test]
    fn test_zero_transfer_succeeds() {
        let mut ledger = funded("A", 0);
        let a = Address::from("A");
        let b = Address::from("B");
        ledger.approve(&eco(), &a, &b, Amount::ZERO).unwrap();
        ledger.transfer(&eco(), &b, &a, &b, Amount::ZERO).unwrap();
    }

    #[test]
    fn test_fractional_amounts() {
        let mut ledger = funded("A", 1);
        let a = Address::from("A");
        let b = Address::from("B");
        let half = Amount::new(dec!(0.5)).unwrap();

        ledger.transfer(&eco(), &a, &a, &b, half).unwrap();
        assert_eq!(ledger.balance_of(&eco(), &a).unwrap(), half);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");

        let mut ledger = funded("A", 100);
        ledger
            .approve_unlimited(&eco(), &Address::from("A"), &Address::from("ESCROW"))
            .unwrap();
        ledger.save(&path).unwrap();

        let loaded = MemoryLedger::load(&path).unwrap();
        assert_eq!(loaded, ledger);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let loaded = MemoryLedger::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, MemoryLedger::new());
    }
}
