//! Write-through persistence for [`MemoryLedger`]
//!
//! Every transfer and allowance change is saved to the snapshot file before
//! the call returns. A failed save puts the in-memory ledger back the way it
//! was and reports `TransferError::Storage`, so callers that audit after a
//! successful transfer never audit value movement that is not on disk.

use std::path::{Path, PathBuf};

use ecoctl_core::{Address, Amount, AssetRef};

use crate::error::LedgerResult;
use crate::memory::MemoryLedger;
use crate::service::TransferService;

#[derive(Debug)]
pub struct SnapshotLedger {
    inner: MemoryLedger,
    path: PathBuf,
}

impl SnapshotLedger {
    /// Load the snapshot at `path`, or start empty when it does not exist yet
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let inner = MemoryLedger::load(&path)?;
        Ok(Self { inner, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.inner
    }

    /// Direct access for setup (assets, minting). Call [`SnapshotLedger::save`] afterwards.
    pub fn ledger_mut(&mut self) -> &mut MemoryLedger {
        &mut self.inner
    }

    pub fn save(&self) -> LedgerResult<()> {
        self.inner.save(&self.path)
    }

    /// Apply `change` and persist it, or leave memory untouched on any failure
    fn write_through(&mut self, change: impl FnOnce(&mut MemoryLedger) -> LedgerResult<()>) -> LedgerResult<()> {
        let before = self.inner.clone();
        change(&mut self.inner)?;
        if let Err(e) = self.save() {
            tracing::error!(path = %self.path.display(), error = %e, "Ledger snapshot not saved, change discarded");
            self.inner = before;
            return Err(e);
        }
        Ok(())
    }
}

impl TransferService for SnapshotLedger {
    fn balance_of(&self, asset: &AssetRef, holder: &Address) -> LedgerResult<Amount> {
        self.inner.balance_of(asset, holder)
    }

    fn allowance(&self, asset: &AssetRef, owner: &Address, spender: &Address) -> LedgerResult<Amount> {
        self.inner.allowance(asset, owner, spender)
    }

    fn approve(&mut self, asset: &AssetRef, owner: &Address, spender: &Address, amount: Amount) -> LedgerResult<()> {
        self.write_through(|ledger| ledger.approve(asset, owner, spender, amount))
    }

    fn transfer(
        &mut self,
        asset: &AssetRef,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        self.write_through(|ledger| ledger.transfer(asset, spender, from, to, amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransferError;
    use tempfile::tempdir;

    fn eco() -> AssetRef {
        AssetRef::from("ECO")
    }

    fn funded(path: &Path) -> SnapshotLedger {
        let mut ledger = SnapshotLedger::open(path).unwrap();
        ledger.ledger_mut().register_asset(eco());
        ledger
            .ledger_mut()
            .mint(&eco(), &Address::from("A"), Amount::from_units(100))
            .unwrap();
        ledger.save().unwrap();
        ledger
    }

    #[test]
    fn test_transfer_is_on_disk_when_it_returns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let mut ledger = funded(&path);
        let a = Address::from("A");
        let b = Address::from("B");

        ledger.transfer(&eco(), &a, &a, &b, Amount::from_units(30)).unwrap();

        let reloaded = MemoryLedger::load(&path).unwrap();
        assert_eq!(reloaded.balance_of(&eco(), &b).unwrap(), Amount::from_units(30));
        assert_eq!(&reloaded, ledger.ledger());
    }

    #[test]
    fn test_failed_save_discards_transfer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let mut ledger = funded(&path);
        let a = Address::from("A");
        let b = Address::from("B");

        // A non-empty directory in place of the snapshot makes the rename fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), b"x").unwrap();

        let err = ledger.transfer(&eco(), &a, &a, &b, Amount::from_units(30)).unwrap_err();
        assert!(matches!(err, TransferError::Storage(_)));
        assert_eq!(ledger.balance_of(&eco(), &a).unwrap(), Amount::from_units(100));
        assert_eq!(ledger.balance_of(&eco(), &b).unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_rejected_transfer_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let mut ledger = funded(&path);
        let escrow = Address::from("ESCROW");

        let err = ledger
            .transfer(&eco(), &escrow, &Address::from("A"), &escrow, Amount::from_units(10))
            .unwrap_err();
        assert!(err.is_shortfall());
        assert_eq!(&MemoryLedger::load(&path).unwrap(), ledger.ledger());
    }
}
