//! The value-transfer interface consumed by the compliance engine

use ecoctl_core::{Address, Amount, AssetRef};

use crate::error::LedgerResult;

/// Atomic debit/credit service.
///
/// `transfer` either moves exactly `amount` from `from` to `to` or changes
/// nothing. When `spender` differs from `from`, the spender needs an allowance
/// pre-granted by `from`; the ledger consumes it as part of the same transfer.
pub trait TransferService {
    fn balance_of(&self, asset: &AssetRef, holder: &Address) -> LedgerResult<Amount>;

    /// Remaining amount `spender` may move out of `owner`'s balance
    fn allowance(&self, asset: &AssetRef, owner: &Address, spender: &Address) -> LedgerResult<Amount>;

    /// Set the allowance `owner` grants to `spender`, replacing any previous one
    fn approve(&mut self, asset: &AssetRef, owner: &Address, spender: &Address, amount: Amount) -> LedgerResult<()>;

    fn transfer(
        &mut self,
        asset: &AssetRef,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()>;
}

impl<T: TransferService + ?Sized> TransferService for Box<T> {
    fn balance_of(&self, asset: &AssetRef, holder: &Address) -> LedgerResult<Amount> {
        (**self).balance_of(asset, holder)
    }

    fn allowance(&self, asset: &AssetRef, owner: &Address, spender: &Address) -> LedgerResult<Amount> {
        (**self).allowance(asset, owner, spender)
    }

    fn approve(&mut self, asset: &AssetRef, owner: &Address, spender: &Address, amount: Amount) -> LedgerResult<()> {
        (**self).approve(asset, owner, spender, amount)
    }

    fn transfer(
        &mut self,
        asset: &AssetRef,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        (**self).transfer(asset, spender, from, to, amount)
    }
}
