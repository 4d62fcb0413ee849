//! Ledger errors

use ecoctl_core::{Address, Amount, AssetRef};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Insufficient balance for {holder}: available {available}, required {required}")]
    InsufficientBalance {
        holder: Address,
        available: Amount,
        required: Amount,
    },

    #[error("Insufficient allowance from {owner} to {spender}: available {available}, required {required}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        available: Amount,
        required: Amount,
    },

    #[error("Unknown asset: {0}")]
    UnknownAsset(AssetRef),

    #[error("Balance overflow for {0}")]
    Overflow(Address),

    #[error("Ledger storage error: {0}")]
    Storage(String),
}

impl TransferError {
    /// Balance or entitlement shortfall on the paying side
    pub fn is_shortfall(&self) -> bool {
        matches!(
            self,
            TransferError::InsufficientBalance { .. } | TransferError::InsufficientAllowance { .. }
        )
    }
}

pub type LedgerResult<T> = Result<T, TransferError>;
