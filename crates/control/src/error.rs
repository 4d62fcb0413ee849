//! Compliance engine errors
//!
//! Every error leaves the engine exactly as it was before the call.

use ecoctl_audit::AuditError;
use ecoctl_core::{Address, EnterpriseId};
use ecoctl_ledger::TransferError;
use thiserror::Error;

use crate::access::Operation;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Caller {caller} is not authorized for {operation}")]
    Unauthorized { operation: Operation, caller: Address },

    #[error("Caller identity could not be resolved")]
    Unauthenticated,

    #[error("Enterprise not found: {0}")]
    NotFound(EnterpriseId),

    #[error("Enterprise with address {0} already registered")]
    DuplicateAddress(Address),

    #[error("Invalid address: {0}")]
    InvalidAddress(Address),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(TransferError),

    #[error("No collected fines to withdraw")]
    NothingToWithdraw,

    #[error("Ledger error: {0}")]
    Ledger(TransferError),

    #[error("Audit log error: {0}")]
    Audit(#[from] AuditError),

    #[error("Engine already initialized")]
    AlreadyInitialized,

    #[error("Engine not initialized (no genesis record)")]
    NotInitialized,

    #[error("Replay failed at seq {sequence}: {reason}")]
    Replay { sequence: u64, reason: String },
}

impl From<TransferError> for ControlError {
    fn from(err: TransferError) -> Self {
        if err.is_shortfall() {
            ControlError::InsufficientFunds(err)
        } else {
            ControlError::Ledger(err)
        }
    }
}

pub type ControlResult<T> = Result<T, ControlError>;
