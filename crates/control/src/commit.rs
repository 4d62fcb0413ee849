//! Single commit boundary shared by every mutating operation
//!
//! Order: external transfer, audit append, local apply. A transfer failure
//! aborts before anything is written. An audit failure after a successful
//! transfer is undone with a compensating transfer, so callers only ever see
//! the whole operation or none of it.

use chrono::{DateTime, Utc};
use ecoctl_audit::{AuditEvent, AuditRecord, AuditSink};
use ecoctl_core::{Address, Amount, AssetRef};
use ecoctl_ledger::TransferService;

use crate::error::ControlResult;
use crate::state::{ControlState, Mutation};

/// A ledger movement that must succeed for the operation to commit
#[derive(Debug, Clone)]
pub(crate) struct PendingTransfer {
    pub asset: AssetRef,
    pub spender: Address,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

/// What a completed transfer consumed, enough to undo it
struct Receipt {
    /// Allowance `from` had granted `spender` before the transfer
    prior_allowance: Option<Amount>,
}

impl PendingTransfer {
    fn execute<L: TransferService>(&self, ledger: &mut L) -> ControlResult<Receipt> {
        let prior_allowance = if self.spender != self.from {
            Some(ledger.allowance(&self.asset, &self.from, &self.spender)?)
        } else {
            None
        };
        ledger.transfer(&self.asset, &self.spender, &self.from, &self.to, self.amount)?;
        Ok(Receipt { prior_allowance })
    }

    /// Move the funds back (the credited party authorizes its own debit)
    /// and restore the allowance the transfer consumed
    fn revert<L: TransferService>(&self, ledger: &mut L, receipt: &Receipt) {
        if let Err(e) = ledger.transfer(&self.asset, &self.to, &self.to, &self.from, self.amount) {
            tracing::error!(
                asset = %self.asset,
                from = %self.to,
                to = %self.from,
                amount = %self.amount,
                error = %e,
                "Compensating transfer failed; ledger and audit log diverge"
            );
            return;
        }

        if let Some(allowance) = receipt.prior_allowance {
            if let Err(e) = ledger.approve(&self.asset, &self.from, &self.spender, allowance) {
                tracing::error!(
                    asset = %self.asset,
                    owner = %self.from,
                    spender = %self.spender,
                    allowance = %allowance,
                    error = %e,
                    "Allowance not restored after rollback"
                );
            }
        }
    }
}

pub(crate) fn commit<L: TransferService, S: AuditSink>(
    state: &mut ControlState,
    ledger: &mut L,
    audit: &mut S,
    transfer: Option<PendingTransfer>,
    events: Vec<AuditEvent>,
    mutation: Mutation,
    at: DateTime<Utc>,
) -> ControlResult<Vec<AuditRecord>> {
    let executed = match transfer {
        Some(pending) => {
            let receipt = pending.execute(ledger)?;
            Some((pending, receipt))
        }
        None => None,
    };

    let records = match audit.append_batch(events, at) {
        Ok(records) => records,
        Err(e) => {
            tracing::error!(error = %e, "Audit append failed, rolling back");
            if let Some((pending, receipt)) = &executed {
                pending.revert(ledger, receipt);
            }
            return Err(e.into());
        }
    };

    // Mutations are validated against the same state before commit
    state.apply(mutation)?;

    for record in &records {
        tracing::info!(
            sequence = record.sequence,
            event = record.event.kind(),
            "Committed"
        );
    }
    Ok(records)
}
