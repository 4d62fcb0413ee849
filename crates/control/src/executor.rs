//! Penalty executor - the compliance-check transaction
//!
//! ```text
//! authorize ──► load ──► evaluate ──┬─ compliant ─────────────────► commit
//!                                   └─ exceeded ──► transfer fine ─► commit
//!                                                      │ fails
//!                                                      ▼
//!                                                    abort (nothing recorded)
//! ```

use chrono::{DateTime, Utc};
use ecoctl_audit::{AuditEvent, AuditSink};
use ecoctl_core::{Address, Amount, EnterpriseId, Reading};
use ecoctl_ledger::TransferService;

use crate::access::{AccessGuard, Operation};
use crate::commit::{commit, PendingTransfer};
use crate::error::ControlResult;
use crate::evaluator::ComplianceEvaluator;
use crate::state::{ControlState, Mutation};

/// Result of a committed compliance check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub id: EnterpriseId,
    pub reading: Reading,
    pub exceeded: bool,
    /// Amount moved to escrow, when a fine was charged
    pub fine: Option<Amount>,
    pub recorded_at: DateTime<Utc>,
}

pub struct PenaltyExecutor<'a, L, S> {
    state: &'a mut ControlState,
    ledger: &'a mut L,
    audit: &'a mut S,
}

impl<'a, L: TransferService, S: AuditSink> PenaltyExecutor<'a, L, S> {
    pub fn new(state: &'a mut ControlState, ledger: &'a mut L, audit: &'a mut S) -> Self {
        Self { state, ledger, audit }
    }

    pub fn submit(
        &mut self,
        caller: &Address,
        id: EnterpriseId,
        reading: Reading,
        at: DateTime<Utc>,
    ) -> ControlResult<SubmissionOutcome> {
        AccessGuard::authorize(&self.state.config, caller, Operation::SubmitReading)?;

        let enterprise = self.state.registry.get(id)?;
        let verdict = ComplianceEvaluator::evaluate(reading, enterprise.limits);
        let exceeded = verdict.exceeded();

        tracing::debug!(
            id = %id,
            metric1 = reading.metric1,
            metric2 = reading.metric2,
            limit1 = enterprise.limits.metric1,
            limit2 = enterprise.limits.metric2,
            exceeded,
            "Reading evaluated"
        );

        let mut events = vec![AuditEvent::ComplianceChecked {
            id,
            metric1: reading.metric1,
            metric2: reading.metric2,
            exceeded,
        }];

        let transfer = if exceeded {
            let config = &self.state.config;
            events.push(AuditEvent::FineCharged {
                id,
                address: enterprise.address.clone(),
                amount: config.fine_amount,
            });
            Some(PendingTransfer {
                asset: config.ledger_asset.clone(),
                spender: config.escrow.clone(),
                from: enterprise.address.clone(),
                to: config.escrow.clone(),
                amount: config.fine_amount,
            })
        } else {
            None
        };
        let fine = transfer.as_ref().map(|t| t.amount);

        let mutation = Mutation::RecordReading { id, reading, at };

        if let Err(e) = commit(&mut *self.state, &mut *self.ledger, &mut *self.audit, transfer, events, mutation, at) {
            tracing::warn!(id = %id, error = %e, "Compliance check aborted");
            return Err(e);
        }

        if let Some(amount) = fine {
            tracing::info!(id = %id, amount = %amount, "Fine charged");
        }

        Ok(SubmissionOutcome {
            id,
            reading,
            exceeded,
            fine,
            recorded_at: at,
        })
    }
}
