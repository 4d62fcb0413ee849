//! Escrow ledger
//!
//! The collected-fines balance is never stored locally; it is always read
//! from the value-transfer ledger for the escrow identity.

use chrono::{DateTime, Utc};
use ecoctl_audit::{AuditEvent, AuditSink};
use ecoctl_core::{Address, Amount};
use ecoctl_ledger::TransferService;

use crate::access::{AccessGuard, Operation};
use crate::commit::{commit, PendingTransfer};
use crate::config::GlobalConfig;
use crate::error::{ControlError, ControlResult};
use crate::state::{ControlState, Mutation};

pub struct EscrowLedger;

impl EscrowLedger {
    pub fn balance<L: TransferService>(ledger: &L, config: &GlobalConfig) -> ControlResult<Amount> {
        Ok(ledger.balance_of(&config.ledger_asset, &config.escrow)?)
    }

    /// Move the entire escrow balance to `recipient` in one transfer
    pub(crate) fn withdraw<L: TransferService, S: AuditSink>(
        state: &mut ControlState,
        ledger: &mut L,
        audit: &mut S,
        caller: &Address,
        recipient: &Address,
        at: DateTime<Utc>,
    ) -> ControlResult<Amount> {
        AccessGuard::authorize(&state.config, caller, Operation::WithdrawCollectedFines)?;

        let config = &state.config;
        if recipient.is_unset() || *recipient == config.escrow {
            return Err(ControlError::InvalidAddress(recipient.clone()));
        }

        let amount = Self::balance(ledger, config)?;
        if amount.is_zero() {
            return Err(ControlError::NothingToWithdraw);
        }

        let transfer = PendingTransfer {
            asset: config.ledger_asset.clone(),
            spender: config.escrow.clone(),
            from: config.escrow.clone(),
            to: recipient.clone(),
            amount,
        };
        let events = vec![AuditEvent::FinesWithdrawn {
            recipient: recipient.clone(),
            amount,
        }];

        commit(state, ledger, audit, Some(transfer), events, Mutation::Nothing, at)?;

        tracing::info!(recipient = %recipient, amount = %amount, "Collected fines withdrawn");
        Ok(amount)
    }
}
