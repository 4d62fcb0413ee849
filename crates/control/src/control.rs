//! EcoControl - the engine facade
//!
//! Owns the committed state, the value-transfer ledger and the audit sink.
//! Every mutating method takes `&mut self`, so one operation fully commits
//! or aborts before the next can start.

use chrono::Utc;
use ecoctl_audit::{AuditEvent, AuditLog, AuditSink, ConfigField};
use ecoctl_core::{Address, Amount, AssetRef, EnterpriseId, Limits, Reading};
use ecoctl_ledger::TransferService;

use crate::access::{AccessGuard, Operation};
use crate::commit::commit;
use crate::config::GlobalConfig;
use crate::error::{ControlError, ControlResult};
use crate::escrow::EscrowLedger;
use crate::executor::{PenaltyExecutor, SubmissionOutcome};
use crate::registry::{Enterprise, LatestReading};
use crate::state::{ControlState, Mutation};

pub struct EcoControl<L, S = AuditLog> {
    state: ControlState,
    ledger: L,
    audit: S,
}

impl<L: TransferService, S: AuditSink> EcoControl<L, S> {
    /// Initialize a fresh engine. The audit sink must be empty.
    pub fn genesis(owner: Address, escrow: Address, ledger: L, mut audit: S) -> ControlResult<Self> {
        if !audit.records().is_empty() {
            return Err(ControlError::AlreadyInitialized);
        }
        if owner.is_unset() {
            return Err(ControlError::InvalidAddress(owner));
        }
        if escrow.is_unset() || escrow == owner {
            return Err(ControlError::InvalidAddress(escrow));
        }

        audit.append_batch(
            vec![AuditEvent::Genesis {
                owner: owner.clone(),
                escrow: escrow.clone(),
            }],
            Utc::now(),
        )?;

        tracing::info!(owner = %owner, escrow = %escrow, "Engine initialized");
        Ok(Self {
            state: ControlState::new(GlobalConfig::new(owner, escrow)),
            ledger,
            audit,
        })
    }

    /// Rebuild an engine from an existing audit log
    pub fn restore(ledger: L, audit: S) -> ControlResult<Self> {
        let state = ControlState::replay(audit.records())?;
        tracing::info!(
            enterprises = state.registry.len(),
            records = audit.records().len(),
            "Engine restored"
        );
        Ok(Self { state, ledger, audit })
    }

    // === Registry ===

    pub fn register_enterprise(
        &mut self,
        caller: &Address,
        name: &str,
        address: &Address,
        limit1: u64,
        limit2: u64,
    ) -> ControlResult<EnterpriseId> {
        AccessGuard::authorize(&self.state.config, caller, Operation::RegisterEnterprise)?;

        let enterprise = self
            .state
            .prepare_enterprise(name, address, Limits::new(limit1, limit2))?;
        let id = enterprise.id;
        let events = vec![AuditEvent::Registered {
            id,
            name: enterprise.name.clone(),
            address: enterprise.address.clone(),
            limit1,
            limit2,
        }];

        self.commit_local(events, Mutation::Register(enterprise))?;
        tracing::info!(id = %id, address = %address, "Enterprise registered");
        Ok(id)
    }

    pub fn set_enterprise_limits(
        &mut self,
        caller: &Address,
        id: EnterpriseId,
        limit1: u64,
        limit2: u64,
    ) -> ControlResult<()> {
        AccessGuard::authorize(&self.state.config, caller, Operation::SetEnterpriseLimits)?;
        self.state.registry.get(id)?;

        let events = vec![AuditEvent::LimitsUpdated { id, limit1, limit2 }];
        let limits = Limits::new(limit1, limit2);
        self.commit_local(events, Mutation::SetLimits { id, limits })?;
        Ok(())
    }

    // === Compliance ===

    pub fn submit_reading(
        &mut self,
        caller: &Address,
        id: EnterpriseId,
        metric1: u64,
        metric2: u64,
    ) -> ControlResult<SubmissionOutcome> {
        PenaltyExecutor::new(&mut self.state, &mut self.ledger, &mut self.audit).submit(
            caller,
            id,
            Reading::new(metric1, metric2),
            Utc::now(),
        )
    }

    // === Escrow ===

    pub fn escrow_balance(&self) -> ControlResult<Amount> {
        EscrowLedger::balance(&self.ledger, &self.state.config)
    }

    pub fn withdraw_collected_fines(&mut self, caller: &Address, recipient: &Address) -> ControlResult<Amount> {
        EscrowLedger::withdraw(
            &mut self.state,
            &mut self.ledger,
            &mut self.audit,
            caller,
            recipient,
            Utc::now(),
        )
    }

    // === Configuration ===

    pub fn set_data_processor_caller(&mut self, caller: &Address, processor: &Address) -> ControlResult<()> {
        AccessGuard::authorize(&self.state.config, caller, Operation::SetDataProcessorCaller)?;
        let events = vec![AuditEvent::ConfigUpdated {
            field: ConfigField::DataProcessorCaller,
            value: processor.as_str().to_string(),
        }];
        self.commit_local(events, Mutation::SetDataProcessor(processor.clone()))?;
        Ok(())
    }

    pub fn set_ledger_asset_reference(&mut self, caller: &Address, asset: &AssetRef) -> ControlResult<()> {
        AccessGuard::authorize(&self.state.config, caller, Operation::SetLedgerAssetReference)?;
        let events = vec![AuditEvent::ConfigUpdated {
            field: ConfigField::LedgerAssetReference,
            value: asset.as_str().to_string(),
        }];
        self.commit_local(events, Mutation::SetLedgerAsset(asset.clone()))?;
        Ok(())
    }

    pub fn set_fine_amount(&mut self, caller: &Address, amount: Amount) -> ControlResult<()> {
        AccessGuard::authorize(&self.state.config, caller, Operation::SetFineAmount)?;
        let events = vec![AuditEvent::ConfigUpdated {
            field: ConfigField::FineAmount,
            value: amount.to_string(),
        }];
        self.commit_local(events, Mutation::SetFineAmount(amount))?;
        Ok(())
    }

    fn commit_local(&mut self, events: Vec<AuditEvent>, mutation: Mutation) -> ControlResult<()> {
        commit(
            &mut self.state,
            &mut self.ledger,
            &mut self.audit,
            None,
            events,
            mutation,
            Utc::now(),
        )?;
        Ok(())
    }
}

impl<L, S> EcoControl<L, S> {
    // === Queries ===

    pub fn enterprise(&self, id: EnterpriseId) -> ControlResult<&Enterprise> {
        self.state.registry.get(id)
    }

    pub fn enterprises(&self) -> impl Iterator<Item = &Enterprise> {
        self.state.registry.iter()
    }

    pub fn enterprise_address(&self, id: EnterpriseId) -> ControlResult<&Address> {
        self.state.registry.address(id)
    }

    pub fn enterprise_limits(&self, id: EnterpriseId) -> ControlResult<Limits> {
        self.state.registry.limits(id)
    }

    pub fn latest_reading(&self, id: EnterpriseId) -> ControlResult<LatestReading> {
        self.state.registry.latest_reading(id)
    }

    pub fn next_id(&self) -> EnterpriseId {
        self.state.registry.next_id()
    }

    pub fn owner(&self) -> &Address {
        &self.state.config.owner
    }

    pub fn data_processor_caller(&self) -> &Address {
        &self.state.config.data_processor_caller
    }

    pub fn fine_amount(&self) -> Amount {
        self.state.config.fine_amount
    }

    pub fn ledger_asset_reference(&self) -> &AssetRef {
        &self.state.config.ledger_asset
    }

    pub fn escrow(&self) -> &Address {
        &self.state.config.escrow
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.state.config
    }

    pub fn audit(&self) -> &S {
        &self.audit
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct access to the external ledger (setup, funding, allowances)
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn into_parts(self) -> (L, S) {
        (self.ledger, self.audit)
    }
}
