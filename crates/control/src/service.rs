//! Shared async access to one engine
//!
//! The engine sits behind a tokio read-write lock. Operations that change
//! state are serialized while read-only queries may run together. Records committed by each operation are published on a
//! broadcast channel for downstream consumers.

use std::sync::Arc;

use ecoctl_audit::{AuditLog, AuditRecord, AuditSink};
use ecoctl_core::{Address, Amount, AssetRef, EnterpriseId};
use ecoctl_ledger::TransferService;
use tokio::sync::{broadcast, RwLock};

use crate::access::Authenticator;
use crate::control::EcoControl;
use crate::error::{ControlError, ControlResult};
use crate::executor::SubmissionOutcome;

const CHANNEL_CAPACITY: usize = 256;

pub struct ControlService<L, S = AuditLog> {
    control: Arc<RwLock<EcoControl<L, S>>>,
    records: broadcast::Sender<AuditRecord>,
}

impl<L, S> Clone for ControlService<L, S> {
    fn clone(&self) -> Self {
        Self {
            control: Arc::clone(&self.control),
            records: self.records.clone(),
        }
    }
}

impl<L: TransferService, S: AuditSink> ControlService<L, S> {
    pub fn new(control: EcoControl<L, S>) -> Self {
        let (records, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            control: Arc::new(RwLock::new(control)),
            records,
        }
    }

    /// Receive every record committed after this call
    pub fn subscribe(&self) -> broadcast::Receiver<AuditRecord> {
        self.records.subscribe()
    }

    /// Run a read-only closure against the engine
    pub async fn query<T>(&self, f: impl FnOnce(&EcoControl<L, S>) -> T) -> T {
        let control = self.control.read().await;
        f(&control)
    }

    /// Run one engine operation under the lock and publish what it committed
    pub async fn execute<T>(
        &self,
        auth: &impl Authenticator,
        f: impl FnOnce(&mut EcoControl<L, S>, &Address) -> ControlResult<T>,
    ) -> ControlResult<T> {
        let caller = auth.caller().ok_or(ControlError::Unauthenticated)?;

        let mut control = self.control.write().await;
        let before = control.audit().records().len();
        let result = f(&mut control, &caller);

        for record in &control.audit().records()[before..] {
            // No subscribers is fine
            let _ = self.records.send(record.clone());
        }
        result
    }

    pub async fn register_enterprise(
        &self,
        auth: &impl Authenticator,
        name: &str,
        address: &Address,
        limit1: u64,
        limit2: u64,
    ) -> ControlResult<EnterpriseId> {
        self.execute(auth, |c, caller| {
            c.register_enterprise(caller, name, address, limit1, limit2)
        })
        .await
    }

    pub async fn set_enterprise_limits(
        &self,
        auth: &impl Authenticator,
        id: EnterpriseId,
        limit1: u64,
        limit2: u64,
    ) -> ControlResult<()> {
        self.execute(auth, |c, caller| c.set_enterprise_limits(caller, id, limit1, limit2))
            .await
    }

    pub async fn set_data_processor_caller(&self, auth: &impl Authenticator, processor: &Address) -> ControlResult<()> {
        self.execute(auth, |c, caller| c.set_data_processor_caller(caller, processor))
            .await
    }

    pub async fn set_ledger_asset_reference(&self, auth: &impl Authenticator, asset: &AssetRef) -> ControlResult<()> {
        self.execute(auth, |c, caller| c.set_ledger_asset_reference(caller, asset))
            .await
    }

    pub async fn set_fine_amount(&self, auth: &impl Authenticator, amount: Amount) -> ControlResult<()> {
        self.execute(auth, |c, caller| c.set_fine_amount(caller, amount)).await
    }

    pub async fn submit_reading(
        &self,
        auth: &impl Authenticator,
        id: EnterpriseId,
        metric1: u64,
        metric2: u64,
    ) -> ControlResult<SubmissionOutcome> {
        self.execute(auth, |c, caller| c.submit_reading(caller, id, metric1, metric2))
            .await
    }

    pub async fn withdraw_collected_fines(&self, auth: &impl Authenticator, recipient: &Address) -> ControlResult<Amount> {
        self.execute(auth, |c, caller| c.withdraw_collected_fines(caller, recipient))
            .await
    }

    pub async fn escrow_balance(&self) -> ControlResult<Amount> {
        self.query(|c| c.escrow_balance()).await
    }
}
