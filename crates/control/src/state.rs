//! Committed engine state and replay
//!
//! State only changes through [`Mutation`]s, applied after their audit
//! records are durable. Replaying the audit log re-derives the same state.

use chrono::{DateTime, Utc};
use ecoctl_audit::{AuditEvent, AuditRecord, ConfigField};
use ecoctl_core::{Address, Amount, AssetRef, EnterpriseId, Limits, Reading};

use crate::config::GlobalConfig;
use crate::error::{ControlError, ControlResult};
use crate::registry::{Enterprise, EnterpriseRegistry};

/// A validated, not yet applied, local state change
#[derive(Debug, Clone)]
pub(crate) enum Mutation {
    Register(Enterprise),
    SetLimits { id: EnterpriseId, limits: Limits },
    RecordReading {
        id: EnterpriseId,
        reading: Reading,
        at: DateTime<Utc>,
    },
    SetDataProcessor(Address),
    SetLedgerAsset(AssetRef),
    SetFineAmount(Amount),
    Nothing,
}

#[derive(Debug)]
pub struct ControlState {
    pub config: GlobalConfig,
    pub registry: EnterpriseRegistry,
}

impl ControlState {
    pub fn new(config: GlobalConfig) -> Self {
        Self {
            config,
            registry: EnterpriseRegistry::new(),
        }
    }

    /// Validate a registration against the registry and the configuration.
    /// The escrow collects fines and can never be fined itself.
    pub fn prepare_enterprise(&self, name: &str, address: &Address, limits: Limits) -> ControlResult<Enterprise> {
        if *address == self.config.escrow {
            return Err(ControlError::InvalidAddress(address.clone()));
        }
        self.registry.prepare(name, address, limits)
    }

    pub(crate) fn apply(&mut self, mutation: Mutation) -> ControlResult<()> {
        match mutation {
            Mutation::Register(enterprise) => self.registry.insert(enterprise),
            Mutation::SetLimits { id, limits } => self.registry.set_limits(id, limits)?,
            Mutation::RecordReading { id, reading, at } => self.registry.record_reading(id, reading, at)?,
            Mutation::SetDataProcessor(address) => self.config.data_processor_caller = address,
            Mutation::SetLedgerAsset(asset) => self.config.ledger_asset = asset,
            Mutation::SetFineAmount(amount) => self.config.fine_amount = amount,
            Mutation::Nothing => {}
        }
        Ok(())
    }

    /// Rebuild state from a verified audit log. The first record must be genesis.
    pub fn replay(records: &[AuditRecord]) -> ControlResult<Self> {
        let (first, rest) = records.split_first().ok_or(ControlError::NotInitialized)?;

        let mut state = match &first.event {
            AuditEvent::Genesis { owner, escrow } => {
                Self::new(GlobalConfig::new(owner.clone(), escrow.clone()))
            }
            other => {
                return Err(replay_error(first, format!("expected genesis, found {}", other.kind())));
            }
        };

        for record in rest {
            let mutation = state.mutation_for(record).map_err(|e| in_replay(record, e))?;
            state.apply(mutation).map_err(|e| in_replay(record, e))?;
        }

        tracing::debug!(
            records = records.len(),
            enterprises = state.registry.len(),
            "State rebuilt from audit log"
        );
        Ok(state)
    }

    fn mutation_for(&self, record: &AuditRecord) -> ControlResult<Mutation> {
        let mutation = match &record.event {
            AuditEvent::Genesis { .. } => {
                return Err(ControlError::AlreadyInitialized);
            }
            AuditEvent::Registered {
                id,
                name,
                address,
                limit1,
                limit2,
            } => {
                let enterprise = self.prepare_enterprise(name, address, Limits::new(*limit1, *limit2))?;
                if enterprise.id != *id {
                    return Err(ControlError::Replay {
                        sequence: record.sequence,
                        reason: format!("expected id {}, found {}", enterprise.id, id),
                    });
                }
                Mutation::Register(enterprise)
            }
            AuditEvent::LimitsUpdated { id, limit1, limit2 } => {
                self.registry.get(*id)?;
                Mutation::SetLimits {
                    id: *id,
                    limits: Limits::new(*limit1, *limit2),
                }
            }
            AuditEvent::ComplianceChecked {
                id, metric1, metric2, ..
            } => {
                self.registry.get(*id)?;
                Mutation::RecordReading {
                    id: *id,
                    reading: Reading::new(*metric1, *metric2),
                    at: record.timestamp,
                }
            }
            AuditEvent::ConfigUpdated { field, value } => match field {
                ConfigField::DataProcessorCaller => Mutation::SetDataProcessor(Address::new(value.as_str())),
                ConfigField::LedgerAssetReference => Mutation::SetLedgerAsset(AssetRef::new(value.as_str())),
                ConfigField::FineAmount => {
                    let amount = value.parse::<Amount>().map_err(|e| ControlError::Replay {
                        sequence: record.sequence,
                        reason: e.to_string(),
                    })?;
                    Mutation::SetFineAmount(amount)
                }
            },
            AuditEvent::FineCharged { id, .. } => {
                self.registry.get(*id)?;
                Mutation::Nothing
            }
            AuditEvent::FinesWithdrawn { .. } => Mutation::Nothing,
        };
        Ok(mutation)
    }
}

fn replay_error(record: &AuditRecord, reason: String) -> ControlError {
    ControlError::Replay {
        sequence: record.sequence,
        reason,
    }
}

fn in_replay(record: &AuditRecord, err: ControlError) -> ControlError {
    match err {
        ControlError::Replay { .. } => err,
        other => replay_error(record, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoctl_audit::{AuditLog, AuditSink};

    fn log_with(events: Vec<AuditEvent>) -> AuditLog {
        let mut log = AuditLog::in_memory();
        log.append_batch(events, Utc::now()).unwrap();
        log
    }

    fn genesis() -> AuditEvent {
        AuditEvent::Genesis {
            owner: Address::from("owner"),
            escrow: Address::from("escrow"),
        }
    }

    fn registered(id: u64, address: &str) -> AuditEvent {
        AuditEvent::Registered {
            id: EnterpriseId::new(id),
            name: format!("Plant {id}"),
            address: Address::from(address),
            limit1: 100,
            limit2: 20,
        }
    }

    #[test]
    fn test_replay_requires_genesis() {
        assert!(matches!(ControlState::replay(&[]), Err(ControlError::NotInitialized)));

        let log = log_with(vec![registered(0, "a")]);
        assert!(matches!(
            ControlState::replay(log.records()),
            Err(ControlError::Replay { sequence: 1, .. })
        ));
    }

    #[test]
    fn test_replay_rebuilds_registry_and_config() {
        let log = log_with(vec![
            genesis(),
            registered(0, "a"),
            registered(1, "b"),
            AuditEvent::LimitsUpdated {
                id: EnterpriseId::new(1),
                limit1: 5,
                limit2: 6,
            },
            AuditEvent::ComplianceChecked {
                id: EnterpriseId::new(0),
                metric1: 50,
                metric2: 10,
                exceeded: false,
            },
            AuditEvent::ConfigUpdated {
                field: ConfigField::DataProcessorCaller,
                value: "processor".to_string(),
            },
            AuditEvent::ConfigUpdated {
                field: ConfigField::FineAmount,
                value: "100".to_string(),
            },
            AuditEvent::ConfigUpdated {
                field: ConfigField::LedgerAssetReference,
                value: "ECO".to_string(),
            },
        ]);

        let state = ControlState::replay(log.records()).unwrap();

        assert_eq!(state.registry.len(), 2);
        assert_eq!(state.registry.limits(EnterpriseId::new(1)).unwrap(), Limits::new(5, 6));
        let latest = state.registry.latest_reading(EnterpriseId::new(0)).unwrap();
        assert_eq!(latest.reading, Reading::new(50, 10));
        assert_eq!(latest.recorded_at, Some(log.records()[4].timestamp));
        assert_eq!(state.config.data_processor_caller, Address::from("processor"));
        assert_eq!(state.config.fine_amount, Amount::from_units(100));
        assert_eq!(state.config.ledger_asset, AssetRef::from("ECO"));
        assert_eq!(state.config.owner, Address::from("owner"));
    }

    #[test]
    fn test_replay_rejects_out_of_order_ids() {
        let log = log_with(vec![genesis(), registered(1, "a")]);
        assert!(matches!(
            ControlState::replay(log.records()),
            Err(ControlError::Replay { sequence: 2, .. })
        ));
    }

    #[test]
    fn test_replay_rejects_unknown_enterprise() {
        let log = log_with(vec![
            genesis(),
            AuditEvent::LimitsUpdated {
                id: EnterpriseId::new(7),
                limit1: 1,
                limit2: 1,
            },
        ]);
        assert!(ControlState::replay(log.records()).is_err());
    }

    #[test]
    fn test_replay_rejects_second_genesis() {
        let log = log_with(vec![genesis(), genesis()]);
        assert!(matches!(
            ControlState::replay(log.records()),
            Err(ControlError::Replay { sequence: 2, .. })
        ));
    }

    #[test]
    fn test_replay_rejects_escrow_as_enterprise() {
        let log = log_with(vec![genesis(), registered(0, "escrow")]);
        assert!(matches!(
            ControlState::replay(log.records()),
            Err(ControlError::Replay { sequence: 2, .. })
        ));
    }
}
