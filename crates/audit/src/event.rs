//! Audit events and records

use chrono::{DateTime, Utc};
use ecoctl_core::{Address, Amount, EnterpriseId};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Which piece of global configuration a `ConfigUpdated` event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConfigField {
    DataProcessorCaller,
    LedgerAssetReference,
    FineAmount,
}

/// Domain events consumed by external monitoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Owner and escrow identities fixed at initialization
    Genesis { owner: Address, escrow: Address },

    Registered {
        id: EnterpriseId,
        name: String,
        address: Address,
        limit1: u64,
        limit2: u64,
    },

    LimitsUpdated {
        id: EnterpriseId,
        limit1: u64,
        limit2: u64,
    },

    ComplianceChecked {
        id: EnterpriseId,
        metric1: u64,
        metric2: u64,
        exceeded: bool,
    },

    FineCharged {
        id: EnterpriseId,
        address: Address,
        amount: Amount,
    },

    /// `value` is the textual form of the new setting
    ConfigUpdated { field: ConfigField, value: String },

    FinesWithdrawn { recipient: Address, amount: Amount },
}

impl AuditEvent {
    /// Enterprise the event is about, if any
    pub fn enterprise_id(&self) -> Option<EnterpriseId> {
        match self {
            AuditEvent::Registered { id, .. }
            | AuditEvent::LimitsUpdated { id, .. }
            | AuditEvent::ComplianceChecked { id, .. }
            | AuditEvent::FineCharged { id, .. } => Some(*id),
            AuditEvent::Genesis { .. }
            | AuditEvent::ConfigUpdated { .. }
            | AuditEvent::FinesWithdrawn { .. } => None,
        }
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            AuditEvent::Genesis { .. } => "genesis",
            AuditEvent::Registered { .. } => "registered",
            AuditEvent::LimitsUpdated { .. } => "limits_updated",
            AuditEvent::ComplianceChecked { .. } => "compliance_checked",
            AuditEvent::FineCharged { .. } => "fine_charged",
            AuditEvent::ConfigUpdated { .. } => "config_updated",
            AuditEvent::FinesWithdrawn { .. } => "fines_withdrawn",
        }
    }
}

/// One line of the audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub sequence: u64,
    pub prev_hash: String,
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let event = AuditEvent::ComplianceChecked {
            id: EnterpriseId::new(3),
            metric1: 150,
            metric2: 30,
            exceeded: true,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"compliance_checked\""));
        assert!(json.contains("\"exceeded\":true"));

        let parsed: AuditEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_config_field_names() {
        assert_eq!(ConfigField::FineAmount.to_string(), "fine_amount");
        assert_eq!(
            "data_processor_caller".parse::<ConfigField>().unwrap(),
            ConfigField::DataProcessorCaller
        );
        assert_eq!(
            serde_json::to_string(&ConfigField::LedgerAssetReference).unwrap(),
            "\"ledger_asset_reference\""
        );
    }

    #[test]
    fn test_enterprise_id_accessor() {
        let charged = AuditEvent::FineCharged {
            id: EnterpriseId::new(1),
            address: Address::from("plant"),
            amount: Amount::from_units(100),
        };
        assert_eq!(charged.enterprise_id(), Some(EnterpriseId::new(1)));
        assert_eq!(charged.kind(), "fine_charged");

        let config = AuditEvent::ConfigUpdated {
            field: ConfigField::FineAmount,
            value: "5".to_string(),
        };
        assert_eq!(config.enterprise_id(), None);
    }
}
