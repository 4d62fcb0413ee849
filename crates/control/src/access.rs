//! Access guard - role check before any mutation

use ecoctl_core::Address;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::config::GlobalConfig;
use crate::error::{ControlError, ControlResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Owner,
    DataProcessor,
}

/// Every mutating operation of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    RegisterEnterprise,
    SetEnterpriseLimits,
    SetDataProcessorCaller,
    SetLedgerAssetReference,
    SetFineAmount,
    WithdrawCollectedFines,
    SubmitReading,
}

impl Operation {
    pub fn required_role(&self) -> Role {
        match self {
            Operation::SubmitReading => Role::DataProcessor,
            Operation::RegisterEnterprise
            | Operation::SetEnterpriseLimits
            | Operation::SetDataProcessorCaller
            | Operation::SetLedgerAssetReference
            | Operation::SetFineAmount
            | Operation::WithdrawCollectedFines => Role::Owner,
        }
    }
}

/// Resolves the identity behind a call. The engine trusts the result as-is.
pub trait Authenticator {
    fn caller(&self) -> Option<Address>;
}

/// Authenticator that always reports the same identity
#[derive(Debug, Clone)]
pub struct FixedCaller(pub Address);

impl Authenticator for FixedCaller {
    fn caller(&self) -> Option<Address> {
        if self.0.is_unset() {
            None
        } else {
            Some(self.0.clone())
        }
    }
}

pub struct AccessGuard;

impl AccessGuard {
    /// Identity currently holding `role`
    pub fn holder(config: &GlobalConfig, role: Role) -> &Address {
        match role {
            Role::Owner => &config.owner,
            Role::DataProcessor => &config.data_processor_caller,
        }
    }

    /// Fails with `Unauthorized` unless `caller` holds the role `operation` needs.
    /// An unset role holder matches nobody.
    pub fn authorize(config: &GlobalConfig, caller: &Address, operation: Operation) -> ControlResult<()> {
        let holder = Self::holder(config, operation.required_role());

        if holder.is_unset() || holder != caller {
            tracing::warn!(caller = %caller, operation = %operation, "Unauthorized call rejected");
            return Err(ControlError::Unauthorized {
                operation,
                caller: caller.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn config() -> GlobalConfig {
        let mut config = GlobalConfig::new(Address::from("owner"), Address::from("escrow"));
        config.data_processor_caller = Address::from("processor");
        config
    }

    #[test]
    fn test_role_table() {
        for op in Operation::iter() {
            let expected = if op == Operation::SubmitReading {
                Role::DataProcessor
            } else {
                Role::Owner
            };
            assert_eq!(op.required_role(), expected, "{op}");
        }
    }

    #[test]
    fn test_owner_cannot_submit_readings() {
        let result = AccessGuard::authorize(&config(), &Address::from("owner"), Operation::SubmitReading);
        assert!(matches!(result, Err(ControlError::Unauthorized { .. })));
    }

    #[test]
    fn test_processor_cannot_administer() {
        let processor = Address::from("processor");
        for op in Operation::iter().filter(|op| op.required_role() == Role::Owner) {
            assert!(AccessGuard::authorize(&config(), &processor, op).is_err());
        }
        assert!(AccessGuard::authorize(&config(), &processor, Operation::SubmitReading).is_ok());
    }

    #[test]
    fn test_unset_processor_matches_nobody() {
        let mut config = config();
        config.data_processor_caller = Address::unset();
        let result = AccessGuard::authorize(&config, &Address::unset(), Operation::SubmitReading);
        assert!(matches!(result, Err(ControlError::Unauthorized { .. })));
    }

    #[test]
    fn test_fixed_caller() {
        assert_eq!(FixedCaller(Address::from("owner")).caller(), Some(Address::from("owner")));
        assert_eq!(FixedCaller(Address::unset()).caller(), None);
    }
}
