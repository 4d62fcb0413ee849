//! Global configuration, owned and changed only by the owner

use ecoctl_core::{Address, Amount, AssetRef};
use serde::{Deserialize, Serialize};

/// Process-wide settings of the engine.
///
/// `owner` and `escrow` are fixed at genesis. The remaining fields start unset
/// and may be overwritten (even back to unset) by the owner at any time; an
/// unset value makes dependent operations fail when they run, not when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub owner: Address,
    /// The only identity allowed to submit readings
    pub data_processor_caller: Address,
    pub ledger_asset: AssetRef,
    pub fine_amount: Amount,
    /// Holding identity that accumulates collected fines
    pub escrow: Address,
}

impl GlobalConfig {
    pub fn new(owner: Address, escrow: Address) -> Self {
        Self {
            owner,
            data_processor_caller: Address::unset(),
            ledger_asset: AssetRef::default(),
            fine_amount: Amount::ZERO,
            escrow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config_starts_unset() {
        let config = GlobalConfig::new(Address::from("owner"), Address::from("escrow"));
        assert!(config.data_processor_caller.is_unset());
        assert!(config.ledger_asset.is_unset());
        assert!(config.fine_amount.is_zero());
    }
}
