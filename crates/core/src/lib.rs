//! EcoCtl Core - Domain types
//!
//! Value types shared by every EcoCtl crate:
//! - `Address`: byte-exact external identity (enterprise, owner, escrow)
//! - `AssetRef`: which ledger asset penalties are paid in
//! - `Amount`: non-negative decimal for fines and balances
//! - `EnterpriseId`, `Limits`, `Reading`: the monitored-entity vocabulary

pub mod amount;
pub mod enterprise;
pub mod identity;

pub use amount::{Amount, AmountError};
pub use enterprise::{EnterpriseId, Limits, Reading};
pub use identity::{Address, AssetRef};
