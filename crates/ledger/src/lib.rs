//! EcoCtl Ledger - value-transfer boundary
//!
//! The compliance engine never moves funds itself. It talks to a
//! [`TransferService`], which must apply each transfer all-or-nothing.
//!
//! [`MemoryLedger`] is the in-process implementation used by the CLI and the
//! test suites: balances per asset, pre-granted allowances, mint for setup.
//! [`SnapshotLedger`] wraps it with a JSON snapshot saved on every change.

pub mod error;
pub mod memory;
pub mod service;
pub mod snapshot;

pub use error::{LedgerResult, TransferError};
pub use memory::MemoryLedger;
pub use service::TransferService;
pub use snapshot::SnapshotLedger;
