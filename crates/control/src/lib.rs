//! EcoCtl Control - compliance engine
//!
//! Registers monitored enterprises, checks submitted readings against their
//! limits and charges fines atomically through an external ledger. Every
//! committed change lands in the hash-chained audit log, which is also the
//! source of truth for rebuilding state on restart.

pub mod access;
mod commit;
pub mod config;
pub mod control;
pub mod error;
pub mod escrow;
pub mod evaluator;
pub mod executor;
pub mod registry;
pub mod service;
pub mod state;

pub use access::{AccessGuard, Authenticator, FixedCaller, Operation, Role};
pub use config::GlobalConfig;
pub use control::EcoControl;
pub use error::{ControlError, ControlResult};
pub use escrow::EscrowLedger;
pub use evaluator::{ComplianceEvaluator, Verdict};
pub use executor::{PenaltyExecutor, SubmissionOutcome};
pub use registry::{Enterprise, EnterpriseRegistry, LatestReading};
pub use service::ControlService;
pub use state::ControlState;
