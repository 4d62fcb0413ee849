//! EcoCtl Audit Log
//!
//! Every committed state change produces one or more [`AuditEvent`]s. They
//! are wrapped in [`AuditRecord`]s that carry a sequence number and a SHA-256
//! hash chain, and appended to a JSONL file that is never rewritten.
//!
//! ```text
//! seq 1  prev=GENESIS  hash=h1   Genesis
//! seq 2  prev=h1       hash=h2   Registered
//! seq 3  prev=h2       hash=h3   ComplianceChecked
//! seq 4  prev=h3       hash=h4   FineCharged
//! ```
//!
//! The registry and configuration can be rebuilt from the records alone.

pub mod error;
pub mod event;
pub mod hash;
pub mod log;

pub use error::{AuditError, AuditResult};
pub use event::{AuditEvent, AuditRecord, ConfigField};
pub use hash::{verify_chain, ChainError, GENESIS_HASH};
pub use log::{AuditLog, AuditSink};
