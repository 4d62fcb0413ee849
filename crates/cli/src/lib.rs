//! EcoCtl CLI - operator tooling
//!
//! Wires the engine to a JSONL audit log and a JSON ledger snapshot on disk.

pub mod commands;
pub mod context;
pub mod settings;

pub use context::AppContext;
pub use settings::Settings;
