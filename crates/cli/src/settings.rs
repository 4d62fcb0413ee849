//! Operator settings
//!
//! Loaded from an optional JSON file. Every field has a default, and a few
//! can be overridden through the environment.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_DATA_DIR: &str = "ECOCTL_DATA_DIR";
pub const ENV_CALLER: &str = "ECOCTL_CALLER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding the audit log and ledger snapshot
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_audit_file")]
    pub audit_file: String,

    #[serde(default = "default_ledger_file")]
    pub ledger_file: String,

    /// Identity that collects fines; fixed at init
    #[serde(default = "default_escrow")]
    pub escrow: String,

    /// Asset created and configured by `init`, and used by the token helpers
    #[serde(default = "default_asset")]
    pub default_asset: String,

    /// Identity the CLI acts as
    #[serde(default)]
    pub caller: Option<String>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_audit_file() -> String {
    "audit.jsonl".to_string()
}

fn default_ledger_file() -> String {
    "ledger.json".to_string()
}

fn default_escrow() -> String {
    "escrow".to_string()
}

fn default_asset() -> String {
    "ECO".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            audit_file: default_audit_file(),
            ledger_file: default_ledger_file(),
            escrow: default_escrow(),
            default_asset: default_asset(),
            caller: None,
        }
    }
}

impl Settings {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// File (if any), then environment overrides
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(caller) = lookup(ENV_CALLER) {
            self.caller = Some(caller);
        }
    }

    pub fn audit_path(&self) -> PathBuf {
        self.data_dir.join(&self.audit_file)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(&self.ledger_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.audit_path(), PathBuf::from("./data/audit.jsonl"));
        assert_eq!(settings.ledger_path(), PathBuf::from("./data/ledger.json"));
        assert_eq!(settings.escrow, "escrow");
        assert_eq!(settings.default_asset, "ECO");
        assert!(settings.caller.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ecoctl.json");
        std::fs::write(&path, r#"{"escrow": "vault", "default_asset": "CO2"}"#).unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.escrow, "vault");
        assert_eq!(settings.default_asset, "CO2");
        assert_eq!(settings.audit_file, "audit.jsonl");
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = Settings::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_overrides() {
        let mut settings = Settings::default();
        settings.apply_overrides(|key| match key {
            ENV_DATA_DIR => Some("/var/lib/ecoctl".to_string()),
            ENV_CALLER => Some("owner".to_string()),
            _ => None,
        });
        assert_eq!(settings.data_dir, PathBuf::from("/var/lib/ecoctl"));
        assert_eq!(settings.caller.as_deref(), Some("owner"));
    }
}
