//! Application context - wires settings, ledger snapshot and audit log together
//!
//! The ledger writes its snapshot on every transfer, before the engine appends
//! the matching audit records. A crash in between leaves moved funds without
//! their audit entry, never an audited fine without the moved funds.

use anyhow::Context;
use ecoctl_audit::AuditLog;
use ecoctl_control::{Authenticator, ControlError, EcoControl};
use ecoctl_core::{Address, AssetRef};
use ecoctl_ledger::{MemoryLedger, SnapshotLedger};
use std::path::PathBuf;

use crate::settings::Settings;

enum Engine {
    /// No genesis record yet
    Fresh { ledger: SnapshotLedger, audit: AuditLog },
    Ready(EcoControl<SnapshotLedger>),
}

pub struct AppContext {
    settings: Settings,
    caller: Option<Address>,
    engine: Engine,
}

impl AppContext {
    /// Load the ledger snapshot and rebuild engine state from the audit log
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&settings.data_dir)
            .with_context(|| format!("Failed to create {}", settings.data_dir.display()))?;

        let ledger = SnapshotLedger::open(settings.ledger_path())?;
        let audit = AuditLog::open(settings.audit_path())?;

        let engine = if audit.is_empty() {
            Engine::Fresh { ledger, audit }
        } else {
            Engine::Ready(EcoControl::restore(ledger, audit)?)
        };

        let caller = settings.caller.as_deref().map(Address::from);
        Ok(Self {
            settings,
            caller,
            engine,
        })
    }

    /// Write the genesis record and configure the default asset
    pub fn init(self, owner: &Address) -> anyhow::Result<Self> {
        let Self {
            settings,
            caller,
            engine,
        } = self;

        let (mut ledger, audit) = match engine {
            Engine::Fresh { ledger, audit } => (ledger, audit),
            Engine::Ready(_) => return Err(ControlError::AlreadyInitialized.into()),
        };

        let asset = AssetRef::new(settings.default_asset.as_str());
        if !ledger.ledger().has_asset(&asset) {
            ledger.ledger_mut().register_asset(asset.clone());
        }

        let escrow = Address::new(settings.escrow.as_str());
        let mut control = EcoControl::genesis(owner.clone(), escrow, ledger, audit)?;
        control.set_ledger_asset_reference(owner, &asset)?;

        let mut ctx = Self {
            settings,
            caller,
            engine: Engine::Ready(control),
        };
        ctx.save_ledger()?;
        Ok(ctx)
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.engine, Engine::Ready(_))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_caller(&mut self, caller: Address) {
        self.caller = Some(caller);
    }

    /// Authenticated caller, or `Unauthenticated`
    pub fn require_caller(&self) -> Result<Address, ControlError> {
        self.caller().ok_or(ControlError::Unauthenticated)
    }

    pub fn control(&self) -> Result<&EcoControl<SnapshotLedger>, ControlError> {
        match &self.engine {
            Engine::Ready(control) => Ok(control),
            Engine::Fresh { .. } => Err(ControlError::NotInitialized),
        }
    }

    pub fn control_mut(&mut self) -> Result<&mut EcoControl<SnapshotLedger>, ControlError> {
        match &mut self.engine {
            Engine::Ready(control) => Ok(control),
            Engine::Fresh { .. } => Err(ControlError::NotInitialized),
        }
    }

    /// The ledger is usable before init (funding, allowances)
    pub fn ledger(&self) -> &MemoryLedger {
        match &self.engine {
            Engine::Ready(control) => control.ledger().ledger(),
            Engine::Fresh { ledger, .. } => ledger.ledger(),
        }
    }

    pub fn ledger_mut(&mut self) -> &mut MemoryLedger {
        match &mut self.engine {
            Engine::Ready(control) => control.ledger_mut().ledger_mut(),
            Engine::Fresh { ledger, .. } => ledger.ledger_mut(),
        }
    }

    /// Persist the ledger snapshot after direct setup changes (mint, approve).
    /// Engine transfers save themselves.
    pub fn save_ledger(&self) -> anyhow::Result<()> {
        let path = self.ledger_path();
        self.ledger()
            .save(&path)
            .with_context(|| format!("Failed to save ledger snapshot {}", path.display()))
    }

    pub fn audit_path(&self) -> PathBuf {
        self.settings.audit_path()
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.settings.ledger_path()
    }

    pub fn default_asset(&self) -> AssetRef {
        AssetRef::new(self.settings.default_asset.as_str())
    }
}

impl Authenticator for AppContext {
    fn caller(&self) -> Option<Address> {
        self.caller.clone()
    }
}
