//! CLI commands

use anyhow::Context;
use ecoctl_audit::{verify_chain, AuditLog};
use ecoctl_core::{Address, Amount, AssetRef, EnterpriseId};
use ecoctl_ledger::TransferService;
use serde::Deserialize;
use std::path::Path;

use crate::context::AppContext;

/// One entry of a batch file for `process`
#[derive(Debug, Clone, Deserialize)]
pub struct ReadingSubmission {
    pub id: EnterpriseId,
    pub metric1: u64,
    pub metric2: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSummary {
    pub submitted: usize,
    pub fined: usize,
    pub failed: usize,
}

/// Initialize the engine with a genesis record
pub fn init(ctx: AppContext, owner: &str) -> anyhow::Result<AppContext> {
    let owner = Address::from(owner);
    let ctx = ctx.init(&owner)?;
    let control = ctx.control()?;

    println!("✅ Initialized");
    println!("   Owner:  {}", control.owner());
    println!("   Escrow: {}", control.escrow());
    println!("   Asset:  {}", control.ledger_asset_reference());
    Ok(ctx)
}

pub fn register(ctx: &mut AppContext, name: &str, address: &str, limit1: u64, limit2: u64) -> anyhow::Result<EnterpriseId> {
    let caller = ctx.require_caller()?;
    let address = Address::from(address);
    let id = ctx
        .control_mut()?
        .register_enterprise(&caller, name, &address, limit1, limit2)?;

    println!("✅ Registered {} ({}) as enterprise {}", name, address, id);
    Ok(id)
}

pub fn set_limits(ctx: &mut AppContext, id: EnterpriseId, limit1: u64, limit2: u64) -> anyhow::Result<()> {
    let caller = ctx.require_caller()?;
    ctx.control_mut()?.set_enterprise_limits(&caller, id, limit1, limit2)?;

    println!("✅ Limits for enterprise {} set to ({}, {})", id, limit1, limit2);
    Ok(())
}

pub fn set_processor(ctx: &mut AppContext, processor: &str) -> anyhow::Result<()> {
    let caller = ctx.require_caller()?;
    let processor = Address::from(processor);
    ctx.control_mut()?.set_data_processor_caller(&caller, &processor)?;

    println!("✅ Data processor set to {}", processor);
    Ok(())
}

pub fn set_asset(ctx: &mut AppContext, asset: &str) -> anyhow::Result<()> {
    let caller = ctx.require_caller()?;
    let asset = AssetRef::from(asset);
    ctx.control_mut()?.set_ledger_asset_reference(&caller, &asset)?;

    println!("✅ Ledger asset set to {}", asset);
    Ok(())
}

pub fn set_fine(ctx: &mut AppContext, amount: Amount) -> anyhow::Result<()> {
    let caller = ctx.require_caller()?;
    ctx.control_mut()?.set_fine_amount(&caller, amount)?;

    println!("✅ Fine amount set to {}", amount);
    Ok(())
}

pub fn submit(ctx: &mut AppContext, id: EnterpriseId, metric1: u64, metric2: u64) -> anyhow::Result<()> {
    let caller = ctx.require_caller()?;
    let outcome = ctx
        .control_mut()?
        .submit_reading(&caller, id, metric1, metric2)?;

    match outcome.fine {
        Some(fine) => println!(
            "⚠️  Enterprise {} exceeded its limits with {}: fined {}",
            id, outcome.reading, fine
        ),
        None => println!("✅ Enterprise {} compliant with {}", id, outcome.reading),
    }
    Ok(())
}

/// Submit every reading in a JSON batch file. Failures are logged and skipped.
pub fn process(ctx: &mut AppContext, file: &Path) -> anyhow::Result<ProcessSummary> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read batch file {}", file.display()))?;
    let batch: Vec<ReadingSubmission> =
        serde_json::from_str(&content).with_context(|| format!("Invalid batch file {}", file.display()))?;

    let caller = ctx.require_caller()?;
    let mut summary = ProcessSummary::default();

    for item in &batch {
        let result = ctx
            .control_mut()?
            .submit_reading(&caller, item.id, item.metric1, item.metric2);
        match result {
            Ok(outcome) => {
                summary.submitted += 1;
                if outcome.fine.is_some() {
                    summary.fined += 1;
                }
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(id = %item.id, error = %e, "Reading rejected");
            }
        }
    }

    println!(
        "✅ Processed {} readings: {} submitted, {} fined, {} failed",
        batch.len(),
        summary.submitted,
        summary.fined,
        summary.failed
    );
    Ok(summary)
}

pub fn withdraw(ctx: &mut AppContext, recipient: &str) -> anyhow::Result<Amount> {
    let caller = ctx.require_caller()?;
    let recipient = Address::from(recipient);
    let amount = ctx
        .control_mut()?
        .withdraw_collected_fines(&caller, &recipient)?;

    println!("✅ Withdrew {} to {}", amount, recipient);
    Ok(amount)
}

pub fn show(ctx: &AppContext, id: EnterpriseId) -> anyhow::Result<()> {
    let enterprise = ctx.control()?.enterprise(id)?;

    println!("Enterprise {}", enterprise.id);
    println!("   Name:    {}", enterprise.name);
    println!("   Address: {}", enterprise.address);
    println!(
        "   Limits:  ({}, {})",
        enterprise.limits.metric1, enterprise.limits.metric2
    );
    match enterprise.latest_reading_time {
        Some(at) => println!("   Latest:  {} at {}", enterprise.latest_reading, at.to_rfc3339()),
        None => println!("   Latest:  none"),
    }
    Ok(())
}

pub fn list(ctx: &AppContext) -> anyhow::Result<()> {
    let control = ctx.control()?;
    if control.next_id() == EnterpriseId::FIRST {
        println!("No enterprises registered");
        return Ok(());
    }

    println!("{:<6} {:<24} {:<24} {:>10} {:>10}", "ID", "NAME", "ADDRESS", "LIMIT1", "LIMIT2");
    for enterprise in control.enterprises() {
        println!(
            "{:<6} {:<24} {:<24} {:>10} {:>10}",
            enterprise.id, enterprise.name, enterprise.address, enterprise.limits.metric1, enterprise.limits.metric2
        );
    }
    Ok(())
}

pub fn status(ctx: &AppContext) -> anyhow::Result<()> {
    let control = ctx.control()?;

    println!("Owner:           {}", control.owner());
    println!("Data processor:  {}", control.data_processor_caller());
    println!("Ledger asset:    {}", control.ledger_asset_reference());
    println!("Fine amount:     {}", control.fine_amount());
    println!("Escrow:          {}", control.escrow());
    println!("Next id:         {}", control.next_id());
    println!("Audit records:   {}", control.audit().len());
    Ok(())
}

pub fn escrow(ctx: &AppContext) -> anyhow::Result<Amount> {
    let control = ctx.control()?;
    let balance = control.escrow_balance()?;

    println!("Escrow {} holds {} {}", control.escrow(), balance, control.ledger_asset_reference());
    Ok(balance)
}

// === Ledger helpers ===

pub fn mint(ctx: &mut AppContext, to: &str, amount: Amount, asset: Option<&str>) -> anyhow::Result<()> {
    let asset = asset.map_or_else(|| ctx.default_asset(), AssetRef::from);
    let to = Address::from(to);

    let ledger = ctx.ledger_mut();
    if !ledger.has_asset(&asset) {
        ledger.register_asset(asset.clone());
    }
    let balance = ledger.mint(&asset, &to, amount)?;
    ctx.save_ledger()?;

    println!("✅ Minted {} {} to {} (balance: {})", amount, asset, to, balance);
    Ok(())
}

/// Grant `spender` an allowance over `holder`'s funds; no amount means unlimited
pub fn approve(
    ctx: &mut AppContext,
    holder: &str,
    spender: Option<&str>,
    amount: Option<Amount>,
    asset: Option<&str>,
) -> anyhow::Result<()> {
    let asset = asset.map_or_else(|| ctx.default_asset(), AssetRef::from);
    let holder = Address::from(holder);
    let spender = Address::from(spender.unwrap_or(ctx.settings().escrow.as_str()));

    let ledger = ctx.ledger_mut();
    match amount {
        Some(amount) => ledger.approve(&asset, &holder, &spender, amount)?,
        None => ledger.approve_unlimited(&asset, &holder, &spender)?,
    }
    ctx.save_ledger()?;

    match amount {
        Some(amount) => println!("✅ {} allows {} to spend {} {}", holder, spender, amount, asset),
        None => println!("✅ {} allows {} to spend any {}", holder, spender, asset),
    }
    Ok(())
}

pub fn balance(ctx: &AppContext, holder: &str, asset: Option<&str>) -> anyhow::Result<Amount> {
    let asset = asset.map_or_else(|| ctx.default_asset(), AssetRef::from);
    let holder = Address::from(holder);
    let balance = ctx.ledger().balance_of(&asset, &holder)?;

    println!("{}: {} {}", holder, balance, asset);
    Ok(balance)
}

/// Verify the audit log hash chain without loading engine state
pub fn audit(path: &Path) -> anyhow::Result<bool> {
    if !path.exists() {
        println!("No audit log at {}", path.display());
        return Ok(true);
    }

    let records = AuditLog::read_file(path)?;
    match verify_chain(&records) {
        Ok(()) => {
            println!("✅ Hash chain verified ({} records)", records.len());
            Ok(true)
        }
        Err(e) => {
            println!("❌ Hash chain broken: {}", e);
            Ok(false)
        }
    }
}
