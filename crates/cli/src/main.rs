//! EcoCtl CLI - Main entry point

use clap::{Parser, Subcommand};
use ecoctl_cli::{commands, AppContext, Settings};
use ecoctl_core::{Address, Amount, EnterpriseId};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ecoctl")]
#[command(about = "EcoCtl - emission compliance and penalty engine", long_about = None)]
struct Cli {
    /// Settings file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory path (overrides settings)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Identity to act as (overrides ECOCTL_CALLER)
    #[arg(long)]
    caller: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the engine with a genesis record
    Init {
        /// Owner identity
        #[arg(long)]
        owner: String,
    },

    /// Register an enterprise
    Register {
        name: String,
        address: String,
        limit1: u64,
        limit2: u64,
    },

    /// Update the limits of an enterprise
    SetLimits {
        id: EnterpriseId,
        limit1: u64,
        limit2: u64,
    },

    /// Set the identity allowed to submit readings
    SetProcessor { address: String },

    /// Set the ledger asset fines are charged in
    SetAsset { asset: String },

    /// Set the fine charged per violation
    SetFine { amount: Amount },

    /// Submit one reading
    Submit {
        id: EnterpriseId,
        metric1: u64,
        metric2: u64,
    },

    /// Submit every reading in a JSON batch file
    Process { file: PathBuf },

    /// Move all collected fines to a recipient
    Withdraw { recipient: String },

    /// Show one enterprise
    Show { id: EnterpriseId },

    /// List registered enterprises
    List,

    /// Show engine configuration
    Status,

    /// Show the escrow balance
    Escrow,

    // === Ledger helpers ===

    /// Credit an identity with new funds
    Mint {
        to: String,
        amount: Amount,
        #[arg(long)]
        asset: Option<String>,
    },

    /// Grant an allowance (unlimited when no amount is given)
    Approve {
        holder: String,
        /// Spender identity (defaults to the escrow)
        #[arg(long)]
        spender: Option<String>,
        #[arg(long)]
        amount: Option<Amount>,
        #[arg(long)]
        asset: Option<String>,
    },

    /// Check the ledger balance of an identity
    Balance {
        holder: String,
        #[arg(long)]
        asset: Option<String>,
    },

    /// Audit the log (verify hash chain)
    Audit,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        settings.data_dir = data;
    }

    // Audit must work even when the log no longer verifies
    if let Commands::Audit = cli.command {
        if !commands::audit(&settings.audit_path())? {
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut ctx = AppContext::new(settings)?;
    if let Some(caller) = cli.caller {
        ctx.set_caller(Address::from(caller));
    }

    match cli.command {
        Commands::Init { owner } => {
            commands::init(ctx, &owner)?;
        }
        Commands::Register {
            name,
            address,
            limit1,
            limit2,
        } => {
            commands::register(&mut ctx, &name, &address, limit1, limit2)?;
        }
        Commands::SetLimits { id, limit1, limit2 } => {
            commands::set_limits(&mut ctx, id, limit1, limit2)?;
        }
        Commands::SetProcessor { address } => {
            commands::set_processor(&mut ctx, &address)?;
        }
        Commands::SetAsset { asset } => {
            commands::set_asset(&mut ctx, &asset)?;
        }
        Commands::SetFine { amount } => {
            commands::set_fine(&mut ctx, amount)?;
        }
        Commands::Submit { id, metric1, metric2 } => {
            commands::submit(&mut ctx, id, metric1, metric2)?;
        }
        Commands::Process { file } => {
            commands::process(&mut ctx, &file)?;
        }
        Commands::Withdraw { recipient } => {
            commands::withdraw(&mut ctx, &recipient)?;
        }
        Commands::Show { id } => {
            commands::show(&ctx, id)?;
        }
        Commands::List => {
            commands::list(&ctx)?;
        }
        Commands::Status => {
            commands::status(&ctx)?;
        }
        Commands::Escrow => {
            commands::escrow(&ctx)?;
        }
        Commands::Mint { to, amount, asset } => {
            commands::mint(&mut ctx, &to, amount, asset.as_deref())?;
        }
        Commands::Approve {
            holder,
            spender,
            amount,
            asset,
        } => {
            commands::approve(&mut ctx, &holder, spender.as_deref(), amount, asset.as_deref())?;
        }
        Commands::Balance { holder, asset } => {
            commands::balance(&ctx, &holder, asset.as_deref())?;
        }
        Commands::Audit => {}
    }

    Ok(())
}
