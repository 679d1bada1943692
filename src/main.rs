//! Donation transfer pipeline driver
//!
//! Thin CLI collaborator around the transfer core: picks a token from the
//! catalog, takes a user-entered amount, and runs one donation transfer to
//! its terminal settlement outcome.

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(dead_code)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use donation_engine::catalog::TokenCatalog;
use donation_engine::config::Config;
use donation_engine::rpc::NodeRpc;
use donation_engine::transfer::{KeypairSigner, TransferOrchestrator};
use donation_engine::types::{SettlementOutcome, TransferRequest};
use donation_engine::wallet::WalletSession;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Catalog id or symbol of the token to donate
    #[arg(short, long)]
    token: String,

    /// Donation amount in whole-token units (e.g. "1.5")
    #[arg(short, long)]
    amount: String,

    /// Override the configured recipient address
    #[arg(long)]
    recipient: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose)?;

    info!("🚀 Starting donation transfer pipeline");
    info!("📋 Loading configuration from: {}", args.config);
    let config = load_config(&args.config)?;
    config.validate().context("Invalid configuration")?;

    info!(
        "🪙 Loading token catalog from: {}",
        config.donation.catalog_path
    );
    let catalog = TokenCatalog::from_file(&config.donation.catalog_path)?;
    info!(
        "   {} tokens listed, {} transferable",
        catalog.len(),
        catalog.transferable().count()
    );

    let token = catalog
        .find(&args.token)
        .with_context(|| format!("Token '{}' not found in catalog", args.token))?
        .clone();

    let amount: Decimal = args
        .amount
        .parse()
        .with_context(|| format!("Invalid amount '{}'", args.amount))?;

    info!("🔑 Loading wallet from: {}", config.wallet.keypair_path);
    let session =
        WalletSession::from_file(&config.wallet.keypair_path).context("Failed to load wallet")?;
    let sender = session.owner();
    info!("💼 Wallet address: {}", sender);

    info!("🌐 Connecting to RPC endpoint: {}", config.rpc.url);
    let rpc = Arc::new(NodeRpc::from_config(&config.rpc)?);
    let signer = Arc::new(KeypairSigner::new(session));

    let orchestrator = TransferOrchestrator::new(
        rpc,
        signer,
        config.confirmation.poll_interval(),
        config.confirmation.max_wait(),
    );

    let recipient = args
        .recipient
        .unwrap_or_else(|| config.donation.recipient_address.clone());

    let request = TransferRequest {
        token,
        amount,
        sender_address: sender.to_string(),
        recipient_address: recipient,
    };

    match orchestrator.execute(request).await {
        Ok(outcome) => {
            render_outcome(&outcome);
            Ok(())
        }
        Err(e) => {
            error!(category = e.category(), "❌ Transfer aborted: {e}");
            Err(e.into())
        }
    }
}

/// Render each settlement case distinctly. A timeout is "unknown", never
/// "failed": the underlying transaction may still confirm.
fn render_outcome(outcome: &SettlementOutcome) {
    match outcome {
        SettlementOutcome::Confirmed { signature } => {
            info!("✅ Donation confirmed: {signature}");
        }
        SettlementOutcome::Rejected { reason } => {
            warn!("🙅 Donation rejected in wallet: {reason}");
        }
        SettlementOutcome::Failed { ledger_error } => {
            error!("❌ Donation failed on ledger: {ledger_error}");
        }
        SettlementOutcome::TimedOut => {
            warn!(
                "⏳ Donation status unknown: the confirmation window elapsed. \
                 The transfer may still confirm; check the explorer later"
            );
        }
    }
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        "donation_engine=debug,info"
    } else {
        "donation_engine=info,warn,error"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    Ok(())
}

/// Load configuration from file with fallback to defaults
fn load_config(path: &str) -> Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file_with_env(path)
            .with_context(|| format!("Failed to load config from {}", path))
    } else {
        warn!("Config file '{}' not found, using defaults", path);
        Ok(Config::default())
    }
}
