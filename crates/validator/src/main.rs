//! Closing Validator
//!
//! Runs one unanimous closing round for this validator.
//! Bridge events and time ticks are replayed from a JSON-lines script,
//! confirmation messages go to the L1 committer, and the round outcome is
//! reported once it is known.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use l1_bridge::{L1Reader, StateCommitter};
use l1_integration::{Assertion, Hash};
use l2_consensus::{ClosingContext, ClosingDriver, ResultHandoff, ValidatorCore, ValidatorState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;

use config::ValidatorConfig;

/// How this validator proposed the assertion
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// A final unanimous assertion was broadcast
    Unanimous,
    /// A tentative unanimous assertion was broadcast at a sequence number
    Offchain,
}

/// Unanimous closing round runner
#[derive(Parser, Debug)]
#[command(name = "closing-validator")]
#[command(about = "Drive a unanimous assertion closing round from bridge input", long_about = None)]
struct Args {
    /// JSON-lines file of bridge inputs
    #[arg(long)]
    script: PathBuf,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Round entry point
    #[arg(long, value_enum, default_value = "offchain")]
    mode: Mode,

    /// Sequence number of our proposal (offchain mode)
    #[arg(long, default_value = "0")]
    sequence_num: u64,

    /// Label hashed into the assertion's after-hash
    #[arg(long, default_value = "genesis")]
    after_state: String,

    /// Number of VM steps covered by the assertion
    #[arg(long, default_value = "0")]
    num_steps: u32,

    /// Override the configured grace period
    #[arg(long)]
    grace_period: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match &args.config {
        Some(path) => ValidatorConfig::load(path)
            .with_context(|| format!("loading config from {:?}", path))?,
        None => ValidatorConfig::default(),
    };
    if let Some(grace_period) = args.grace_period {
        config.grace_period = grace_period;
    }

    tracing::info!("Starting closing validator - {:?} mode", args.mode);
    tracing::info!("  Script: {:?}", args.script);
    tracing::info!("  Grace period: {}", config.grace_period);
    tracing::info!("  L1 RPC: {}", config.l1_rpc_url);
    tracing::info!("  Pending inbox messages: {}", config.inbox.len());

    let core = Arc::new(ValidatorCore::with_messages(config.inbox_messages()));
    let ctx = ClosingContext::new(config.closing_config(), core.clone());
    let assertion = Assertion::new(Hash::digest(args.after_state.as_bytes()), args.num_steps);
    tracing::info!("Proposed assertion {}", assertion.hash());

    let (handoff, result_rx) = ResultHandoff::channel();
    let state = match args.mode {
        Mode::Unanimous => ValidatorState::attempting_unanimous(ctx, assertion, handoff),
        Mode::Offchain => {
            ValidatorState::attempting_offchain(ctx, args.sequence_num, assertion, handoff)
        }
    };

    let reader = L1Reader::from_file(&args.script)
        .await?
        .with_pace(Duration::from_millis(config.tick_interval_ms));
    let committer = StateCommitter::new(&config.l1_rpc_url);

    let (tx, rx) = mpsc::channel(64);
    let feed = reader.spawn_feed(tx);
    let driver = ClosingDriver::new(state);

    let run_result = tokio::select! {
        result = driver.run(rx, &committer) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down closing validator...");
            feed.abort();
            return Ok(());
        }
    };
    feed.abort();

    let outcome = match run_result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Closing round error: {:#}", e);
            if let Ok(result) = result_rx.await {
                tracing::info!("Reported outcome: {}", result);
            }
            return Err(e);
        }
    };

    for msg in committer.sent_messages().await {
        println!("{}", serde_json::to_string(&msg)?);
    }

    match result_rx.await {
        Ok(result) => tracing::info!(
            "Round finished in {} at {}: unanimous = {}",
            outcome.final_state,
            chrono::Utc::now().to_rfc3339(),
            result
        ),
        Err(_) => tracing::warn!(
            "Round stopped in {} without an outcome ({} inputs processed)",
            outcome.final_state,
            outcome.inputs_processed
        ),
    }
    tracing::info!(
        "VM received {} messages over {} deliveries",
        core.delivered_messages().len(),
        core.delivery_count()
    );

    Ok(())
}
