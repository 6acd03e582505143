//! StockScan loopback: the shell and the page bridged in one process.
//!
//! Runs the host bridge (with a simulated RFID reader) and the hosted bridge
//! (with an in-memory inventory) against each other, presses "start scan",
//! and prints what happened.
//!
//! # Usage
//!
//! ```text
//! stockscan-loopback [OPTIONS]
//!
//! Options:
//!   --config <PATH>            Shell config file [default: platform config dir]
//!   --tag <EPC>                Tag the reader reports; repeatable
//!   --seed <NAME:QTY[:TAG]>    Product in the page's store; repeatable
//!   --no-scanner               Simulate a shell without reader hardware
//!   --enforce-directions       Reject messages sent against their direction
//!   --register-unknown         Create a product for every unknown tag
//!   --idle-timeout-ms <MS>     Give up after this much silence [default: 500]
//! ```
//!
//! | Variable               | Flag                |
//! |------------------------|---------------------|
//! | `STOCKSCAN_CONFIG`     | `--config`          |
//! | `STOCKSCAN_TAGS`       | `--tag` (comma-separated) |
//! | `STOCKSCAN_IDLE_MS`    | `--idle-timeout-ms` |
//!
//! Log output follows `RUST_LOG`, falling back to `shell.log_level` from the
//! config file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stockscan_loopback::domain::{parse_seed, LoopbackConfig};
use stockscan_loopback::infrastructure::{run_loopback, LoopbackReport};
use stockscan_shell::infrastructure::storage::config::{default_config_path, load_config_from};
use stockscan_web::application::ScanOutcome;

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "stockscan-loopback",
    about = "Exercise the StockScan WebView bridge end to end without a WebView",
    version
)]
struct Cli {
    /// Shell config file.  Missing files mean defaults.
    #[arg(long, env = "STOCKSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// EPC the simulated reader reports once scanning starts.
    #[arg(long = "tag", env = "STOCKSCAN_TAGS", value_delimiter = ',')]
    tags: Vec<String>,

    /// Product in the page's store before the run, as `NAME:QTY[:TAG]`.
    ///
    /// Replaces the built-in Widget/Gadget seed when given.
    #[arg(long = "seed")]
    seeds: Vec<String>,

    /// Simulate a shell whose reader hardware is missing.
    #[arg(long)]
    no_scanner: bool,

    /// Reject messages travelling against their conventional direction,
    /// regardless of the config file.
    #[arg(long)]
    enforce_directions: bool,

    /// Create a product for every unknown tag.
    #[arg(long)]
    register_unknown: bool,

    #[arg(long, default_value_t = 500, env = "STOCKSCAN_IDLE_MS")]
    idle_timeout_ms: u64,
}

impl Cli {
    /// Builds the run configuration, loading the shell config file.
    ///
    /// # Errors
    ///
    /// Fails if the config file cannot be read or parsed, or if a `--seed`
    /// is malformed.
    fn into_loopback_config(self) -> anyhow::Result<LoopbackConfig> {
        let path = match self.config {
            Some(path) => path,
            None => default_config_path().context("cannot locate the shell config")?,
        };
        let mut shell = load_config_from(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        if self.enforce_directions {
            shell.bridge.enforce_directions = true;
        }

        let mut config = LoopbackConfig {
            shell,
            scanner_available: !self.no_scanner,
            register_unknown: self.register_unknown,
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
            ..LoopbackConfig::default()
        };
        if !self.tags.is_empty() {
            config.tags = self.tags;
        }
        if !self.seeds.is_empty() {
            config.seed = self
                .seeds
                .iter()
                .map(|s| parse_seed(s))
                .collect::<Result<_, _>>()
                .context("invalid --seed")?;
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_loopback_config()?;

    let fallback = config.shell.shell.log_level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();

    info!(
        "loopback starting: {} tag(s), scanner {}",
        config.tags.len(),
        if config.scanner_available { "present" } else { "absent" }
    );

    let report = run_loopback(config).await?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &LoopbackReport) {
    println!("Scans:");
    for outcome in &report.outcomes {
        match outcome {
            ScanOutcome::Restocked(p) => println!("  {} -> {} (now {})", tag_of(p), p.name, p.quantity),
            ScanOutcome::Unknown { rfid_tag } => println!("  {rfid_tag} -> unknown"),
        }
    }
    if let Some(error) = &report.panel.error {
        println!("Scanner error: {error}");
    }

    println!("Inventory:");
    for p in &report.products {
        println!(
            "  {:<24} {:>6}  {}",
            p.name,
            p.quantity,
            p.rfid_tag.as_deref().unwrap_or("-")
        );
    }

    println!(
        "Messages: {} to page, {} to shell; reader started {}x, stopped {}x",
        report.delivered_to_page,
        report.delivered_to_shell,
        report.reader_starts,
        report.reader_stops
    );
}

fn tag_of(p: &stockscan_core::domain::product::Product) -> &str {
    p.rfid_tag.as_deref().unwrap_or("-")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
