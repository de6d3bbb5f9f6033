//! Budget updater CLI entry point.
//!
//! This binary is the composition root for the system. Responsibilities:
//!
//! 1. **Parse configuration**: load the TOML file and validate the policy and
//!    column mapping before any remote call is made.
//! 2. **Wire observability**: configure `tracing-subscriber` with a human or
//!    JSON layer and, when an endpoint is configured, an OpenTelemetry OTLP
//!    exporter. All spans and events from every crate flow through it.
//! 3. **Construct infrastructure**: create the [`ads::RestAdsClient`] and
//!    inject it into [`nodes::BudgetUpdater`].
//! 4. **Run**: read the input table, execute one run, and write the audit
//!    table as JSON. Ctrl-C cancels the run between remote calls.

mod config;
mod telemetry;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use ads::RestAdsClient;
use nodes::{BudgetUpdater, InputTable, TracingProgress};
use pipeline::ExecutionMode;

use crate::config::CliConfig;

#[derive(Debug, Parser)]
#[command(name = "budget-updater", version, about = "Reallocate campaign budgets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute budget changes for the input rows and preview or apply them.
    Run {
        /// Path to the TOML configuration file.
        #[arg(long)]
        config: PathBuf,
        /// JSON array of input rows.
        #[arg(long)]
        input: PathBuf,
        /// Submit the changes instead of previewing them.
        #[arg(long)]
        apply: bool,
        /// Where to write the audit table; stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            config,
            input,
            apply,
            output,
        } => run(&config, &input, apply, output.as_deref()).await,
    }
}

async fn run(
    config_path: &Path,
    input_path: &Path,
    apply: bool,
    output: Option<&Path>,
) -> Result<()> {
    let mut config = CliConfig::load(config_path)?;
    if apply {
        config.policy.execution_mode = ExecutionMode::Apply;
    }
    let _telemetry = telemetry::init(&config.observability)?;

    let policy = config.policy.validate().context("invalid [policy] section")?;
    let customer_id = config.connection.customer_id()?;
    let client = RestAdsClient::new(config.connection.resolve()?)
        .context("creating advertising API client")?;
    let updater = BudgetUpdater::new(Arc::new(client), customer_id, config.columns, policy)
        .context("invalid [columns] section")?;

    let table = read_table(input_path)?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; cancelling after the current call");
                cancel.cancel();
            }
        }
    });

    let report = match updater.run(&table, &TracingProgress, &cancel).await {
        Ok(report) => report,
        Err(err) => {
            error!(error = %err, "Run failed");
            return Err(err.into());
        }
    };

    info!(
        run_id = %report.run_id,
        mode = %report.execution_mode,
        counts = ?report.status_counts(),
        "Budget updater finished"
    );
    write_report(&report.audit_rows(), output)
}

fn read_table(path: &Path) -> Result<InputTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading input table {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("input table {} is not a JSON array of objects", path.display()))
}

fn write_report<T: serde::Serialize>(rows: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(rows).context("serializing audit table")?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing audit table {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
