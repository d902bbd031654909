use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use ridehail::application::platform::Platform;
use ridehail::domain::money::Percentage;
use ridehail::domain::pricing::PaymentSettings;
use ridehail::interfaces::csv::command_reader::CommandReader;
use ridehail::interfaces::csv::ledger_writer::{LedgerWriter, StatementRow, UserRow, ride_rows};
use ridehail::interfaces::csv::rule_reader::RuleReader;
use ridehail::interfaces::csv::user_reader::UserReader;
use ridehail::interfaces::script::ScriptRunner;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Report {
    Users,
    Rides,
    Drivers,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ride command script (CSV)
    script: PathBuf,

    /// Seed users CSV: id, role, name, vehicle, wallet, online
    #[arg(long)]
    users: Option<PathBuf>,

    /// Pricing rules CSV replacing the defaults: id, region, base, per_km, active
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Platform commission percentage (0-100)
    #[arg(long)]
    commission: Option<Decimal>,

    /// Treat the payment provider as configured, enabling the prepaid wallet
    #[arg(long)]
    payment_provider: bool,

    #[arg(long, value_enum, default_value = "users")]
    report: Report,

    #[arg(long, value_enum, default_value = "csv")]
    format: Format,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .into_diagnostic()?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut settings = PaymentSettings {
        provider_configured: cli.payment_provider,
        ..PaymentSettings::default()
    };
    if let Some(percent) = cli.commission {
        settings.commission = Percentage::new(percent).into_diagnostic()?;
    }
    let platform = Platform::in_memory(settings);
    if let Some(path) = &cli.rules {
        let file = File::open(path).into_diagnostic()?;
        let rules = RuleReader::new(file)
            .rules()
            .collect::<ridehail::error::Result<Vec<_>>>()
            .into_diagnostic()?;
        platform.settings.replace_rules(rules).await.into_diagnostic()?;
    }

    if let Some(path) = &cli.users {
        let file = File::open(path).into_diagnostic()?;
        for user in UserReader::new(file).users() {
            match user {
                Ok(user) => {
                    if let Err(err) = platform.accounts.register(user).await {
                        warn!(error = %err, "seed user rejected");
                    }
                }
                Err(err) => warn!(error = %err, "seed user unreadable"),
            }
        }
    }

    let file = File::open(&cli.script).into_diagnostic()?;
    let mut runner = ScriptRunner::new(&platform);
    let outcome = runner.replay(CommandReader::new(file).commands()).await;
    info!(
        applied = outcome.applied,
        rejected = outcome.rejected,
        "script replayed"
    );

    let summary = platform.reports.platform_summary().await.into_diagnostic()?;
    let briefing = platform
        .advisory
        .operations_briefing(summary.active_rides, summary.gross_revenue)
        .await;
    info!(?summary, %briefing, "platform summary");

    let stdout = io::stdout();
    let out = stdout.lock();
    match cli.report {
        Report::Users => {
            let users = platform.accounts.users().await.into_diagnostic()?;
            let rows: Vec<UserRow> = users.iter().map(UserRow::from).collect();
            emit(out, cli.format, &rows)
        }
        Report::Rides => {
            let rides = platform.registry.rides().await.into_diagnostic()?;
            emit(out, cli.format, &ride_rows(&rides, &runner.labels_by_ride()))
        }
        Report::Drivers => {
            let statements = platform.reports.driver_statements().await.into_diagnostic()?;
            let rows: Vec<StatementRow> = statements.iter().map(StatementRow::from).collect();
            emit(out, cli.format, &rows)
        }
    }
}

fn emit<W: Write, T: Serialize>(mut out: W, format: Format, rows: &[T]) -> Result<()> {
    match format {
        Format::Csv => LedgerWriter::new(out).write_rows(rows).into_diagnostic(),
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, rows).into_diagnostic()?;
            writeln!(out).into_diagnostic()
        }
    }
}
