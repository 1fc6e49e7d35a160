use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use salary_tax_engine::api::{AppState, ComparisonResponse, create_router};
use salary_tax_engine::config::{
    EngineSettings, RuleSetRepository, SettingsError, YamlRuleSource,
};
use salary_tax_engine::engine::TaxEngine;
use salary_tax_engine::error::EngineError;
use salary_tax_engine::models::{CompensationProfile, FiscalYear, RegimeId};
use salary_tax_engine::telemetry::{self, TelemetryError};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to read profile {path}: {source}")]
    ReadProfile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse profile {path}: {source}")]
    ParseProfile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to render output: {0}")]
    Render(#[source] serde_json::Error),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(
    name = "salary-tax-engine",
    about = "Compare income-tax regimes for a salary profile",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Compare regimes for a profile read from a JSON file
    Compare(CompareArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Path to a JSON compensation profile
    #[arg(long)]
    profile: PathBuf,
    /// Fiscal year, e.g. 2024-25
    #[arg(long)]
    fiscal_year: FiscalYear,
    /// Regime to compute (repeatable); all regimes when omitted
    #[arg(long = "regime")]
    regimes: Vec<RegimeId>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    let settings = EngineSettings::from_env()?;

    match command {
        Command::Serve(args) => run_server(settings, args).await,
        Command::Compare(args) => run_compare(settings, args).await,
    }
}

fn build_engine(settings: &EngineSettings) -> TaxEngine<YamlRuleSource> {
    let source = YamlRuleSource::new(settings.rules_dir.clone());
    TaxEngine::with_repository(RuleSetRepository::with_policy(
        source,
        settings.load_policy.clone(),
    ))
}

async fn run_server(mut settings: EngineSettings, mut args: ServeArgs) -> Result<(), CliError> {
    if let Some(host) = args.host.take() {
        settings.host = host;
    }
    if let Some(port) = args.port.take() {
        settings.port = port;
    }

    telemetry::init(&settings.log_level)?;

    let engine = build_engine(&settings);
    let rules_dir = engine.repository().source().dir().to_path_buf();
    let app = create_router(AppState::new(engine));

    let addr = settings.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        %addr,
        rules_dir = %rules_dir.display(),
        "salary tax engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_compare(settings: EngineSettings, args: CompareArgs) -> Result<(), CliError> {
    let CompareArgs {
        profile,
        fiscal_year,
        regimes,
    } = args;

    let content = tokio::fs::read_to_string(&profile)
        .await
        .map_err(|source| CliError::ReadProfile {
            path: profile.clone(),
            source,
        })?;
    let parsed: CompensationProfile =
        serde_json::from_str(&content).map_err(|source| CliError::ParseProfile {
            path: profile.clone(),
            source,
        })?;

    let engine = build_engine(&settings);
    let results = engine.compare(&parsed, &fiscal_year, &regimes).await?;
    let response = ComparisonResponse::new(fiscal_year, results);

    let rendered = serde_json::to_string_pretty(&response).map_err(CliError::Render)?;
    println!("{rendered}");
    Ok(())
}
