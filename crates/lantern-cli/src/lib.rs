//! Lantern command-line shell.
//!
//! Thin wrapper around [`ScrapeService`]: loads configuration, installs the
//! tracing subscriber, establishes a session and prints results as JSON.
//! Logs go to stderr so stdout stays machine-readable.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use lantern_auth::{Confidence, SessionStatus};
use lantern_core::AppConfig;
use lantern_scanner::ScrapeService;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "lantern")]
#[command(about = "Batch profile metadata scraper")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch profile metadata for a batch of identifiers
    Scrape(ScrapeArgs),

    /// Check whether a session is still accepted by the platform
    Verify(SessionArgs),

    /// Write a config file with default settings
    Init(InitArgs),
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Platform session id cookie value
    #[arg(long, env = "LANTERN_SESSION_ID", hide_env_values = true)]
    pub session_id: String,

    /// CSRF token cookie value
    #[arg(long, env = "LANTERN_CSRF_TOKEN", hide_env_values = true)]
    pub csrf_token: Option<String>,
}

#[derive(Debug, Args)]
pub struct ScrapeArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Charge the batch against this caller's quota
    #[arg(long)]
    pub caller: Option<String>,

    /// File with identifiers, one per line or comma separated
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Handles or profile URLs
    pub identifiers: Vec<String>,
}

/// Initialize tracing subscriber for logging
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load the config file (explicit path or default location) plus env overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::load().context("failed to load config")?,
    };
    config.apply_env();
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Write the default configuration to `path` (or the default location).
///
/// Refuses to replace an existing file unless `force` is set.
pub fn init_config(path: Option<&Path>, force: bool) -> anyhow::Result<PathBuf> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => AppConfig::config_path().context("failed to locate config directory")?,
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    AppConfig::default()
        .save_to(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Collect identifiers from `--input` and the positional arguments.
///
/// Blank entries and lines starting with `#` are skipped.
pub fn read_identifiers(input: Option<&Path>, inline: &[String]) -> anyhow::Result<Vec<String>> {
    let mut identifiers = Vec::new();

    if let Some(path) = input {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        for line in contents.lines().map(str::trim) {
            if line.starts_with('#') {
                continue;
            }
            identifiers.extend(split_entries(line));
        }
    }
    for arg in inline {
        identifiers.extend(split_entries(arg));
    }

    if identifiers.is_empty() {
        bail!("no identifiers given (pass them as arguments or with --input)");
    }
    Ok(identifiers)
}

fn split_entries(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
}

/// Human-readable form of a verification outcome.
#[must_use]
pub fn describe_status(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Valid(Confidence::High) => "valid (high confidence)",
        SessionStatus::Valid(Confidence::Low) => "valid (low confidence)",
        SessionStatus::Expired => "expired",
        SessionStatus::Blocked => "blocked",
    }
}

/// Load config, install logging and build the service.
fn start_service(config_path: Option<&Path>) -> anyhow::Result<ScrapeService> {
    let config = load_config(config_path)?;
    init_tracing(&config.logging.filter);

    info!("Starting Lantern v{}", env!("CARGO_PKG_VERSION"));
    Ok(ScrapeService::from_config(&config)?)
}

/// Entry point for the `lantern` binary.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Scrape(args) => {
            let identifiers = read_identifiers(args.input.as_deref(), &args.identifiers)?;
            let service = start_service(config_path)?;
            service.establish_session(&args.session.session_id, args.session.csrf_token.as_deref())?;

            let result = match args.caller.as_deref() {
                Some(caller) => service.submit_batch_for(caller, &identifiers).await?,
                None => service.submit_batch(&identifiers).await?,
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Verify(args) => {
            let service = start_service(config_path)?;
            service.establish_session(&args.session_id, args.csrf_token.as_deref())?;
            let status = service.verify_session().await?;
            println!("{}", describe_status(status));
            if !status.is_valid() {
                std::process::exit(1);
            }
        }
        Command::Init(args) => {
            let path = init_config(config_path, args.force)?;
            println!("{}", path.display());
        }
    }

    Ok(())
}
