//! klinevote CLI: run the alert bot, analyze one timeframe, check configs.
//!
//! Commands:
//! - `run`: poll the market data provider and send alerts until Ctrl-C
//! - `analyze`: vote once on a timeframe and print the breakdown
//! - `check-config`: validate a config file and report missing secrets

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use klinevote_core::clock::{Clock, SystemClock};
use klinevote_core::domain::Timeframe;
use klinevote_runner::{
    build_provider, build_sink, BotConfig, MessageFormatter, Orchestrator, ProviderKind, Secrets,
    SinkKind,
};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG: &str = "klinevote.toml";

#[derive(Parser)]
#[command(
    name = "klinevote",
    version,
    about = "klinevote: multi-timeframe indicator vote alerts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll for closed candles and send alerts until interrupted.
    Run {
        /// Path to a TOML config file.
        #[arg(long, env = "KLINEVOTE_CONFIG")]
        config: Option<PathBuf>,

        /// Write alerts to the log instead of sending them.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Use synthetic candles instead of the configured provider.
        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
    /// Vote once on the latest closed candle of a timeframe.
    Analyze {
        /// Timeframe label (1m, 3m, 5m, 15m, 30m, 1h, 2h, 4h, 1d).
        #[arg(long)]
        timeframe: Timeframe,

        /// Path to a TOML config file.
        #[arg(long, env = "KLINEVOTE_CONFIG")]
        config: Option<PathBuf>,

        /// Use synthetic candles instead of the configured provider.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Print the result as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Validate a config file and report which secrets are set.
    CheckConfig {
        /// Path to a TOML config file.
        #[arg(long, env = "KLINEVOTE_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,klinevote=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            dry_run,
            synthetic,
        } => run_bot(config.as_deref(), dry_run, synthetic).await,
        Commands::Analyze {
            timeframe,
            config,
            synthetic,
            json,
        } => run_analyze(timeframe, config.as_deref(), synthetic, json).await,
        Commands::CheckConfig { config } => check_config(config.as_deref()),
    }
}

/// Explicit path, else `./klinevote.toml` if present, else built-in defaults.
fn load_config(path: Option<&Path>) -> Result<BotConfig> {
    match path {
        Some(path) => BotConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            BotConfig::from_file(Path::new(DEFAULT_CONFIG))
                .with_context(|| format!("loading config {DEFAULT_CONFIG}"))
        }
        None => {
            info!("no config file, using defaults");
            Ok(BotConfig::default())
        }
    }
}

async fn run_bot(path: Option<&Path>, dry_run: bool, synthetic: bool) -> Result<()> {
    let mut config = load_config(path)?;
    if synthetic {
        config.data.provider = ProviderKind::Synthetic;
    }
    if dry_run {
        config.notify.sink = SinkKind::Log;
    }
    let secrets = Secrets::from_env(&config);
    secrets.require_for(&config)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let provider = build_provider(&config, &secrets, clock.clone())?;
    let sink = build_sink(&config, &secrets, dry_run)?;
    let mut orchestrator = Orchestrator::new(&config, provider, sink, clock)?;

    orchestrator
        .run(shutdown_signal())
        .await
        .context("polling loop stopped")?;
    info!("stopped");
    Ok(())
}

async fn run_analyze(
    timeframe: Timeframe,
    path: Option<&Path>,
    synthetic: bool,
    json: bool,
) -> Result<()> {
    let mut config = load_config(path)?;
    if synthetic {
        config.data.provider = ProviderKind::Synthetic;
    }
    let secrets = Secrets::from_env(&config);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let provider = build_provider(&config, &secrets, clock.clone())?;
    let sink = build_sink(&config, &secrets, true)?;
    let orchestrator = Orchestrator::new(&config, provider, sink, clock)?;

    let result = orchestrator
        .analyze_once(timeframe)
        .await
        .with_context(|| format!("analyzing {} {timeframe}", config.bot.symbol))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    let formatter = MessageFormatter::new(&config.display);
    println!(
        "{} {timeframe}: {} @ {:.4} (candle {})",
        config.bot.symbol,
        result.signal,
        result.price,
        formatter.local_time(result.timestamp * 1000)
    );
    print!("{}", formatter.vote_breakdown(&result));
    Ok(())
}

fn check_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    let secrets = Secrets::from_env(&config);
    let labels: Vec<&str> = config.bot.timeframes.iter().map(|tf| tf.as_str()).collect();

    println!("Symbol:      {}", config.bot.symbol);
    println!("Timeframes:  {}", labels.join(", "));
    println!("Provider:    {:?}", config.data.provider);
    println!("Sink:        {:?}", config.notify.sink);
    println!("Quorum:      {}/8", config.strategy.quorum);
    println!("Conflict:    {:?}", config.strategy.on_conflict);
    println!("Secrets:     {secrets:?}");

    secrets.require_for(&config)?;
    println!("Config OK");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
