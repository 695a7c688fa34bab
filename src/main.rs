use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hitwindow::config::HitwindowConfig;
use hitwindow::ratelimit::{Algorithm, KeyDeriver, RateLimitConfig, RateLimiter, RedisCounterStore};

/// Hitwindow - record hits against Redis-backed rate limiters
#[derive(Parser, Debug)]
#[command(name = "hitwindow", version, about)]
struct Cli {
    /// Configuration file path (YAML or TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record hits against a named resource and print the hits remaining
    Hit(HitArgs),
}

#[derive(Args, Debug)]
struct HitArgs {
    /// Resource name
    name: String,

    /// Window length (minutes for fixed window, seconds for sliding window)
    #[arg(long)]
    interval: u32,

    /// Hits allowed per window
    #[arg(long)]
    max_hits: u64,

    /// Number of hits to record
    #[arg(long, default_value_t = 1)]
    count: u32,

    /// Override the configured algorithm
    #[arg(long, value_enum)]
    algorithm: Option<AlgorithmArg>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlgorithmArg {
    Fixed,
    Sliding,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Fixed => Algorithm::FixedWindow,
            AlgorithmArg::Sliding => Algorithm::SlidingWindow,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
struct HitReport<'a> {
    name: &'a str,
    algorithm: Algorithm,
    hit: u32,
    remaining: u64,
    limited: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = HitwindowConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Hit(args) => run_hit(&config, args).await,
    }
}

async fn run_hit(config: &HitwindowConfig, args: HitArgs) -> anyhow::Result<()> {
    let algorithm = args
        .algorithm
        .map(Algorithm::from)
        .unwrap_or(config.limiter.algorithm);

    let store = RedisCounterStore::connect(&config.store.url)
        .await
        .context("failed to open the counter store")?;
    let limiter = RateLimiter::new(
        Arc::new(store),
        KeyDeriver::new(config.store.key_prefix.clone()),
        algorithm,
    );
    info!(algorithm = %algorithm, name = %args.name, "Rate limiter ready");

    let limit = RateLimitConfig::new(args.interval, args.max_hits);

    for hit in 1..=args.count {
        let remaining = limiter
            .hit(&args.name, &limit)
            .await
            .with_context(|| format!("hit {hit} against {:?} failed", args.name))?;

        let report = HitReport {
            name: &args.name,
            algorithm,
            hit,
            remaining,
            limited: remaining == 0,
        };

        match args.format {
            OutputFormat::Text => println!(
                "{} hit {}: {} remaining{}",
                report.name,
                report.hit,
                report.remaining,
                if report.limited { " (rate limited)" } else { "" }
            ),
            OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
        }
    }

    Ok(())
}
