//! RuleLab CLI — generate strategies over a CSV dataset.
//!
//! Commands:
//! - `generate` — run a generation session and save the best configuration
//! - `catalog` — list the built-in indicators and scoring options

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rulelab_core::indicators::{Indicator, IndicatorProvider};
use rulelab_core::{data, BuiltinCatalog, Configuration, Granularity, SimBacktester};
use rulelab_search::{
    simple_options, spawn_generation, GenerationEvent, ScoringSelection, SearchConfig,
    SimpleMetric,
};

#[derive(Parser)]
#[command(
    name = "rulelab",
    about = "RuleLab CLI — randomized trading-rule generation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a generation session over a CSV dataset.
    Generate {
        /// Path to a CSV file (time,open,high,low,close,volume).
        #[arg(long)]
        data: PathBuf,

        /// Instrument symbol recorded in the dataset.
        #[arg(long, default_value = "EURUSD")]
        symbol: String,

        /// Data granularity: m1, h1, d1, w1.
        #[arg(long, default_value = "h1")]
        granularity: String,

        /// Wall-clock budget in minutes. Omit to run until Ctrl-C.
        #[arg(long)]
        minutes: Option<u32>,

        /// Master seed for reproducible runs.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Maximum entry filter slots.
        #[arg(long, default_value_t = 2)]
        max_entry_filters: usize,

        /// Maximum exit filter slots.
        #[arg(long, default_value_t = 1)]
        max_exit_filters: usize,

        /// Scoring criterion: balance, or a metric such as sharpe,
        /// profit-factor, annualized-profit, win-loss.
        #[arg(long, default_value = "balance")]
        scoring: String,

        /// Keep the leaderboard from an earlier run in this session.
        #[arg(long, default_value_t = false)]
        preserve: bool,

        /// TOML search config; command-line flags override it.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the best configuration as JSON here.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List built-in indicators and scoring options.
    Catalog,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Commands::Generate {
            data,
            symbol,
            granularity,
            minutes,
            seed,
            max_entry_filters,
            max_exit_filters,
            scoring,
            preserve,
            config,
            out,
        } => generate(
            data,
            symbol,
            granularity,
            minutes,
            seed,
            max_entry_filters,
            max_exit_filters,
            scoring,
            preserve,
            config,
            out,
        ),
        Commands::Catalog => catalog(),
    }
}

fn parse_scoring(text: &str) -> Result<ScoringSelection> {
    if text.eq_ignore_ascii_case("balance") {
        return Ok(ScoringSelection::NetBalance);
    }
    match text.parse::<SimpleMetric>() {
        Ok(metric) => Ok(ScoringSelection::Simple(metric)),
        Err(e) => bail!("{e}; use 'balance' or a metric name"),
    }
}

#[allow(clippy::too_many_arguments)]
fn generate(
    data: PathBuf,
    symbol: String,
    granularity: String,
    minutes: Option<u32>,
    seed: u64,
    max_entry_filters: usize,
    max_exit_filters: usize,
    scoring: String,
    preserve: bool,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let granularity: Granularity = granularity
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let dataset = data::load_csv(&data, &symbol, granularity)
        .with_context(|| format!("loading dataset from {}", data.display()))?;
    info!(
        symbol = %dataset.symbol,
        bars = dataset.bar_count(),
        %granularity,
        "dataset loaded"
    );

    let mut search = match config {
        Some(path) => SearchConfig::from_toml_file(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SearchConfig::default(),
    };
    search.budget_minutes = minutes.or(search.budget_minutes);
    search.seed = seed;
    search.max_entry_filters = max_entry_filters;
    search.max_exit_filters = max_exit_filters;
    search.scoring = parse_scoring(&scoring)?;
    search.validate().map_err(|e| anyhow::anyhow!(e))?;
    let budget = search.budget_minutes;

    let session = rulelab_search::GenerationSession::new(
        Arc::new(BuiltinCatalog),
        Arc::new(SimBacktester::default()),
        Arc::new(dataset),
        search,
        Configuration::new(0, 0),
    );

    let handle = spawn_generation(session, budget, preserve);
    for event in handle.events().iter() {
        match event {
            GenerationEvent::Progress { percent } => info!(percent, "searching"),
            GenerationEvent::Improvement {
                score,
                label,
                description,
            } => info!(score, %label, %description, "new best"),
            GenerationEvent::Notice { message } => tracing::warn!(%message, "notice"),
        }
    }
    let (session, result) = handle.join();
    let report = result?;

    info!(
        outcome = ?report.outcome,
        cycles = report.cycles,
        calculations = report.calculations,
        benchmark = report.benchmark,
        elapsed_secs = report.elapsed.as_secs_f64(),
        "run finished"
    );
    for line in &report.history {
        println!("{line}");
    }

    match &report.best {
        Some(best) => {
            println!(
                "best: {} = {:.4} ({} slots)",
                best.label,
                best.score,
                best.config.slot_count()
            );
            if let Some(path) = out {
                let json = serde_json::to_string_pretty(session.template())
                    .context("serializing best configuration")?;
                std::fs::write(&path, json)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("saved best configuration to {}", path.display());
            }
        }
        None => println!("no profitable configuration found"),
    }
    Ok(())
}

fn catalog() -> Result<()> {
    println!("indicators:");
    for name in BuiltinCatalog.names() {
        let indicator = BuiltinCatalog
            .construct(&name)
            .map_err(|e| anyhow::anyhow!(e))?;
        println!(
            "  {name} — kinds {:?}, exit filters: {}",
            indicator.supported_kinds(),
            indicator.supports_exit_filters()
        );
    }
    println!("scoring options:");
    println!("  Net Balance");
    for option in simple_options(None) {
        println!("  {option}");
    }
    Ok(())
}
