//! Guardian CLI: score one security, scan a watchlist, print the default config.
//!
//! Commands:
//! - `analyze <TICKER>`: full report for one security
//! - `scan --watchlist <FILE>`: score every watchlist entry and rank the results
//! - `config`: print the default engine configuration as TOML

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use guardian_core::classify::Branch;
use guardian_core::domain::SecurityProfile;
use guardian_core::scoring::FundamentalDimension;
use guardian_core::{Engine, EngineConfig, Evaluation, PositionContext, ScoreReport};
use guardian_runner::scan::DEFAULT_LOOKBACK_DAYS;
use guardian_runner::{
    rank, CachedProvider, CircuitBreaker, CsvProvider, MarketDataProvider, Pacer, ScanItem,
    ScanOptions, ScanOutcome, Scanner, SecurityInputs, SyntheticProvider, Watchlist,
    YahooProvider,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(
    name = "guardian",
    version,
    about = "Guardian: explainable single-equity scoring with hard risk vetoes"
)]
struct Cli {
    /// More log output on stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Engine configuration TOML. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one security and explain the result.
    Analyze {
        /// Ticker, e.g. 2330 or 6488.TWO.
        ticker: String,

        #[command(flatten)]
        position: PositionArgs,

        /// Include the monthly seasonality table.
        #[arg(long, default_value_t = false)]
        seasonality: bool,

        #[command(flatten)]
        data: DataArgs,

        /// Print the report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Score every security in a watchlist and rank them.
    Scan {
        /// Watchlist TOML file.
        #[arg(long)]
        watchlist: PathBuf,

        /// Fetch sequentially, then score in parallel.
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Show only the best N rows.
        #[arg(long)]
        top: Option<usize>,

        #[command(flatten)]
        data: DataArgs,

        /// Print the ranked rows as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the default engine configuration as TOML.
    Config,
}

#[derive(Args)]
struct PositionArgs {
    /// Entry price of an open position; 0 means not held.
    #[arg(long, default_value_t = 0.0)]
    entry: f64,

    /// Tolerated loss from entry, as a fraction.
    #[arg(long, default_value_t = 0.10)]
    tolerated_loss: f64,

    /// Apply the trailing stop to an open position.
    #[arg(long, default_value_t = false)]
    trailing: bool,

    /// Capital at risk per trade, used for position sizing.
    #[arg(long, default_value_t = 5000.0)]
    budget: f64,

    /// Force the scoring branch instead of classifying.
    #[arg(long)]
    branch: Option<Branch>,
}

impl PositionArgs {
    fn context(&self, include_seasonality: bool) -> PositionContext {
        PositionContext {
            entry_price: self.entry,
            tolerated_loss: self.tolerated_loss,
            trailing_stop: self.trailing,
            risk_budget: self.budget,
            branch_override: self.branch,
            include_seasonality,
            ..PositionContext::default()
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    Yahoo,
    Csv,
    Synthetic,
}

#[derive(Args)]
struct DataArgs {
    /// Where market data comes from.
    #[arg(long, value_enum, default_value_t = SourceKind::Yahoo)]
    source: SourceKind,

    /// Directory of CSV files for `--source csv`.
    #[arg(long, default_value = "data")]
    csv_dir: PathBuf,

    /// Minimum spacing between uncached fetches. Defaults to 300 for yahoo, 0 otherwise.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Lifetime of cached fetches.
    #[arg(long, default_value_t = 900)]
    cache_ttl_secs: u64,

    /// Calendar days of history to request.
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_DAYS)]
    lookback_days: u32,

    /// Seed for `--source synthetic`.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

impl DataArgs {
    fn provider(&self) -> Result<CachedProvider<Box<dyn MarketDataProvider>>> {
        let (inner, default_delay): (Box<dyn MarketDataProvider>, u64) = match self.source {
            SourceKind::Yahoo => {
                let yahoo = YahooProvider::new(Arc::new(CircuitBreaker::default()))
                    .context("initialising Yahoo provider")?;
                (Box::new(yahoo), 300)
            }
            SourceKind::Csv => {
                if !self.csv_dir.is_dir() {
                    bail!("CSV directory {} does not exist", self.csv_dir.display());
                }
                (Box::new(CsvProvider::new(&self.csv_dir)), 0)
            }
            SourceKind::Synthetic => {
                let end = Utc::now().date_naive();
                (Box::new(SyntheticProvider::new(self.seed, end)), 0)
            }
        };
        let delay = Duration::from_millis(self.delay_ms.unwrap_or(default_delay));
        Ok(CachedProvider::new(
            inner,
            Duration::from_secs(self.cache_ttl_secs),
            Pacer::new(delay),
        ))
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_engine(path: Option<&PathBuf>) -> Result<Engine> {
    let config = match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    Engine::try_new(config).context("engine configuration rejected")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Analyze {
            ticker,
            position,
            seasonality,
            data,
            json,
        } => {
            let engine = load_engine(cli.config.as_ref())?;
            run_analyze(&engine, &ticker, &position.context(seasonality), &data, json)
        }
        Commands::Scan {
            watchlist,
            parallel,
            top,
            data,
            json,
        } => {
            let engine = load_engine(cli.config.as_ref())?;
            let watchlist = Watchlist::load(&watchlist)
                .with_context(|| format!("loading watchlist {}", watchlist.display()))?;
            run_scan(&engine, &watchlist, parallel, top, &data, json)
        }
        Commands::Config => {
            let text = EngineConfig::default()
                .to_toml_string()
                .context("serialising default config")?;
            print!("{text}");
            Ok(())
        }
    }
}

fn run_analyze(
    engine: &Engine,
    ticker: &str,
    position: &PositionContext,
    data: &DataArgs,
    json: bool,
) -> Result<()> {
    position.validate().context("invalid position inputs")?;
    let provider = data.provider()?;
    let hint = SecurityProfile::default();

    let inputs = SecurityInputs::fetch(&provider, ticker, &hint, data.lookback_days)
        .with_context(|| format!("fetching data for {ticker}"))?
        .with_context(|| format!("no price history found for {ticker}"))?;
    let macro_context = provider.macro_snapshot().unwrap_or_else(|e| {
        warn!(error = %e, "macro snapshot failed");
        None
    });

    match engine.evaluate(&inputs.evaluation_inputs(macro_context.as_ref(), position)) {
        Evaluation::Scored(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Evaluation::InsufficientData { symbol, reason } => {
            bail!("cannot score {symbol}: {reason}")
        }
    }
}

fn print_report(r: &ScoreReport) {
    println!("{} as of {}  close {:.2}", r.symbol, r.as_of, r.close);
    println!(
        "regime {:?}, {} branch, {:?} policy",
        r.regime, r.branch, r.policy
    );
    println!(
        "score {:.1} in [{:.0}, {:.0}]  action {:?}",
        r.score, r.score_floor, r.score_ceiling, r.action
    );
    if let Some(veto) = &r.veto {
        println!("VETO {:?}: {}", veto.kind, veto.reason);
    }

    println!();
    println!(
        "technical {:+.1}  gate {:.2}  chip-flow {:+.1} ({})",
        r.sub_scores.technical.points,
        r.sub_scores.gate,
        r.sub_scores.chip_flow.points,
        r.chip_flow_source
    );
    match &r.sub_scores.fundamental {
        FundamentalDimension::Included(s) => println!("fundamental {:.1}", s.points),
        FundamentalDimension::Excluded { .. } => println!("fundamental excluded"),
    }
    println!("macro multiplier {:.2}", r.macro_multiplier);

    let s = &r.snapshot;
    println!(
        "RSI {}  %K {}  bias {}%  slope {}%/bar  position {}  VWAP {}",
        opt(s.rsi, 1),
        opt(s.stoch_k, 1),
        opt(s.bias, 1),
        opt(s.slope_pct, 2),
        opt(s.position, 2),
        opt(s.vwap, 2)
    );

    println!();
    println!("protective stop {:.2}", r.protective_stop);
    if let Some(stop) = r.user_stop {
        println!("user stop {stop:.2}");
    }
    if let Some(stop) = r.trailing_stop {
        println!("trailing stop {stop:.2}");
    }
    println!("reward/risk {:.2}", r.reward_risk);
    if let Some(size) = &r.position_size {
        println!(
            "position size {} shares ({} board lots of {})",
            size.shares, size.board_lots, size.board_lot
        );
    }

    if !r.data_issues.is_empty() {
        println!();
        for issue in &r.data_issues {
            println!("! {issue}");
        }
    }

    println!();
    for e in r.explanations.iter() {
        println!("[{}] {}: {}", e.source, e.title, e.rationale);
    }

    if let Some(season) = &r.seasonality {
        println!();
        println!("month  mean%   win%  days");
        for m in &season.months {
            println!(
                "{:>5}  {:>+5.2}  {:>5.1}  {:>4}",
                m.month, m.mean_change_pct, m.win_rate_pct, m.samples
            );
        }
    }
}

fn opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.decimals$}"))
}

fn run_scan(
    engine: &Engine,
    watchlist: &Watchlist,
    parallel: bool,
    top: Option<usize>,
    data: &DataArgs,
    json: bool,
) -> Result<()> {
    let provider = data.provider()?;
    let options = ScanOptions {
        lookback_days: data.lookback_days,
        ..ScanOptions::default()
    };
    let min_rr = options.strong_buy_reward_risk;
    let scanner = Scanner::new(&provider, engine, options);

    let items: Vec<ScanItem> = if parallel {
        scanner.scan_parallel(watchlist)
    } else {
        scanner.scan(watchlist).collect()
    };
    let stats = provider.stats();
    info!(
        securities = items.len(),
        cache_hits = stats.hits,
        cache_misses = stats.misses,
        "scan complete"
    );

    let mut rows: Vec<_> = items.iter().filter_map(|i| i.row(min_rr)).collect();
    rank(&mut rows);
    if let Some(n) = top {
        rows.truncate(n);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:>3}  {:<16} {:<20} {:>8} {:>8} {:>7}  {:<9} {:<10} {:>5}  {}",
        "#", "group", "name", "ticker", "close", "score", "action", "verdict", "r/r", "vwap"
    );
    for (i, row) in rows.iter().enumerate() {
        println!(
            "{:>3}  {:<16} {:<20} {:>8} {:>8.2} {:>7.1}  {:<9} {:<10} {:>5.2}  {:?}",
            i + 1,
            row.group,
            row.name,
            row.ticker,
            row.close,
            row.score,
            format!("{:?}", row.action),
            row.recommendation.to_string(),
            row.reward_risk,
            row.vwap_relation
        );
    }

    let skipped: Vec<_> = items
        .iter()
        .filter(|i| !matches!(i.outcome, ScanOutcome::Scored { .. }))
        .collect();
    if !skipped.is_empty() {
        println!();
        for item in skipped {
            let detail = match &item.outcome {
                ScanOutcome::InsufficientData { reason } => reason.to_string(),
                ScanOutcome::Failed { error } => error.clone(),
                _ => String::new(),
            };
            println!(
                "skipped {} ({}): {} {}",
                item.entry.name,
                item.entry.ticker,
                item.outcome.label(),
                detail
            );
        }
    }
    Ok(())
}
