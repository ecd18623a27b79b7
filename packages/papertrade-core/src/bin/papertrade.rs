//! Papertrade CLI - scenario analytics and paper trading from the command line.
//!
//! Every command prints an `ApiResponse` JSON document on stdout; logs go to stderr.

use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use papertrade_core::{
    analytics::{format_roi, smart_entry, time_weighted_roi},
    options::{OptionKind, OptionPosition, OptionSide},
    paper_trade::{OptionOrder, Order, OrderType, TradingSession},
    scenario::simulate_what_if,
    sentiment::{self, Crowd, Lexicon, SentimentCard},
    types::SnapshotRecord,
    auto_rebalance, correlation_matrix, ApiResponse, Config, Error, InstrumentSnapshot,
    LengthPolicy, ScenarioReport, TradeSide,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "papertrade")]
#[command(about = "Paper trading CLI - scenario analytics and simulated orders")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.papertrade/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scenario analytics over a snapshot file
    Scenario {
        #[command(subcommand)]
        action: ScenarioAction,
    },
    /// Paper trading session commands
    Paper {
        /// Session file (defaults to ~/.papertrade/session.json)
        #[arg(long, global = true)]
        session: Option<PathBuf>,

        #[command(subcommand)]
        action: PaperAction,
    },
    /// Option payoff analysis
    #[command(name = "option")]
    Options {
        #[command(subcommand)]
        action: OptionAction,
    },
}

#[derive(Args)]
struct InputArgs {
    /// JSON array of instrument snapshots
    #[arg(short, long)]
    input: PathBuf,
}

#[derive(Subcommand)]
enum ScenarioAction {
    /// Pairwise correlation of price histories
    Correlate {
        #[command(flatten)]
        input: InputArgs,
        /// Align unequal histories on their trailing points
        #[arg(long)]
        truncate: bool,
    },
    /// Best entry index for one instrument
    Entry {
        #[command(flatten)]
        input: InputArgs,
        #[arg(short, long)]
        symbol: String,
        #[arg(long)]
        index: usize,
    },
    /// Sector rebalance suggestions
    Rebalance {
        #[command(flatten)]
        input: InputArgs,
        /// Overrides the configured risk tolerance
        #[arg(short, long)]
        tolerance: Option<f64>,
    },
    /// Annualized ROI per instrument
    Roi {
        #[command(flatten)]
        input: InputArgs,
        /// Overrides the configured holding period
        #[arg(short, long)]
        days: Option<i64>,
    },
    /// Value series for a hypothetical entry
    WhatIf {
        #[command(flatten)]
        input: InputArgs,
        #[arg(short, long)]
        symbol: String,
        #[arg(long)]
        index: usize,
    },
    /// Full scenario report
    Report {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Score news headlines
    Sentiment {
        /// Headline text (repeatable)
        #[arg(long = "headline", required = true)]
        headlines: Vec<String>,
        /// Symbol and daily change percent for a portfolio map card
        #[arg(long, requires = "change")]
        symbol: Option<String>,
        #[arg(long, requires = "symbol", allow_hyphen_values = true)]
        change: Option<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Buy,
    Sell,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Call,
    Put,
}

impl From<SideArg> for TradeSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Buy => TradeSide::Buy,
            SideArg::Sell => TradeSide::Sell,
        }
    }
}

impl From<SideArg> for OptionSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Buy => OptionSide::Buy,
            SideArg::Sell => OptionSide::Sell,
        }
    }
}

impl From<KindArg> for OptionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Call => OptionKind::Call,
            KindArg::Put => OptionKind::Put,
        }
    }
}

#[derive(Subcommand)]
enum PaperAction {
    /// Reset the session with a starting balance
    Setup {
        /// Defaults to the configured starting balance
        #[arg(short, long)]
        balance: Option<f64>,
    },
    /// Execute a buy immediately
    Buy {
        #[arg(short, long)]
        symbol: String,
        #[arg(short = 'n', long)]
        quantity: f64,
        #[arg(short, long)]
        price: f64,
    },
    /// Execute a sell immediately
    Sell {
        #[arg(short, long)]
        symbol: String,
        #[arg(short = 'n', long)]
        quantity: f64,
        #[arg(short, long)]
        price: f64,
    },
    /// Submit a share order, queued unless it can fill now
    Submit {
        #[arg(long, value_enum)]
        side: SideArg,
        #[arg(short, long)]
        symbol: String,
        #[arg(short = 'n', long)]
        quantity: f64,
        #[arg(short, long)]
        price: f64,
        /// Queue as a limit order
        #[arg(long)]
        limit: bool,
        /// Local exchange time, e.g. 2024-01-08T12:00:00
        #[arg(long)]
        at: Option<NaiveDateTime>,
    },
    /// Submit an option order
    #[command(name = "option")]
    OptionOrder {
        #[arg(long, value_enum)]
        side: SideArg,
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(short, long)]
        symbol: String,
        #[arg(short = 'n', long)]
        contracts: u32,
        /// Premium per share
        #[arg(short, long)]
        price: f64,
        #[arg(long)]
        strike: f64,
        #[arg(long)]
        limit: bool,
        #[arg(long)]
        at: Option<NaiveDateTime>,
    },
    /// Cancel a queued share order
    Cancel {
        #[arg(long)]
        index: usize,
    },
    /// Cancel a queued option order
    CancelOption {
        #[arg(long)]
        index: usize,
    },
    /// Fill queued orders if the market is open
    Execute {
        #[arg(long)]
        at: Option<NaiveDateTime>,
    },
    /// Session status and open P&L
    Status {
        /// Mark price as SYMBOL=PRICE (repeatable)
        #[arg(long = "price", value_parser = parse_mark)]
        prices: Vec<(String, f64)>,
        /// Mark price for open option trades
        #[arg(long)]
        option_mark: Option<f64>,
    },
}

#[derive(Subcommand)]
enum OptionAction {
    /// Payoff at expiry for a single leg
    Payoff {
        #[arg(long, value_enum)]
        side: SideArg,
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long)]
        strike: f64,
        #[arg(long)]
        premium: f64,
        #[arg(short = 'n', long, default_value = "1")]
        contracts: u32,
        /// Price range either side of the strike
        #[arg(long, default_value = "40")]
        zoom: f64,
        #[arg(long, default_value = "1")]
        step: f64,
    },
}

fn parse_mark(s: &str) -> Result<(String, f64), String> {
    let (symbol, price) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SYMBOL=PRICE, got {}", s))?;
    let price = price
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid price {:?}: {}", price, e))?;
    Ok((symbol.trim().to_uppercase(), price))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
    .context("failed to load config")?;

    let response = match run(cli.command, &config) {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ApiResponse::err(e.to_string())
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run(command: Commands, config: &Config) -> papertrade_core::Result<Value> {
    match command {
        Commands::Scenario { action } => handle_scenario(action, config),
        Commands::Paper { session, action } => {
            let path = session.unwrap_or_else(TradingSession::default_path);
            handle_paper(action, &path, config)
        }
        Commands::Options { action } => handle_option(action),
    }
}

fn load_snapshots(input: &InputArgs, config: &Config) -> papertrade_core::Result<Vec<InstrumentSnapshot>> {
    let content = fs::read_to_string(&input.input)?;
    let records: Vec<SnapshotRecord> = serde_json::from_str(&content)?;
    tracing::debug!(count = records.len(), path = %input.input.display(), "snapshots loaded");

    Ok(records
        .into_iter()
        .map(|r| r.into_snapshot(&config.analytics))
        .collect())
}

fn find_snapshot<'a>(
    snapshots: &'a [InstrumentSnapshot],
    symbol: &str,
) -> papertrade_core::Result<&'a InstrumentSnapshot> {
    let symbol = symbol.trim().to_uppercase();
    snapshots
        .iter()
        .find(|s| s.symbol == symbol)
        .ok_or(Error::PositionNotFound(symbol))
}

fn handle_scenario(action: ScenarioAction, config: &Config) -> papertrade_core::Result<Value> {
    let analytics = &config.analytics;

    match action {
        ScenarioAction::Correlate { input, truncate } => {
            let snapshots = load_snapshots(&input, config)?;
            let policy = if truncate {
                LengthPolicy::Truncate
            } else {
                analytics.length_policy
            };
            let pairs = correlation_matrix(&snapshots, policy)?;
            Ok(json!({ "pairs": pairs }))
        }
        ScenarioAction::Entry {
            input,
            symbol,
            index,
        } => {
            let snapshots = load_snapshots(&input, config)?;
            let snapshot = find_snapshot(&snapshots, &symbol)?;
            let entry = smart_entry(&snapshot.history, index)?;
            Ok(json!({ "symbol": snapshot.symbol, "entry": entry }))
        }
        ScenarioAction::Rebalance { input, tolerance } => {
            let snapshots = load_snapshots(&input, config)?;
            let tolerance = tolerance.unwrap_or(analytics.risk_tolerance);
            let suggestions = auto_rebalance(&snapshots, tolerance)?;
            Ok(json!({ "tolerance": tolerance, "suggestions": suggestions }))
        }
        ScenarioAction::Roi { input, days } => {
            let snapshots = load_snapshots(&input, config)?;
            let days = days.unwrap_or(analytics.days_held);
            let rows: Vec<Value> = snapshots
                .iter()
                .map(|s| {
                    json!({
                        "symbol": s.symbol,
                        "roi": time_weighted_roi(s, days).ok(),
                        "display": format_roi(s, days),
                    })
                })
                .collect();
            Ok(json!({ "days_held": days, "instruments": rows }))
        }
        ScenarioAction::WhatIf {
            input,
            symbol,
            index,
        } => {
            let snapshots = load_snapshots(&input, config)?;
            let snapshot = find_snapshot(&snapshots, &symbol)?;
            let series = simulate_what_if(snapshot, index)?;
            Ok(json!({ "symbol": snapshot.symbol, "series": series }))
        }
        ScenarioAction::Report { input } => {
            let snapshots = load_snapshots(&input, config)?;
            let report = ScenarioReport::build(&snapshots, analytics)?;
            Ok(serde_json::to_value(report)?)
        }
        ScenarioAction::Sentiment {
            headlines,
            symbol,
            change,
        } => {
            let card = match (symbol, change) {
                (Some(symbol), Some(change)) => Some(SentimentCard::build(
                    &symbol,
                    change,
                    &headlines,
                    &Lexicon::portfolio_map(),
                )),
                _ => None,
            };
            let score = sentiment::headline_score(&headlines, &analytics.lexicon);
            Ok(json!({
                "score": score,
                "crowd": Crowd::from_score(score),
                "tally": sentiment::keyword_tally(&headlines, &Lexicon::portfolio_map()),
                "summary": sentiment::summarize_headlines(&headlines, &analytics.lexicon),
                "card": card,
            }))
        }
    }
}

fn now_or(at: Option<NaiveDateTime>) -> NaiveDateTime {
    at.unwrap_or_else(|| Local::now().naive_local())
}

fn order_type(limit: bool) -> OrderType {
    if limit {
        OrderType::Limit
    } else {
        OrderType::Market
    }
}

fn handle_paper(action: PaperAction, path: &Path, config: &Config) -> papertrade_core::Result<Value> {
    let mut session = TradingSession::load_from_path(path, &config.session)?;

    let data = match action {
        PaperAction::Setup { balance } => {
            let balance = balance.unwrap_or(config.session.starting_balance);
            session.setup(balance)?;
            json!({ "message": "Session set up", "balance": session.balance() })
        }
        PaperAction::Buy {
            symbol,
            quantity,
            price,
        } => {
            let trade = session.buy(&symbol, quantity, price)?;
            json!({ "trade": trade, "balance": session.balance() })
        }
        PaperAction::Sell {
            symbol,
            quantity,
            price,
        } => {
            let trade = session.sell(&symbol, quantity, price)?;
            json!({ "trade": trade, "balance": session.balance() })
        }
        PaperAction::Submit {
            side,
            symbol,
            quantity,
            price,
            limit,
            at,
        } => {
            let order = Order::new(side.into(), &symbol, quantity, price);
            let submission = session.submit(order, order_type(limit), now_or(at))?;
            json!({ "submission": submission, "balance": session.balance() })
        }
        PaperAction::OptionOrder {
            side,
            kind,
            symbol,
            contracts,
            price,
            strike,
            limit,
            at,
        } => {
            let order = OptionOrder {
                kind: kind.into(),
                side: side.into(),
                symbol,
                contracts,
                price,
                strike,
            };
            let submission = session.submit_option(order, order_type(limit), now_or(at))?;
            json!({ "submission": submission, "balance": session.balance() })
        }
        PaperAction::Cancel { index } => json!({ "cancelled": session.cancel_order(index)? }),
        PaperAction::CancelOption { index } => {
            json!({ "cancelled": session.cancel_option(index)? })
        }
        PaperAction::Execute { at } => {
            let now = now_or(at);
            let trades = session.execute_queued(now);
            let option_trades = session.execute_queued_options(now);
            json!({
                "trades": trades,
                "option_trades": option_trades,
                "balance": session.balance(),
            })
        }
        PaperAction::Status {
            prices,
            option_mark,
        } => {
            let prices: HashMap<String, f64> = prices.into_iter().collect();
            return Ok(json!({
                "status": session.status(),
                "open_pl_shares": session.open_pl_shares(&prices),
                "open_pl_options": option_mark.map(|mark| session.open_pl_options(mark)),
            }));
        }
    };

    session.save_to_path(path)?;
    Ok(data)
}

fn handle_option(action: OptionAction) -> papertrade_core::Result<Value> {
    match action {
        OptionAction::Payoff {
            side,
            kind,
            strike,
            premium,
            contracts,
            zoom,
            step,
        } => {
            let position = OptionPosition::new(kind.into(), side.into(), strike, premium, contracts)?;
            Ok(json!({
                "breakeven": position.breakeven(),
                "max_gain": position.max_gain().to_string(),
                "max_loss": position.max_loss().to_string(),
                "curve": position.profit_curve(zoom, step)?,
            }))
        }
    }
}
