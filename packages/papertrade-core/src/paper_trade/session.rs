//! Paper trading session store.
//!
//! All mutation goes through the action methods below; fields are private so
//! balance, holdings and queues can only change together.

use super::market_hours::MarketHours;
use crate::config::SessionConfig;
use crate::options::{OptionKind, OptionSide};
use crate::types::{Trade, TradeSide};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Shares held in one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: f64,
    /// Cost-averaged entry price
    pub avg_price: f64,
}

impl Holding {
    /// Unrealized P&L at a price.
    pub fn open_pl(&self, price: f64) -> f64 {
        (price - self.avg_price) * self.quantity
    }
}

/// Market or limit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Market,
    Limit,
}

/// An equity order awaiting execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub side: TradeSide,
    pub symbol: String,
    pub quantity: f64,
    /// Limit price, or the market price at submission
    pub price: f64,
}

impl Order {
    pub fn new(side: TradeSide, symbol: &str, quantity: f64, price: f64) -> Self {
        Self {
            side,
            symbol: symbol.trim().to_uppercase(),
            quantity,
            price,
        }
    }

    /// Cash reserved by the order while queued.
    pub fn reserved_cash(&self) -> f64 {
        match self.side {
            TradeSide::Buy => self.quantity * self.price,
            TradeSide::Sell => 0.0,
        }
    }
}

/// A single-leg option order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionOrder {
    pub kind: OptionKind,
    pub side: OptionSide,
    pub symbol: String,
    pub contracts: u32,
    /// Premium per share
    pub price: f64,
    pub strike: f64,
}

/// An executed option order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionTrade {
    #[serde(flatten)]
    pub order: OptionOrder,
    pub realized_pl: f64,
    pub executed_at: DateTime<Utc>,
}

/// Whether a submitted order was filled immediately or queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "order", rename_all = "snake_case")]
pub enum Submission<E, Q> {
    Executed(E),
    Queued(Q),
}

/// Session status summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub setup_complete: bool,
    pub starting_balance: f64,
    pub balance: f64,
    /// Balance less cash reserved by queued buys
    pub buying_power: f64,
    pub holdings: Vec<Holding>,
    pub trade_count: usize,
    pub option_trade_count: usize,
    pub queued_orders: usize,
    pub queued_option_orders: usize,
    pub realized_pl: f64,
    pub started_at: Option<DateTime<Utc>>,
}

/// Simulated brokerage account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSession {
    setup_complete: bool,
    starting_balance: f64,
    balance: f64,
    holdings: Vec<Holding>,
    trades: Vec<Trade>,
    option_trades: Vec<OptionTrade>,
    queued_orders: Vec<Order>,
    queued_option_orders: Vec<OptionOrder>,
    realized_pl: f64,
    contract_multiplier: f64,
    market_hours: MarketHours,
    started_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Default for TradingSession {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

impl TradingSession {
    /// Create a session that has not been set up yet.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            setup_complete: false,
            starting_balance: 0.0,
            balance: 0.0,
            holdings: Vec::new(),
            trades: Vec::new(),
            option_trades: Vec::new(),
            queued_orders: Vec::new(),
            queued_option_orders: Vec::new(),
            realized_pl: 0.0,
            contract_multiplier: config.contract_multiplier,
            market_hours: config.market_hours,
            started_at: None,
            updated_at: None,
        }
    }

    /// Get the default session file path.
    ///
    /// Default path: `~/.papertrade/session.json`
    /// Can be overridden with `PAPERTRADE_SESSION_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("PAPERTRADE_SESSION_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".papertrade/session.json"))
            .unwrap_or_else(|| PathBuf::from("papertrade_session.json"))
    }

    /// Load a session from a specific path. A missing file yields a fresh session.
    pub fn load_from_path(path: &Path, config: &SessionConfig) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no session file, starting fresh");
            return Ok(Self::new(config));
        }

        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the session to a specific path.
    pub fn save_to_path(&mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        self.updated_at = Some(Utc::now());
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reset everything and start with a fresh balance.
    pub fn setup(&mut self, starting_balance: f64) -> Result<()> {
        if !starting_balance.is_finite() || starting_balance < 0.0 {
            return Err(Error::Validation(format!(
                "starting balance must be a non-negative amount, got {}",
                starting_balance
            )));
        }

        self.setup_complete = true;
        self.starting_balance = starting_balance;
        self.balance = starting_balance;
        self.holdings.clear();
        self.trades.clear();
        self.option_trades.clear();
        self.queued_orders.clear();
        self.queued_option_orders.clear();
        self.realized_pl = 0.0;
        self.started_at = Some(Utc::now());
        self.updated_at = self.started_at;

        tracing::info!(starting_balance, "paper trading session set up");
        Ok(())
    }

    fn ensure_setup(&self) -> Result<()> {
        if self.setup_complete {
            Ok(())
        } else {
            Err(Error::InvalidOperation(
                "Session not set up. Run setup with a starting balance first.".to_string(),
            ))
        }
    }

    fn validate_order(symbol: &str, quantity: f64, price: f64) -> Result<()> {
        if symbol.trim().is_empty() {
            return Err(Error::Validation("symbol must not be empty".to_string()));
        }
        if quantity.is_nan() || quantity <= 0.0 || price.is_nan() || price <= 0.0 {
            return Err(Error::Validation(format!(
                "quantity and price must be positive (got {}, {})",
                quantity, price
            )));
        }
        Ok(())
    }

    fn holding(&self, symbol: &str) -> Result<&Holding> {
        self.holdings
            .iter()
            .find(|h| h.symbol == symbol)
            .ok_or_else(|| Error::PositionNotFound(symbol.to_string()))
    }

    fn ensure_shares(&self, symbol: &str, quantity: f64) -> Result<&Holding> {
        let holding = self.holding(symbol)?;
        if quantity > holding.quantity {
            return Err(Error::InvalidOperation(format!(
                "Cannot sell {} shares of {}, only have {}",
                quantity, symbol, holding.quantity
            )));
        }
        Ok(holding)
    }

    /// Execute a buy at `price`, cost-averaging into any existing holding.
    pub fn buy(&mut self, symbol: &str, quantity: f64, price: f64) -> Result<Trade> {
        self.ensure_setup()?;
        Self::validate_order(symbol, quantity, price)?;

        let cost = quantity * price;
        if cost > self.balance {
            return Err(Error::InsufficientFunds {
                needed: cost,
                available: self.balance,
            });
        }

        let symbol = symbol.trim().to_uppercase();
        self.balance -= cost;

        match self.holdings.iter_mut().find(|h| h.symbol == symbol) {
            Some(holding) => {
                let total = holding.quantity + quantity;
                holding.avg_price = (holding.avg_price * holding.quantity + cost) / total;
                holding.quantity = total;
            }
            None => self.holdings.push(Holding {
                symbol: symbol.clone(),
                quantity,
                avg_price: price,
            }),
        }

        let trade = Trade::new(&symbol, TradeSide::Buy, quantity, price);
        self.trades.push(trade.clone());
        self.updated_at = Some(Utc::now());
        Ok(trade)
    }

    /// Execute a sell at `price`, realizing P&L against the average price.
    pub fn sell(&mut self, symbol: &str, quantity: f64, price: f64) -> Result<Trade> {
        self.ensure_setup()?;
        Self::validate_order(symbol, quantity, price)?;

        let symbol = symbol.trim().to_uppercase();
        let avg_price = self.ensure_shares(&symbol, quantity)?.avg_price;
        let pl = (price - avg_price) * quantity;

        self.balance += quantity * price;
        self.realized_pl += pl;
        if let Some(idx) = self.holdings.iter().position(|h| h.symbol == symbol) {
            if self.holdings[idx].quantity - quantity <= 0.0 {
                self.holdings.remove(idx);
            } else {
                self.holdings[idx].quantity -= quantity;
            }
        }

        let trade = Trade::new(&symbol, TradeSide::Sell, quantity, price).with_realized_pl(pl);
        self.trades.push(trade.clone());
        self.updated_at = Some(Utc::now());
        Ok(trade)
    }

    /// Cash still free after queued buys are reserved.
    pub fn buying_power(&self) -> f64 {
        let queued_shares: f64 = self.queued_orders.iter().map(Order::reserved_cash).sum();
        let queued_options: f64 = self
            .queued_option_orders
            .iter()
            .filter(|o| o.side == OptionSide::Buy)
            .map(|o| self.option_cost(o))
            .sum();
        self.balance - queued_shares - queued_options
    }

    /// Submit an equity order.
    ///
    /// A market order fills immediately while the market is open; limit
    /// orders and orders placed while closed are queued.
    pub fn submit(
        &mut self,
        mut order: Order,
        order_type: OrderType,
        now: NaiveDateTime,
    ) -> Result<Submission<Trade, Order>> {
        self.ensure_setup()?;
        Self::validate_order(&order.symbol, order.quantity, order.price)?;
        order.symbol = order.symbol.trim().to_uppercase();

        match order.side {
            TradeSide::Sell => {
                self.ensure_shares(&order.symbol, order.quantity)?;
            }
            TradeSide::Buy => {
                let available = self.buying_power();
                let needed = order.reserved_cash();
                if needed > available {
                    return Err(Error::InsufficientFunds { needed, available });
                }
            }
        }

        if order_type == OrderType::Market && self.market_hours.is_open(now) {
            let trade = match order.side {
                TradeSide::Buy => self.buy(&order.symbol, order.quantity, order.price)?,
                TradeSide::Sell => self.sell(&order.symbol, order.quantity, order.price)?,
            };
            return Ok(Submission::Executed(trade));
        }

        tracing::info!(symbol = %order.symbol, ?order_type, "order queued");
        self.queued_orders.push(order.clone());
        self.updated_at = Some(Utc::now());
        Ok(Submission::Queued(order))
    }

    /// Remove a queued equity order.
    pub fn cancel_order(&mut self, index: usize) -> Result<Order> {
        if index >= self.queued_orders.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.queued_orders.len(),
            });
        }
        self.updated_at = Some(Utc::now());
        Ok(self.queued_orders.remove(index))
    }

    /// Fill every queued equity order if the market is open.
    ///
    /// The queue is cleared; orders that can no longer be filled are dropped.
    pub fn execute_queued(&mut self, now: NaiveDateTime) -> Vec<Trade> {
        if !self.market_hours.is_open(now) || self.queued_orders.is_empty() {
            return Vec::new();
        }

        let queued = std::mem::take(&mut self.queued_orders);
        let mut executed = Vec::with_capacity(queued.len());
        for order in queued {
            let result = match order.side {
                TradeSide::Buy => self.buy(&order.symbol, order.quantity, order.price),
                TradeSide::Sell => self.sell(&order.symbol, order.quantity, order.price),
            };
            match result {
                Ok(trade) => executed.push(trade),
                Err(e) => tracing::warn!(symbol = %order.symbol, error = %e, "queued order dropped"),
            }
        }
        executed
    }

    fn option_cost(&self, order: &OptionOrder) -> f64 {
        order.price * order.contracts as f64 * self.contract_multiplier
    }

    fn validate_option(order: &OptionOrder) -> Result<()> {
        if order.symbol.trim().is_empty() {
            return Err(Error::Validation("symbol must not be empty".to_string()));
        }
        if order.contracts == 0 || order.price.is_nan() || order.price <= 0.0 {
            return Err(Error::Validation(format!(
                "contracts and premium must be positive (got {}, {})",
                order.contracts, order.price
            )));
        }
        if !order.strike.is_finite() || order.strike <= 0.0 {
            return Err(Error::Validation(format!(
                "strike must be a positive amount, got {}",
                order.strike
            )));
        }
        Ok(())
    }

    fn fill_option(&mut self, order: OptionOrder) -> OptionTrade {
        let premium = self.option_cost(&order);
        match order.side {
            OptionSide::Buy => self.balance -= premium,
            OptionSide::Sell => self.balance += premium,
        }

        let trade = OptionTrade {
            order,
            realized_pl: 0.0,
            executed_at: Utc::now(),
        };
        self.option_trades.push(trade.clone());
        self.updated_at = Some(Utc::now());
        trade
    }

    /// Submit an option order.
    ///
    /// Short calls must be covered by held shares and short puts secured by
    /// cash for the full strike.
    pub fn submit_option(
        &mut self,
        mut order: OptionOrder,
        order_type: OrderType,
        now: NaiveDateTime,
    ) -> Result<Submission<OptionTrade, OptionOrder>> {
        self.ensure_setup()?;
        Self::validate_option(&order)?;
        order.symbol = order.symbol.trim().to_uppercase();

        let shares = order.contracts as f64 * self.contract_multiplier;
        match (order.side, order.kind) {
            (OptionSide::Sell, OptionKind::Call) => {
                let held = self
                    .holdings
                    .iter()
                    .find(|h| h.symbol == order.symbol)
                    .map_or(0.0, |h| h.quantity);
                if held < shares {
                    return Err(Error::InvalidOperation(format!(
                        "Covered call needs {} shares of {}, have {}",
                        shares, order.symbol, held
                    )));
                }
            }
            (OptionSide::Sell, OptionKind::Put) => {
                let needed = order.strike * shares;
                if self.balance < needed {
                    return Err(Error::InsufficientFunds {
                        needed,
                        available: self.balance,
                    });
                }
            }
            (OptionSide::Buy, _) => {}
        }

        if order_type == OrderType::Market && self.market_hours.is_open(now) {
            let cost = self.option_cost(&order);
            if order.side == OptionSide::Buy && cost > self.balance {
                return Err(Error::InsufficientFunds {
                    needed: cost,
                    available: self.balance,
                });
            }
            return Ok(Submission::Executed(self.fill_option(order)));
        }

        self.queue_option(order.clone())?;
        Ok(Submission::Queued(order))
    }

    /// Queue an option order for the next open session.
    pub fn queue_option(&mut self, mut order: OptionOrder) -> Result<()> {
        self.ensure_setup()?;
        Self::validate_option(&order)?;
        order.symbol = order.symbol.trim().to_uppercase();

        tracing::info!(symbol = %order.symbol, kind = ?order.kind, side = ?order.side, "option order queued");
        self.queued_option_orders.push(order);
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Remove a queued option order.
    pub fn cancel_option(&mut self, index: usize) -> Result<OptionOrder> {
        if index >= self.queued_option_orders.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.queued_option_orders.len(),
            });
        }
        self.updated_at = Some(Utc::now());
        Ok(self.queued_option_orders.remove(index))
    }

    /// Fill every queued option order if the market is open.
    ///
    /// Buys are debited only when the balance covers them, otherwise dropped;
    /// sells credit the premium. The queue is cleared.
    pub fn execute_queued_options(&mut self, now: NaiveDateTime) -> Vec<OptionTrade> {
        if !self.market_hours.is_open(now) || self.queued_option_orders.is_empty() {
            return Vec::new();
        }

        let queued = std::mem::take(&mut self.queued_option_orders);
        let mut executed = Vec::with_capacity(queued.len());
        for order in queued {
            let cost = self.option_cost(&order);
            if order.side == OptionSide::Buy && self.balance < cost {
                tracing::warn!(
                    symbol = %order.symbol,
                    cost,
                    balance = self.balance,
                    "queued option order dropped"
                );
                continue;
            }
            executed.push(self.fill_option(order));
        }
        executed
    }

    /// Unrealized share P&L; holdings without a price are skipped.
    pub fn open_pl_shares(&self, prices: &HashMap<String, f64>) -> f64 {
        self.holdings
            .iter()
            .filter_map(|h| prices.get(&h.symbol).map(|&p| h.open_pl(p)))
            .sum()
    }

    /// Unrealized option P&L, marking every contract at `market_price`.
    pub fn open_pl_options(&self, market_price: f64) -> f64 {
        self.option_trades
            .iter()
            .map(|t| {
                let contracts = t.order.contracts as f64 * self.contract_multiplier;
                let notional_now = market_price * contracts;
                let cost = t.order.price * contracts;
                match t.order.side {
                    OptionSide::Buy => notional_now - cost,
                    OptionSide::Sell => cost - notional_now,
                }
            })
            .sum()
    }

    /// Get current status summary.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            setup_complete: self.setup_complete,
            starting_balance: self.starting_balance,
            balance: self.balance,
            buying_power: self.buying_power(),
            holdings: self.holdings.clone(),
            trade_count: self.trades.len(),
            option_trade_count: self.option_trades.len(),
            queued_orders: self.queued_orders.len(),
            queued_option_orders: self.queued_option_orders.len(),
            realized_pl: self.realized_pl,
            started_at: self.started_at,
        }
    }

    pub fn is_setup(&self) -> bool {
        self.setup_complete
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn option_trades(&self) -> &[OptionTrade] {
        &self.option_trades
    }

    pub fn queued_orders(&self) -> &[Order] {
        &self.queued_orders
    }

    pub fn queued_option_orders(&self) -> &[OptionOrder] {
        &self.queued_option_orders
    }

    pub fn realized_pl(&self) -> f64 {
        self.realized_pl
    }
}
