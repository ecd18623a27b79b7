//! Paper trading simulation module.
//!
//! Provides a session store for simulated share and option trading without
//! real money, gated by regular market hours.

mod market_hours;
mod session;

pub use market_hours::MarketHours;
pub use session::{
    Holding, OptionOrder, OptionTrade, Order, OrderType, SessionStatus, Submission,
    TradingSession,
};
