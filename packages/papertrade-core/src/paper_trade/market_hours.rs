//! Regular trading session hours.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Weekday session window, both ends inclusive to the minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl Default for MarketHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
        }
    }
}

impl MarketHours {
    /// Whether the market is open at a local exchange time.
    pub fn is_open(&self, at: NaiveDateTime) -> bool {
        if matches!(at.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }

        let minute_of_day = |t: NaiveTime| t.hour() * 60 + t.minute();
        let now = minute_of_day(at.time());
        now >= minute_of_day(self.open) && now <= minute_of_day(self.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        // January 2024: the 8th is a Monday, the 6th a Saturday
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn test_weekday_session() {
        let hours = MarketHours::default();
        assert!(!hours.is_open(at(8, 9, 29, 59)));
        assert!(hours.is_open(at(8, 9, 30, 0)));
        assert!(hours.is_open(at(10, 12, 0, 0)));
        assert!(hours.is_open(at(12, 16, 0, 45)));
        assert!(!hours.is_open(at(12, 16, 1, 0)));
    }

    #[test]
    fn test_weekend_closed() {
        let hours = MarketHours::default();
        assert!(!hours.is_open(at(6, 12, 0, 0)));
        assert!(!hours.is_open(at(7, 12, 0, 0)));
    }
}
