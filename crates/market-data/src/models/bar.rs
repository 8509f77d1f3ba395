use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily OHLCV bar.
///
/// Dates are calendar days in the market's local convention; non-trading
/// days are simply absent from a series. Prices must be strictly positive,
/// volume non-negative, and the high/low envelope must contain open and
/// close.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading day (market-local calendar date).
    pub date: NaiveDate,

    /// Opening price.
    pub open: Decimal,

    /// Highest traded price.
    pub high: Decimal,

    /// Lowest traded price.
    pub low: Decimal,

    /// Closing price.
    pub close: Decimal,

    /// Traded volume in shares (adapters normalize lots to shares).
    pub volume: Decimal,
}

/// A structural defect in a bar or a series of bars.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum SeriesDefect {
    /// The series contains no bars at all.
    #[error("series is empty")]
    Empty,

    /// A price field is zero or negative.
    #[error("bar {date}: non-positive price")]
    NonPositivePrice { date: NaiveDate },

    /// Volume is negative.
    #[error("bar {date}: negative volume")]
    NegativeVolume { date: NaiveDate },

    /// High is below open, close or low.
    #[error("bar {date}: high below open/close/low")]
    HighOutOfRange { date: NaiveDate },

    /// Low is above open, close or high.
    #[error("bar {date}: low above open/close/high")]
    LowOutOfRange { date: NaiveDate },

    /// Dates are not strictly increasing (duplicate or out of order).
    #[error("bar {date}: dates not strictly increasing")]
    NonIncreasingDates { date: NaiveDate },
}

impl PriceBar {
    /// Check the single-bar invariants, returning the first defect found.
    pub fn defect(&self) -> Option<SeriesDefect> {
        let date = self.date;

        if self.open <= Decimal::ZERO
            || self.high <= Decimal::ZERO
            || self.low <= Decimal::ZERO
            || self.close <= Decimal::ZERO
        {
            return Some(SeriesDefect::NonPositivePrice { date });
        }
        if self.volume < Decimal::ZERO {
            return Some(SeriesDefect::NegativeVolume { date });
        }
        if self.high < self.open || self.high < self.close || self.high < self.low {
            return Some(SeriesDefect::HighOutOfRange { date });
        }
        if self.low > self.open || self.low > self.close {
            return Some(SeriesDefect::LowOutOfRange { date });
        }

        None
    }
}

/// Check a whole series: non-empty, per-bar invariants, strictly
/// increasing dates. Returns the first defect found, scanning in order.
pub fn series_defect(series: &[PriceBar]) -> Option<SeriesDefect> {
    if series.is_empty() {
        return Some(SeriesDefect::Empty);
    }

    let mut prev_date: Option<NaiveDate> = None;
    for bar in series {
        if let Some(defect) = bar.defect() {
            return Some(defect);
        }
        if let Some(prev) = prev_date {
            if bar.date <= prev {
                return Some(SeriesDefect::NonIncreasingDates { date: bar.date });
            }
        }
        prev_date = Some(bar.date);
    }

    None
}
