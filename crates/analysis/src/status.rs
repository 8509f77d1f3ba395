//! Categorical indicator statuses.
//!
//! Closed enumerations so every branch in the scoring algorithm is
//! exhaustive and compiler-checked instead of string-compared.

use serde::{Deserialize, Serialize};

/// Moving-average alignment at the latest bar.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum MaStatus {
    /// ma5 > ma10 > ma20 > ma60 with every gap above the separation
    /// threshold (converged averages do not qualify).
    StrongBull,
    /// ma5 > ma10 > ma20.
    Bullish,
    /// ma5 < ma10 < ma20.
    Bearish,
    /// Averages are entangled.
    Choppy,
}

/// Most recent MACD histogram sign change, qualified by the line's side of
/// the zero axis.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum MacdStatus {
    GoldenCrossAboveZero,
    GoldenCrossBelowZero,
    DeadCrossAboveZero,
    DeadCrossBelowZero,
    /// No sign change within the lookback window.
    Neutral,
}

impl MacdStatus {
    /// Any golden cross, regardless of the zero axis.
    pub fn is_golden_cross(self) -> bool {
        matches!(self, Self::GoldenCrossAboveZero | Self::GoldenCrossBelowZero)
    }

    /// Any dead cross, regardless of the zero axis.
    pub fn is_dead_cross(self) -> bool {
        matches!(self, Self::DeadCrossAboveZero | Self::DeadCrossBelowZero)
    }
}

/// KDJ oscillator state at the latest bar.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum KdjStatus {
    /// K and D both above 80.
    Overbought,
    /// K and D both below 20.
    Oversold,
    /// K crossed above D on the latest bar.
    GoldenCross,
    /// K crossed below D on the latest bar.
    DeadCross,
    Neutral,
}

/// Volume behaviour of the latest bar against its trailing average.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum VolumeStatus {
    /// Heavy volume on a rising close.
    HeavyInflow,
    /// Heavy volume on a falling close.
    HeavyOutflow,
    Normal,
}

/// Composite trend classification: MA alignment refined by MACD agreement.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TrendStatus {
    StrongBull,
    Bull,
    Bear,
    Range,
}

/// Action bucket derived from the composite score.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum BuySignal {
    StrongBuy,
    Buy,
    Hold,
    Sell,
}

/// Market-wide regime for the benchmark index.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum MarketRegime {
    Bull,
    Bear,
    Range,
}

impl std::fmt::Display for TrendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrongBull => write!(f, "strong bull"),
            Self::Bull => write!(f, "bull"),
            Self::Bear => write!(f, "bear"),
            Self::Range => write!(f, "range"),
        }
    }
}

impl std::fmt::Display for BuySignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrongBuy => write!(f, "strong buy"),
            Self::Buy => write!(f, "buy"),
            Self::Hold => write!(f, "hold"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

impl std::fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bull => write!(f, "bull"),
            Self::Bear => write!(f, "bear"),
            Self::Range => write!(f, "range"),
        }
    }
}
