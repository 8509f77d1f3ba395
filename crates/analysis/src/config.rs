//! Scoring policy configuration.
//!
//! Everything a deployment might want to tune lives here as plain data:
//! sub-score tables, band edges and thresholds. The engine hard-codes the
//! indicator math (windows 5/10/20/60, MACD 12/26/9, KDJ 9, RSI 14,
//! BOLL 20/2σ) and keeps the [0, 100] clamp regardless of the weights it
//! is given.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sub-score contributed by each categorical status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub ma_strong_bull: i32,
    pub ma_bullish: i32,
    pub ma_choppy: i32,
    pub ma_bearish: i32,

    pub macd_golden_above: i32,
    pub macd_golden_below: i32,
    pub macd_neutral: i32,
    pub macd_dead_above: i32,
    pub macd_dead_below: i32,

    pub kdj_golden_cross: i32,
    pub kdj_oversold: i32,
    pub kdj_neutral: i32,
    pub kdj_overbought: i32,
    pub kdj_dead_cross: i32,

    pub volume_heavy_inflow: i32,
    pub volume_normal: i32,
    pub volume_heavy_outflow: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            ma_strong_bull: 30,
            ma_bullish: 22,
            ma_choppy: 10,
            ma_bearish: 0,

            macd_golden_above: 20,
            macd_golden_below: 14,
            macd_neutral: 8,
            macd_dead_above: 4,
            macd_dead_below: 0,

            kdj_golden_cross: 15,
            kdj_oversold: 10,
            kdj_neutral: 8,
            kdj_overbought: 4,
            kdj_dead_cross: 0,

            volume_heavy_inflow: 15,
            volume_normal: 8,
            volume_heavy_outflow: 0,
        }
    }
}

/// Sub-score for the price's deviation from ma5.
///
/// A small or negative bias (price sitting on its short average, or
/// pulling back under it) reads as an entry; a stretched bias reads as
/// chase risk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiasBands {
    /// Score when bias is negative (pullback under ma5).
    pub pullback_score: i32,
    /// Upper edge of the "tight to ma5" band, percent.
    pub tight_pct: Decimal,
    pub tight_score: i32,
    /// Upper edge of the "moderate" band, percent.
    pub moderate_pct: Decimal,
    pub moderate_score: i32,
    /// Score beyond the moderate edge.
    pub stretched_score: i32,
}

impl Default for BiasBands {
    fn default() -> Self {
        Self {
            pullback_score: 18,
            tight_pct: Decimal::TWO,
            tight_score: 20,
            moderate_pct: Decimal::new(5, 0),
            moderate_score: 12,
            stretched_score: 4,
        }
    }
}

/// Score-band boundaries mapping the composite score to a [`BuySignal`].
///
/// [`BuySignal`]: crate::status::BuySignal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalBands {
    pub strong_buy_min: u8,
    pub buy_min: u8,
    pub hold_min: u8,
}

impl Default for SignalBands {
    fn default() -> Self {
        Self {
            strong_buy_min: 80,
            buy_min: 60,
            hold_min: 40,
        }
    }
}

impl SignalBands {
    /// Map a clamped score into its action bucket.
    pub fn classify(&self, score: u8) -> crate::status::BuySignal {
        use crate::status::BuySignal;

        if score >= self.strong_buy_min {
            BuySignal::StrongBuy
        } else if score >= self.buy_min {
            BuySignal::Buy
        } else if score >= self.hold_min {
            BuySignal::Hold
        } else {
            BuySignal::Sell
        }
    }
}

/// Thresholds for the benchmark-index regime classification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeThresholds {
    /// Bars in the trailing-return window.
    pub return_lookback: usize,
    /// Bear when ma5 < ma20 and the trailing return is below this, percent.
    pub bear_return_pct: Decimal,
    /// Bull when ma5 > ma20 and the trailing return is above this, percent.
    pub bull_return_pct: Decimal,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            return_lookback: 5,
            bear_return_pct: Decimal::new(-2, 0),
            bull_return_pct: Decimal::ONE,
        }
    }
}

/// Full scoring policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Minimum percent gap between adjacent averages for a StrongBull
    /// reading.
    pub ma_gap_min_pct: Decimal,

    /// How many recent histogram steps to scan for a MACD cross.
    pub macd_cross_lookback: usize,

    /// Bars in the trailing average-volume window.
    pub volume_lookback: usize,

    /// Volume ratio above which a bar counts as heavy.
    pub volume_heavy_ratio: Decimal,

    pub weights: ScoreWeights,
    pub bias_bands: BiasBands,
    pub signal_bands: SignalBands,
    pub regime: RegimeThresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            ma_gap_min_pct: Decimal::new(5, 1),
            macd_cross_lookback: 3,
            volume_lookback: 5,
            volume_heavy_ratio: Decimal::TWO,
            weights: ScoreWeights::default(),
            bias_bands: BiasBands::default(),
            signal_bands: SignalBands::default(),
            regime: RegimeThresholds::default(),
        }
    }
}
