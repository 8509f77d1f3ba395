use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::status::{
    BuySignal, KdjStatus, MaStatus, MacdStatus, TrendStatus, VolumeStatus,
};

/// All indicator values at the latest bar of one series.
///
/// Computed once per analysis and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub ma5: Decimal,
    pub ma10: Decimal,
    pub ma20: Decimal,
    pub ma60: Decimal,

    pub macd_line: Decimal,
    pub macd_signal: Decimal,
    pub macd_hist: Decimal,

    pub kdj_k: Decimal,
    pub kdj_d: Decimal,
    pub kdj_j: Decimal,

    pub rsi: Decimal,

    pub boll_upper: Decimal,
    pub boll_mid: Decimal,
    pub boll_lower: Decimal,

    /// (close − ma5) / ma5 × 100.
    pub bias_ma5: Decimal,

    /// Latest volume over the trailing average volume.
    pub volume_ratio: Decimal,
}

/// Immutable result of one trend analysis.
///
/// Deterministically derived from the input series: the same series always
/// yields the same result. Consumed read-only by the AI/selection layers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendAnalysisResult {
    pub symbol: String,

    /// Composite score, clamped to 0–100.
    pub signal_score: u8,

    pub buy_signal: BuySignal,
    pub trend_status: TrendStatus,
    pub ma_status: MaStatus,
    pub volume_status: VolumeStatus,
    pub macd_status: MacdStatus,
    pub kdj_status: KdjStatus,

    /// (close − ma5) / ma5 × 100, duplicated out of the snapshot because
    /// the selection layer gates on it directly.
    pub bias_ma5: Decimal,

    pub snapshot: IndicatorSnapshot,
}
