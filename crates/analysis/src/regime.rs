//! Market-wide regime classification from the benchmark index.
//!
//! A thin consumer of the scoring engine: runs it over the index series
//! and reduces the MA relationship plus a short-term return to a
//! three-way bull/bear/range call. The classification is advisory
//! metadata; whether a bear reading suppresses per-stock analysis is the
//! orchestrator's policy, not this component's.

use log::info;
use rust_decimal::Decimal;
use trendlens_market_data::models::PriceBar;

use crate::analyzer::TrendAnalyzer;
use crate::config::ScoringConfig;
use crate::errors::AnalysisError;
use crate::status::MarketRegime;

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Classifies the market regime from a benchmark index series.
pub struct MarketRegimeFilter {
    analyzer: TrendAnalyzer,
}

impl MarketRegimeFilter {
    /// Filter with the default policy.
    pub fn new() -> Self {
        Self::with_config(ScoringConfig::default())
    }

    /// Filter with a custom policy (thresholds live in `config.regime`).
    pub fn with_config(config: ScoringConfig) -> Self {
        Self {
            analyzer: TrendAnalyzer::with_config(config),
        }
    }

    /// Classify the market from the benchmark index series.
    ///
    /// `Bear` when ma5 < ma20 and the trailing return is below the bear
    /// threshold; `Bull` when ma5 > ma20 and the trailing return is above
    /// the bull threshold; `Range` otherwise.
    pub fn classify_market(
        &self,
        index_series: &[PriceBar],
    ) -> Result<MarketRegime, AnalysisError> {
        let result = self.analyzer.analyze(index_series, "benchmark")?;
        let snapshot = &result.snapshot;
        let thresholds = &self.analyzer.config().regime;

        // analyze() enforced the minimum length, which exceeds any sane
        // return lookback; clamp anyway so a huge configured lookback
        // degrades to "since the start of the series".
        let n = index_series.len();
        let lookback = thresholds.return_lookback.max(1).min(n - 1);
        let latest = index_series[n - 1].close;
        let base = index_series[n - 1 - lookback].close;
        let trailing_return_pct = (latest - base) / base * HUNDRED;

        let regime = if snapshot.ma5 < snapshot.ma20
            && trailing_return_pct < thresholds.bear_return_pct
        {
            MarketRegime::Bear
        } else if snapshot.ma5 > snapshot.ma20
            && trailing_return_pct > thresholds.bull_return_pct
        {
            MarketRegime::Bull
        } else {
            MarketRegime::Range
        };

        info!(
            "Market regime: {} (ma5 {:.2}, ma20 {:.2}, {}-bar return {:.2}%)",
            regime, snapshot.ma5, snapshot.ma20, lookback, trailing_return_pct
        );

        Ok(regime)
    }
}

impl Default for MarketRegimeFilter {
    fn default() -> Self {
        Self::new()
    }
}
