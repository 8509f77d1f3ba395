//! The trend scoring engine.
//!
//! Pure function of the input series: no I/O, no randomness, no clock.
//! "Latest bar" always means the last element of the supplied series, never
//! wall-clock today.

use log::debug;
use rust_decimal::Decimal;
use trendlens_market_data::models::{series_defect, PriceBar};

use crate::config::ScoringConfig;
use crate::errors::AnalysisError;
use crate::indicators::{self, Kdj, Macd};
use crate::snapshot::{IndicatorSnapshot, TrendAnalysisResult};
use crate::status::{KdjStatus, MaStatus, MacdStatus, TrendStatus, VolumeStatus};

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);
const EIGHTY: Decimal = Decimal::from_parts(80, 0, 0, false, 0);
const TWENTY: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Moving-average windows, shortest to longest.
const MA_WINDOWS: [usize; 4] = [5, 10, 20, 60];

/// Longest lookback any indicator needs; series shorter than this are
/// rejected up front instead of producing a partial result.
pub const MIN_HISTORY: usize = MA_WINDOWS[3];

const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const KDJ_PERIOD: usize = 9;
const RSI_PERIOD: usize = 14;
const BOLL_PERIOD: usize = 20;

/// Technical trend scoring engine.
///
/// Holds only its (immutable) scoring policy, so one instance can be
/// shared freely across concurrent analyses.
pub struct TrendAnalyzer {
    config: ScoringConfig,
}

impl TrendAnalyzer {
    /// Engine with the default scoring policy.
    pub fn new() -> Self {
        Self::with_config(ScoringConfig::default())
    }

    /// Engine with a custom scoring policy.
    pub fn with_config(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// The active scoring policy.
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Minimum series length `analyze` accepts.
    pub fn required_history(&self) -> usize {
        MIN_HISTORY
    }

    /// Analyze a daily series and derive the composite trend result.
    ///
    /// The series must be well-formed (strictly increasing dates, valid
    /// OHLC envelopes) and at least [`MIN_HISTORY`] bars long; anything
    /// less fails without a partial result.
    pub fn analyze(
        &self,
        series: &[PriceBar],
        symbol: &str,
    ) -> Result<TrendAnalysisResult, AnalysisError> {
        if series.len() < MIN_HISTORY {
            return Err(AnalysisError::InsufficientHistory {
                required: MIN_HISTORY,
                got: series.len(),
            });
        }
        if let Some(defect) = series_defect(series) {
            return Err(AnalysisError::MalformedSeries {
                message: defect.to_string(),
            });
        }

        let closes: Vec<Decimal> = series.iter().map(|bar| bar.close).collect();
        let highs: Vec<Decimal> = series.iter().map(|bar| bar.high).collect();
        let lows: Vec<Decimal> = series.iter().map(|bar| bar.low).collect();
        let volumes: Vec<Decimal> = series.iter().map(|bar| bar.volume).collect();

        // Length is checked above, so every indicator has enough data; a
        // None here would be an internal inconsistency, reported as the
        // history error rather than a panic.
        let short = || AnalysisError::InsufficientHistory {
            required: MIN_HISTORY,
            got: series.len(),
        };

        let ma5 = indicators::sma(&closes, MA_WINDOWS[0]).ok_or_else(short)?;
        let ma10 = indicators::sma(&closes, MA_WINDOWS[1]).ok_or_else(short)?;
        let ma20 = indicators::sma(&closes, MA_WINDOWS[2]).ok_or_else(short)?;
        let ma60 = indicators::sma(&closes, MA_WINDOWS[3]).ok_or_else(short)?;

        let macd = indicators::macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL)
            .ok_or_else(short)?;
        let kdj = indicators::kdj(&highs, &lows, &closes, KDJ_PERIOD).ok_or_else(short)?;
        let rsi = indicators::rsi(&closes, RSI_PERIOD).ok_or_else(short)?;
        let (boll_upper, boll_mid, boll_lower) =
            indicators::bollinger(&closes, BOLL_PERIOD, Decimal::TWO).ok_or_else(short)?;

        // A suspended stock can have a zero trailing average; treat the
        // ratio as neutral rather than failing the whole analysis.
        let volume_ratio = indicators::volume_ratio(&volumes, self.config.volume_lookback)
            .unwrap_or(Decimal::ONE);

        let close = closes[closes.len() - 1];
        let prev_close = closes[closes.len() - 2];
        let bias_ma5 = (close - ma5) / ma5 * HUNDRED;

        let ma_status = self.classify_ma(ma5, ma10, ma20, ma60);
        let macd_status = self.classify_macd(&macd);
        let kdj_status = Self::classify_kdj(&kdj);
        let volume_status = self.classify_volume(volume_ratio, close, prev_close);
        let trend_status = Self::refine_trend(ma_status, macd_status);

        let signal_score =
            self.score(ma_status, macd_status, kdj_status, volume_status, bias_ma5);
        let buy_signal = self.config.signal_bands.classify(signal_score);

        debug!(
            "[{}] ma={:?} macd={:?} kdj={:?} volume={:?} -> {} ({:?})",
            symbol, ma_status, macd_status, kdj_status, volume_status, signal_score, buy_signal
        );

        let last = |values: &[Decimal]| values.last().copied().unwrap_or_default();

        Ok(TrendAnalysisResult {
            symbol: symbol.to_string(),
            signal_score,
            buy_signal,
            trend_status,
            ma_status,
            volume_status,
            macd_status,
            kdj_status,
            bias_ma5,
            snapshot: IndicatorSnapshot {
                ma5,
                ma10,
                ma20,
                ma60,
                macd_line: last(&macd.line),
                macd_signal: last(&macd.signal),
                macd_hist: last(&macd.histogram),
                kdj_k: last(&kdj.k),
                kdj_d: last(&kdj.d),
                kdj_j: last(&kdj.j),
                rsi,
                boll_upper,
                boll_mid,
                boll_lower,
                bias_ma5,
                volume_ratio,
            },
        })
    }

    /// MA alignment at the latest bar. A full bull stack only counts as
    /// StrongBull when every adjacent gap clears the separation threshold;
    /// averages that have converged to within noise stay merely Bullish.
    fn classify_ma(&self, ma5: Decimal, ma10: Decimal, ma20: Decimal, ma60: Decimal) -> MaStatus {
        let gap_pct =
            |fast: Decimal, slow: Decimal| (fast - slow) / slow * HUNDRED;

        if ma5 > ma10 && ma10 > ma20 && ma20 > ma60 {
            let min_gap = self.config.ma_gap_min_pct;
            if gap_pct(ma5, ma10) > min_gap
                && gap_pct(ma10, ma20) > min_gap
                && gap_pct(ma20, ma60) > min_gap
            {
                return MaStatus::StrongBull;
            }
        }

        if ma5 > ma10 && ma10 > ma20 {
            MaStatus::Bullish
        } else if ma5 < ma10 && ma10 < ma20 {
            MaStatus::Bearish
        } else {
            MaStatus::Choppy
        }
    }

    /// Most recent histogram sign change within the configured lookback,
    /// qualified by which side of zero the MACD line sits on now.
    fn classify_macd(&self, macd: &Macd) -> MacdStatus {
        let hist = &macd.histogram;
        if hist.len() < 2 {
            return MacdStatus::Neutral;
        }

        let line_above_zero = macd
            .line
            .last()
            .map(|&line| line > Decimal::ZERO)
            .unwrap_or(false);

        let steps = self.config.macd_cross_lookback.min(hist.len() - 1);
        for offset in 0..steps {
            let idx = hist.len() - 1 - offset;
            let curr = hist[idx];
            let prev = hist[idx - 1];

            if prev <= Decimal::ZERO && curr > Decimal::ZERO {
                return if line_above_zero {
                    MacdStatus::GoldenCrossAboveZero
                } else {
                    MacdStatus::GoldenCrossBelowZero
                };
            }
            if prev >= Decimal::ZERO && curr < Decimal::ZERO {
                return if line_above_zero {
                    MacdStatus::DeadCrossAboveZero
                } else {
                    MacdStatus::DeadCrossBelowZero
                };
            }
        }

        MacdStatus::Neutral
    }

    /// KDJ state: the extreme zones dominate, a K/D cross only reads from
    /// neutral territory.
    fn classify_kdj(kdj: &Kdj) -> KdjStatus {
        let (k, d) = match (kdj.k.last(), kdj.d.last()) {
            (Some(&k), Some(&d)) => (k, d),
            _ => return KdjStatus::Neutral,
        };

        if k > EIGHTY && d > EIGHTY {
            return KdjStatus::Overbought;
        }
        if k < TWENTY && d < TWENTY {
            return KdjStatus::Oversold;
        }

        if kdj.k.len() >= 2 {
            let prev_k = kdj.k[kdj.k.len() - 2];
            let prev_d = kdj.d[kdj.d.len() - 2];

            if prev_k <= prev_d && k > d {
                return KdjStatus::GoldenCross;
            }
            if prev_k >= prev_d && k < d {
                return KdjStatus::DeadCross;
            }
        }

        KdjStatus::Neutral
    }

    /// Heavy volume is only directional when the close actually moved.
    fn classify_volume(
        &self,
        volume_ratio: Decimal,
        close: Decimal,
        prev_close: Decimal,
    ) -> VolumeStatus {
        if volume_ratio > self.config.volume_heavy_ratio {
            if close > prev_close {
                return VolumeStatus::HeavyInflow;
            }
            if close < prev_close {
                return VolumeStatus::HeavyOutflow;
            }
        }
        VolumeStatus::Normal
    }

    /// Trend = MA alignment, demoted one notch when MACD disagrees.
    fn refine_trend(ma_status: MaStatus, macd_status: MacdStatus) -> TrendStatus {
        match ma_status {
            MaStatus::StrongBull => {
                if macd_status.is_dead_cross() {
                    TrendStatus::Bull
                } else {
                    TrendStatus::StrongBull
                }
            }
            MaStatus::Bullish => {
                if macd_status.is_dead_cross() {
                    TrendStatus::Range
                } else {
                    TrendStatus::Bull
                }
            }
            MaStatus::Bearish => {
                if macd_status.is_golden_cross() {
                    TrendStatus::Range
                } else {
                    TrendStatus::Bear
                }
            }
            MaStatus::Choppy => TrendStatus::Range,
        }
    }

    /// Weighted sum of the configured sub-scores, clamped to [0, 100]
    /// whatever the weight configuration says.
    fn score(
        &self,
        ma_status: MaStatus,
        macd_status: MacdStatus,
        kdj_status: KdjStatus,
        volume_status: VolumeStatus,
        bias_ma5: Decimal,
    ) -> u8 {
        let w = &self.config.weights;

        let mut total: i32 = 0;

        total += match ma_status {
            MaStatus::StrongBull => w.ma_strong_bull,
            MaStatus::Bullish => w.ma_bullish,
            MaStatus::Choppy => w.ma_choppy,
            MaStatus::Bearish => w.ma_bearish,
        };

        total += match macd_status {
            MacdStatus::GoldenCrossAboveZero => w.macd_golden_above,
            MacdStatus::GoldenCrossBelowZero => w.macd_golden_below,
            MacdStatus::Neutral => w.macd_neutral,
            MacdStatus::DeadCrossAboveZero => w.macd_dead_above,
            MacdStatus::DeadCrossBelowZero => w.macd_dead_below,
        };

        total += match kdj_status {
            KdjStatus::GoldenCross => w.kdj_golden_cross,
            KdjStatus::Oversold => w.kdj_oversold,
            KdjStatus::Neutral => w.kdj_neutral,
            KdjStatus::Overbought => w.kdj_overbought,
            KdjStatus::DeadCross => w.kdj_dead_cross,
        };

        total += match volume_status {
            VolumeStatus::HeavyInflow => w.volume_heavy_inflow,
            VolumeStatus::Normal => w.volume_normal,
            VolumeStatus::HeavyOutflow => w.volume_heavy_outflow,
        };

        total += self.bias_score(bias_ma5);

        total.clamp(0, 100) as u8
    }

    fn bias_score(&self, bias_ma5: Decimal) -> i32 {
        let bands = &self.config.bias_bands;

        if bias_ma5 < Decimal::ZERO {
            bands.pullback_score
        } else if bias_ma5 < bands.tight_pct {
            bands.tight_score
        } else if bias_ma5 < bands.moderate_pct {
            bands.moderate_score
        } else {
            bands.stretched_score
        }
    }
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoreWeights;
    use crate::status::BuySignal;
    use chrono::{Days, NaiveDate};
    use rust_decimal_macros::dec;

    fn bars_from_closes(closes: &[Decimal]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start.checked_add_days(Days::new(i as u64)).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: dec!(100000),
            })
            .collect()
    }

    /// Strictly increasing closes, +1 per day.
    fn rising_series(n: usize, base: i64) -> Vec<PriceBar> {
        let closes: Vec<Decimal> = (0..n)
            .map(|i| Decimal::from(base + i as i64))
            .collect();
        bars_from_closes(&closes)
    }

    fn falling_series(n: usize, base: i64) -> Vec<PriceBar> {
        let closes: Vec<Decimal> = (0..n)
            .map(|i| Decimal::from(base - i as i64))
            .collect();
        bars_from_closes(&closes)
    }

    #[test]
    fn test_minimum_length_boundary() {
        let analyzer = TrendAnalyzer::new();

        assert!(analyzer.analyze(&rising_series(60, 100), "600519").is_ok());

        let error = analyzer
            .analyze(&rising_series(59, 100), "600519")
            .unwrap_err();
        assert_eq!(
            error,
            AnalysisError::InsufficientHistory {
                required: 60,
                got: 59
            }
        );
    }

    #[test]
    fn test_empty_series_is_insufficient() {
        let analyzer = TrendAnalyzer::new();
        let error = analyzer.analyze(&[], "600519").unwrap_err();
        assert_eq!(
            error,
            AnalysisError::InsufficientHistory {
                required: 60,
                got: 0
            }
        );
    }

    #[test]
    fn test_unordered_dates_rejected_not_reordered() {
        let analyzer = TrendAnalyzer::new();
        let mut series = rising_series(60, 100);
        series.swap(10, 40);

        let error = analyzer.analyze(&series, "600519").unwrap_err();
        assert!(matches!(error, AnalysisError::MalformedSeries { .. }));
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let analyzer = TrendAnalyzer::new();
        let series = rising_series(80, 50);

        let first = analyzer.analyze(&series, "600519").unwrap();
        let second = analyzer.analyze(&series, "600519").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_rising_series_reads_strong_bull() {
        let analyzer = TrendAnalyzer::new();
        let result = analyzer.analyze(&rising_series(60, 100), "600519").unwrap();

        assert_eq!(result.ma_status, MaStatus::StrongBull);
        assert!(matches!(
            result.trend_status,
            TrendStatus::StrongBull | TrendStatus::Bull
        ));
        assert!(matches!(
            result.buy_signal,
            BuySignal::StrongBuy | BuySignal::Buy
        ));
        assert!(result.signal_score <= 100);
    }

    #[test]
    fn test_falling_series_reads_bearish() {
        let analyzer = TrendAnalyzer::new();
        let result = analyzer.analyze(&falling_series(60, 200), "600519").unwrap();

        assert_eq!(result.ma_status, MaStatus::Bearish);
        assert!(matches!(
            result.trend_status,
            TrendStatus::Bear | TrendStatus::Range
        ));
        assert!(result.signal_score < 60);
    }

    #[test]
    fn test_snapshot_is_internally_consistent() {
        let analyzer = TrendAnalyzer::new();
        let series = rising_series(60, 100);
        let result = analyzer.analyze(&series, "600519").unwrap();
        let snapshot = &result.snapshot;

        let close = series[series.len() - 1].close;
        let expected_bias = (close - snapshot.ma5) / snapshot.ma5 * dec!(100);

        assert_eq!(result.bias_ma5, expected_bias);
        assert_eq!(snapshot.bias_ma5, expected_bias);
        assert!(snapshot.ma5 > snapshot.ma10);
        assert!(snapshot.ma10 > snapshot.ma20);
        assert!(snapshot.ma20 > snapshot.ma60);
        assert_eq!(
            snapshot.macd_hist,
            snapshot.macd_line - snapshot.macd_signal
        );
        assert!(snapshot.boll_upper >= snapshot.boll_mid);
        assert!(snapshot.boll_lower <= snapshot.boll_mid);
        assert_eq!(snapshot.rsi, dec!(100)); // no down day in the series
    }

    #[test]
    fn test_score_clamped_for_any_weights() {
        let mut config = ScoringConfig::default();
        config.weights = ScoreWeights {
            ma_strong_bull: 1000,
            ma_bullish: 1000,
            ma_choppy: 1000,
            ma_bearish: 1000,
            macd_golden_above: 1000,
            macd_golden_below: 1000,
            macd_neutral: 1000,
            macd_dead_above: 1000,
            macd_dead_below: 1000,
            kdj_golden_cross: 1000,
            kdj_oversold: 1000,
            kdj_neutral: 1000,
            kdj_overbought: 1000,
            kdj_dead_cross: 1000,
            volume_heavy_inflow: 1000,
            volume_normal: 1000,
            volume_heavy_outflow: 1000,
        };
        let greedy = TrendAnalyzer::with_config(config.clone());
        let result = greedy.analyze(&rising_series(60, 100), "600519").unwrap();
        assert_eq!(result.signal_score, 100);

        config.weights = ScoreWeights {
            ma_strong_bull: -1000,
            ma_bullish: -1000,
            ma_choppy: -1000,
            ma_bearish: -1000,
            macd_golden_above: -1000,
            macd_golden_below: -1000,
            macd_neutral: -1000,
            macd_dead_above: -1000,
            macd_dead_below: -1000,
            kdj_golden_cross: -1000,
            kdj_oversold: -1000,
            kdj_neutral: -1000,
            kdj_overbought: -1000,
            kdj_dead_cross: -1000,
            volume_heavy_inflow: -1000,
            volume_normal: -1000,
            volume_heavy_outflow: -1000,
        };
        let grim = TrendAnalyzer::with_config(config);
        let result = grim.analyze(&rising_series(60, 100), "600519").unwrap();
        assert_eq!(result.signal_score, 0);
    }

    #[test]
    fn test_converged_averages_are_not_strong_bull() {
        // Closes rising by a hair: the stack orders bullishly but the gaps
        // stay under the separation threshold.
        let closes: Vec<Decimal> = (0..60)
            .map(|i| dec!(100) + Decimal::new(i, 3)) // +0.001/day
            .collect();
        let analyzer = TrendAnalyzer::new();
        let result = analyzer.analyze(&bars_from_closes(&closes), "600519").unwrap();

        assert_eq!(result.ma_status, MaStatus::Bullish);
    }

    #[test]
    fn test_heavy_volume_on_up_close_is_inflow() {
        let mut series = rising_series(60, 100);
        let last = series.len() - 1;
        series[last].volume = dec!(500000); // 5x the trailing average

        let analyzer = TrendAnalyzer::new();
        let result = analyzer.analyze(&series, "600519").unwrap();

        assert_eq!(result.volume_status, VolumeStatus::HeavyInflow);
        assert_eq!(result.snapshot.volume_ratio, dec!(5));
    }

    #[test]
    fn test_heavy_volume_on_down_close_is_outflow() {
        let mut series = rising_series(60, 100);
        let last = series.len() - 1;
        // Turn the last bar into a heavy down day.
        let prev_close = series[last - 1].close;
        series[last].close = prev_close - dec!(1);
        series[last].open = series[last].close;
        series[last].high = series[last].close;
        series[last].low = series[last].close;
        series[last].volume = dec!(500000);

        let analyzer = TrendAnalyzer::new();
        let result = analyzer.analyze(&series, "600519").unwrap();

        assert_eq!(result.volume_status, VolumeStatus::HeavyOutflow);
    }

    #[test]
    fn test_overbought_kdj_on_relentless_rally() {
        let analyzer = TrendAnalyzer::new();
        let result = analyzer.analyze(&rising_series(60, 100), "600519").unwrap();

        assert_eq!(result.kdj_status, KdjStatus::Overbought);
    }
}
