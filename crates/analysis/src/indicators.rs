//! Pure computation of technical indicators.
//!
//! No I/O, no side effects. Takes price/volume slices and returns indicator
//! values; all computations use `Decimal`. Helpers return `None` instead of
//! guessing when there is not enough data — the analyzer checks history
//! length up front, so a `None` here means a caller bug, not a data issue.
//!
//! Indicators implemented: SMA, EMA (SMA-seeded), MACD, KDJ, RSI (Wilder's
//! smoothing), Bollinger bands (population std-dev), volume ratio.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);
const FIFTY: Decimal = Decimal::from_parts(50, 0, 0, false, 0);
const THREE: Decimal = Decimal::from_parts(3, 0, 0, false, 0);

/// Simple moving average of the trailing `period` values.
pub fn sma(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }

    let window = &values[values.len() - period..];
    Some(window.iter().copied().sum::<Decimal>() / Decimal::from(period as u64))
}

/// Exponential moving average series.
///
/// Multiplier `k = 2 / (period + 1)`; the first value is seeded with the
/// SMA of the first `period` inputs, so the output has
/// `len - period + 1` values aligned to the input tail.
pub fn ema(values: &[Decimal], period: usize) -> Vec<Decimal> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = Decimal::TWO / Decimal::from(period as u64 + 1);
    let one_minus_k = Decimal::ONE - k;

    let seed: Decimal =
        values[..period].iter().copied().sum::<Decimal>() / Decimal::from(period as u64);

    let mut result = Vec::with_capacity(values.len() - period + 1);
    result.push(seed);

    for &value in &values[period..] {
        let prev = result[result.len() - 1];
        result.push(value * k + prev * one_minus_k);
    }

    result
}

/// MACD line, signal line and histogram series.
///
/// All three vectors end at the latest bar. `line` starts once the slow EMA
/// is seeded; `signal` and `histogram` start `signal_period - 1` values
/// later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Macd {
    pub line: Vec<Decimal>,
    pub signal: Vec<Decimal>,
    pub histogram: Vec<Decimal>,
}

/// Moving average convergence divergence.
///
/// Line = EMA(fast) − EMA(slow), signal = EMA(line, signal_period),
/// histogram = line − signal. Returns `None` when fewer than
/// `slow + signal_period - 1` values are supplied (no histogram value yet).
pub fn macd(
    closes: &[Decimal],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Option<Macd> {
    if fast == 0 || slow <= fast || signal_period == 0 {
        return None;
    }
    if closes.len() < slow + signal_period - 1 {
        return None;
    }

    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);

    // Align the two EMAs on the slow start.
    let offset = slow - fast;
    let line: Vec<Decimal> = (0..slow_ema.len())
        .map(|i| fast_ema[i + offset] - slow_ema[i])
        .collect();

    let signal = ema(&line, signal_period);
    let histogram: Vec<Decimal> = signal
        .iter()
        .enumerate()
        .map(|(i, &s)| line[i + signal_period - 1] - s)
        .collect();

    Some(Macd {
        line,
        signal,
        histogram,
    })
}

/// KDJ stochastic series, one value per input bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Kdj {
    pub k: Vec<Decimal>,
    pub d: Vec<Decimal>,
    pub j: Vec<Decimal>,
}

/// KDJ stochastic oscillator.
///
/// RSV = (close − lowest low) / (highest high − lowest low) × 100 over a
/// trailing `period` window (growing at the start of the series), then
/// K = (2·K₋₁ + RSV) / 3, D = (2·D₋₁ + K) / 3 with both seeded at 50, and
/// J = 3K − 2D. A flat window yields RSV 50.
pub fn kdj(
    highs: &[Decimal],
    lows: &[Decimal],
    closes: &[Decimal],
    period: usize,
) -> Option<Kdj> {
    let n = closes.len();
    if period == 0 || n < period || highs.len() != n || lows.len() != n {
        return None;
    }

    let mut k_series = Vec::with_capacity(n);
    let mut d_series = Vec::with_capacity(n);
    let mut j_series = Vec::with_capacity(n);

    let mut prev_k = FIFTY;
    let mut prev_d = FIFTY;

    for i in 0..n {
        let start = i.saturating_sub(period - 1);
        let mut highest = highs[start];
        let mut lowest = lows[start];
        for idx in start..=i {
            if highs[idx] > highest {
                highest = highs[idx];
            }
            if lows[idx] < lowest {
                lowest = lows[idx];
            }
        }

        let range = highest - lowest;
        let rsv = if range.is_zero() {
            FIFTY
        } else {
            (closes[i] - lowest) / range * HUNDRED
        };

        let k = (Decimal::TWO * prev_k + rsv) / THREE;
        let d = (Decimal::TWO * prev_d + k) / THREE;
        let j = THREE * k - Decimal::TWO * d;

        k_series.push(k);
        d_series.push(d);
        j_series.push(j);

        prev_k = k;
        prev_d = d;
    }

    Some(Kdj {
        k: k_series,
        d: d_series,
        j: j_series,
    })
}

/// Relative strength index (Wilder's smoothing).
///
/// Needs `period + 1` closes for the first value. A series with no losses
/// reads 100, no gains reads 0, no movement at all reads 50.
pub fn rsi(closes: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let period_d = Decimal::from(period as u64);
    let period_m1 = Decimal::from(period as u64 - 1);

    let changes: Vec<Decimal> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain = changes[..period]
        .iter()
        .map(|&c| if c > Decimal::ZERO { c } else { Decimal::ZERO })
        .sum::<Decimal>()
        / period_d;
    let mut avg_loss = changes[..period]
        .iter()
        .map(|&c| if c < Decimal::ZERO { -c } else { Decimal::ZERO })
        .sum::<Decimal>()
        / period_d;

    for &c in &changes[period..] {
        let gain = if c > Decimal::ZERO { c } else { Decimal::ZERO };
        let loss = if c < Decimal::ZERO { -c } else { Decimal::ZERO };
        avg_gain = (avg_gain * period_m1 + gain) / period_d;
        avg_loss = (avg_loss * period_m1 + loss) / period_d;
    }

    if avg_gain.is_zero() && avg_loss.is_zero() {
        return Some(FIFTY);
    }
    if avg_loss.is_zero() {
        return Some(HUNDRED);
    }

    let rs = avg_gain / avg_loss;
    Some(HUNDRED - HUNDRED / (Decimal::ONE + rs))
}

/// Bollinger bands `(upper, middle, lower)` over the trailing `period`
/// closes, using the population standard deviation.
pub fn bollinger(
    closes: &[Decimal],
    period: usize,
    std_mult: Decimal,
) -> Option<(Decimal, Decimal, Decimal)> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    let period_d = Decimal::from(period as u64);
    let middle = window.iter().copied().sum::<Decimal>() / period_d;

    let variance = window
        .iter()
        .map(|&c| {
            let diff = c - middle;
            diff * diff
        })
        .sum::<Decimal>()
        / period_d;
    let std_dev = variance.sqrt().unwrap_or(Decimal::ZERO);

    Some((middle + std_mult * std_dev, middle, middle - std_mult * std_dev))
}

/// Latest volume over the mean of the preceding `lookback` volumes
/// (excluding the latest bar). `None` when there is not enough history or
/// the trailing mean is zero.
pub fn volume_ratio(volumes: &[Decimal], lookback: usize) -> Option<Decimal> {
    let n = volumes.len();
    if lookback == 0 || n < lookback + 1 {
        return None;
    }

    let window = &volumes[n - 1 - lookback..n - 1];
    let mean = window.iter().copied().sum::<Decimal>() / Decimal::from(lookback as u64);
    if mean.is_zero() {
        return None;
    }

    Some(volumes[n - 1] / mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn decs(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|&v| Decimal::from(v)).collect()
    }

    #[test]
    fn test_sma_basic() {
        let values = decs(&[10, 20, 30]);
        assert_eq!(sma(&values, 3), Some(dec!(20)));
    }

    #[test]
    fn test_sma_uses_trailing_window() {
        let values = decs(&[100, 10, 20, 30]);
        assert_eq!(sma(&values, 3), Some(dec!(20)));
    }

    #[test]
    fn test_sma_insufficient_data() {
        let values = decs(&[10, 20]);
        assert_eq!(sma(&values, 3), None);
        assert_eq!(sma(&values, 0), None);
    }

    #[test]
    fn test_ema_seeded_with_sma() {
        let values = decs(&[10, 20, 30]);
        assert_eq!(ema(&values, 3), vec![dec!(20)]);
    }

    #[test]
    fn test_ema_subsequent_values() {
        // k = 2 / (3 + 1) = 0.5; EMA = 40 * 0.5 + 20 * 0.5 = 30
        let values = decs(&[10, 20, 30, 40]);
        assert_eq!(ema(&values, 3), vec![dec!(20), dec!(30)]);
    }

    #[test]
    fn test_ema_insufficient_data() {
        assert!(ema(&decs(&[10, 20]), 5).is_empty());
    }

    #[test]
    fn test_macd_alignment() {
        let values: Vec<Decimal> = (1..=60).map(Decimal::from).collect();
        let macd = macd(&values, 12, 26, 9).unwrap();

        assert_eq!(macd.line.len(), 60 - 26 + 1);
        assert_eq!(macd.signal.len(), macd.line.len() - 9 + 1);
        assert_eq!(macd.histogram.len(), macd.signal.len());
    }

    #[test]
    fn test_macd_flat_prices_is_zero() {
        let values = vec![dec!(100); 60];
        let macd = macd(&values, 12, 26, 9).unwrap();

        assert_eq!(*macd.line.last().unwrap(), Decimal::ZERO);
        assert_eq!(*macd.histogram.last().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let values: Vec<Decimal> = (1..=60).map(Decimal::from).collect();
        let macd = macd(&values, 12, 26, 9).unwrap();

        assert!(*macd.line.last().unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_macd_insufficient_data() {
        let values: Vec<Decimal> = (1..=30).map(Decimal::from).collect();
        assert!(macd(&values, 12, 26, 9).is_none());
    }

    #[test]
    fn test_kdj_flat_window_reads_fifty() {
        let flat = vec![dec!(10); 20];
        let kdj = kdj(&flat, &flat, &flat, 9).unwrap();

        assert_eq!(*kdj.k.last().unwrap(), dec!(50));
        assert_eq!(*kdj.d.last().unwrap(), dec!(50));
        assert_eq!(*kdj.j.last().unwrap(), dec!(50));
    }

    #[test]
    fn test_kdj_rising_series_overbought() {
        let closes: Vec<Decimal> = (1..=30).map(Decimal::from).collect();
        let kdj = kdj(&closes, &closes, &closes, 9).unwrap();

        let k = *kdj.k.last().unwrap();
        let d = *kdj.d.last().unwrap();
        assert!(k > dec!(80), "K was {}", k);
        assert!(d > dec!(80), "D was {}", d);
    }

    #[test]
    fn test_kdj_k_and_d_bounded() {
        let closes: Vec<Decimal> = (1..=40).map(|i| Decimal::from(if i % 3 == 0 { i } else { 41 - i })).collect();
        let kdj = kdj(&closes, &closes, &closes, 9).unwrap();

        for (&k, &d) in kdj.k.iter().zip(kdj.d.iter()) {
            assert!(k >= Decimal::ZERO && k <= dec!(100));
            assert!(d >= Decimal::ZERO && d <= dec!(100));
        }
    }

    #[test]
    fn test_kdj_mismatched_lengths() {
        let closes = decs(&[1, 2, 3]);
        let short = decs(&[1, 2]);
        assert!(kdj(&short, &closes, &closes, 2).is_none());
    }

    #[test]
    fn test_rsi_all_gains() {
        let closes: Vec<Decimal> = (1..=20).map(Decimal::from).collect();
        assert_eq!(rsi(&closes, 14), Some(dec!(100)));
    }

    #[test]
    fn test_rsi_all_losses() {
        let closes: Vec<Decimal> = (1..=20).rev().map(Decimal::from).collect();
        assert_eq!(rsi(&closes, 14), Some(dec!(0)));
    }

    #[test]
    fn test_rsi_flat_is_neutral() {
        let closes = vec![dec!(10); 20];
        assert_eq!(rsi(&closes, 14), Some(dec!(50)));
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let closes = decs(&[1, 2, 3]);
        assert_eq!(rsi(&closes, 14), None);
    }

    #[test]
    fn test_bollinger_flat_prices_collapse() {
        let closes = vec![dec!(10); 25];
        let (upper, middle, lower) = bollinger(&closes, 20, Decimal::TWO).unwrap();

        assert_eq!(upper, dec!(10));
        assert_eq!(middle, dec!(10));
        assert_eq!(lower, dec!(10));
    }

    #[test]
    fn test_bollinger_bands_bracket_mean() {
        let closes: Vec<Decimal> = (1..=25).map(Decimal::from).collect();
        let (upper, middle, lower) = bollinger(&closes, 20, Decimal::TWO).unwrap();

        assert!(upper > middle);
        assert!(lower < middle);
    }

    #[test]
    fn test_volume_ratio_doubling() {
        let volumes = decs(&[100, 100, 100, 100, 100, 200]);
        assert_eq!(volume_ratio(&volumes, 5), Some(dec!(2)));
    }

    #[test]
    fn test_volume_ratio_excludes_latest_from_mean() {
        let volumes = decs(&[100, 100, 100]);
        assert_eq!(volume_ratio(&volumes, 2), Some(dec!(1)));
    }

    #[test]
    fn test_volume_ratio_zero_mean() {
        let volumes = decs(&[0, 0, 0, 0, 0, 100]);
        assert_eq!(volume_ratio(&volumes, 5), None);
    }

    #[test]
    fn test_volume_ratio_insufficient_data() {
        let volumes = decs(&[100, 100]);
        assert_eq!(volume_ratio(&volumes, 5), None);
    }
}
