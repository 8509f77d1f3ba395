//! Series validation.
//!
//! Validates fetched series before they can satisfy a request:
//! - non-empty
//! - OHLC invariants (high >= open/close/low, low <= open/close)
//! - positive prices, non-negative volume
//! - strictly increasing dates
//!
//! A rejection is hard: the provider's result is discarded and failover
//! continues.

use log::warn;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{series_defect, PriceBar};

/// A hard validation rejection.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("series validation failed: {message}")]
pub struct ValidationFailure {
    /// Description of the first defect found.
    pub message: String,
}

/// Series validator configuration.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Sanity ceiling for close prices; anything above is logged as
    /// suspicious but still accepted.
    pub max_price: Option<Decimal>,
    /// Whether to log zero-volume bars (markets closed / suspended).
    pub warn_on_zero_volume: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_price: Some(Decimal::from(1_000_000i64)),
            warn_on_zero_volume: true,
        }
    }
}

/// Validates fetched series against the canonical invariants.
pub struct SeriesValidator {
    config: ValidatorConfig,
}

impl SeriesValidator {
    /// Create a validator with default configuration.
    pub fn new() -> Self {
        Self {
            config: ValidatorConfig::default(),
        }
    }

    /// Create a validator with custom configuration.
    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a fetched series.
    ///
    /// Structural defects are hard failures; sanity warnings are logged
    /// and do not cause rejection.
    pub fn validate(&self, series: &[PriceBar]) -> Result<(), ValidationFailure> {
        if let Some(defect) = series_defect(series) {
            return Err(ValidationFailure {
                message: defect.to_string(),
            });
        }

        for bar in series {
            if let Some(max_price) = self.config.max_price {
                if bar.close > max_price {
                    warn!(
                        "Suspicious close {} on {} exceeds sanity ceiling {}",
                        bar.close, bar.date, max_price
                    );
                }
            }
            if self.config.warn_on_zero_volume && bar.volume == Decimal::ZERO {
                warn!("Zero volume on {} (market closed or suspended?)", bar.date);
            }
        }

        Ok(())
    }
}

impl Default for SeriesValidator {
    fn default() -> Self {
        Self::new()
    }
}
