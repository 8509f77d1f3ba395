//! Trendlens Analysis Crate
//!
//! Technical trend scoring over canonical daily series.
//!
//! # Overview
//!
//! The analysis crate provides:
//! - Pure indicator computation (SMA/EMA, MACD, KDJ, RSI, BOLL, volume
//!   ratio)
//! - The trend scoring engine: categorical statuses and a 0–100 composite
//!   score with a configurable policy
//! - The market regime filter for the benchmark index
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |  Vec<PriceBar>   | --> |  TrendAnalyzer   |  (pure, deterministic)
//! +------------------+     +------------------+
//!                                  |
//!                 +----------------+----------------+
//!                 v                v                v
//!         +-------------+  +--------------+  +-------------+
//!         |  indicators |  |   statuses   |  | signal score|
//!         +-------------+  +--------------+  +-------------+
//!                                  |
//!                                  v
//!                        +---------------------+
//!                        | TrendAnalysisResult |
//!                        +---------------------+
//! ```
//!
//! Every analysis is a pure function of its input series — no I/O, no
//! hidden clock, no shared mutable state — so identical series always
//! produce identical results and one engine instance can serve concurrent
//! callers.
//!
//! # Core Types
//!
//! - [`TrendAnalyzer`] - The scoring engine
//! - [`TrendAnalysisResult`] / [`IndicatorSnapshot`] - Immutable outputs
//! - [`ScoringConfig`] - The tunable scoring policy
//! - [`MarketRegimeFilter`] - Bull/bear/range gate for the benchmark index

pub mod analyzer;
pub mod config;
pub mod errors;
pub mod indicators;
pub mod regime;
pub mod snapshot;
pub mod status;

pub use analyzer::{TrendAnalyzer, MIN_HISTORY};
pub use config::{BiasBands, RegimeThresholds, ScoreWeights, ScoringConfig, SignalBands};
pub use errors::AnalysisError;
pub use regime::MarketRegimeFilter;
pub use snapshot::{IndicatorSnapshot, TrendAnalysisResult};
pub use status::{
    BuySignal, KdjStatus, MaStatus, MacdStatus, MarketRegime, TrendStatus, VolumeStatus,
};
