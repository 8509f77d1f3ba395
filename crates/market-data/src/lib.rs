//! Trendlens Market Data Crate
//!
//! Multi-vendor daily market data fetching with deterministic failover.
//!
//! # Overview
//!
//! The market data crate supports:
//! - A canonical daily bar model (`PriceBar`) shared by every vendor
//! - Multiple provider adapters: Eastmoney, Tencent, Sina
//! - Priority-ordered failover with per-provider timeouts
//! - Circuit breaking, request spacing and series validation
//! - Attempt diagnostics for "no data, tried: [...]" reporting
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |      Caller      | --> |  SourceRegistry  |  (priority order, failover)
//! +------------------+     +------------------+
//!                                  |
//!                  +---------------+---------------+
//!                  v               v               v
//!          +-----------+    +-----------+    +-----------+
//!          | Eastmoney |    |  Tencent  |    |   Sina    |  (adapters)
//!          +-----------+    +-----------+    +-----------+
//!                  \               |               /
//!                   v              v              v
//!                        +------------------+
//!                        |   Vec<PriceBar>  |  (canonical series)
//!                        +------------------+
//!                                  |
//!                                  v
//!                        +------------------+
//!                        |   FetchOutcome   |  (series + winning source)
//!                        +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`PriceBar`] - Canonical daily OHLCV bar
//! - [`FetchOutcome`] - Resolved series plus the provider that produced it
//! - [`FetchOptions`] - Per-call timeout and cancellation deadline
//! - [`SourceDescriptor`] - Immutable registration identity of a provider
//! - [`SourceRegistry`] - The resolution chain itself
//!
//! The registry performs sequential, blocking-style attempts within one
//! logical fetch — no concurrent fan-out across vendors for a single
//! symbol, which keeps failover ordering deterministic and avoids
//! duplicate-cost calls. Different symbols may be fetched concurrently;
//! every call is independent.

pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;

// Re-export all public types from models
pub use models::{
    exchange_prefix, is_valid_symbol, series_defect, FetchOptions, FetchOutcome, PriceBar,
    SeriesDefect, SourceCapabilities, SourceDescriptor,
};

// Re-export error types
pub use errors::{FailoverClass, FailureKind, ProviderError, ResolutionError};

// Re-export provider types
pub use provider::eastmoney::EastmoneyProvider;
pub use provider::sina::SinaProvider;
pub use provider::tencent::TencentProvider;
pub use provider::{MarketDataProvider, Throttle};

// Re-export registry types
pub use registry::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, FetchAttempts, ProviderAttempt,
    SeriesValidator, SourceRegistry, ThrottleGate, ValidationFailure, ValidatorConfig,
};
