//! Error types and failover classification for the market data crate.
//!
//! This module provides:
//! - [`ProviderError`]: adapter-local failures, absorbed by the registry
//! - [`FailureKind`]: the uniform failure tag recorded in attempt diagnostics
//! - [`FailoverClass`]: whether a failure counts against a provider's circuit
//! - [`ResolutionError`]: what the registry surfaces when a fetch cannot be
//!   satisfied

mod failover;

pub use failover::FailoverClass;

use serde::Serialize;
use thiserror::Error;

use crate::registry::FetchAttempts;

/// Failures an adapter can report.
///
/// Adapters translate every vendor/transport condition into one of these
/// variants; a raw `reqwest` or parse error never crosses the adapter
/// boundary. The registry reasons about them uniformly via
/// [`kind`](Self::kind) and [`failover_class`](Self::failover_class).
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The vendor did not answer in time.
    #[error("timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The vendor throttled the request (HTTP 429 or equivalent).
    #[error("rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The symbol does not match the vendor's grammar or is unknown to it.
    #[error("invalid symbol '{symbol}': {provider}")]
    InvalidSymbol {
        /// The provider that rejected the symbol
        provider: String,
        /// The offending symbol
        symbol: String,
    },

    /// The vendor answered with a payload that could not be decoded into
    /// canonical bars.
    #[error("malformed response from {provider}: {message}")]
    MalformedResponse {
        /// The provider whose payload failed to decode
        provider: String,
        /// What went wrong while decoding
        message: String,
    },

    /// The vendor is unreachable or returned a server-side failure.
    #[error("provider unavailable: {provider} - {message}")]
    Unavailable {
        /// The provider that could not be reached
        provider: String,
        /// Transport-level detail
        message: String,
    },
}

/// Uniform failure tag recorded per provider attempt.
///
/// Superset of the [`ProviderError`] variants: the registry itself
/// contributes `InvalidSeries` (validation rejection) and `CircuitOpen`
/// (provider skipped without a call).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum FailureKind {
    Timeout,
    RateLimited,
    InvalidSymbol,
    MalformedResponse,
    Unavailable,
    /// The provider answered, but the series failed validation.
    InvalidSeries,
    /// The provider's circuit was open; no call was made.
    CircuitOpen,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Timeout => "timeout",
            Self::RateLimited => "rate-limited",
            Self::InvalidSymbol => "invalid-symbol",
            Self::MalformedResponse => "malformed-response",
            Self::Unavailable => "unavailable",
            Self::InvalidSeries => "invalid-series",
            Self::CircuitOpen => "circuit-open",
        };
        write!(f, "{}", label)
    }
}

impl ProviderError {
    /// The uniform failure tag for this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::InvalidSymbol { .. } => FailureKind::InvalidSymbol,
            Self::MalformedResponse { .. } => FailureKind::MalformedResponse,
            Self::Unavailable { .. } => FailureKind::Unavailable,
        }
    }

    /// How the registry should treat this failure when moving on.
    ///
    /// Every adapter failure fails over to the next provider; the class
    /// only decides whether the provider's circuit breaker is penalized.
    ///
    /// # Examples
    ///
    /// ```
    /// use trendlens_market_data::errors::{FailoverClass, ProviderError};
    ///
    /// let error = ProviderError::Timeout { provider: "EASTMONEY".to_string() };
    /// assert_eq!(error.failover_class(), FailoverClass::ProviderFault);
    ///
    /// let error = ProviderError::InvalidSymbol {
    ///     provider: "SINA".to_string(),
    ///     symbol: "BOGUS".to_string(),
    /// };
    /// assert_eq!(error.failover_class(), FailoverClass::RequestFault);
    /// ```
    pub fn failover_class(&self) -> FailoverClass {
        match self {
            // Provider health issues - count against the circuit breaker
            Self::Timeout { .. } | Self::RateLimited { .. } | Self::Unavailable { .. } => {
                FailoverClass::ProviderFault
            }

            // Request-specific - the provider itself is fine
            Self::InvalidSymbol { .. } | Self::MalformedResponse { .. } => {
                FailoverClass::RequestFault
            }
        }
    }
}

/// What the registry surfaces when a fetch cannot be satisfied.
///
/// Individual provider failures are always recovered locally; only total
/// exhaustion or cancellation propagates, and both carry the ordered
/// per-provider attempt diagnostics.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// Every eligible provider was tried and none produced a valid series.
    #[error("no data for '{symbol}': all providers exhausted [{attempts}]")]
    AllProvidersExhausted {
        /// The requested symbol
        symbol: String,
        /// Ordered (provider, failure) diagnostics
        attempts: FetchAttempts,
    },

    /// The caller's deadline expired before a provider succeeded.
    #[error("fetch cancelled for '{symbol}' [{attempts}]")]
    Cancelled {
        /// The requested symbol
        symbol: String,
        /// Attempts made before cancellation
        attempts: FetchAttempts,
    },
}

impl ResolutionError {
    /// The attempt diagnostics carried by either variant.
    pub fn attempts(&self) -> &FetchAttempts {
        match self {
            Self::AllProvidersExhausted { attempts, .. } => attempts,
            Self::Cancelled { attempts, .. } => attempts,
        }
    }
}
