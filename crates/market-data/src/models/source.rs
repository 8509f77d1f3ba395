use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bar::PriceBar;

/// What a data source can serve.
///
/// The registry only routes daily-history requests to sources that declare
/// `supports_daily`; the realtime flag exists for embedding layers that
/// route intraday quote lookups.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SourceCapabilities {
    /// Serves daily OHLCV history.
    pub supports_daily: bool,

    /// Serves realtime/intraday quotes.
    pub supports_realtime: bool,
}

impl SourceCapabilities {
    /// Daily history only.
    pub const fn daily_only() -> Self {
        Self {
            supports_daily: true,
            supports_realtime: false,
        }
    }

    /// Daily history plus realtime quotes.
    pub const fn daily_and_realtime() -> Self {
        Self {
            supports_daily: true,
            supports_realtime: true,
        }
    }
}

/// Immutable registration identity of a data source.
///
/// Lower `priority` is tried first; sources sharing a priority keep their
/// registration order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SourceDescriptor {
    pub name: &'static str,
    pub priority: u8,
    pub capabilities: SourceCapabilities,
}

/// The result of a resolved daily fetch.
///
/// Created fresh per call and never mutated afterwards; callers may retain
/// it but must treat it as a value.
#[derive(Clone, Debug, Serialize)]
pub struct FetchOutcome {
    /// Normalized daily bars, oldest first.
    pub series: Vec<PriceBar>,

    /// Name of the provider that satisfied the request.
    pub source: &'static str,

    /// When the fetch completed.
    pub fetched_at: DateTime<Utc>,
}

/// Per-call options for a resolved fetch.
#[derive(Clone, Debug)]
pub struct FetchOptions {
    /// Budget for each individual provider attempt. A provider that does
    /// not answer within this window is abandoned and the next one is
    /// tried; a late response is discarded.
    pub per_provider_timeout: Duration,

    /// Optional overall deadline. Once passed, the in-flight attempt is
    /// abandoned and remaining providers are skipped.
    pub deadline: Option<tokio::time::Instant>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            per_provider_timeout: Duration::from_secs(5),
            deadline: None,
        }
    }
}

impl FetchOptions {
    /// Options with a custom per-provider timeout and no deadline.
    pub fn with_timeout(per_provider_timeout: Duration) -> Self {
        Self {
            per_provider_timeout,
            deadline: None,
        }
    }

    /// Set an overall deadline.
    pub fn deadline(mut self, deadline: tokio::time::Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}
