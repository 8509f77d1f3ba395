//! Market data provider trait definition.
//!
//! This module defines the core `MarketDataProvider` trait that all
//! vendor adapters must implement.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::models::{PriceBar, SourceCapabilities, SourceDescriptor};

/// Minimum spacing between outbound calls to one vendor.
///
/// These are public scrape endpoints with informal rate policies; the
/// registry honours the spacing before every call so that burst fetches do
/// not get a vendor IP-banned.
#[derive(Clone, Copy, Debug)]
pub struct Throttle {
    /// Minimum delay between consecutive requests.
    pub min_delay: Duration,
}

impl Default for Throttle {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(200),
        }
    }
}

impl Throttle {
    /// No spacing at all (used by in-test providers).
    pub const fn none() -> Self {
        Self {
            min_delay: Duration::ZERO,
        }
    }
}

/// Trait for daily market data providers.
///
/// Implement this trait to add support for a new vendor. The registry uses
/// the provider's capabilities and priority to decide when to call it, and
/// owns all retry/failover behavior: an adapter performs exactly one
/// vendor round-trip per `fetch_daily` call and never retries internally.
///
/// Every failure must be translated into a [`ProviderError`] — a raw
/// transport error never crosses this boundary, so the registry can reason
/// about failure kinds uniformly.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use trendlens_market_data::provider::{MarketDataProvider, Throttle};
/// use trendlens_market_data::models::SourceCapabilities;
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl MarketDataProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn capabilities(&self) -> SourceCapabilities {
///         SourceCapabilities::daily_only()
///     }
///
///     // ... implement fetch_daily
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "EASTMONEY", "SINA", etc.
    /// Used for logging, circuit breaker tracking, and outcome attribution.
    fn id(&self) -> &'static str;

    /// Provider priority for ordering.
    ///
    /// Lower values = tried first. Default is 10. Providers sharing a
    /// priority are tried in registration order.
    fn priority(&self) -> u8 {
        10
    }

    /// Describes what this provider can serve.
    fn capabilities(&self) -> SourceCapabilities;

    /// Request spacing the registry should honour for this vendor.
    fn throttle(&self) -> Throttle {
        Throttle::default()
    }

    /// Registration identity snapshot.
    fn descriptor(&self) -> SourceDescriptor {
        SourceDescriptor {
            name: self.id(),
            priority: self.priority(),
            capabilities: self.capabilities(),
        }
    }

    /// Fetch the last `lookback_days` daily bars for a symbol.
    ///
    /// # Arguments
    ///
    /// * `symbol` - Six-digit A-share code (e.g. "600519")
    /// * `lookback_days` - Number of trailing trading days requested
    ///
    /// # Returns
    ///
    /// Canonical bars ordered by date ascending (field renaming, date
    /// parsing and volume unit normalization already applied), or a
    /// [`ProviderError`] describing the failure kind.
    async fn fetch_daily(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<PriceBar>, ProviderError>;
}
