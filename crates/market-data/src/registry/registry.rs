//! Source registry: priority-ordered failover across vendor adapters.
//!
//! The registry owns the resolution chain, handling:
//! - Provider ordering by priority (registration order breaks ties)
//! - Failover to the next provider on any failure
//! - Per-provider timeouts and overall cancellation deadline
//! - Circuit breaking and request spacing
//! - Series validation
//! - Attempt diagnostics for "no data, tried: [...]" reporting

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::time::Instant;

use super::{CircuitBreaker, FetchAttempts, SeriesValidator, ThrottleGate};
use crate::errors::{FailoverClass, FailureKind, ResolutionError};
use crate::models::{FetchOptions, FetchOutcome, SourceDescriptor};
use crate::provider::MarketDataProvider;

/// Priority-ordered registry of market data providers.
///
/// Registration happens once at construction; afterwards the provider list
/// is read-only, so concurrent fetches for different symbols share the
/// registry without locking. The only mutable state (circuit breaker and
/// throttle bookkeeping) sits behind its own locks and never leaks between
/// calls.
pub struct SourceRegistry {
    providers: Vec<Arc<dyn MarketDataProvider>>,
    circuit_breaker: CircuitBreaker,
    throttle: ThrottleGate,
    validator: SeriesValidator,
}

impl SourceRegistry {
    /// Create a registry from the given providers.
    ///
    /// Providers are ordered by ascending priority; providers sharing a
    /// priority keep their registration order (the sort is stable).
    pub fn new(providers: Vec<Arc<dyn MarketDataProvider>>) -> Self {
        Self::with_config(providers, CircuitBreaker::new(), SeriesValidator::new())
    }

    /// Create a registry with custom circuit breaker and validator.
    pub fn with_config(
        mut providers: Vec<Arc<dyn MarketDataProvider>>,
        circuit_breaker: CircuitBreaker,
        validator: SeriesValidator,
    ) -> Self {
        providers.sort_by_key(|p| p.priority());

        Self {
            providers,
            circuit_breaker,
            throttle: ThrottleGate::new(),
            validator,
        }
    }

    /// Fetch the last `lookback_days` daily bars for a symbol, failing over
    /// across providers in priority order.
    ///
    /// The first provider that returns a non-empty, invariant-satisfying
    /// series wins: at most one provider succeeds per call, and partial
    /// results are never merged across providers (mixing vendors would
    /// corrupt indicator continuity downstream).
    ///
    /// Each attempt is bounded by `opts.per_provider_timeout`; a timed-out
    /// attempt is abandoned (a late response is discarded) and the chain
    /// moves on. When `opts.deadline` passes, the in-flight attempt is
    /// aborted and the call returns [`ResolutionError::Cancelled`].
    pub async fn fetch_daily(
        &self,
        symbol: &str,
        lookback_days: u32,
        opts: &FetchOptions,
    ) -> Result<FetchOutcome, ResolutionError> {
        let mut attempts = FetchAttempts::new();

        let candidates: Vec<_> = self
            .providers
            .iter()
            .filter(|p| p.capabilities().supports_daily)
            .collect();

        if candidates.is_empty() {
            warn!("No daily-capable providers registered");
            return Err(ResolutionError::AllProvidersExhausted {
                symbol: symbol.to_string(),
                attempts,
            });
        }

        for provider in candidates {
            let id = provider.id();

            if let Some(deadline) = opts.deadline {
                if Instant::now() >= deadline {
                    info!(
                        "Fetch for '{}' cancelled before trying '{}' [{}]",
                        symbol, id, attempts
                    );
                    return Err(ResolutionError::Cancelled {
                        symbol: symbol.to_string(),
                        attempts,
                    });
                }
            }

            if !self.circuit_breaker.is_allowed(id) {
                debug!("Circuit open for provider '{}', skipping", id);
                attempts.record(id, FailureKind::CircuitOpen);
                continue;
            }

            self.throttle
                .acquire(id, provider.throttle().min_delay)
                .await;

            // Bound the attempt by the per-provider timeout, or by what is
            // left of the overall deadline if that is tighter.
            let (budget, deadline_bound) = match opts.deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining <= opts.per_provider_timeout {
                        (remaining, true)
                    } else {
                        (opts.per_provider_timeout, false)
                    }
                }
                None => (opts.per_provider_timeout, false),
            };

            debug!(
                "Fetching {} daily bars for '{}' from '{}'",
                lookback_days, symbol, id
            );

            match tokio::time::timeout(budget, provider.fetch_daily(symbol, lookback_days)).await {
                Err(_elapsed) => {
                    if deadline_bound {
                        info!(
                            "Fetch for '{}' cancelled during attempt on '{}' [{}]",
                            symbol, id, attempts
                        );
                        return Err(ResolutionError::Cancelled {
                            symbol: symbol.to_string(),
                            attempts,
                        });
                    }

                    self.circuit_breaker.record_failure(id);
                    warn!(
                        "Provider '{}' timed out after {:?} for '{}', trying next",
                        id, budget, symbol
                    );
                    attempts.record(id, FailureKind::Timeout);
                }
                Ok(Err(e)) => {
                    if e.failover_class() == FailoverClass::ProviderFault {
                        self.circuit_breaker.record_failure(id);
                    }
                    warn!("Provider '{}' failed for '{}': {}, trying next", id, symbol, e);
                    attempts.record(id, e.kind());
                }
                Ok(Ok(series)) => match self.validator.validate(&series) {
                    Ok(()) => {
                        self.circuit_breaker.record_success(id);
                        info!(
                            "Fetched {} valid bars for '{}' from '{}'",
                            series.len(),
                            symbol,
                            id
                        );
                        return Ok(FetchOutcome {
                            series,
                            source: id,
                            fetched_at: Utc::now(),
                        });
                    }
                    Err(e) => {
                        warn!("Series from '{}' for '{}' rejected: {}", id, symbol, e);
                        attempts.record(id, FailureKind::InvalidSeries);
                    }
                },
            }
        }

        warn!("All providers exhausted for '{}' [{}]", symbol, attempts);
        Err(ResolutionError::AllProvidersExhausted {
            symbol: symbol.to_string(),
            attempts,
        })
    }

    /// The registered providers, in try order.
    pub fn providers(&self) -> &[Arc<dyn MarketDataProvider>] {
        &self.providers
    }

    /// Registration descriptors, in try order.
    pub fn descriptors(&self) -> Vec<SourceDescriptor> {
        self.providers.iter().map(|p| p.descriptor()).collect()
    }

    /// Check if a provider's circuit is open.
    pub fn is_circuit_open(&self, provider: &str) -> bool {
        self.circuit_breaker.state(provider) == super::CircuitState::Open
    }

    /// Reset a provider's circuit breaker.
    pub fn reset_circuit(&self, provider: &str) {
        self.circuit_breaker.reset(provider);
    }
}
