//! Attempt tracking for failover diagnostics.

use serde::Serialize;

use crate::errors::FailureKind;

/// Record of a single provider attempt during a fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProviderAttempt {
    /// The provider that was tried (or skipped).
    pub provider: &'static str,
    /// Why it did not produce the outcome.
    pub failure: FailureKind,
}

/// Ordered per-provider diagnostics for one fetch call.
///
/// Attached to [`ResolutionError`](crate::errors::ResolutionError) so a
/// caller can report "no data for symbol X, tried: [...]" without the
/// registry logging being its only trace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FetchAttempts {
    attempts: Vec<ProviderAttempt>,
}

impl FetchAttempts {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    /// Record a failed or skipped provider, in try order.
    pub fn record(&mut self, provider: &'static str, failure: FailureKind) {
        self.attempts.push(ProviderAttempt { provider, failure });
    }

    /// Attempts in the order they were made.
    pub fn as_slice(&self) -> &[ProviderAttempt] {
        &self.attempts
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

impl std::fmt::Display for FetchAttempts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, attempt) in self.attempts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}({})", attempt.provider, attempt.failure)?;
        }
        Ok(())
    }
}
