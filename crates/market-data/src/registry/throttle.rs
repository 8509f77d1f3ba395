//! Per-provider request spacing.
//!
//! Keeps a minimum delay between consecutive calls to the same vendor.
//! The slot is reserved while the bookkeeping lock is held, so concurrent
//! fetches for different symbols queue behind one another per vendor
//! instead of racing past the spacing.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::warn;
use tokio::time::Instant;

/// Per-provider minimum-spacing gate.
///
/// Thread-safe; in-memory only, resets on restart.
pub struct ThrottleGate {
    /// Earliest instant the next call per provider may go out.
    next_slot: Mutex<HashMap<&'static str, Instant>>,
}

impl ThrottleGate {
    pub fn new() -> Self {
        Self {
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    fn lock_slots(&self) -> MutexGuard<'_, HashMap<&'static str, Instant>> {
        self.next_slot.lock().unwrap_or_else(|poisoned| {
            warn!("Throttle gate mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Wait until the provider's next slot, then claim the one after it.
    pub async fn acquire(&self, provider: &'static str, min_delay: Duration) {
        if min_delay.is_zero() {
            return;
        }

        let wait = {
            let mut slots = self.lock_slots();
            let now = Instant::now();
            let slot = slots.get(provider).copied().unwrap_or(now).max(now);
            slots.insert(provider, slot + min_delay);
            slot.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

impl Default for ThrottleGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_call_does_not_wait() {
        let gate = ThrottleGate::new();

        let before = Instant::now();
        gate.acquire("EASTMONEY", Duration::from_millis(200)).await;
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_call_waits_min_delay() {
        let gate = ThrottleGate::new();
        let min_delay = Duration::from_millis(200);

        gate.acquire("EASTMONEY", min_delay).await;
        let before = Instant::now();
        gate.acquire("EASTMONEY", min_delay).await;

        assert_eq!(Instant::now().duration_since(before), min_delay);
    }

    #[tokio::test(start_paused = true)]
    async fn test_providers_are_independent() {
        let gate = ThrottleGate::new();
        let min_delay = Duration::from_millis(200);

        gate.acquire("EASTMONEY", min_delay).await;
        let before = Instant::now();
        gate.acquire("SINA", min_delay).await;

        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_is_a_noop() {
        let gate = ThrottleGate::new();

        gate.acquire("EASTMONEY", Duration::ZERO).await;
        let before = Instant::now();
        gate.acquire("EASTMONEY", Duration::ZERO).await;
        assert_eq!(Instant::now(), before);
    }
}
