/// Classification of an adapter failure for failover handling.
///
/// Every failure moves the registry on to the next provider; the class only
/// decides whether the failing provider's circuit breaker records a penalty.
///
/// # Behavior Summary
///
/// | Class | Try Next Provider? | Record Circuit Breaker Failure? |
/// |-------|-------------------|--------------------------------|
/// | `ProviderFault` | Yes | Yes (affects future requests) |
/// | `RequestFault` | Yes | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailoverClass {
    /// The provider itself is unhealthy (timeout, throttling, outage).
    ///
    /// Recorded in the circuit breaker; enough of these in a row opens the
    /// circuit and the provider is temporarily excluded from the pool.
    ProviderFault,

    /// The request was the problem (bad symbol, undecodable payload for
    /// this instrument). The provider stays in good standing.
    RequestFault,
}
