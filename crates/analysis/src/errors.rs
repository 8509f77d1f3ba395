use thiserror::Error;

/// Failures of a single analysis call.
///
/// Both variants are fatal for that analysis: no partial or degraded
/// result is ever produced, so downstream consumers can never silently
/// trust an incomplete score.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum AnalysisError {
    /// The series is shorter than the longest indicator lookback.
    #[error("insufficient history: required {required} bars, got {got}")]
    InsufficientHistory { required: usize, got: usize },

    /// The series violates the bar or ordering invariants.
    #[error("malformed series: {message}")]
    MalformedSeries { message: String },
}
