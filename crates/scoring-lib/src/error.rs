//! Error types for the scoring engine
//!
//! Recoverable, expected outcomes (insufficient data) are modelled as typed
//! result variants on the analyzer side, not as errors. `EngineError` covers
//! configuration problems surfaced synchronously to the caller. Precondition
//! violations (scores outside [0,1], empty series) panic and are documented
//! on the operations that check them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Fewer verdicts were supplied than the configured quorum requires.
    #[error("consensus quorum not met: required {required} verdicts, received {received}")]
    QuorumNotMet { required: usize, received: usize },

    /// A threshold setter was called with a key the engine does not know.
    #[error("unknown threshold key `{0}`")]
    UnknownThreshold(String),

    /// A configuration value is outside its valid range.
    #[error("configuration value {value} for `{name}` is outside [0.0, 1.0]")]
    ValueOutOfRange { name: &'static str, value: f64 },

    /// Score bands must be strictly increasing within [0,1].
    #[error("score bands must satisfy 0 <= low < medium < high <= 1 (got {low}, {medium}, {high})")]
    InvalidScoreBands { low: f64, medium: f64, high: f64 },

    /// A detector with this name is already registered.
    #[error("detector `{0}` is already registered")]
    DuplicateDetector(String),

    /// A registered detector failed to produce a verdict.
    #[error("detector `{detector}` failed: {reason}")]
    DetectorFailed { detector: String, reason: String },
}
