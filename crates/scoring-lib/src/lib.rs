//! Host-based threat-scoring engine
//!
//! This crate provides the core functionality for:
//! - Statistical analysis of per-process resource-usage time series
//! - Risk classification of readings, spikes, sustained usage, and patterns
//! - A minimal detector registration/evaluation surface
//! - Multi-detector consensus with weighted, conflict-resolving, and
//!   ensemble aggregation
//!
//! The engine is a pure function of the telemetry handed to it plus its own
//! configuration; it performs no I/O and never blocks.

pub mod analyzer;
pub mod config;
pub mod consensus;
pub mod error;
pub mod models;
pub mod observability;
pub mod registry;
pub mod stats;

pub use analyzer::{
    PatternResult, ResourceAnalyzer, RiskAssessment, SpikeAnalysis, SpikeResult,
    SustainedAnalysis, SustainedResult, Thresholds,
};
pub use config::EngineConfig;
pub use consensus::{
    ConsensusEngine, ConsensusMethod, ConsensusResult, EnsembleMethod, EnsembleResult,
    ResolutionMethod, RiskValues, ScoreBands,
};
pub use error::EngineError;
pub use models::*;
pub use observability::{AnalyzerMetrics, MetricsSnapshot};
pub use registry::{Detector, DetectorRegistry, ResourceUsageDetector};
