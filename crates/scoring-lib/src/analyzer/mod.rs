//! Resource anomaly analyzer
//!
//! Classifies single readings and time-series windows of CPU/memory usage
//! into risk levels, anomaly types, and behavioral patterns. Every operation
//! is total: insufficient input yields a typed insufficient-data result,
//! never a default risk level.
//!
//! Thresholds are read-mostly: evaluation calls snapshot them through a
//! reader lock, setters are rare administrative writes.

mod pattern;
mod spike;
mod sustained;

pub use pattern::PatternResult;
pub use spike::{SpikeAnalysis, SpikeResult};
pub use sustained::{SustainedAnalysis, SustainedResult};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::models::{RiskLevel, SystemInfo, SystemLoad};
use crate::observability::{AnalyzerMetrics, MetricsSnapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{PoisonError, RwLock};

/// Duration (seconds) after which suspicious usage counts as sustained.
const SUSTAINED_DURATION_SECS: u64 = 300;

/// Base adaptive memory threshold in MB.
const ADAPTIVE_BASE_MB: f64 = 1024.0;

/// Analyzer threshold and gating configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thresholds {
    pub suspicious: f64,
    pub high_risk: f64,
    pub spike_multiplier: f64,
    pub min_spike_readings: usize,
    pub min_pattern_readings: usize,
    pub min_sustained_readings: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            suspicious: 80.0,
            high_risk: 90.0,
            spike_multiplier: 3.0,
            min_spike_readings: 2,
            min_pattern_readings: 3,
            min_sustained_readings: 5,
        }
    }
}

/// Risk assessment for a single usage reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub process: String,
    pub usage_value: f64,
    pub duration_secs: u64,
    pub risk_level: RiskLevel,
    pub score: f64,
    pub threshold_exceeded: bool,
    pub risk_factors: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

/// Statistical analyzer for per-process resource usage.
pub struct ResourceAnalyzer {
    thresholds: RwLock<Thresholds>,
    metrics: AnalyzerMetrics,
}

impl ResourceAnalyzer {
    pub fn new() -> Self {
        Self::with_thresholds(Thresholds::default())
    }

    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self {
            thresholds: RwLock::new(thresholds),
            metrics: AnalyzerMetrics::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_thresholds(Thresholds {
            suspicious: config.suspicious_threshold,
            high_risk: config.high_risk_threshold,
            spike_multiplier: config.spike_multiplier,
            min_spike_readings: config.min_spike_readings,
            min_pattern_readings: config.min_pattern_readings,
            min_sustained_readings: config.min_sustained_readings,
        })
    }

    /// Analyze one instantaneous usage reading (percent scale).
    ///
    /// Any usage at or above the suspicious threshold is HIGH risk; duration
    /// only nudges the score within the HIGH band, it never changes the band.
    pub fn analyze_usage(
        &self,
        process: &str,
        usage_value: f64,
        duration_secs: u64,
    ) -> RiskAssessment {
        let t = self.snapshot_thresholds();
        self.metrics.timed("analyze_usage", || {
            let mut factors = Vec::new();

            let (risk_level, score) = if usage_value >= t.high_risk {
                factors.push(format!("critical usage: {usage_value:.1}%"));
                (RiskLevel::High, 0.95)
            } else if usage_value >= t.suspicious {
                factors.push(format!("suspicious usage: {usage_value:.1}%"));
                let mut score: f64 = 0.85;
                if duration_secs > SUSTAINED_DURATION_SECS {
                    factors.push(format!("sustained for {duration_secs}s"));
                    score = (score + 0.05).min(0.95);
                }
                (RiskLevel::High, score)
            } else {
                factors.push(format!("normal usage: {usage_value:.1}%"));
                (RiskLevel::Low, (usage_value / 100.0 * 0.5).min(0.5))
            };

            if risk_level == RiskLevel::High {
                self.metrics.record_anomaly();
            }

            RiskAssessment {
                process: process.to_string(),
                usage_value,
                duration_secs,
                risk_level,
                score,
                threshold_exceeded: usage_value >= t.suspicious,
                risk_factors: factors,
                analyzed_at: Utc::now(),
            }
        })
    }

    /// Analyze a memory reading relative to a memory threshold (MB).
    ///
    /// Scales used/threshold onto the percent scale and applies the same
    /// banding as [`analyze_usage`](Self::analyze_usage).
    pub fn analyze_memory_usage(
        &self,
        process: &str,
        used_mb: f64,
        threshold_mb: f64,
        duration_secs: u64,
    ) -> RiskAssessment {
        let ratio_pct = if threshold_mb > 0.0 {
            used_mb / threshold_mb * 100.0
        } else {
            0.0
        };
        self.analyze_usage(process, ratio_pct, duration_secs)
    }

    /// Memory threshold (MB) scaled to the host's RAM and current load.
    pub fn adaptive_threshold(&self, system_info: &SystemInfo) -> f64 {
        let mut threshold = if system_info.total_memory_gb >= 16.0 {
            ADAPTIVE_BASE_MB * 2.0
        } else if system_info.total_memory_gb >= 8.0 {
            ADAPTIVE_BASE_MB * 1.5
        } else {
            ADAPTIVE_BASE_MB
        };

        match system_info.system_load {
            SystemLoad::High => threshold *= 0.8,
            SystemLoad::Low => threshold *= 1.2,
            SystemLoad::Normal => {}
        }

        threshold
    }

    /// Update one named threshold. Unknown keys are a configuration error.
    pub fn set_threshold(&self, key: &str, value: f64) -> Result<(), EngineError> {
        let mut t = self
            .thresholds
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match key {
            "suspicious" => t.suspicious = value,
            "high_risk" => t.high_risk = value,
            "spike_multiplier" => t.spike_multiplier = value,
            _ => return Err(EngineError::UnknownThreshold(key.to_string())),
        }
        Ok(())
    }

    /// Replace the whole threshold table.
    pub fn set_thresholds(&self, thresholds: Thresholds) {
        *self
            .thresholds
            .write()
            .unwrap_or_else(PoisonError::into_inner) = thresholds;
    }

    /// Defensive copy of the current thresholds.
    pub fn thresholds(&self) -> Thresholds {
        self.snapshot_thresholds()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    /// Gather this engine's Prometheus metric families for exposition.
    pub fn gather_metrics(&self) -> Vec<prometheus::proto::MetricFamily> {
        self.metrics.gather()
    }

    pub(crate) fn snapshot_thresholds(&self) -> Thresholds {
        self.thresholds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn analysis_metrics(&self) -> &AnalyzerMetrics {
        &self.metrics
    }
}

impl Default for ResourceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
