//! Engine configuration
//!
//! Thresholds and gates are process-wide administrative settings; they are
//! loaded once from the environment and then owned (and mutable via setters)
//! by the engine instances that consume them.

use anyhow::Result;
use serde::Deserialize;

/// Scoring engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Usage percentage above which a reading counts as suspicious.
    #[serde(default = "default_suspicious")]
    pub suspicious_threshold: f64,

    /// Usage percentage above which a reading is critical.
    #[serde(default = "default_high_risk")]
    pub high_risk_threshold: f64,

    /// Multiplier over the window average that defines a spike.
    #[serde(default = "default_spike_multiplier")]
    pub spike_multiplier: f64,

    /// Minimum verdicts required before consensus is considered reliable.
    #[serde(default = "default_min_detectors")]
    pub min_detectors: usize,

    /// Minimum readings for spike detection.
    #[serde(default = "default_min_spike_readings")]
    pub min_spike_readings: usize,

    /// Minimum points for pattern classification.
    #[serde(default = "default_min_pattern_readings")]
    pub min_pattern_readings: usize,

    /// Minimum readings for sustained-usage analysis.
    #[serde(default = "default_min_sustained_readings")]
    pub min_sustained_readings: usize,
}

fn default_suspicious() -> f64 {
    80.0
}

fn default_high_risk() -> f64 {
    90.0
}

fn default_spike_multiplier() -> f64 {
    3.0
}

fn default_min_detectors() -> usize {
    1
}

fn default_min_spike_readings() -> usize {
    2
}

fn default_min_pattern_readings() -> usize {
    3
}

fn default_min_sustained_readings() -> usize {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            suspicious_threshold: default_suspicious(),
            high_risk_threshold: default_high_risk(),
            spike_multiplier: default_spike_multiplier(),
            min_detectors: default_min_detectors(),
            min_spike_readings: default_min_spike_readings(),
            min_pattern_readings: default_min_pattern_readings(),
            min_sustained_readings: default_min_sustained_readings(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `SCORING_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("SCORING"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }
}
