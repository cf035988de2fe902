//! Spike detection
//!
//! Flags a single reading far above the recent window average. The absolute
//! floor keeps low-usage processes from being flagged on noise.

use super::ResourceAnalyzer;
use crate::models::{AnomalyType, TimeSeriesWindow};
use crate::stats;
use serde::Serialize;

/// A reading must exceed this absolute value to count as a spike.
const SPIKE_ABSOLUTE_FLOOR: f64 = 50.0;

/// Outcome of spike detection over a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpikeResult {
    /// Fewer readings than the spike gate requires.
    InsufficientData { readings: usize },
    Analyzed(SpikeAnalysis),
}

impl SpikeResult {
    /// Insufficient data never reports an anomaly.
    pub fn anomaly_detected(&self) -> bool {
        match self {
            SpikeResult::InsufficientData { .. } => false,
            SpikeResult::Analyzed(analysis) => analysis.anomaly_detected,
        }
    }
}

/// Spike analysis over a sufficient window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpikeAnalysis {
    pub process: String,
    pub anomaly_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_type: Option<AnomalyType>,
    pub average: f64,
    pub max: f64,
    pub threshold: f64,
    pub confidence: f64,
    pub readings: usize,
}

impl ResourceAnalyzer {
    /// Detect a sudden usage spike in the window.
    ///
    /// Threshold is `average × spike_multiplier`; a spike requires the max to
    /// exceed both the threshold and the absolute floor.
    pub fn detect_spike(&self, window: &TimeSeriesWindow) -> SpikeResult {
        let t = self.snapshot_thresholds();
        self.analysis_metrics().timed("detect_spike", || {
            if window.len() < t.min_spike_readings {
                return SpikeResult::InsufficientData {
                    readings: window.len(),
                };
            }

            let values = window.values();
            let average = stats::mean(&values);
            let max = stats::max(&values);
            let threshold = average * t.spike_multiplier;

            let detected = max > threshold && max > SPIKE_ABSOLUTE_FLOOR;
            let confidence = if detected {
                ((max / threshold) * 0.8).min(0.95)
            } else {
                0.0
            };

            if detected {
                self.analysis_metrics().record_anomaly();
            }

            SpikeResult::Analyzed(SpikeAnalysis {
                process: window.process.clone(),
                anomaly_detected: detected,
                anomaly_type: detected.then_some(AnomalyType::SuddenSpike),
                average,
                max,
                threshold,
                confidence,
                readings: values.len(),
            })
        })
    }
}
