//! Sustained-usage analysis
//!
//! A high fraction of readings above the suspicious threshold suggests
//! continuous activity such as a polling loop. The indicator tags feed
//! downstream reporting only; they never change the numeric verdict.

use super::ResourceAnalyzer;
use crate::models::{AnomalyType, RiskLevel, TimeSeriesWindow, UsagePattern};
use serde::Serialize;

/// Outcome of sustained-usage analysis over a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SustainedResult {
    /// Fewer readings than the sustained gate requires.
    InsufficientData { readings: usize },
    Analyzed(SustainedAnalysis),
}

impl SustainedResult {
    pub fn sustained_anomaly(&self) -> bool {
        match self {
            SustainedResult::InsufficientData { .. } => false,
            SustainedResult::Analyzed(analysis) => analysis.sustained_anomaly,
        }
    }
}

/// Sustained-usage analysis over a sufficient window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SustainedAnalysis {
    pub process: String,
    pub risk_level: RiskLevel,
    pub sustained_anomaly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_type: Option<AnomalyType>,
    pub high_readings: usize,
    pub total_readings: usize,
    pub high_fraction: f64,
    pub pattern: UsagePattern,
    pub confidence: f64,
    pub indicators: Vec<String>,
}

impl ResourceAnalyzer {
    /// Analyze the fraction of readings at or above the suspicious threshold.
    pub fn analyze_sustained(&self, window: &TimeSeriesWindow) -> SustainedResult {
        let t = self.snapshot_thresholds();
        self.analysis_metrics().timed("analyze_sustained", || {
            if window.len() < t.min_sustained_readings {
                return SustainedResult::InsufficientData {
                    readings: window.len(),
                };
            }

            let total = window.len();
            let high_readings = window
                .readings
                .iter()
                .filter(|r| r.value >= t.suspicious)
                .count();
            let fraction = high_readings as f64 / total as f64;

            let (risk_level, sustained_anomaly) = if fraction >= 0.7 {
                (RiskLevel::High, true)
            } else if fraction >= 0.4 {
                (RiskLevel::Medium, false)
            } else {
                (RiskLevel::Low, false)
            };

            let pattern = if fraction >= 0.8 {
                UsagePattern::Consistent
            } else if fraction >= 0.5 {
                UsagePattern::Frequent
            } else if fraction >= 0.2 {
                UsagePattern::Occasional
            } else {
                UsagePattern::Rare
            };

            let mut indicators = Vec::new();
            if pattern == UsagePattern::Consistent {
                indicators.push("consistent_high_usage".to_string());
            }
            if fraction >= 0.6 {
                indicators.push("sustained_resource_consumption".to_string());
            }

            if sustained_anomaly {
                self.analysis_metrics().record_anomaly();
            }

            SustainedResult::Analyzed(SustainedAnalysis {
                process: window.process.clone(),
                risk_level,
                sustained_anomaly,
                anomaly_type: sustained_anomaly.then_some(AnomalyType::SustainedHigh),
                high_readings,
                total_readings: total,
                high_fraction: fraction,
                pattern,
                confidence: (fraction * 1.2).min(0.95),
                indicators,
            })
        })
    }
}
