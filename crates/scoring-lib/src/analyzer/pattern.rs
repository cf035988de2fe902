//! Behavioral pattern classification
//!
//! Classifies the shape of a memory (or CPU) series through an ordered
//! cascade: growth dominates volatility, volatility dominates absolute level.
//! The cascade is first-match-wins, so classification is deterministic and
//! total over all numeric inputs.

use super::ResourceAnalyzer;
use crate::models::{AnomalyType, PatternType, RiskLevel};
use crate::stats::Statistics;
use serde::Serialize;

/// Outcome of pattern classification over a value series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternResult {
    pub pattern: PatternType,
    /// Absent when the series was too short to classify.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_type: Option<AnomalyType>,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    pub indicators: Vec<String>,
}

impl PatternResult {
    fn insufficient_data() -> Self {
        Self {
            pattern: PatternType::InsufficientData,
            risk: None,
            anomaly_type: None,
            confidence: 0.0,
            statistics: None,
            indicators: Vec::new(),
        }
    }
}

impl ResourceAnalyzer {
    /// Classify the shape of a usage series (values in MB for memory).
    pub fn classify_pattern(&self, series: &[f64]) -> PatternResult {
        let t = self.snapshot_thresholds();
        self.analysis_metrics().timed("classify_pattern", || {
            if series.len() < t.min_pattern_readings {
                return PatternResult::insufficient_data();
            }

            let stats = Statistics::from_series(series);

            // First match wins.
            let (pattern, risk, anomaly_type, confidence, indicators) =
                if stats.growth_rate > 0.5 {
                    let risk = if stats.average > 500.0 {
                        RiskLevel::High
                    } else {
                        RiskLevel::Medium
                    };
                    (
                        PatternType::Growing,
                        risk,
                        Some(AnomalyType::MemoryLeak),
                        0.8,
                        vec!["memory_growth", "potential_leak"],
                    )
                } else if stats.volatility > 0.5 {
                    (
                        PatternType::Volatile,
                        RiskLevel::Medium,
                        Some(AnomalyType::VolatilePattern),
                        0.7,
                        vec!["unstable_behavior", "resource_thrashing"],
                    )
                } else if stats.average > 1000.0 && stats.volatility < 0.2 {
                    (
                        PatternType::StableHigh,
                        RiskLevel::Medium,
                        None,
                        0.9,
                        vec!["high_resource_consumption"],
                    )
                } else if stats.average < 200.0 && stats.volatility < 0.3 {
                    (
                        PatternType::StableLow,
                        RiskLevel::Low,
                        None,
                        0.9,
                        vec!["normal_behavior"],
                    )
                } else {
                    (
                        PatternType::Normal,
                        RiskLevel::Low,
                        None,
                        0.8,
                        vec!["standard_usage"],
                    )
                };

            if anomaly_type.is_some() {
                self.analysis_metrics().record_anomaly();
            }

            PatternResult {
                pattern,
                risk: Some(risk),
                anomaly_type,
                confidence,
                statistics: Some(stats),
                indicators: indicators.into_iter().map(str::to_string).collect(),
            }
        })
    }
}
