//! Core data model for the threat-scoring engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk level emitted by individual detectors.
///
/// Ordered LOW < MEDIUM < HIGH; the ordering is used for majority counting
/// and conflict tie-breaking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// Final risk band produced by consensus.
///
/// Consensus recognizes a synthetic NORMAL band below LOW for scores that do
/// not reach the LOW threshold.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskBand {
    Normal,
    Low,
    Medium,
    High,
}

impl From<RiskLevel> for RiskBand {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Low => RiskBand::Low,
            RiskLevel::Medium => RiskBand::Medium,
            RiskLevel::High => RiskBand::High,
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskBand::Normal => write!(f, "NORMAL"),
            RiskBand::Low => write!(f, "LOW"),
            RiskBand::Medium => write!(f, "MEDIUM"),
            RiskBand::High => write!(f, "HIGH"),
        }
    }
}

/// Why an analysis result was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyType {
    SuddenSpike,
    SustainedHigh,
    MemoryLeak,
    VolatilePattern,
}

/// Shape classification of a resource-usage series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    StableLow,
    StableHigh,
    Growing,
    Volatile,
    Normal,
    InsufficientData,
}

/// Qualitative label for how often a window sits above the suspicious line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsagePattern {
    Consistent,
    Frequent,
    Occasional,
    Rare,
}

/// A single timestamped usage sample (CPU percent or memory MB).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// An ordered, finite window of readings for one process.
///
/// The window is owned by the caller; the engine derives statistics from it
/// but never stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesWindow {
    pub process: String,
    pub readings: Vec<Reading>,
}

impl TimeSeriesWindow {
    pub fn new(process: impl Into<String>) -> Self {
        Self {
            process: process.into(),
            readings: Vec::new(),
        }
    }

    /// Build a window from raw values with synthetic timestamps spaced
    /// `step_secs` apart, starting at `start`.
    pub fn from_values(
        process: impl Into<String>,
        start: DateTime<Utc>,
        step_secs: i64,
        values: &[f64],
    ) -> Self {
        let readings = values
            .iter()
            .enumerate()
            .map(|(i, v)| Reading::new(start + chrono::Duration::seconds(i as i64 * step_secs), *v))
            .collect();
        Self {
            process: process.into(),
            readings,
        }
    }

    pub fn push(&mut self, reading: Reading) {
        self.readings.push(reading);
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.value).collect()
    }
}

/// The unit exchanged with the consensus engine: one detector's opinion
/// about one process. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorVerdict {
    pub detector: String,
    pub risk_level: RiskLevel,
    pub score: f64,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl DetectorVerdict {
    /// Create a verdict without an explicit weight.
    ///
    /// # Panics
    /// Panics if `score` or `confidence` is outside [0,1]; out-of-range
    /// values indicate a bug in the producing detector.
    pub fn new(
        detector: impl Into<String>,
        risk_level: RiskLevel,
        score: f64,
        confidence: f64,
    ) -> Self {
        assert!(
            (0.0..=1.0).contains(&score),
            "verdict score {score} outside [0,1]"
        );
        assert!(
            (0.0..=1.0).contains(&confidence),
            "verdict confidence {confidence} outside [0,1]"
        );
        Self {
            detector: detector.into(),
            risk_level,
            score,
            confidence,
            weight: None,
        }
    }

    /// Attach an explicit per-call weight, overriding the engine table.
    ///
    /// # Panics
    /// Panics if `weight` is outside [0,1].
    pub fn with_weight(mut self, weight: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&weight),
            "verdict weight {weight} outside [0,1]"
        );
        self.weight = Some(weight);
        self
    }
}

/// A probability distribution over {LOW, MEDIUM, HIGH} from one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassDistribution {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl ClassDistribution {
    pub fn new(low: f64, medium: f64, high: f64) -> Self {
        Self { low, medium, high }
    }

    /// The class with the highest probability. Ties resolve toward the
    /// higher-severity class.
    pub fn dominant(&self) -> (RiskLevel, f64) {
        let mut best = (RiskLevel::Low, self.low);
        for (level, p) in [
            (RiskLevel::Medium, self.medium),
            (RiskLevel::High, self.high),
        ] {
            if p >= best.1 {
                best = (level, p);
            }
        }
        best
    }
}

/// One observed network connection of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub remote_addr: String,
    pub port: u16,
    pub protocol: String,
}

/// Raw per-process telemetry handed in by the monitoring plugins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessTelemetry {
    pub process: String,
    pub cpu: TimeSeriesWindow,
    pub memory: TimeSeriesWindow,
    pub api_calls: Vec<String>,
    pub connections: Vec<ConnectionRecord>,
}

impl ProcessTelemetry {
    pub fn new(process: impl Into<String>) -> Self {
        let process = process.into();
        Self {
            cpu: TimeSeriesWindow::new(process.clone()),
            memory: TimeSeriesWindow::new(process.clone()),
            api_calls: Vec::new(),
            connections: Vec::new(),
            process,
        }
    }
}

/// Host load bucket used by the adaptive memory threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemLoad {
    Low,
    Normal,
    High,
}

/// Host characteristics consumed by `adaptive_threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub total_memory_gb: f64,
    pub system_load: SystemLoad,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskBand::Normal < RiskBand::Low);
    }

    #[test]
    fn window_from_values() {
        let window = TimeSeriesWindow::from_values(
            "svc.exe",
            Utc::now(),
            60,
            &[1.0, 2.0, 3.0],
        );
        assert_eq!(window.len(), 3);
        assert_eq!(window.values(), vec![1.0, 2.0, 3.0]);
        assert!(window.readings[0].timestamp < window.readings[2].timestamp);
    }

    #[test]
    fn dominant_class_ties_toward_severity() {
        let dist = ClassDistribution::new(0.4, 0.2, 0.4);
        let (level, p) = dist.dominant();
        assert_eq!(level, RiskLevel::High);
        assert!((p - 0.4).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "outside [0,1]")]
    fn verdict_rejects_out_of_range_score() {
        let _ = DetectorVerdict::new("ml_detector", RiskLevel::High, 1.2, 0.9);
    }

    #[test]
    fn verdict_serializes_without_absent_weight() {
        let verdict = DetectorVerdict::new("ml_detector", RiskLevel::High, 0.9, 0.8);
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["risk_level"], "HIGH");
        assert!(json.get("weight").is_none());

        let weighted = verdict.with_weight(0.4);
        let json = serde_json::to_value(&weighted).unwrap();
        assert_eq!(json["weight"], 0.4);
    }
}
