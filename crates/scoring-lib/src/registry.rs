//! Detector orchestration surface
//!
//! The minimal contract between the external plugin manager and this core:
//! detectors register under a unique name and are asked for a verdict about
//! one process's telemetry. This is not a scheduler; evaluation happens
//! synchronously on the caller's thread, and independent processes may be
//! evaluated concurrently.

use crate::analyzer::{ResourceAnalyzer, SpikeResult, SustainedResult};
use crate::consensus::RiskValues;
use crate::error::EngineError;
use crate::models::{DetectorVerdict, ProcessTelemetry, RiskLevel};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::warn;

/// An independent source of risk verdicts about a process.
pub trait Detector: Send + Sync {
    /// Unique detector name; also the key into the consensus weight table.
    fn name(&self) -> &str;

    /// Produce one verdict for the given telemetry.
    fn evaluate(&self, telemetry: &ProcessTelemetry) -> Result<DetectorVerdict, EngineError>;
}

/// Concurrent registry of detectors keyed by name.
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: DashMap<String, Arc<dyn Detector>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            detectors: DashMap::new(),
        }
    }

    /// Register a detector. Names must be unique.
    pub fn register(&self, detector: Arc<dyn Detector>) -> Result<(), EngineError> {
        let name = detector.name().to_string();
        if self.detectors.contains_key(&name) {
            return Err(EngineError::DuplicateDetector(name));
        }
        self.detectors.insert(name, detector);
        Ok(())
    }

    /// Remove a detector by name; returns whether it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        self.detectors.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.detectors.iter().map(|e| e.key().clone()).collect()
    }

    /// Evaluate every registered detector against one process's telemetry.
    ///
    /// Failing detectors are logged and skipped so one faulty plugin cannot
    /// suppress the verdicts of the others.
    pub fn evaluate_all(&self, telemetry: &ProcessTelemetry) -> Vec<DetectorVerdict> {
        let mut verdicts = Vec::with_capacity(self.detectors.len());
        for entry in self.detectors.iter() {
            match entry.value().evaluate(telemetry) {
                Ok(verdict) => verdicts.push(verdict),
                Err(err) => {
                    warn!(
                        detector = %entry.key(),
                        process = %telemetry.process,
                        error = %err,
                        "detector evaluation failed, skipping"
                    );
                }
            }
        }
        verdicts
    }
}

/// Built-in detector that folds the resource analyzer's spike, sustained,
/// and instantaneous-usage analyses into one verdict.
pub struct ResourceUsageDetector {
    name: String,
    analyzer: ResourceAnalyzer,
    risk_values: RiskValues,
}

impl ResourceUsageDetector {
    pub fn new(analyzer: ResourceAnalyzer) -> Self {
        Self {
            name: "resource_detector".to_string(),
            analyzer,
            risk_values: RiskValues::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn analyzer(&self) -> &ResourceAnalyzer {
        &self.analyzer
    }
}

impl Detector for ResourceUsageDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, telemetry: &ProcessTelemetry) -> Result<DetectorVerdict, EngineError> {
        // Highest-scoring signal wins; each candidate is (level, score,
        // confidence).
        let mut best = (RiskLevel::Low, 0.0_f64, 0.0_f64);
        let mut consider = |level: RiskLevel, score: f64, confidence: f64| {
            if score > best.1 {
                best = (level, score, confidence);
            }
        };

        if let Some(last) = telemetry.cpu.readings.last() {
            let assessment = self.analyzer.analyze_usage(&telemetry.process, last.value, 0);
            consider(assessment.risk_level, assessment.score, assessment.score);
        }

        if let SpikeResult::Analyzed(spike) = self.analyzer.detect_spike(&telemetry.cpu) {
            if spike.anomaly_detected {
                consider(RiskLevel::High, spike.confidence, spike.confidence);
            }
        }

        if let SustainedResult::Analyzed(sustained) =
            self.analyzer.analyze_sustained(&telemetry.cpu)
        {
            consider(
                sustained.risk_level,
                self.risk_values.value(sustained.risk_level) * sustained.confidence,
                sustained.confidence,
            );
        }

        let pattern = self.analyzer.classify_pattern(&telemetry.memory.values());
        if let Some(risk) = pattern.risk {
            consider(
                risk,
                self.risk_values.value(risk) * pattern.confidence,
                pattern.confidence,
            );
        }

        let (risk_level, score, confidence) = best;
        Ok(DetectorVerdict::new(
            &self.name,
            risk_level,
            score.min(1.0),
            confidence.min(1.0),
        ))
    }
}
