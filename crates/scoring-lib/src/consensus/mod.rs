//! Multi-detector consensus engine
//!
//! Combines N detector verdicts (risk level, score, confidence, optional
//! explicit weight) into one final risk decision. Configuration (weight
//! table, risk values, score bands) is read-mostly: every aggregation call
//! snapshots it once up front, so a concurrent setter can never interleave
//! with a single call.

mod conflict;
mod ensemble;

pub use conflict::ResolutionMethod;
pub use ensemble::{EnsembleMethod, EnsembleResult};

use crate::error::EngineError;
use crate::models::{DetectorVerdict, RiskBand, RiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::info;

/// Weight applied to detectors missing from the configured table.
const DEFAULT_DETECTOR_WEIGHT: f64 = 0.1;

/// Weight applied when a verdict carries no explicit weight.
const DEFAULT_EXPLICIT_WEIGHT: f64 = 0.25;

/// Aggregation strategy used to produce a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusMethod {
    WeightedAverage,
    ExplicitWeights,
    ConflictResolution,
}

/// Numeric value assigned to each risk level for score arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskValues {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for RiskValues {
    fn default() -> Self {
        Self {
            low: 0.2,
            medium: 0.5,
            high: 0.85,
        }
    }
}

impl RiskValues {
    pub fn value(&self, level: RiskLevel) -> f64 {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
        }
    }
}

/// Score thresholds mapping a consensus score onto the final band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBands {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for ScoreBands {
    fn default() -> Self {
        Self {
            low: 0.3,
            medium: 0.6,
            high: 0.8,
        }
    }
}

impl ScoreBands {
    pub fn band(&self, score: f64) -> RiskBand {
        if score >= self.high {
            RiskBand::High
        } else if score >= self.medium {
            RiskBand::Medium
        } else if score >= self.low {
            RiskBand::Low
        } else {
            RiskBand::Normal
        }
    }
}

#[derive(Debug, Clone)]
struct ConsensusConfig {
    weights: HashMap<String, f64>,
    risk_values: RiskValues,
    bands: ScoreBands,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        let weights = HashMap::from([
            ("ml_detector".to_string(), 0.3),
            ("behavior_detector".to_string(), 0.25),
            ("network_detector".to_string(), 0.25),
            ("api_detector".to_string(), 0.2),
        ]);
        Self {
            weights,
            risk_values: RiskValues::default(),
            bands: ScoreBands::default(),
        }
    }
}

/// Final aggregated verdict. Created once per call; no lifecycle beyond it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusResult {
    pub final_risk_level: RiskBand,
    pub consensus_score: f64,
    pub confidence: f64,
    pub detectors_count: usize,
    pub method: ConsensusMethod,
    /// How a conflict was resolved, when conflict resolution ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionMethod>,
}

/// Aggregates detector verdicts into one risk decision.
pub struct ConsensusEngine {
    config: RwLock<ConsensusConfig>,
}

impl ConsensusEngine {
    pub fn new() -> Self {
        Self {
            config: RwLock::new(ConsensusConfig::default()),
        }
    }

    /// Combine verdicts using the engine's configured weight table.
    ///
    /// The quorum check runs before any aggregation so partial data never
    /// silently produces a verdict.
    ///
    /// # Panics
    /// Panics if any verdict carries a score, confidence, or weight outside
    /// [0,1]; that indicates a bug in the producing detector.
    pub fn combine(
        &self,
        verdicts: &[DetectorVerdict],
        min_detectors: usize,
    ) -> Result<ConsensusResult, EngineError> {
        let cfg = self.snapshot();
        let required = min_detectors.max(1);
        if verdicts.len() < required {
            return Err(EngineError::QuorumNotMet {
                required,
                received: verdicts.len(),
            });
        }
        validate_verdicts(verdicts);

        let result = aggregate(verdicts, &cfg.bands, ConsensusMethod::WeightedAverage, |v| {
            cfg.weights
                .get(&v.detector)
                .copied()
                .unwrap_or(DEFAULT_DETECTOR_WEIGHT)
        });

        info!(
            method = "weighted_average",
            detectors = result.detectors_count,
            consensus_score = result.consensus_score,
            final_risk_level = %result.final_risk_level,
            "consensus computed"
        );
        Ok(result)
    }

    /// Combine verdicts using each verdict's own explicit weight, letting
    /// callers override detector influence per call. Identical arithmetic to
    /// [`combine`](Self::combine): the highest-weighted detector dominates
    /// the band decision by construction of the weighted sum.
    ///
    /// # Panics
    /// Same preconditions as [`combine`](Self::combine).
    pub fn weighted_consensus(
        &self,
        verdicts: &[DetectorVerdict],
    ) -> Result<ConsensusResult, EngineError> {
        let cfg = self.snapshot();
        if verdicts.is_empty() {
            return Err(EngineError::QuorumNotMet {
                required: 1,
                received: 0,
            });
        }
        validate_verdicts(verdicts);

        Ok(aggregate(
            verdicts,
            &cfg.bands,
            ConsensusMethod::ExplicitWeights,
            |v| v.weight.unwrap_or(DEFAULT_EXPLICIT_WEIGHT),
        ))
    }

    /// Set the configured weight for one detector.
    pub fn set_detector_weight(
        &self,
        detector: impl Into<String>,
        weight: f64,
    ) -> Result<(), EngineError> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(EngineError::ValueOutOfRange {
                name: "detector weight",
                value: weight,
            });
        }
        self.config_write().weights.insert(detector.into(), weight);
        Ok(())
    }

    /// Defensive copy of the detector weight table.
    pub fn detector_weights(&self) -> HashMap<String, f64> {
        self.snapshot().weights
    }

    /// Replace the risk-value mapping.
    pub fn set_risk_values(&self, values: RiskValues) -> Result<(), EngineError> {
        for (name, value) in [
            ("risk value LOW", values.low),
            ("risk value MEDIUM", values.medium),
            ("risk value HIGH", values.high),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::ValueOutOfRange { name, value });
            }
        }
        self.config_write().risk_values = values;
        Ok(())
    }

    pub fn risk_values(&self) -> RiskValues {
        self.snapshot().risk_values
    }

    /// Replace the score-band thresholds. Bands must be strictly increasing
    /// within [0,1].
    pub fn set_score_bands(&self, bands: ScoreBands) -> Result<(), EngineError> {
        let ordered = 0.0 <= bands.low && bands.low < bands.medium && bands.medium < bands.high;
        if !ordered || bands.high > 1.0 {
            return Err(EngineError::InvalidScoreBands {
                low: bands.low,
                medium: bands.medium,
                high: bands.high,
            });
        }
        self.config_write().bands = bands;
        Ok(())
    }

    pub fn score_bands(&self) -> ScoreBands {
        self.snapshot().bands
    }

    fn snapshot(&self) -> ConsensusConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn config_write(&self) -> std::sync::RwLockWriteGuard<'_, ConsensusConfig> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Weighted aggregation shared by the table-weighted and explicit-weight
/// paths: `consensus_score = Σ(score×weight) / Σweight`, confidence is the
/// plain average.
fn aggregate(
    verdicts: &[DetectorVerdict],
    bands: &ScoreBands,
    method: ConsensusMethod,
    weight_of: impl Fn(&DetectorVerdict) -> f64,
) -> ConsensusResult {
    let mut weighted_score = 0.0;
    let mut total_weight = 0.0;
    let mut confidence_sum = 0.0;

    for verdict in verdicts {
        let weight = weight_of(verdict);
        weighted_score += verdict.score * weight;
        total_weight += weight;
        confidence_sum += verdict.confidence;
    }

    let consensus_score = if total_weight > 0.0 {
        weighted_score / total_weight
    } else {
        0.0
    };

    ConsensusResult {
        final_risk_level: bands.band(consensus_score),
        consensus_score,
        confidence: confidence_sum / verdicts.len() as f64,
        detectors_count: verdicts.len(),
        method,
        resolution: None,
    }
}

pub(crate) fn validate_verdicts(verdicts: &[DetectorVerdict]) {
    for v in verdicts {
        assert!(
            (0.0..=1.0).contains(&v.score),
            "verdict score {} from `{}` outside [0,1]",
            v.score,
            v.detector
        );
        assert!(
            (0.0..=1.0).contains(&v.confidence),
            "verdict confidence {} from `{}` outside [0,1]",
            v.confidence,
            v.detector
        );
        if let Some(w) = v.weight {
            assert!(
                (0.0..=1.0).contains(&w),
                "verdict weight {w} from `{}` outside [0,1]",
                v.detector
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(name: &str, level: RiskLevel, score: f64, confidence: f64) -> DetectorVerdict {
        DetectorVerdict::new(name, level, score, confidence)
    }

    fn four_detector_verdicts() -> Vec<DetectorVerdict> {
        vec![
            verdict("ml_detector", RiskLevel::High, 0.92, 0.85),
            verdict("behavior_detector", RiskLevel::Medium, 0.65, 0.78),
            verdict("network_detector", RiskLevel::High, 0.88, 0.90),
            verdict("api_detector", RiskLevel::High, 0.95, 0.93),
        ]
    }

    #[test]
    fn majority_high_verdicts_combine_to_high() {
        let engine = ConsensusEngine::new();
        let result = engine.combine(&four_detector_verdicts(), 1).unwrap();

        assert_eq!(result.final_risk_level, RiskBand::High);
        assert!(result.consensus_score > 0.8);
        assert!(result.confidence > 0.85);
        assert_eq!(result.detectors_count, 4);
        assert_eq!(result.method, ConsensusMethod::WeightedAverage);
    }

    #[test]
    fn combine_is_idempotent() {
        let engine = ConsensusEngine::new();
        let verdicts = four_detector_verdicts();
        let first = engine.combine(&verdicts, 2).unwrap();
        let second = engine.combine(&verdicts, 2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn quorum_violation_is_an_error() {
        let engine = ConsensusEngine::new();
        let single = vec![verdict("ml_detector", RiskLevel::High, 0.95, 0.9)];
        let err = engine.combine(&single, 2).unwrap_err();
        assert!(matches!(
            err,
            EngineError::QuorumNotMet {
                required: 2,
                received: 1
            }
        ));
    }

    #[test]
    fn empty_verdicts_never_aggregate() {
        let engine = ConsensusEngine::new();
        assert!(engine.combine(&[], 0).is_err());
        assert!(engine.weighted_consensus(&[]).is_err());
    }

    #[test]
    fn unknown_detectors_fall_back_to_default_weight() {
        let engine = ConsensusEngine::new();
        let verdicts = vec![
            verdict("mystery_a", RiskLevel::High, 0.9, 0.8),
            verdict("mystery_b", RiskLevel::High, 0.9, 0.8),
        ];
        // Equal fallback weights reduce to the plain average.
        let result = engine.combine(&verdicts, 1).unwrap();
        assert!((result.consensus_score - 0.9).abs() < 1e-12);
        assert_eq!(result.final_risk_level, RiskBand::High);
    }

    #[test]
    fn highest_explicit_weight_dominates() {
        let engine = ConsensusEngine::new();
        let verdicts = vec![
            verdict("ml_detector", RiskLevel::High, 0.95, 0.9).with_weight(0.8),
            verdict("behavior_detector", RiskLevel::Low, 0.2, 0.7).with_weight(0.1),
            verdict("network_detector", RiskLevel::Low, 0.25, 0.7).with_weight(0.1),
        ];

        let result = engine.weighted_consensus(&verdicts).unwrap();
        // (0.95*0.8 + 0.2*0.1 + 0.25*0.1) / 1.0 = 0.805
        assert!((result.consensus_score - 0.805).abs() < 1e-9);
        assert_eq!(result.final_risk_level, RiskBand::High);
        assert_eq!(result.method, ConsensusMethod::ExplicitWeights);
    }

    #[test]
    fn missing_explicit_weight_uses_default() {
        let engine = ConsensusEngine::new();
        let verdicts = vec![
            verdict("a", RiskLevel::Low, 0.4, 0.6),
            verdict("b", RiskLevel::Low, 0.2, 0.6),
        ];
        let result = engine.weighted_consensus(&verdicts).unwrap();
        assert!((result.consensus_score - 0.3).abs() < 1e-12);
        assert_eq!(result.final_risk_level, RiskBand::Low);
    }

    #[test]
    fn low_scores_fall_into_normal_band() {
        let engine = ConsensusEngine::new();
        let verdicts = vec![
            verdict("ml_detector", RiskLevel::Low, 0.1, 0.9),
            verdict("network_detector", RiskLevel::Low, 0.15, 0.8),
        ];
        let result = engine.combine(&verdicts, 1).unwrap();
        assert_eq!(result.final_risk_level, RiskBand::Normal);
    }

    #[test]
    #[should_panic(expected = "outside [0,1]")]
    fn malformed_verdict_fails_fast() {
        let engine = ConsensusEngine::new();
        let mut bad = verdict("ml_detector", RiskLevel::High, 0.9, 0.9);
        bad.score = 1.7;
        let _ = engine.combine(&[bad], 1);
    }

    #[test]
    fn weight_setter_round_trips_with_defensive_copy() {
        let engine = ConsensusEngine::new();
        engine.set_detector_weight("iast_detector", 0.15).unwrap();
        assert_eq!(engine.detector_weights()["iast_detector"], 0.15);

        let mut copy = engine.detector_weights();
        copy.insert("iast_detector".to_string(), 0.99);
        assert_eq!(engine.detector_weights()["iast_detector"], 0.15);

        let err = engine.set_detector_weight("iast_detector", 1.5).unwrap_err();
        assert!(matches!(err, EngineError::ValueOutOfRange { .. }));
    }

    #[test]
    fn score_bands_are_validated_and_applied() {
        let engine = ConsensusEngine::new();
        assert!(engine
            .set_score_bands(ScoreBands {
                low: 0.5,
                medium: 0.4,
                high: 0.9
            })
            .is_err());

        engine
            .set_score_bands(ScoreBands {
                low: 0.2,
                medium: 0.5,
                high: 0.9,
            })
            .unwrap();

        let verdicts = vec![
            verdict("a", RiskLevel::Medium, 0.85, 0.8),
            verdict("b", RiskLevel::Medium, 0.85, 0.8),
        ];
        // 0.85 clears MEDIUM (0.5) but not the new HIGH bar (0.9).
        let result = engine.combine(&verdicts, 1).unwrap();
        assert_eq!(result.final_risk_level, RiskBand::Medium);
    }

    #[test]
    fn risk_values_setter_round_trips() {
        let engine = ConsensusEngine::new();
        let values = RiskValues {
            low: 0.1,
            medium: 0.4,
            high: 0.9,
        };
        engine.set_risk_values(values).unwrap();
        assert_eq!(engine.risk_values(), values);

        let err = engine
            .set_risk_values(RiskValues {
                low: -0.1,
                medium: 0.5,
                high: 0.9,
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::ValueOutOfRange { .. }));
    }

    #[test]
    fn consensus_result_serializes_for_reporting() {
        let engine = ConsensusEngine::new();
        let result = engine.combine(&four_detector_verdicts(), 1).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["final_risk_level"], "HIGH");
        assert_eq!(json["method"], "weighted_average");
        assert!(json.get("resolution").is_none());
    }
}
