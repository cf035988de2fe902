//! Conflict resolution between disagreeing detectors
//!
//! Used when risk levels disagree sharply (e.g. simultaneous LOW and HIGH
//! verdicts for the same process). The final level follows the majority; a
//! split with no majority resolves toward the higher-severity band, since a
//! missed threat costs more than a false alarm. Every result names the
//! resolution method used so downstream audit trails can explain the call.

use super::{validate_verdicts, ConsensusEngine, ConsensusMethod, ConsensusResult};
use crate::error::EngineError;
use crate::models::{DetectorVerdict, RiskLevel};
use serde::{Deserialize, Serialize};
use tracing::info;

/// How a conflicting verdict set was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// One risk level held a strict plurality of verdicts.
    MajorityVote,
    /// Frequencies tied; the higher-severity level won.
    HighestSeverity,
}

impl ConsensusEngine {
    /// Resolve a set of conflicting verdicts.
    ///
    /// The consensus score falls back to the unweighted mean of the verdict
    /// scores; the final level comes from level frequencies, not the score.
    ///
    /// # Panics
    /// Same preconditions as [`combine`](Self::combine).
    pub fn resolve_conflicts(
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

        let n = verdicts.len() as f64;
        let avg_score = verdicts.iter().map(|v| v.score).sum::<f64>() / n;
        let avg_confidence = verdicts.iter().map(|v| v.confidence).sum::<f64>() / n;

        let mut counts = [0usize; 3];
        for v in verdicts {
            counts[v.risk_level as usize] += 1;
        }
        let top = *counts.iter().max().unwrap_or(&0);
        let tied: Vec<RiskLevel> = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High]
            .into_iter()
            .filter(|level| counts[*level as usize] == top)
            .collect();

        let (level, resolution) = if tied.len() == 1 {
            (tied[0], ResolutionMethod::MajorityVote)
        } else {
            // No majority: take the tied level with the highest configured
            // risk value.
            let highest = tied
                .into_iter()
                .max_by(|a, b| {
                    cfg.risk_values
                        .value(*a)
                        .partial_cmp(&cfg.risk_values.value(*b))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(RiskLevel::High);
            (highest, ResolutionMethod::HighestSeverity)
        };

        info!(
            method = "conflict_resolution",
            resolution = ?resolution,
            final_risk_level = %level,
            detectors = verdicts.len(),
            "conflicting verdicts resolved"
        );

        Ok(ConsensusResult {
            final_risk_level: level.into(),
            consensus_score: avg_score,
            confidence: avg_confidence,
            detectors_count: verdicts.len(),
            method: ConsensusMethod::ConflictResolution,
            resolution: Some(resolution),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskBand;

    fn verdict(name: &str, level: RiskLevel, score: f64) -> DetectorVerdict {
        DetectorVerdict::new(name, level, score, 0.8)
    }

    #[test]
    fn majority_level_wins() {
        let engine = ConsensusEngine::new();
        let verdicts = vec![
            verdict("detector_1", RiskLevel::High, 0.95),
            verdict("detector_2", RiskLevel::Low, 0.15),
            verdict("detector_3", RiskLevel::Medium, 0.55),
            verdict("detector_4", RiskLevel::Low, 0.20),
        ];

        let result = engine.resolve_conflicts(&verdicts).unwrap();
        assert_eq!(result.final_risk_level, RiskBand::Low);
        assert_eq!(result.resolution, Some(ResolutionMethod::MajorityVote));
        assert_eq!(result.method, ConsensusMethod::ConflictResolution);
        assert!((result.consensus_score - 0.4625).abs() < 1e-9);
    }

    #[test]
    fn even_split_resolves_toward_severity() {
        let engine = ConsensusEngine::new();
        let verdicts = vec![
            verdict("detector_1", RiskLevel::High, 0.9),
            verdict("detector_2", RiskLevel::Low, 0.1),
        ];

        let result = engine.resolve_conflicts(&verdicts).unwrap();
        assert_eq!(result.final_risk_level, RiskBand::High);
        assert_eq!(result.resolution, Some(ResolutionMethod::HighestSeverity));
    }

    #[test]
    fn three_way_split_picks_highest() {
        let engine = ConsensusEngine::new();
        let verdicts = vec![
            verdict("detector_1", RiskLevel::Low, 0.1),
            verdict("detector_2", RiskLevel::Medium, 0.5),
            verdict("detector_3", RiskLevel::High, 0.9),
        ];

        let result = engine.resolve_conflicts(&verdicts).unwrap();
        assert_eq!(result.final_risk_level, RiskBand::High);
        assert_eq!(result.resolution, Some(ResolutionMethod::HighestSeverity));
    }

    #[test]
    fn agreeing_verdicts_still_name_their_method() {
        let engine = ConsensusEngine::new();
        let verdicts = vec![
            verdict("detector_1", RiskLevel::Medium, 0.5),
            verdict("detector_2", RiskLevel::Medium, 0.6),
        ];

        let result = engine.resolve_conflicts(&verdicts).unwrap();
        assert_eq!(result.final_risk_level, RiskBand::Medium);
        assert!(result.resolution.is_some());
    }

    #[test]
    fn empty_input_is_a_quorum_error() {
        let engine = ConsensusEngine::new();
        assert!(matches!(
            engine.resolve_conflicts(&[]),
            Err(EngineError::QuorumNotMet { .. })
        ));
    }
}
