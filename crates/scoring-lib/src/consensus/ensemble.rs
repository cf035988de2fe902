//! Ensemble consensus over model probability distributions
//!
//! Each prediction is a probability distribution over {LOW, MEDIUM, HIGH}
//! from one model. Voting sums the distributions and picks the arg-max
//! class; the reported confidence is the group's normalized agreement on
//! that class, not any single model's confidence.

use super::ConsensusEngine;
use crate::error::EngineError;
use crate::models::{ClassDistribution, RiskLevel};
use serde::{Deserialize, Serialize};

/// Ensemble combination method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsembleMethod {
    Voting,
    Averaging,
}

/// Outcome of ensemble consensus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleResult {
    pub predicted_class: RiskLevel,
    /// Summed probability of the winning class divided by the number of
    /// predictions.
    pub ensemble_confidence: f64,
    pub probabilities: ClassDistribution,
    pub predictions_count: usize,
    pub method: EnsembleMethod,
}

impl ConsensusEngine {
    /// Combine model probability distributions into one class prediction.
    ///
    /// Voting and averaging both reduce to the mean-distribution arg-max;
    /// ties resolve toward the higher-severity class.
    ///
    /// # Panics
    /// Panics if any probability is outside [0,1].
    pub fn ensemble_consensus(
        &self,
        predictions: &[ClassDistribution],
        method: EnsembleMethod,
    ) -> Result<EnsembleResult, EngineError> {
        if predictions.is_empty() {
            return Err(EngineError::QuorumNotMet {
                required: 1,
                received: 0,
            });
        }
        for dist in predictions {
            for (name, p) in [("low", dist.low), ("medium", dist.medium), ("high", dist.high)] {
                assert!(
                    (0.0..=1.0).contains(&p),
                    "class probability {p} for {name} outside [0,1]"
                );
            }
        }
        let n = predictions.len() as f64;
        let mean = ClassDistribution::new(
            predictions.iter().map(|d| d.low).sum::<f64>() / n,
            predictions.iter().map(|d| d.medium).sum::<f64>() / n,
            predictions.iter().map(|d| d.high).sum::<f64>() / n,
        );

        let (predicted_class, ensemble_confidence) = mean.dominant();

        Ok(EnsembleResult {
            predicted_class,
            ensemble_confidence,
            probabilities: mean,
            predictions_count: predictions.len(),
            method,
        })
    }
}
