//! Engine-owned metrics and timing instrumentation
//!
//! Each analyzer instance owns its own `prometheus::Registry` so independently
//! configured engines can run in parallel without sharing counter state. The
//! `timed` helper replaces decorator-style timing: it runs the analysis
//! closure, records the duration, and emits a structured log event.

use prometheus::{Counter, IntCounter, Opts, Registry};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, warn};

/// Analyses slower than this are logged at warn level.
const SLOW_ANALYSIS_SECS: f64 = 1.0;

/// Per-engine analysis counters backed by a private Prometheus registry.
pub struct AnalyzerMetrics {
    registry: Registry,
    analyses_performed: IntCounter,
    anomalies_detected: IntCounter,
    analysis_seconds_total: Counter,
}

impl AnalyzerMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let analyses_performed = IntCounter::with_opts(Opts::new(
            "scoring_analyses_performed_total",
            "Total number of analysis operations run by this engine",
        ))
        .expect("valid counter opts");

        let anomalies_detected = IntCounter::with_opts(Opts::new(
            "scoring_anomalies_detected_total",
            "Total number of anomalies flagged by this engine",
        ))
        .expect("valid counter opts");

        let analysis_seconds_total = Counter::with_opts(Opts::new(
            "scoring_analysis_seconds_total",
            "Cumulative wall time spent in analysis operations",
        ))
        .expect("valid counter opts");

        registry
            .register(Box::new(analyses_performed.clone()))
            .expect("register analyses_performed");
        registry
            .register(Box::new(anomalies_detected.clone()))
            .expect("register anomalies_detected");
        registry
            .register(Box::new(analysis_seconds_total.clone()))
            .expect("register analysis_seconds_total");

        Self {
            registry,
            analyses_performed,
            anomalies_detected,
            analysis_seconds_total,
        }
    }

    /// Run one analysis operation, recording its duration and logging the
    /// outcome.
    pub fn timed<T>(&self, op: &'static str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        let elapsed = start.elapsed().as_secs_f64();

        self.analyses_performed.inc();
        self.analysis_seconds_total.inc_by(elapsed);

        if elapsed > SLOW_ANALYSIS_SECS {
            warn!(op, elapsed_secs = elapsed, "slow analysis");
        } else {
            debug!(op, elapsed_secs = elapsed, "analysis completed");
        }
        out
    }

    /// Count one flagged anomaly.
    pub fn record_anomaly(&self) {
        self.anomalies_detected.inc();
    }

    /// Plain-value view of the counters for host consumption.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let analyses = self.analyses_performed.get();
        let anomalies = self.anomalies_detected.get();
        let total_secs = self.analysis_seconds_total.get();
        MetricsSnapshot {
            analyses_performed: analyses,
            anomalies_detected: anomalies,
            detection_rate: anomalies as f64 / (analyses.max(1)) as f64,
            total_analysis_seconds: total_secs,
            avg_analysis_seconds: total_secs / (analyses.max(1)) as f64,
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.analyses_performed.reset();
        self.anomalies_detected.reset();
        self.analysis_seconds_total.reset();
    }

    /// Gather metric families for exposition by the host.
    pub fn gather(&self) -> Vec<prometheus::proto::MetricFamily> {
        self.registry.gather()
    }
}

impl Default for AnalyzerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the engine counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub analyses_performed: u64,
    pub anomalies_detected: u64,
    pub detection_rate: f64,
    pub total_analysis_seconds: f64,
    pub avg_analysis_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_counts_analyses() {
        let metrics = AnalyzerMetrics::new();
        let out = metrics.timed("test_op", || 41 + 1);
        assert_eq!(out, 42);

        let snap = metrics.snapshot();
        assert_eq!(snap.analyses_performed, 1);
        assert_eq!(snap.anomalies_detected, 0);
    }

    #[test]
    fn detection_rate_and_reset() {
        let metrics = AnalyzerMetrics::new();
        metrics.timed("a", || ());
        metrics.timed("b", || ());
        metrics.record_anomaly();

        let snap = metrics.snapshot();
        assert_eq!(snap.analyses_performed, 2);
        assert_eq!(snap.anomalies_detected, 1);
        assert!((snap.detection_rate - 0.5).abs() < 1e-12);

        metrics.reset();
        let snap = metrics.snapshot();
        assert_eq!(snap.analyses_performed, 0);
        assert_eq!(snap.anomalies_detected, 0);
    }

    #[test]
    fn registries_are_independent() {
        let a = AnalyzerMetrics::new();
        let b = AnalyzerMetrics::new();
        a.timed("op", || ());
        assert_eq!(a.snapshot().analyses_performed, 1);
        assert_eq!(b.snapshot().analyses_performed, 0);
        assert_eq!(b.gather().len(), 3);
    }
}
