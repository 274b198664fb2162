//! Submission metrics for the risk service.

use crate::types::assessment::{RiskBucket, RiskLabel};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

const LATENCY_WINDOW: usize = 10_000;

/// Counters and latency samples for scoring requests
pub struct AssessmentMetrics {
    submissions: AtomicU64,
    predictions: AtomicU64,
    validation_failures: AtomicU64,
    scoring_failures: AtomicU64,
    positive: AtomicU64,
    negative: AtomicU64,
    /// Low, Moderate, High
    buckets: [AtomicU64; 3],
    /// Scoring times (in microseconds)
    latencies: RwLock<Vec<u64>>,
    start_time: Instant,
}

impl AssessmentMetrics {
    pub fn new() -> Self {
        Self {
            submissions: AtomicU64::new(0),
            predictions: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            scoring_failures: AtomicU64::new(0),
            positive: AtomicU64::new(0),
            negative: AtomicU64::new(0),
            buckets: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
            latencies: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, elapsed: Duration, label: RiskLabel, bucket: RiskBucket) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
        self.predictions.fetch_add(1, Ordering::Relaxed);

        match label {
            RiskLabel::Positive => self.positive.fetch_add(1, Ordering::Relaxed),
            RiskLabel::Negative => self.negative.fetch_add(1, Ordering::Relaxed),
        };

        let idx = match bucket {
            RiskBucket::Low => 0,
            RiskBucket::Moderate => 1,
            RiskBucket::High => 2,
        };
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.latencies.write() {
            times.push(elapsed.as_micros() as u64);
            // Keep only the most recent half once the window fills
            if times.len() > LATENCY_WINDOW {
                times.drain(0..LATENCY_WINDOW / 2);
            }
        }
    }

    pub fn record_validation_failure(&self) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scoring_failure(&self) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
        self.scoring_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Scoring latency statistics
    pub fn latency_stats(&self) -> LatencyStats {
        let mut sorted = match self.latencies.read() {
            Ok(times) => times.clone(),
            Err(_) => return LatencyStats::default(),
        };
        if sorted.is_empty() {
            return LatencyStats::default();
        }
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let pct = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: pct(0.50),
            p95_us: pct(0.95),
            p99_us: pct(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            submissions: self.submissions.load(Ordering::Relaxed),
            predictions: self.predictions.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            scoring_failures: self.scoring_failures.load(Ordering::Relaxed),
            positive: self.positive.load(Ordering::Relaxed),
            negative: self.negative.load(Ordering::Relaxed),
            low: self.buckets[0].load(Ordering::Relaxed),
            moderate: self.buckets[1].load(Ordering::Relaxed),
            high: self.buckets[2].load(Ordering::Relaxed),
            latency: self.latency_stats(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let s = self.snapshot();
        let positive_rate = if s.predictions > 0 {
            (s.positive as f64 / s.predictions as f64) * 100.0
        } else {
            0.0
        };

        info!("═══════════════ DELIRIUM RISK SERVICE SUMMARY ═══════════════");
        info!(
            "Submissions: {:>6}  Predictions: {:>6}  Uptime: {}s",
            s.submissions, s.predictions, s.uptime_secs
        );
        info!(
            "Input errors: {:>6}  Scoring errors: {:>6}",
            s.validation_failures, s.scoring_failures
        );
        info!(
            "Positive: {:>6} ({:.1}%)  Low/Moderate/High: {}/{}/{}",
            s.positive, positive_rate, s.low, s.moderate, s.high
        );
        info!(
            "Scoring time (μs): mean={} p50={} p95={} p99={} max={}",
            s.latency.mean_us, s.latency.p50_us, s.latency.p95_us, s.latency.p99_us, s.latency.max_us
        );
    }
}

impl Default for AssessmentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoring time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub submissions: u64,
    pub predictions: u64,
    pub validation_failures: u64,
    pub scoring_failures: u64,
    pub positive: u64,
    pub negative: u64,
    pub low: u64,
    pub moderate: u64,
    pub high: u64,
    pub latency: LatencyStats,
}
