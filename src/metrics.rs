//! Runtime metrics: build and query latency, add/delete counts.

use std::time::Duration;

/// Collects runtime metrics for the tree indexes.
#[derive(Debug)]
pub struct MetricsCollector {
    build_latencies_us: Vec<f64>,
    query_latencies_us: Vec<f64>,
    total_adds: u64,
    total_deletes: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            build_latencies_us: Vec::new(),
            query_latencies_us: Vec::new(),
            total_adds: 0,
            total_deletes: 0,
        }
    }

    /// Record a tree build with its duration.
    pub fn record_build(&mut self, duration: Duration) {
        self.build_latencies_us.push(duration.as_micros() as f64);
    }

    /// Record a query with its duration.
    pub fn record_query(&mut self, duration: Duration) {
        self.query_latencies_us.push(duration.as_micros() as f64);
    }

    pub fn record_add(&mut self) {
        self.total_adds += 1;
    }

    pub fn record_delete(&mut self) {
        self.total_deletes += 1;
    }

    pub fn total_builds(&self) -> u64 {
        self.build_latencies_us.len() as u64
    }

    pub fn total_queries(&self) -> u64 {
        self.query_latencies_us.len() as u64
    }

    pub fn total_adds(&self) -> u64 {
        self.total_adds
    }

    pub fn total_deletes(&self) -> u64 {
        self.total_deletes
    }

    /// Average query latency in microseconds.
    pub fn avg_query_latency_us(&self) -> f64 {
        mean(&self.query_latencies_us)
    }

    /// Average build latency in microseconds.
    pub fn avg_build_latency_us(&self) -> f64 {
        mean(&self.build_latencies_us)
    }

    /// Get a percentile of query latency (e.g., 50.0, 95.0, 99.0).
    pub fn percentile_query_latency_us(&self, percentile: f64) -> f64 {
        if self.query_latencies_us.is_empty() {
            return 0.0;
        }

        let mut sorted = self.query_latencies_us.clone();
        sorted.sort_by(f64::total_cmp);

        let index = ((percentile / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[index.min(sorted.len() - 1)]
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
