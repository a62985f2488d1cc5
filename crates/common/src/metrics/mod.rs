//! Prometheus metrics
//!
//! Metric names share the `campusrate_` prefix. Recording goes through the
//! `metrics` facade, so calls are no-ops until an exporter is installed.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all CampusRate metrics
pub const METRICS_PREFIX: &str = "campusrate";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.00,
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_reviews_submitted_total", METRICS_PREFIX),
        Unit::Count,
        "Reviews persisted, by reviewable type"
    );

    describe_histogram!(
        format!("{}_aggregate_recompute_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Time to re-read reviews and overwrite aggregate columns"
    );

    describe_counter!(
        format!("{}_votes_total", METRICS_PREFIX),
        Unit::Count,
        "Vote submissions, by votable type and resulting action"
    );

    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of search queries"
    );

    describe_histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Search dispatch latency in seconds"
    );

    describe_histogram!(
        format!("{}_search_results", METRICS_PREFIX),
        Unit::Count,
        "Rows returned per search across all kinds"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

pub fn record_review_submitted(reviewable_type: &str) {
    counter!(
        format!("{}_reviews_submitted_total", METRICS_PREFIX),
        "type" => reviewable_type.to_string()
    )
    .increment(1);
}

pub fn record_aggregate_recompute(reviewable_type: &str, duration_secs: f64) {
    histogram!(
        format!("{}_aggregate_recompute_seconds", METRICS_PREFIX),
        "type" => reviewable_type.to_string()
    )
    .record(duration_secs);
}

pub fn record_vote(votable_type: &str, action: &str) {
    counter!(
        format!("{}_votes_total", METRICS_PREFIX),
        "type" => votable_type.to_string(),
        "action" => action.to_string()
    )
    .increment(1);
}

/// Helper to record search metrics
pub fn record_search(duration_secs: f64, scope: &str, result_count: usize) {
    counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        "scope" => scope.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        "scope" => scope.to_string()
    )
    .record(duration_secs);

    histogram!(
        format!("{}_search_results", METRICS_PREFIX),
        "scope" => scope.to_string()
    )
    .record(result_count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets_sorted() {
        assert!(LATENCY_BUCKETS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_recorders_without_exporter() {
        let metrics = RequestMetrics::start("POST", "/functions/v1/votes");
        metrics.finish(200);
        record_review_submitted("course");
        record_aggregate_recompute("course", 0.01);
        record_vote("review", "created");
        record_search(0.02, "all", 3);
    }
}
