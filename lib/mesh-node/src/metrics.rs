//! Prometheus metrics for inbound requests and outbound calls

use anyhow::Result;
use hyper::StatusCode;
use mesh_core::CallResult;
use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Prometheus metrics collector for a service node
#[derive(Clone)]
pub struct MetricsCollector {
    /// Inbound HTTP requests by route and response status
    pub http_requests_total: CounterVec,
    /// Outbound calls by outcome
    pub upstream_calls_total: CounterVec,
    pub registry: Arc<Registry>,
}

impl MetricsCollector {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let http_requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests"),
            &["route", "status"],
        )?;

        let upstream_calls_total = CounterVec::new(
            Opts::new("upstream_calls_total", "Total outbound service calls by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(upstream_calls_total.clone()))?;

        Ok(Self {
            http_requests_total,
            upstream_calls_total,
            registry,
        })
    }

    pub fn record_request(&self, route: &str, status: StatusCode) {
        self.http_requests_total
            .with_label_values(&[route, status.as_str()])
            .inc();
    }

    pub fn record_call(&self, result: &CallResult) {
        self.upstream_calls_total
            .with_label_values(&[result.outcome()])
            .inc();
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_collector_gathers() {
        let collector = MetricsCollector::new().expect("Failed to create collector");
        assert!(collector.gather().is_ok());
    }

    #[test]
    fn test_request_counter() {
        let collector = MetricsCollector::new().expect("Failed to create collector");
        collector.record_request("health", StatusCode::OK);
        collector.record_request("health", StatusCode::OK);

        assert_eq!(
            collector
                .http_requests_total
                .with_label_values(&["health", "200"])
                .get(),
            2.0
        );
        let text = collector.gather().expect("Failed to gather metrics");
        assert!(text.contains("# TYPE http_requests_total counter"));
    }

    #[test]
    fn test_call_outcomes() {
        let collector = MetricsCollector::new().expect("Failed to create collector");
        collector.record_call(&CallResult::NotFound);
        collector.record_call(&CallResult::UpstreamError("boom".to_string()));
        collector.record_call(&CallResult::Success("ok".to_string()));

        for outcome in ["success", "not_found", "upstream_error"] {
            assert_eq!(
                collector.upstream_calls_total.with_label_values(&[outcome]).get(),
                1.0
            );
        }
    }

    #[test]
    fn test_clones_share_registry() {
        let collector = MetricsCollector::new().expect("Failed to create collector");
        let clone = collector.clone();
        clone.record_call(&CallResult::NotFound);

        let text = collector.gather().expect("Failed to gather metrics");
        assert!(text.contains("upstream_calls_total{outcome=\"not_found\"} 1"));
    }
}
