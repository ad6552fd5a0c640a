//! Request counters
//!
//! Counters only, monotonic, reset on process start.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::StatusCode;
use serde::Serialize;

/// Registry of HTTP and statistics counters
///
/// All counters use `Relaxed` atomics; readers only need eventually
/// consistent totals.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    requests_total: AtomicU64,
    responses_2xx: AtomicU64,
    responses_400: AtomicU64,
    responses_404: AtomicU64,
    responses_5xx: AtomicU64,
    count_queries: AtomicU64,
    age_queries: AtomicU64,
    unresolved_codes: AtomicU64,
    store_failures: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished HTTP response
    pub fn record_response(&self, status: StatusCode) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        let counter = match status.as_u16() {
            200..=299 => &self.responses_2xx,
            400 => &self.responses_400,
            404 => &self.responses_404,
            500..=599 => &self.responses_5xx,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment `/v1/stats/count` executions
    pub fn increment_count_queries(&self) {
        self.count_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment `/v1/stats/age` executions
    pub fn increment_age_queries(&self) {
        self.age_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment filter codes that did not resolve
    pub fn increment_unresolved_codes(&self) {
        self.unresolved_codes.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment store failures surfaced as 500
    pub fn increment_store_failures(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            responses_2xx: self.responses_2xx.load(Ordering::Relaxed),
            responses_400: self.responses_400.load(Ordering::Relaxed),
            responses_404: self.responses_404.load(Ordering::Relaxed),
            responses_5xx: self.responses_5xx.load(Ordering::Relaxed),
            count_queries: self.count_queries.load(Ordering::Relaxed),
            age_queries: self.age_queries.load(Ordering::Relaxed),
            unresolved_codes: self.unresolved_codes.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of every counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub responses_2xx: u64,
    pub responses_400: u64,
    pub responses_404: u64,
    pub responses_5xx: u64,
    pub count_queries: u64,
    pub age_queries: u64,
    pub unresolved_codes: u64,
    pub store_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let snapshot = MetricsRegistry::new().snapshot();
        assert_eq!(snapshot.requests_total, 0);
        assert_eq!(snapshot.count_queries, 0);
        assert_eq!(snapshot.store_failures, 0);
    }

    #[test]
    fn test_record_response_buckets() {
        let registry = MetricsRegistry::new();
        registry.record_response(StatusCode::OK);
        registry.record_response(StatusCode::CREATED);
        registry.record_response(StatusCode::BAD_REQUEST);
        registry.record_response(StatusCode::NOT_FOUND);
        registry.record_response(StatusCode::INTERNAL_SERVER_ERROR);
        registry.record_response(StatusCode::REQUEST_TIMEOUT);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.requests_total, 6);
        assert_eq!(snapshot.responses_2xx, 2);
        assert_eq!(snapshot.responses_400, 1);
        assert_eq!(snapshot.responses_404, 1);
        assert_eq!(snapshot.responses_5xx, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let registry = MetricsRegistry::new();
        registry.increment_count_queries();
        registry.increment_unresolved_codes();

        let json = serde_json::to_value(registry.snapshot()).unwrap();
        assert_eq!(json["count_queries"], 1);
        assert_eq!(json["unresolved_codes"], 1);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let reg = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    reg.increment_age_queries();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.snapshot().age_queries, 800);
    }
}
