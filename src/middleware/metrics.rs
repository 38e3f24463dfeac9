use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::Middleware;
use crate::route::{Next, RouteFuture};
use crate::server::{RequestContext, ResponseContext};

/// Middleware for collecting Prometheus-compatible metrics
///
/// Counts requests reaching the wrapped node and how they ended, and sums
/// their latency. All counters use atomic operations, so one instance can be
/// shared behind an `Arc` and read while requests are in flight.
///
/// Metrics collected:
/// - Total request count
/// - Average latency
/// - Handled / not handled / failed request counts
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    handled: AtomicUsize,
    unhandled: AtomicUsize,
    errors: AtomicUsize,
}

impl Default for MetricsMiddleware {
    fn default() -> Self {
        Self {
            request_count: AtomicUsize::new(0),
            total_latency_ns: AtomicU64::new(0),
            handled: AtomicUsize::new(0),
            unhandled: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        }
    }
}

impl MetricsMiddleware {
    /// Create a new metrics middleware with all counters initialized to zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Calculate the average request latency
    ///
    /// Returns zero duration if no requests have been processed yet.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Requests the wrapped node reported as handled.
    pub fn handled_count(&self) -> usize {
        self.handled.load(Ordering::Relaxed)
    }

    /// Requests the wrapped node reported as not handled.
    pub fn unhandled_count(&self) -> usize {
        self.unhandled.load(Ordering::Relaxed)
    }

    /// Requests the wrapped node failed with an error.
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Render the counters in the Prometheus text exposition format.
    pub fn render_prometheus(&self) -> String {
        format!(
            "# HELP routeloom_requests_total Total number of dispatched requests\n\
             # TYPE routeloom_requests_total counter\n\
             routeloom_requests_total {}\n\
             # HELP routeloom_requests_outcome_total Requests by outcome\n\
             # TYPE routeloom_requests_outcome_total counter\n\
             routeloom_requests_outcome_total{{outcome=\"handled\"}} {}\n\
             routeloom_requests_outcome_total{{outcome=\"unhandled\"}} {}\n\
             routeloom_requests_outcome_total{{outcome=\"error\"}} {}\n\
             # HELP routeloom_request_latency_seconds Average request latency in seconds\n\
             # TYPE routeloom_request_latency_seconds gauge\n\
             routeloom_request_latency_seconds {}\n",
            self.request_count(),
            self.handled_count(),
            self.unhandled_count(),
            self.error_count(),
            self.average_latency().as_secs_f64(),
        )
    }

    fn record(&self, latency: Duration, outcome: Option<bool>) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns.fetch_add(
            u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
        let counter = match outcome {
            Some(true) => &self.handled,
            Some(false) => &self.unhandled,
            None => &self.errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Passive: never answers on its own, only observes the wrapped node.
impl Middleware for MetricsMiddleware {
    fn call<'a>(
        &'a self,
        req: RequestContext,
        resp: ResponseContext,
        next: Next<'a>,
    ) -> RouteFuture<'a> {
        Box::pin(async move {
            let start = Instant::now();
            let result = next.run(req, resp).await;
            self.record(start.elapsed(), result.as_ref().ok().copied());
            result
        })
    }
}
