use super::Middleware;
use crate::route::{Next, RouteFuture};
use crate::server::{RequestContext, ResponseContext};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Logs how long the wrapped node took, in microseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Profile;

impl Middleware for Profile {
    fn call<'a>(
        &'a self,
        req: RequestContext,
        resp: ResponseContext,
        next: Next<'a>,
    ) -> RouteFuture<'a> {
        Box::pin(async move {
            let head = Arc::clone(req.head());
            let start = Instant::now();
            let result = next.run(req, resp).await;
            let elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
            info!(
                method = %head.method(),
                path = %head.path(),
                elapsed_us,
                handled = ?result.as_ref().ok(),
                "Request timed"
            );
            result
        })
    }
}
