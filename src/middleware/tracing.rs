use tracing::{info_span, Instrument};

use super::Middleware;
use crate::route::{Next, RouteFuture};
use crate::server::{RequestContext, ResponseContext};

/// Runs the wrapped node inside a `request` span carrying method, path and
/// request id.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn call<'a>(
        &'a self,
        req: RequestContext,
        resp: ResponseContext,
        next: Next<'a>,
    ) -> RouteFuture<'a> {
        let span = info_span!(
            "request",
            method = %req.method(),
            path = %req.path(),
            request_id = %req.request_id(),
        );
        Box::pin(next.run(req, resp).instrument(span))
    }
}
