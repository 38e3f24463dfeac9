use super::Middleware;
use crate::route::{Next, RouteFuture};
use crate::server::{RequestContext, ResponseContext};
use tracing::warn;

/// Answers 404 when the wrapped node does not match; otherwise runs it.
///
/// The layer matches only what the wrapped node matches, but it reports
/// [`answers_unmatched`](crate::route::Route::answers_unmatched), so the
/// router invokes a root carrying it for every request and unrouted
/// requests become 404s. Inside a group it never shadows later members.
/// A 404 counts as handled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFound;

impl Middleware for NotFound {
    fn call<'a>(
        &'a self,
        req: RequestContext,
        resp: ResponseContext,
        next: Next<'a>,
    ) -> RouteFuture<'a> {
        if next.matches(req.method(), req.remaining()) {
            return next.run(req, resp);
        }
        Box::pin(async move {
            let path = req.path().to_string();
            warn!(
                method = %req.method(),
                path = %path,
                request_id = %req.request_id(),
                "No route matched"
            );
            resp.with_status(404)
                .send(format!("Not found: {path}"))
                .await?;
            Ok(true)
        })
    }

    fn answers_unmatched(&self) -> bool {
        true
    }
}
