use super::Middleware;
use crate::route::{Next, RouteError, RouteFuture};
use crate::server::{RequestContext, ResponseContext, ResponseError};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, warn};

/// Body of the response sent when the wrapped node fails.
pub const SERVER_FAULT_BODY: &str = "Internal server error!";

/// Failure boundary around the wrapped node.
///
/// Errors and panics from below are logged and answered with a 500 sent
/// through a snapshot of the response taken before the wrapped node ran,
/// unless a response was already sent. A contained failure reports the
/// request as not handled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerFault;

impl Middleware for ServerFault {
    fn call<'a>(
        &'a self,
        req: RequestContext,
        resp: ResponseContext,
        next: Next<'a>,
    ) -> RouteFuture<'a> {
        Box::pin(async move {
            let snapshot = resp.clone();
            let head = Arc::clone(req.head());

            // Building the nested future runs synchronous code too.
            let nested = async move { next.run(req, resp).await };
            let failure = match AssertUnwindSafe(nested).catch_unwind().await {
                Ok(Ok(handled)) => return Ok(handled),
                Ok(Err(e)) => e,
                Err(panic) => RouteError::from_panic(panic),
            };

            error!(
                method = %head.method(),
                path = %head.path(),
                request_id = %head.request_id(),
                error = %failure,
                "Request failed"
            );

            if snapshot.is_committed() {
                warn!(
                    path = %head.path(),
                    status = ?snapshot.committed_status(),
                    "Response already sent before failure"
                );
                return Ok(false);
            }
            match snapshot.with_status(500).send(SERVER_FAULT_BODY).await {
                Ok(()) | Err(ResponseError::AlreadySent) => {}
                Err(e) => error!(path = %head.path(), error = %e, "Failed to send 500 response"),
            }
            Ok(false)
        })
    }
}
