use crate::ids::RequestId;
use crate::route::{Route, RouteDescription, RouteError, Scope};
use crate::runtime_config::RuntimeConfig;
use crate::server::{DecodedRequest, RequestContext, RequestHead, ResponseContext, ResponseSink};
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Body of the 400 sent for a target that is empty, relative or contains `..`.
pub const ILLEGAL_TARGET_BODY: &str = "Illegal request-target";
/// Body of the 413 sent for a body above the configured limit.
pub const PAYLOAD_TOO_LARGE_BODY: &str = "Payload too large";

/// Result of dispatching one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    /// Whether the tree reported the request as handled.
    pub handled: bool,
    /// Status of the response sent, if one was sent.
    pub status: Option<u16>,
    pub request_id: RequestId,
}

/// A checked route tree ready to serve requests.
///
/// Cheap to clone; clones share the tree.
#[derive(Clone)]
pub struct Router {
    root: Arc<dyn Route>,
    config: Arc<RuntimeConfig>,
    routes: Arc<[RouteDescription]>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Check `root` and build a router with the default configuration.
    ///
    /// # Errors
    ///
    /// The first construction error found in the tree: an invalid pattern,
    /// or an endpoint whose params, body or mixins are not provided above it.
    pub fn build(root: impl Route) -> Result<Self, RouteError> {
        Self::with_config(root, RuntimeConfig::default())
    }

    /// Check `root` and build a router with `config`.
    ///
    /// # Errors
    ///
    /// See [`Router::build`].
    pub fn with_config(root: impl Route, config: RuntimeConfig) -> Result<Self, RouteError> {
        if let Err(e) = root.check(&Scope::root()) {
            error!(error = %e, "Route tree rejected");
            return Err(e);
        }
        let mut routes = Vec::new();
        root.describe("", &mut routes);
        info!(routes = routes.len(), "Router built");
        Ok(Self {
            root: Arc::new(root),
            config: Arc::new(config),
            routes: routes.into(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Every endpoint of the tree, in precedence order.
    #[must_use]
    pub fn routes(&self) -> &[RouteDescription] {
        &self.routes
    }

    /// Log the route table at info level.
    pub fn dump_routes(&self) {
        info!(count = self.routes.len(), "[routes]");
        for route in self.routes.iter() {
            info!(route = %route, params = ?route.params, "[route]");
        }
    }

    /// Run one request through the tree.
    ///
    /// At most one response is written to `sink`. Failures escaping the tree
    /// are logged and answered with a 500 when nothing was sent yet; this
    /// function never panics on their account.
    pub async fn dispatch(
        &self,
        request: DecodedRequest,
        sink: Arc<dyn ResponseSink>,
    ) -> DispatchOutcome {
        let request_id = RequestId::from_headers(&request.headers, &self.config.request_id_header);
        let resp = ResponseContext::new(sink)
            .with_header(&self.config.request_id_header, request_id.to_string());

        if !is_valid_target(&request.target) {
            warn!(
                method = %request.method,
                target = %request.target,
                request_id = %request_id,
                "Illegal request-target"
            );
            return reject(resp, 400, ILLEGAL_TARGET_BODY, request_id).await;
        }

        if request.body.len() > self.config.max_body_bytes {
            warn!(
                method = %request.method,
                target = %request.target,
                body_size = request.body.len(),
                limit = self.config.max_body_bytes,
                request_id = %request_id,
                "Request body too large"
            );
            return reject(resp, 413, PAYLOAD_TOO_LARGE_BODY, request_id).await;
        }

        let req = RequestContext::new(request, request_id)
            .with_conversion_policy(self.config.conversion_policy);
        let head = Arc::clone(req.head());

        let routed = self.root.matches(head.method(), req.remaining());
        if !routed && !self.root.answers_unmatched() {
            debug!(
                method = %head.method(),
                path = %head.path(),
                request_id = %request_id,
                "No route matched"
            );
            return DispatchOutcome {
                handled: false,
                status: None,
                request_id,
            };
        }

        let snapshot = resp.clone();
        let invoked = async { self.root.invoke(req, resp).await };
        let handled = match AssertUnwindSafe(invoked).catch_unwind().await {
            Ok(Ok(handled)) => handled,
            Ok(Err(e)) => {
                contain(&head, snapshot.clone(), e).await;
                false
            }
            Err(panic) => {
                contain(&head, snapshot.clone(), RouteError::from_panic(panic)).await;
                false
            }
        };

        let status = snapshot.committed_status();
        if handled {
            info!(
                status = ?status,
                method = %head.method(),
                path = %head.path(),
                request_id = %request_id,
                "Request handled"
            );
        } else {
            debug!(
                status = ?status,
                method = %head.method(),
                path = %head.path(),
                request_id = %request_id,
                "Request not handled"
            );
        }

        DispatchOutcome {
            handled,
            status,
            request_id,
        }
    }

    /// Dispatch the requests of one connection strictly in order.
    pub async fn serve_sequential<I>(
        &self,
        requests: I,
        sink: Arc<dyn ResponseSink>,
    ) -> Vec<DispatchOutcome>
    where
        I: IntoIterator<Item = DecodedRequest>,
    {
        let mut outcomes = Vec::new();
        for request in requests {
            outcomes.push(self.dispatch(request, Arc::clone(&sink)).await);
        }
        outcomes
    }
}

/// A request target must be non-empty, absolute and free of `..`.
#[must_use]
pub fn is_valid_target(target: &str) -> bool {
    target.starts_with('/') && !target.contains("..")
}

async fn reject(
    resp: ResponseContext,
    status: u16,
    body: &'static str,
    request_id: RequestId,
) -> DispatchOutcome {
    let sent = match resp.with_status(status).text(body).await {
        Ok(()) => Some(status),
        Err(e) => {
            error!(status, error = %e, request_id = %request_id, "Failed to send rejection");
            None
        }
    };
    DispatchOutcome {
        handled: true,
        status: sent,
        request_id,
    }
}

async fn contain(head: &RequestHead, snapshot: ResponseContext, failure: RouteError) {
    error!(
        method = %head.method(),
        path = %head.path(),
        request_id = %head.request_id(),
        error = %failure,
        "Unhandled failure escaped the route tree"
    );
    if snapshot.is_committed() {
        return;
    }
    if let Err(e) = snapshot
        .with_status(500)
        .send(crate::middleware::SERVER_FAULT_BODY)
        .await
    {
        error!(path = %head.path(), error = %e, "Failed to send 500 response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_target() {
        assert!(is_valid_target("/"));
        assert!(is_valid_target("/user/42?x=1"));
        assert!(!is_valid_target(""));
        assert!(!is_valid_target("user/42"));
        assert!(!is_valid_target("/../etc/passwd"));
        assert!(!is_valid_target("/a/..b"));
    }
}
