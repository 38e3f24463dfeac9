use crate::route::{Next, RouteError, RouteFuture, Scope};
use crate::server::{RequestContext, ResponseContext};

/// Policy wrapped around a nested route node.
///
/// `call` decides whether and how to run the nested node: it may answer on
/// its own, extend the request context before calling `next`, or observe the
/// result. `scope` tells the router what the middleware adds for the nodes
/// below it (a body shape, a mixin); the default adds nothing.
///
/// A wrapped node matches exactly when its nested node does.
pub trait Middleware: Send + Sync + 'static {
    fn call<'a>(
        &'a self,
        req: RequestContext,
        resp: ResponseContext,
        next: Next<'a>,
    ) -> RouteFuture<'a>;

    /// Scope seen by the wrapped node.
    ///
    /// # Errors
    ///
    /// A requirement of this middleware the outer scope does not meet.
    fn scope(&self, outer: &Scope) -> Result<Scope, RouteError> {
        Ok(outer.clone())
    }

    /// Whether `call` produces a response for requests the nested node does
    /// not match. Surfaces as
    /// [`Route::answers_unmatched`](crate::route::Route::answers_unmatched)
    /// on the layer.
    fn answers_unmatched(&self) -> bool {
        false
    }
}

/// Closure adapter for one-off middleware.
///
/// ```rust
/// use routeloom::middleware::FnMiddleware;
///
/// let tag = FnMiddleware::new(|req, resp, next| next.run(req, resp.with_header("x-served-by", "routeloom")));
/// # let _ = tag;
/// ```
pub struct FnMiddleware<F> {
    f: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(RequestContext, ResponseContext, Next<'a>) -> RouteFuture<'a>
        + Send
        + Sync
        + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(RequestContext, ResponseContext, Next<'a>) -> RouteFuture<'a>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        req: RequestContext,
        resp: ResponseContext,
        next: Next<'a>,
    ) -> RouteFuture<'a> {
        (self.f)(req, resp, next)
    }
}

impl<M: Middleware> Middleware for std::sync::Arc<M> {
    fn call<'a>(
        &'a self,
        req: RequestContext,
        resp: ResponseContext,
        next: Next<'a>,
    ) -> RouteFuture<'a> {
        (**self).call(req, resp, next)
    }

    fn scope(&self, outer: &Scope) -> Result<Scope, RouteError> {
        (**self).scope(outer)
    }

    fn answers_unmatched(&self) -> bool {
        (**self).answers_unmatched()
    }
}
