use super::{Next, Route, RouteDescription, RouteError, RouteFuture, Scope};
use crate::middleware::Middleware;
use crate::server::{RequestContext, ResponseContext};
use http::Method;

/// A middleware wrapped around a nested node.
pub struct Layer<M, R> {
    middleware: M,
    nested: R,
}

impl<M: Middleware, R: Route> Layer<M, R> {
    pub fn new(middleware: M, nested: R) -> Self {
        Self { middleware, nested }
    }

    #[must_use]
    pub fn middleware(&self) -> &M {
        &self.middleware
    }
}

impl<M: Middleware, R: Route> Route for Layer<M, R> {
    fn matches(&self, method: &Method, path: &str) -> bool {
        self.nested.matches(method, path)
    }

    fn invoke<'a>(&'a self, req: RequestContext, resp: ResponseContext) -> RouteFuture<'a> {
        self.middleware.call(req, resp, Next::new(&self.nested))
    }

    fn answers_unmatched(&self) -> bool {
        self.middleware.answers_unmatched() || self.nested.answers_unmatched()
    }

    fn check(&self, scope: &Scope) -> Result<(), RouteError> {
        let inner = self.middleware.scope(scope)?;
        self.nested.check(&inner)
    }

    fn describe(&self, prefix: &str, out: &mut Vec<RouteDescription>) {
        self.nested.describe(prefix, out);
    }
}
