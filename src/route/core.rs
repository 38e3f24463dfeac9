use super::RouteError;
use crate::fixed_str::FieldName;
use crate::pattern::PathPattern;
use crate::record::{algebra, Schema};
use crate::server::{RequestContext, ResponseContext};
use futures::future::{self, BoxFuture};
use http::Method;
use std::fmt;

/// Future returned by [`Route::invoke`]. `Ok(true)` means the request was
/// handled.
pub type RouteFuture<'a> = BoxFuture<'a, Result<bool, RouteError>>;

/// A node of the route tree.
///
/// `matches` is a pure predicate over the method and the unconsumed path.
/// `check` and `describe` run once, when the router is built.
pub trait Route: Send + Sync + 'static {
    fn matches(&self, method: &Method, path: &str) -> bool;

    /// Run the node for a request.
    ///
    /// Callers must first get `true` from [`matches`](Route::matches) (or
    /// [`answers_unmatched`](Route::answers_unmatched)) for the same method
    /// and remaining path. A binder or group invoked without a match fails
    /// with [`RouteError::Unmatched`].
    fn invoke<'a>(&'a self, req: RequestContext, resp: ResponseContext) -> RouteFuture<'a>;

    /// Whether `invoke` answers requests this node does not match.
    ///
    /// Only consulted by the dispatcher for the root; it never widens
    /// `matches`, so group selection is unaffected.
    fn answers_unmatched(&self) -> bool {
        false
    }

    /// Verify this node's requirements against what the nodes above it
    /// provide.
    ///
    /// # Errors
    ///
    /// The first unmet requirement found.
    fn check(&self, scope: &Scope) -> Result<(), RouteError>;

    /// Append one entry per endpoint reachable from this node.
    fn describe(&self, prefix: &str, out: &mut Vec<RouteDescription>);
}

/// Handle on the node a middleware wraps.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    route: &'a dyn Route,
}

impl<'a> Next<'a> {
    #[must_use]
    pub fn new(route: &'a dyn Route) -> Self {
        Self { route }
    }

    #[must_use]
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.route.matches(method, path)
    }

    /// Invoke the wrapped node.
    pub fn run(self, req: RequestContext, resp: ResponseContext) -> RouteFuture<'a> {
        self.route.invoke(req, resp)
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Next")
    }
}

/// What the nodes above a given node provide: path prefix, bound params,
/// the body shape and attached mixins.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    prefix: String,
    params: Schema,
    body: Option<Schema>,
    mixins: Vec<(FieldName, Schema)>,
}

impl Scope {
    /// Scope at the root of a tree: nothing bound.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Path prefix consumed so far, as pattern source text.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn params(&self) -> &Schema {
        &self.params
    }

    #[must_use]
    pub fn body(&self) -> Option<&Schema> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn mixin(&self, name: &str) -> Option<&Schema> {
        self.mixins
            .binary_search_by(|(k, _)| k.as_str().cmp(name))
            .ok()
            .map(|i| &self.mixins[i].1)
    }

    pub fn mixin_names(&self) -> impl Iterator<Item = &FieldName> + '_ {
        self.mixins.iter().map(|(k, _)| k)
    }

    /// Scope below a binder with `pattern`.
    #[must_use]
    pub fn nest(&self, pattern: &PathPattern) -> Self {
        let mut inner = self.clone();
        inner.prefix.push_str(pattern.source());
        inner.params = self.params.union(pattern.schema());
        inner
    }

    /// Scope below a body parser producing `schema`.
    #[must_use]
    pub fn with_body(&self, schema: Schema) -> Self {
        let mut inner = self.clone();
        inner.body = Some(schema);
        inner
    }

    /// Scope below a middleware attaching mixin `name`.
    #[must_use]
    pub fn with_mixin(&self, name: impl Into<FieldName>, schema: Schema) -> Self {
        let single = [(name.into(), schema)];
        let mut inner = self.clone();
        inner.mixins = algebra::union(&self.mixins, &single);
        inner
    }
}

/// One endpoint of a route tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescription {
    pub method: Method,
    /// Full pattern from the root, e.g. `/user/:userId/name`.
    pub path: String,
    /// Params the endpoint declares.
    pub params: Vec<FieldName>,
}

impl fmt::Display for RouteDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{:<7} {path}", self.method.as_str())
    }
}

/// Type-erased route node.
pub struct AnyRoute(Box<dyn Route>);

impl AnyRoute {
    #[must_use]
    pub fn new(route: impl Route) -> Self {
        Self(Box::new(route))
    }
}

impl fmt::Debug for AnyRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AnyRoute")
    }
}

impl Route for AnyRoute {
    fn matches(&self, method: &Method, path: &str) -> bool {
        self.0.matches(method, path)
    }

    fn invoke<'a>(&'a self, req: RequestContext, resp: ResponseContext) -> RouteFuture<'a> {
        self.0.invoke(req, resp)
    }

    fn answers_unmatched(&self) -> bool {
        self.0.answers_unmatched()
    }

    fn check(&self, scope: &Scope) -> Result<(), RouteError> {
        self.0.check(scope)
    }

    fn describe(&self, prefix: &str, out: &mut Vec<RouteDescription>) {
        self.0.describe(prefix, out);
    }
}

/// Node that matches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRoute;

impl Route for NullRoute {
    fn matches(&self, _method: &Method, _path: &str) -> bool {
        false
    }

    fn invoke<'a>(&'a self, _req: RequestContext, _resp: ResponseContext) -> RouteFuture<'a> {
        Box::pin(future::ready(Ok(false)))
    }

    fn check(&self, _scope: &Scope) -> Result<(), RouteError> {
        Ok(())
    }

    fn describe(&self, _prefix: &str, _out: &mut Vec<RouteDescription>) {}
}
