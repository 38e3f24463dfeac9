use super::{AnyRoute, Route, RouteDescription, RouteError, RouteFuture, Scope};
use crate::server::{RequestContext, ResponseContext};
use futures::future;
use http::Method;

/// Ordered alternatives. The first member that matches is the only one
/// invoked.
#[derive(Debug, Default)]
pub struct Group {
    routes: Vec<AnyRoute>,
}

impl Group {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a member. Earlier members take precedence.
    #[must_use]
    pub fn route(mut self, route: impl Route) -> Self {
        self.push(route);
        self
    }

    pub fn push(&mut self, route: impl Route) {
        self.routes.push(AnyRoute::new(route));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Route for Group {
    fn matches(&self, method: &Method, path: &str) -> bool {
        self.routes.iter().any(|r| r.matches(method, path))
    }

    fn invoke<'a>(&'a self, req: RequestContext, resp: ResponseContext) -> RouteFuture<'a> {
        match self
            .routes
            .iter()
            .find(|r| r.matches(req.method(), req.remaining()))
        {
            Some(route) => route.invoke(req, resp),
            None => Box::pin(future::ready(Err(RouteError::Unmatched {
                path: req.remaining().to_string(),
            }))),
        }
    }

    fn check(&self, scope: &Scope) -> Result<(), RouteError> {
        self.routes.iter().try_for_each(|r| r.check(scope))
    }

    fn describe(&self, prefix: &str, out: &mut Vec<RouteDescription>) {
        for route in &self.routes {
            route.describe(prefix, out);
        }
    }
}

/// Build a [`Group`] from a list of routes, highest precedence first.
///
/// ```rust
/// use routeloom::group;
/// use routeloom::route::{get_at, post_at};
///
/// let users = group![
///     get_at("/users", |_req, resp| async move {
///         resp.text("list").await
///     }),
///     post_at("/users", |_req, resp| async move {
///         resp.with_status(201).text("created").await
///     }),
/// ];
/// assert_eq!(users.len(), 2);
/// ```
#[macro_export]
macro_rules! group {
    ($($route:expr),* $(,)?) => {
        $crate::route::Group::new()$(.route($route))*
    };
}
