use super::{Route, RouteDescription, RouteError, RouteFuture, Scope};
use crate::pattern::{PathPattern, PatternError};
use crate::server::{RequestContext, ResponseContext};
use futures::future;
use http::Method;
use tracing::{trace, warn};

/// Node that consumes a path prefix matching its pattern, merges the
/// captures into the request params and hands the rest to its nested node.
pub struct Binder<R> {
    source: String,
    /// A pattern that failed to compile never matches; the error is reported
    /// when the router is built.
    pattern: Result<PathPattern, PatternError>,
    nested: R,
}

impl<R: Route> Binder<R> {
    pub fn new(pattern: &str, nested: R) -> Self {
        let compiled = PathPattern::compile(pattern);
        if let Err(e) = &compiled {
            warn!(pattern = %pattern, error = %e, "Invalid route pattern");
        }
        Self {
            source: pattern.to_string(),
            pattern: compiled,
            nested,
        }
    }

    #[must_use]
    pub fn pattern(&self) -> Option<&PathPattern> {
        self.pattern.as_ref().ok()
    }

    #[must_use]
    pub fn nested(&self) -> &R {
        &self.nested
    }
}

impl<R: Route> Route for Binder<R> {
    fn matches(&self, method: &Method, path: &str) -> bool {
        match &self.pattern {
            Ok(pattern) => pattern
                .prefix_len(path)
                .is_some_and(|len| self.nested.matches(method, &path[len..])),
            Err(_) => false,
        }
    }

    fn invoke<'a>(&'a self, req: RequestContext, resp: ResponseContext) -> RouteFuture<'a> {
        let matched = self
            .pattern
            .as_ref()
            .ok()
            .and_then(|pattern| pattern.match_prefix(req.remaining()));
        let Some(m) = matched else {
            return Box::pin(future::ready(Err(RouteError::Unmatched {
                path: req.remaining().to_string(),
            })));
        };
        trace!(
            pattern = %self.source,
            consumed = m.consumed,
            captures = m.captures.len(),
            "Binder matched"
        );
        let req = req.with_params(&m.captures).consume(m.consumed);
        self.nested.invoke(req, resp)
    }

    fn check(&self, scope: &Scope) -> Result<(), RouteError> {
        let pattern = self
            .pattern
            .as_ref()
            .map_err(|e| RouteError::Pattern(e.clone()))?;
        self.nested.check(&scope.nest(pattern))
    }

    fn describe(&self, prefix: &str, out: &mut Vec<RouteDescription>) {
        self.nested.describe(&format!("{prefix}{}", self.source), out);
    }
}
