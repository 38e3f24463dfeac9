use super::{Route, RouteDescription, RouteError, RouteFuture, Scope};
use crate::fixed_str::FieldName;
use crate::record::{algebra, ConversionPolicy, Schema};
use crate::server::{RequestContext, ResponseContext};
use futures::future::{self, BoxFuture};
use http::Method;
use std::future::Future;
use tracing::debug;

/// Values a handler future may resolve to.
pub trait HandlerOutcome: Send + 'static {
    /// # Errors
    ///
    /// The handler's own failure.
    fn into_result(self) -> anyhow::Result<()>;
}

impl HandlerOutcome for () {
    fn into_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E> HandlerOutcome for Result<(), E>
where
    E: Into<anyhow::Error> + Send + 'static,
{
    fn into_result(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

/// Request handler at the leaf of a route tree.
///
/// Implemented for every `Fn(RequestContext, ResponseContext) -> impl Future`
/// whose output is a [`HandlerOutcome`].
pub trait Handler: Send + Sync + 'static {
    fn call(
        &self,
        req: RequestContext,
        resp: ResponseContext,
    ) -> BoxFuture<'static, anyhow::Result<()>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(RequestContext, ResponseContext) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: HandlerOutcome,
{
    fn call(
        &self,
        req: RequestContext,
        resp: ResponseContext,
    ) -> BoxFuture<'static, anyhow::Result<()>> {
        let fut = (self)(req, resp);
        Box::pin(async move { fut.await.into_result() })
    }
}

/// Leaf node: matches one method once the path is fully consumed.
pub struct Endpoint<H> {
    method: Method,
    handler: H,
    params: Schema,
    body: Option<Schema>,
    mixins: Vec<(FieldName, Schema)>,
    /// Falls back to the request's policy when unset.
    policy: Option<ConversionPolicy>,
}

impl<H> Endpoint<H> {
    #[must_use]
    pub fn new(method: Method, handler: H) -> Self {
        Self {
            method,
            handler,
            params: Schema::empty(),
            body: None,
            mixins: Vec::new(),
            policy: None,
        }
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Declare path params this endpoint reads. Binders above it must
    /// capture them, and at invoke time the params are converted to this
    /// shape; captured params outside it move to the request extensions.
    #[must_use]
    pub fn requires_params(mut self, schema: Schema) -> Self {
        self.params = self.params.union(&schema);
        self
    }

    /// Declare the structured body this endpoint reads. A body parser above
    /// it must produce every field with a compatible kind.
    #[must_use]
    pub fn requires_body(mut self, schema: Schema) -> Self {
        self.body = Some(schema);
        self
    }

    /// Declare a mixin this endpoint reads, e.g. `cookies`.
    #[must_use]
    pub fn requires_mixin(mut self, name: impl Into<FieldName>, schema: Schema) -> Self {
        let single = [(name.into(), schema)];
        self.mixins = algebra::union(&self.mixins, &single);
        self
    }

    /// How declared params are converted at invoke time. Defaults to the
    /// router's configured policy.
    #[must_use]
    pub fn conversion_policy(mut self, policy: ConversionPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    fn prepare(&self, req: RequestContext) -> Result<RequestContext, RouteError> {
        if self.params.is_empty() {
            return Ok(req);
        }
        let policy = self.policy.unwrap_or_else(|| req.conversion_policy());
        let conversion = req.params().convert(&self.params, policy)?;
        Ok(req
            .replace_params(conversion.record)
            .with_extensions(conversion.extras))
    }

    fn route_name(&self, scope: &Scope) -> String {
        let path = if scope.prefix().is_empty() { "/" } else { scope.prefix() };
        format!("{} {path}", self.method)
    }
}

impl<H: Handler> Route for Endpoint<H> {
    fn matches(&self, method: &Method, path: &str) -> bool {
        *method == self.method && path.is_empty()
    }

    fn invoke<'a>(&'a self, req: RequestContext, resp: ResponseContext) -> RouteFuture<'a> {
        let req = match self.prepare(req) {
            Ok(req) => req,
            Err(e) => return Box::pin(future::ready(Err(e))),
        };
        let call = self.handler.call(req, resp);
        Box::pin(async move {
            call.await.map_err(RouteError::Handler)?;
            Ok(true)
        })
    }

    fn check(&self, scope: &Scope) -> Result<(), RouteError> {
        let missing = self.params.subtract(scope.params());
        if !missing.is_empty() {
            return Err(RouteError::MissingParams {
                route: self.route_name(scope),
                missing: missing.names().cloned().collect(),
            });
        }

        let mut missing_mixins = Vec::new();
        for (name, wanted) in &self.mixins {
            match scope.mixin(name.as_str()) {
                None => missing_mixins.push(name.clone()),
                Some(provided) => missing_mixins.extend(
                    wanted
                        .subtract(provided)
                        .names()
                        .map(|field| FieldName::from(format!("{name}.{field}"))),
                ),
            }
        }
        if !missing_mixins.is_empty() {
            return Err(RouteError::MissingMixins {
                route: self.route_name(scope),
                missing: missing_mixins,
            });
        }

        if let Some(wanted) = &self.body {
            let Some(provided) = scope.body() else {
                return Err(RouteError::BodyMismatch {
                    route: self.route_name(scope),
                    detail: "no body parser above this endpoint".to_string(),
                });
            };
            let missing = wanted.subtract(provided);
            let conflicts = wanted.kind_conflicts(provided);
            if !missing.is_empty() || !conflicts.is_empty() {
                return Err(RouteError::BodyMismatch {
                    route: self.route_name(scope),
                    detail: format!("expects {wanted}, parser produces {provided}"),
                });
            }
        }

        debug!(route = %self.route_name(scope), params = %self.params, "Endpoint checked");
        Ok(())
    }

    fn describe(&self, prefix: &str, out: &mut Vec<RouteDescription>) {
        out.push(RouteDescription {
            method: self.method.clone(),
            path: prefix.to_string(),
            params: self.params.names().cloned().collect(),
        });
    }
}
