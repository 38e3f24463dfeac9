use super::Middleware;
use crate::record::{ConversionPolicy, Extensions, Record, Schema};
use crate::route::{Next, RouteError, RouteFuture, Scope};
use crate::runtime_config::RuntimeConfig;
use crate::server::{Body, RequestContext, ResponseContext};
use serde_json::Value;
use tracing::{debug, warn};

/// Parses a JSON object body into a structured record of `schema`.
///
/// Fields are looked up by name. Missing or mistyped fields take their kind's
/// default under [`ConversionPolicy::Lenient`] and answer 400 under
/// [`ConversionPolicy::Strict`]. A body that is not valid JSON, or not an
/// object, always answers 400. An empty body is read as `{}`.
#[derive(Debug, Clone)]
pub struct JsonBody {
    schema: Schema,
    policy: ConversionPolicy,
}

impl JsonBody {
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            policy: ConversionPolicy::Lenient,
        }
    }

    /// Parser following the configured body policy.
    #[must_use]
    pub fn from_config(schema: Schema, config: &RuntimeConfig) -> Self {
        Self::new(schema).policy(config.body_policy)
    }

    #[must_use]
    pub fn strict(schema: Schema) -> Self {
        Self::new(schema).policy(ConversionPolicy::Strict)
    }

    #[must_use]
    pub fn policy(mut self, policy: ConversionPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn parse(&self, raw: &[u8]) -> Result<(Record, Extensions), String> {
        let value: Value = if raw.iter().all(u8::is_ascii_whitespace) {
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_slice(raw).map_err(|e| format!("Invalid JSON body: {e}"))?
        };
        let record = Record::from_json(value).map_err(|e| format!("Invalid JSON body: {e}"))?;
        let conversion = record
            .convert(&self.schema, self.policy)
            .map_err(|e| format!("Invalid request body: {e}"))?;
        if !conversion.missing.is_empty() || !conversion.mistyped.is_empty() {
            debug!(
                missing = ?conversion.missing,
                mistyped = ?conversion.mistyped,
                "Body fields defaulted"
            );
        }
        Ok((conversion.record, conversion.extras))
    }
}

impl Middleware for JsonBody {
    fn call<'a>(
        &'a self,
        req: RequestContext,
        resp: ResponseContext,
        next: Next<'a>,
    ) -> RouteFuture<'a> {
        match self.parse(req.raw_body()) {
            Ok((record, extras)) => {
                let req = req
                    .with_body(Body::Structured(record))
                    .with_extensions(extras);
                next.run(req, resp)
            }
            Err(message) => Box::pin(async move {
                warn!(
                    method = %req.method(),
                    path = %req.path(),
                    request_id = %req.request_id(),
                    error = %message,
                    "Rejected request body"
                );
                resp.with_status(400).text(message).await?;
                Ok(true)
            }),
        }
    }

    fn scope(&self, outer: &Scope) -> Result<Scope, RouteError> {
        Ok(outer.with_body(self.schema.clone()))
    }
}
