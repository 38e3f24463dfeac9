use super::Middleware;
use crate::record::{ConversionPolicy, Schema};
use crate::route::{Next, RouteError, RouteFuture, Scope};
use crate::server::{parse_cookies, RequestContext, ResponseContext, COOKIES_MIXIN};

/// Attaches the request cookies as the `cookies` mixin.
///
/// With a schema, cookies are converted leniently: declared cookies that are
/// absent become empty strings and undeclared ones move to the request
/// extensions. [`CookieParser::all`] keeps every cookie as-is.
#[derive(Debug, Clone, Default)]
pub struct CookieParser {
    schema: Option<Schema>,
}

impl CookieParser {
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Some(schema),
        }
    }

    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }
}

impl Middleware for CookieParser {
    fn call<'a>(
        &'a self,
        req: RequestContext,
        resp: ResponseContext,
        next: Next<'a>,
    ) -> RouteFuture<'a> {
        let cookies = parse_cookies(req.headers());
        let req = match &self.schema {
            None => req.with_mixin(COOKIES_MIXIN, cookies),
            Some(schema) => match cookies.convert(schema, ConversionPolicy::Lenient) {
                Ok(conversion) => req
                    .with_mixin(COOKIES_MIXIN, conversion.record)
                    .with_extensions(conversion.extras),
                Err(e) => return Box::pin(futures::future::ready(Err(e.into()))),
            },
        };
        next.run(req, resp)
    }

    fn scope(&self, outer: &Scope) -> Result<Scope, RouteError> {
        let schema = self.schema.clone().unwrap_or_default();
        Ok(outer.with_mixin(COOKIES_MIXIN, schema))
    }
}
