//! Reference application tree used by the `routeloom` binary and the
//! integration tests.
//!
//! ```text
//! GET  /hello                  plain greeting
//! GET  /hello/:name            greeting with a path param
//! GET  /greet                  greeting from the `name` cookie
//! GET  /user/:userId/name      user name
//! POST /user/:userId/age       JSON body {"age": integer}
//! GET  /static/*file           echoes the requested file path
//! GET  /boom                   always fails (500 through ServerFault)
//! GET  /metrics                Prometheus counters
//! ```

use crate::group;
use crate::middleware::{
    CookieParser, JsonBody, MetricsMiddleware, NotFound, Profile, ServerFault, TracingMiddleware,
};
use crate::record::{FieldKind, RecordError, Schema};
use crate::route::{bind, get, get_at, post, wrap, Route, RouteExt};
use crate::runtime_config::RuntimeConfig;
use crate::server::{RequestContext, ResponseContext, ResponseError};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Typed view of `/user/:userId` params.
#[derive(Debug, Deserialize)]
struct UserParams {
    #[serde(rename = "userId")]
    user_id: String,
}

/// Typed view of the `/age` body.
#[derive(Debug, Deserialize)]
struct AgeBody {
    age: i64,
}

async fn hello(_req: RequestContext, resp: ResponseContext) -> Result<(), ResponseError> {
    resp.send("Hello from routeloom!").await
}

async fn hello_name(req: RequestContext, resp: ResponseContext) -> Result<(), ResponseError> {
    let name = req.params().get_str("name").unwrap_or_default().to_string();
    resp.send(format!("Hello from routeloom, {name}")).await
}

async fn greet(req: RequestContext, resp: ResponseContext) -> Result<(), ResponseError> {
    let name = req
        .cookies()
        .and_then(|c| c.get_str("name"))
        .unwrap_or_default()
        .to_string();
    resp.send(format!("Hello from routeloom, {name}")).await
}

async fn user_name(req: RequestContext, resp: ResponseContext) -> anyhow::Result<()> {
    let params: UserParams = req.params_as()?;
    resp.send(format!("hello {}", params.user_id)).await?;
    Ok(())
}

async fn user_age(req: RequestContext, resp: ResponseContext) -> anyhow::Result<()> {
    let params: UserParams = req.params_as()?;
    let body: AgeBody = req.body_as()?;
    resp.json(&json!({ "userId": params.user_id, "age": body.age }))
        .await?;
    Ok(())
}

async fn static_file(req: RequestContext, resp: ResponseContext) -> Result<(), ResponseError> {
    let file = req.params().get_str("file").unwrap_or_default().to_string();
    resp.text(file).await
}

async fn boom(req: RequestContext, _resp: ResponseContext) -> anyhow::Result<()> {
    anyhow::bail!("demo failure: {} always fails", req.path())
}

/// The user subtree: `/user/:userId` with `/name` and `/age` below it.
///
/// # Errors
///
/// Only if a built-in schema is malformed.
pub fn user_router(config: &RuntimeConfig) -> Result<impl Route, RecordError> {
    let user_id = Schema::strings(["userId"])?;
    let age = Schema::new([("age", FieldKind::Integer)])?;

    Ok(bind(
        "/user/:userId",
        group![
            get(user_name)
                .requires_params(user_id.clone())
                .at("/name"),
            wrap(
                JsonBody::from_config(age.clone(), config),
                post(user_age)
                    .requires_params(user_id)
                    .requires_body(age)
                    .at("/age"),
            ),
        ],
    ))
}

/// The full demo application with the standard middleware stack.
///
/// Outermost first: metrics, tracing, profiling, failure boundary, 404.
///
/// # Errors
///
/// Only if a built-in schema is malformed.
pub fn app(
    config: &RuntimeConfig,
    metrics: Arc<MetricsMiddleware>,
) -> Result<impl Route, RecordError> {
    let cookie_schema = Schema::strings(["name"])?;
    let scrape = Arc::clone(&metrics);

    let routes = group![
        get_at("/hello", hello),
        get_at("/hello/:name", hello_name),
        wrap(
            CookieParser::new(cookie_schema.clone()),
            get(greet)
                .requires_mixin("cookies", cookie_schema)
                .at("/greet"),
        ),
        user_router(config)?,
        get_at("/static/*file", static_file),
        get_at("/boom", boom),
        get_at("/metrics", move |_req, resp: ResponseContext| {
            let body = scrape.render_prometheus();
            async move {
                resp.with_header("content-type", "text/plain; version=0.0.4")
                    .send(body)
                    .await
            }
        }),
    ];

    Ok(routes
        .wrap(NotFound)
        .wrap(ServerFault)
        .wrap(Profile)
        .wrap(TracingMiddleware)
        .wrap(metrics))
}
