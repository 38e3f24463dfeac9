//! # routeloom
//!
//! **routeloom** is an async HTTP request router built from composable route
//! trees. A tree is an ordinary value: endpoints at the leaves, binders that
//! consume path prefixes and capture parameters, groups of alternatives, and
//! middleware layers. Trees are checked once when the router is built, so an
//! endpoint that reads a parameter no binder captures, or a body shape no
//! parser produces, is rejected before the first request.
//!
//! ## Architecture
//!
//! - **[`pattern`]** - path pattern compiler (`/user/:id`, `/static/*file`)
//! - **[`record`]** - name-keyed records and schemas with union,
//!   intersection, difference and conversion
//! - **[`route`]** - the [`Route`](route::Route) trait and the four node kinds
//! - **[`middleware`]** - not-found, server fault, body parsing, cookies,
//!   profiling, metrics and tracing
//! - **[`server`]** - request and response contexts and the
//!   [`ResponseSink`](server::ResponseSink) a transport implements
//! - **[`dispatcher`]** - the [`Router`] entry point
//! - **[`runtime_config`]** - deployment configuration from TOML and env
//! - **[`otel`]** - logging setup
//! - **[`demo`]** - the reference application served by the `routeloom`
//!   binary
//!
//! ### Request Flow
//!
//! ```text
//! DecodedRequest ──► Router::dispatch
//!                      ├─ target check (400)
//!                      ├─ body limit (413)
//!                      ├─ root.matches(method, path)?
//!                      └─ root.invoke(req, resp)
//!                           Layer ─► Middleware::call ─► Next::run
//!                           Binder ─► capture params, consume prefix
//!                           Group  ─► first matching member
//!                           Endpoint ─► handler(req, resp)
//!                                          └─► ResponseSink::send
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use routeloom::group;
//! use routeloom::middleware::{NotFound, ServerFault};
//! use routeloom::route::{bind, get_at, RouteExt};
//! use routeloom::server::{DecodedRequest, MemorySink};
//! use routeloom::Router;
//! use http::Method;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let tree = bind(
//!     "/user/:userId",
//!     group![get_at("/name", |req, resp| async move {
//!         let id = req.params().get_str("userId").unwrap_or_default().to_string();
//!         resp.text(format!("hello {id}")).await
//!     })],
//! )
//! .wrap(NotFound)
//! .wrap(ServerFault);
//!
//! let router = Router::build(tree)?;
//! let sink = MemorySink::new();
//! let outcome = router
//!     .dispatch(DecodedRequest::new(Method::GET, "/user/42/name"), sink.clone())
//!     .await;
//!
//! assert!(outcome.handled);
//! assert_eq!(sink.last().unwrap().body_str(), "hello 42");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Library errors are `thiserror` enums exposed from their modules
//! ([`PatternError`](pattern::PatternError),
//! [`RecordError`](record::RecordError), [`RouteError`](route::RouteError),
//! [`ResponseError`](server::ResponseError)). Handlers return anything that
//! converts into `anyhow::Error`. Errors and panics below a
//! [`ServerFault`](middleware::ServerFault) become a single 500; anything
//! that escapes the tree is contained by the [`Router`].
//!
//! ## Logging
//!
//! Everything logs through `tracing` with structured fields. Install a
//! subscriber with [`otel::init_logging_with_config`] or bring your own.

pub mod cli;
pub mod demo;
pub mod dispatcher;
pub mod fixed_str;
pub mod ids;
pub mod middleware;
pub mod otel;
pub mod pattern;
pub mod record;
pub mod route;
pub mod runtime_config;
pub mod server;

pub use dispatcher::{DispatchOutcome, Router};
pub use fixed_str::FieldName;
pub use ids::RequestId;
pub use record::{ConversionPolicy, FieldKind, Record, Schema};
pub use route::{Route, RouteError, RouteExt};
pub use runtime_config::RuntimeConfig;
