//! # Middleware Module
//!
//! Middleware wraps a route node and decides whether, and with what request
//! context, the node runs. Each middleware is a [`Middleware`] value placed in
//! the tree with [`wrap`](crate::route::wrap) or
//! [`RouteExt::wrap`](crate::route::RouteExt::wrap).
//!
//! ## Available Middleware
//!
//! - [`NotFound`] - answers 404 when nothing below matches
//! - [`ServerFault`] - turns errors and panics below into a single 500
//! - [`JsonBody`] - parses a JSON body into a structured record
//! - [`CookieParser`] - attaches cookies as the `cookies` mixin
//! - [`Profile`] - logs elapsed time in microseconds
//! - [`MetricsMiddleware`] - request counters and latency
//! - [`TracingMiddleware`] - wraps the request in a tracing span
//! - [`FnMiddleware`] - adapts a closure
//!
//! ## Ordering
//!
//! Outer layers run first. A typical stack is
//! `tree.wrap(NotFound).wrap(ServerFault).wrap(Profile)`: timing covers
//! everything, failures in the 404 path are still contained, and a 404 is
//! produced before any handler runs.

mod body;
mod cookies;
mod core;
mod metrics;
mod not_found;
mod profile;
mod server_fault;
mod tracing;

pub use body::JsonBody;
pub use cookies::CookieParser;
pub use core::{FnMiddleware, Middleware};
pub use metrics::MetricsMiddleware;
pub use not_found::NotFound;
pub use profile::Profile;
pub use server_fault::{ServerFault, SERVER_FAULT_BODY};
pub use tracing::TracingMiddleware;
