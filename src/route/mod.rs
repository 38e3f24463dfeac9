//! # Route Module
//!
//! A route tree is a value composed from four kinds of node:
//!
//! | Node | Matches when | On invoke |
//! |------|--------------|-----------|
//! | [`Endpoint`] | method equal, path fully consumed | runs the handler |
//! | [`Binder`] | pattern matches a prefix and nested node matches the rest | merges captures into params, consumes the prefix |
//! | [`Group`] | any member matches | invokes the first matching member only |
//! | [`Layer`] | nested node matches, or the middleware answers unmatched requests | runs the middleware around the nested node |
//!
//! Trees are built with the functions in this module and checked once by
//! [`Router::build`](crate::dispatcher::Router::build): each node's
//! [`Route::check`] receives a [`Scope`] describing what the nodes above it
//! provide, so an endpoint that reads a param no binder captures is rejected
//! before the first request.
//!
//! ## Example
//!
//! ```rust
//! use routeloom::group;
//! use routeloom::record::Schema;
//! use routeloom::route::{bind, get, get_at, RouteExt};
//! use routeloom::middleware::NotFound;
//!
//! let user = bind(
//!     "/user/:userId",
//!     group![
//!         get_at("/name", |req, resp| async move {
//!             let id = req.params().get_str("userId").unwrap_or_default().to_string();
//!             resp.text(format!("user {id}")).await
//!         }),
//!         get(|_req, resp| async move { resp.text("profile").await })
//!             .requires_params(Schema::strings(["userId"]).unwrap()),
//!     ],
//! );
//! let tree = user.wrap(NotFound);
//! # let _ = tree;
//! ```

mod binder;
mod core;
mod endpoint;
mod error;
mod group;
mod layer;

pub use binder::Binder;
pub use core::{AnyRoute, Next, NullRoute, Route, RouteDescription, RouteFuture, Scope};
pub use endpoint::{Endpoint, Handler, HandlerOutcome};
pub use error::RouteError;
pub use group::Group;
pub use layer::Layer;

use crate::middleware::Middleware;
use crate::server::{RequestContext, ResponseContext};
use http::Method;
use std::future::Future;

/// Bind `pattern` in front of `nested`.
pub fn bind<R: Route>(pattern: &str, nested: R) -> Binder<R> {
    Binder::new(pattern, nested)
}

/// Wrap `nested` in `middleware`.
pub fn wrap<M: Middleware, R: Route>(middleware: M, nested: R) -> Layer<M, R> {
    Layer::new(middleware, nested)
}

/// Endpoint for an arbitrary method.
pub fn endpoint<F, Fut>(method: Method, handler: F) -> Endpoint<F>
where
    F: Fn(RequestContext, ResponseContext) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: HandlerOutcome,
{
    Endpoint::new(method, handler)
}

macro_rules! method_routes {
    ($($method:ident => $name:ident, $at:ident;)*) => {$(
        #[doc = concat!("Endpoint answering `", stringify!($method), "` once the path is fully consumed.")]
        pub fn $name<F, Fut>(handler: F) -> Endpoint<F>
        where
            F: Fn(RequestContext, ResponseContext) -> Fut + Send + Sync + 'static,
            Fut: Future + Send + 'static,
            Fut::Output: HandlerOutcome,
        {
            Endpoint::new(Method::$method, handler)
        }

        #[doc = concat!("`", stringify!($method), "` endpoint bound under `pattern`.")]
        pub fn $at<F, Fut>(pattern: &str, handler: F) -> Binder<Endpoint<F>>
        where
            F: Fn(RequestContext, ResponseContext) -> Fut + Send + Sync + 'static,
            Fut: Future + Send + 'static,
            Fut::Output: HandlerOutcome,
        {
            Binder::new(pattern, $name(handler))
        }
    )*};
}

method_routes! {
    GET => get, get_at;
    POST => post, post_at;
    PUT => put, put_at;
    PATCH => patch, patch_at;
    DELETE => delete, delete_at;
    HEAD => head, head_at;
    OPTIONS => options, options_at;
}

/// Combinators available on every route node.
pub trait RouteExt: Route + Sized {
    /// Wrap this node in `middleware`.
    fn wrap<M: Middleware>(self, middleware: M) -> Layer<M, Self> {
        Layer::new(middleware, self)
    }

    /// Bind `pattern` in front of this node.
    fn at(self, pattern: &str) -> Binder<Self> {
        Binder::new(pattern, self)
    }

    /// Erase the concrete node type.
    fn boxed(self) -> AnyRoute {
        AnyRoute::new(self)
    }
}

impl<R: Route> RouteExt for R {}
