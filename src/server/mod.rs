//! Transport-facing request and response types.
//!
//! The network listener and the HTTP codec live outside this crate. They hand
//! the router a [`DecodedRequest`] and an [`Arc<dyn ResponseSink>`]; the route
//! tree sees them as a [`RequestContext`] and a [`ResponseContext`].
//!
//! [`Arc<dyn ResponseSink>`]: ResponseSink

pub mod request;
pub mod response;

pub use request::{
    parse_cookies, parse_query, Body, DecodedRequest, RequestContext, RequestHead, COOKIES_MIXIN,
};
pub use response::{
    ChannelSink, HeaderVec, HttpResponse, MemorySink, ResponseContext, ResponseError, ResponseSink,
    DEFAULT_CONTENT_TYPE,
};
