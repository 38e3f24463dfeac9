//! # Dispatcher Module
//!
//! [`Router`] is the entry point the transport calls. It owns a checked route
//! tree and turns each [`DecodedRequest`](crate::server::DecodedRequest) into
//! at most one response written to a
//! [`ResponseSink`](crate::server::ResponseSink).
//!
//! ## Request Flow
//!
//! 1. Request id taken from the configured header or generated
//! 2. Target validated: empty, relative or `..` targets get 400 before any
//!    route is consulted
//! 3. Bodies above `max_body_bytes` get 413
//! 4. `root.matches`, then `root.invoke`
//! 5. The outcome is logged with method, path, status and request id
//!
//! ## Error Handling
//!
//! Errors and panics that escape the tree (no
//! [`ServerFault`](crate::middleware::ServerFault) composed) are contained
//! here: logged, answered with a 500 if nothing was sent, and reported as
//! not handled.

mod core;

pub use core::{
    is_valid_target, DispatchOutcome, Router, ILLEGAL_TARGET_BODY, PAYLOAD_TOO_LARGE_BODY,
};
