use crate::fixed_str::FieldName;
use crate::pattern::PatternError;
use crate::record::RecordError;
use crate::server::ResponseError;
use std::any::Any;
use thiserror::Error;

/// Errors raised while building or running a route tree.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A node was invoked on a path it does not match.
    #[error("route does not match `{path}`")]
    Unmatched { path: String },

    /// A handler returned an error.
    #[error("handler failed: {0:#}")]
    Handler(#[from] anyhow::Error),

    /// A handler or middleware panicked.
    #[error("panicked: {message}")]
    Panicked { message: String },

    /// An endpoint declares path parameters no binder above it captures.
    #[error("{route} requires params not bound above it: {}", join(missing))]
    MissingParams {
        route: String,
        missing: Vec<FieldName>,
    },

    /// An endpoint declares mixins no middleware above it attaches.
    #[error("{route} requires mixins not attached above it: {}", join(missing))]
    MissingMixins {
        route: String,
        missing: Vec<FieldName>,
    },

    /// An endpoint's declared body shape is not what the parser above it
    /// produces.
    #[error("{route} body mismatch: {detail}")]
    BodyMismatch { route: String, detail: String },

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Response(#[from] ResponseError),
}

impl RouteError {
    /// Build a [`RouteError::Panicked`] from a caught panic payload.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        RouteError::Panicked { message }
    }

    /// Whether this error was detected while building the tree.
    #[must_use]
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            RouteError::MissingParams { .. }
                | RouteError::MissingMixins { .. }
                | RouteError::BodyMismatch { .. }
                | RouteError::Pattern(_)
        )
    }
}

fn join(names: &[FieldName]) -> String {
    names
        .iter()
        .map(FieldName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
