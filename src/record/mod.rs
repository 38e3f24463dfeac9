//! # Record Module
//!
//! Records are the typed key/value sets a request accumulates as it descends
//! the route tree: path parameters captured by binders, a structured body
//! produced by a body parser, and mixins (such as parsed cookies) attached by
//! middleware.
//!
//! ## Two levels, one algebra
//!
//! - [`Schema`] is the shape: field names and [`FieldKind`]s. Schemas are
//!   combined once, at tree-construction time, to check that every endpoint
//!   will receive the fields it declares.
//! - [`Record`] is the value: field names and JSON values. Records are
//!   combined per request as binders merge their captures.
//!
//! Both keep their fields sorted by name with unique names, and both are
//! combined with the same linear merge walk from [`algebra`]:
//!
//! | Operation | Keys kept | On collision |
//! |-----------|-----------|--------------|
//! | `union` | both sides | newer side wins |
//! | `intersection` | shared | left side |
//! | `difference` | exactly one side | n/a |
//! | `subtract` | left only | n/a |
//!
//! ## Conversion
//!
//! [`Record::convert`] reshapes a record into a target schema. Fields the
//! target does not declare are never dropped silently: they are logged and
//! returned in an [`Extensions`] side-channel.

pub mod algebra;
mod core;
mod error;
mod schema;
#[cfg(test)]
mod tests;

pub use core::{Conversion, ConversionPolicy, Extensions, Record};
pub use error::RecordError;
pub use schema::{FieldKind, FieldVec, Schema, MAX_INLINE_FIELDS};
