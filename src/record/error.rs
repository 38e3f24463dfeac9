use super::FieldKind;
use crate::fixed_str::FieldName;
use thiserror::Error;

/// Record construction, conversion and typed-access errors.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Two fields share a name. Records and schemas are keyed sets.
    #[error("field `{name}` appears more than once")]
    DuplicateField { name: FieldName },

    /// A strict conversion found target fields the source does not carry.
    #[error("missing fields: {}", join(fields))]
    MissingFields { fields: Vec<FieldName> },

    /// A field value could not be coerced to the kind its schema declares.
    #[error("field `{field}` is not a valid {expected}")]
    Mistyped { field: FieldName, expected: FieldKind },

    /// Input that should have been a JSON object was something else.
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// Typed view over a record failed.
    #[error("cannot deserialize record: {0}")]
    Deserialize(#[from] serde_json::Error),
}

fn join(fields: &[FieldName]) -> String {
    fields
        .iter()
        .map(FieldName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
