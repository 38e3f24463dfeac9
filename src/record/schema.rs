use super::algebra;
use super::RecordError;
use crate::fixed_str::FieldName;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of fields before a record spills to the heap.
/// Path scopes rarely carry more than a handful of parameters.
pub const MAX_INLINE_FIELDS: usize = 8;

/// Key-sorted field storage shared by [`Schema`] and [`Record`](super::Record).
pub type FieldVec<V> = SmallVec<[(FieldName, V); MAX_INLINE_FIELDS]>;

/// Value type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    /// Any JSON value, stored as-is.
    Any,
}

impl FieldKind {
    /// Value a field of this kind takes when it is absent from its source.
    #[must_use]
    pub fn default_value(self) -> Value {
        match self {
            FieldKind::String => Value::String(String::new()),
            FieldKind::Integer => Value::from(0_i64),
            FieldKind::Number => Value::from(0.0_f64),
            FieldKind::Boolean => Value::Bool(false),
            FieldKind::Any => Value::Null,
        }
    }

    /// Infer the kind of a concrete value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => FieldKind::String,
            Value::Bool(_) => FieldKind::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => FieldKind::Integer,
            Value::Number(_) => FieldKind::Number,
            _ => FieldKind::Any,
        }
    }

    /// Convert `value` to this kind, if it can be done without guessing.
    ///
    /// Strings holding a number or boolean are parsed, so path captures and
    /// cookie values can feed numeric fields.
    #[must_use]
    pub fn coerce(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (FieldKind::Any, v) => Some(v.clone()),
            (FieldKind::String, Value::String(_)) => Some(value.clone()),
            (FieldKind::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (FieldKind::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
            (FieldKind::Integer, Value::Number(n)) => n.as_i64().map(Value::from),
            (FieldKind::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (FieldKind::Number, Value::Number(n)) => n.as_f64().map(Value::from),
            (FieldKind::Number, Value::String(s)) => s.trim().parse::<f64>().ok().map(Value::from),
            (FieldKind::Boolean, Value::Bool(_)) => Some(value.clone()),
            (FieldKind::Boolean, Value::String(s)) => s.trim().parse::<bool>().ok().map(Value::Bool),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Any => "any",
        };
        f.write_str(s)
    }
}

/// The shape of a record: field names with their kinds, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    fields: FieldVec<FieldKind>,
}

impl Schema {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a schema from fields in any order.
    ///
    /// # Errors
    ///
    /// [`RecordError::DuplicateField`] if a name appears twice.
    pub fn new<I, K>(fields: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = (K, FieldKind)>,
        K: Into<FieldName>,
    {
        let fields: Vec<(FieldName, FieldKind)> =
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let sorted = algebra::sort(fields).map_err(|name| RecordError::DuplicateField { name })?;
        Ok(Self {
            fields: FieldVec::from_vec(sorted),
        })
    }

    /// Schema with one `String` field per name.
    ///
    /// # Errors
    ///
    /// [`RecordError::DuplicateField`] if a name appears twice.
    pub fn strings<I, K>(names: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = K>,
        K: Into<FieldName>,
    {
        Self::new(names.into_iter().map(|n| (n, FieldKind::String)))
    }

    pub(crate) fn from_sorted(fields: FieldVec<FieldKind>) -> Self {
        debug_assert!(algebra::is_sorted_unique(&fields));
        Self { fields }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn fields(&self) -> &[(FieldName, FieldKind)] {
        &self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &FieldName> + '_ {
        self.fields.iter().map(|(k, _)| k)
    }

    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.fields
            .binary_search_by(|(k, _)| k.as_str().cmp(name))
            .ok()
            .map(|i| self.fields[i].1)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.kind_of(name).is_some()
    }

    /// All fields of both schemas; on a shared name `newer`'s kind wins.
    #[must_use]
    pub fn union(&self, newer: &Schema) -> Schema {
        Self::from_sorted(algebra::union(&self.fields, &newer.fields))
    }

    #[must_use]
    pub fn intersection(&self, other: &Schema) -> Schema {
        Self::from_sorted(algebra::intersection(&self.fields, &other.fields))
    }

    /// Fields present in exactly one of the two schemas.
    #[must_use]
    pub fn difference(&self, other: &Schema) -> Schema {
        Self::from_sorted(algebra::difference(&self.fields, &other.fields))
    }

    /// Fields of `self` absent from `other`.
    #[must_use]
    pub fn subtract(&self, other: &Schema) -> Schema {
        Self::from_sorted(algebra::subtract(&self.fields, &other.fields))
    }

    /// Names of `self` whose kind disagrees with `other`'s kind for the same
    /// name. `Any` on either side always agrees.
    #[must_use]
    pub fn kind_conflicts(&self, other: &Schema) -> Vec<FieldName> {
        algebra::MergeJoin::new(&self.fields, &other.fields)
            .filter_map(|j| match j {
                algebra::Joined::Both((name, a), (_, b))
                    if a != b && *a != FieldKind::Any && *b != FieldKind::Any =>
                {
                    Some(name.clone())
                }
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, kind)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {kind}")?;
        }
        f.write_str("}")
    }
}
