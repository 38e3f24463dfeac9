use super::algebra::{self, Joined, MergeJoin};
use super::schema::{FieldKind, FieldVec, Schema};
use super::RecordError;
use crate::fixed_str::FieldName;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Typed key/value set, sorted by key with unique keys.
///
/// A record is never mutated in place once a request stage holds it; the
/// algebra methods return new records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    fields: FieldVec<Value>,
}

impl Record {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a record from pairs in any order.
    ///
    /// # Errors
    ///
    /// [`RecordError::DuplicateField`] if a key appears twice.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<FieldName>,
        V: Into<Value>,
    {
        let fields: Vec<(FieldName, Value)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let sorted = algebra::sort(fields).map_err(|name| RecordError::DuplicateField { name })?;
        Ok(Self {
            fields: FieldVec::from_vec(sorted),
        })
    }

    /// Record holding every member of a JSON object.
    ///
    /// # Errors
    ///
    /// [`RecordError::NotAnObject`] when `value` is not an object.
    pub fn from_json(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(RecordError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }

    fn from_map(map: Map<String, Value>) -> Self {
        let mut fields: Vec<(FieldName, Value)> =
            map.into_iter().map(|(k, v)| (FieldName::from(k), v)).collect();
        // object keys are unique; order depends on serde_json features
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            fields: FieldVec::from_vec(fields),
        }
    }

    pub(crate) fn from_sorted(fields: FieldVec<Value>) -> Self {
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
    pub fn fields(&self) -> &[(FieldName, Value)] {
        &self.fields
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldName> + '_ {
        self.fields.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &Value)> + '_ {
        self.fields.iter().map(|(k, v)| (k, v))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .binary_search_by(|(k, _)| k.as_str().cmp(name))
            .ok()
            .map(|i| &self.fields[i].1)
    }

    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| FieldKind::Integer.coerce(v)).and_then(|v| v.as_i64())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The shape of this record, with kinds inferred from the values.
    #[must_use]
    pub fn schema(&self) -> Schema {
        Schema::from_sorted(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), FieldKind::of(v)))
                .collect(),
        )
    }

    /// All fields of both records; on a shared key `newer`'s value wins.
    #[must_use]
    pub fn union(&self, newer: &Record) -> Record {
        Self::from_sorted(algebra::union(&self.fields, &newer.fields))
    }

    /// Fields of `self` whose key also appears in `other`.
    #[must_use]
    pub fn intersection(&self, other: &Record) -> Record {
        Self::from_sorted(algebra::intersection(&self.fields, &other.fields))
    }

    /// Fields whose key appears in exactly one of the two records.
    #[must_use]
    pub fn difference(&self, other: &Record) -> Record {
        Self::from_sorted(algebra::difference(&self.fields, &other.fields))
    }

    /// Fields of `self` whose key does not appear in `other`.
    #[must_use]
    pub fn subtract(&self, other: &Record) -> Record {
        Self::from_sorted(algebra::subtract(&self.fields, &other.fields))
    }

    /// Fields of `self` named by `schema`, values untouched.
    #[must_use]
    pub fn project(&self, schema: &Schema) -> Record {
        Self::from_sorted(algebra::intersection(&self.fields, schema.fields()))
    }

    /// Copy of this record with `name` set to `value`.
    #[must_use]
    pub fn with(&self, name: impl Into<FieldName>, value: impl Into<Value>) -> Record {
        let single = [(name.into(), value.into())];
        Self::from_sorted(algebra::union(&self.fields, &single))
    }

    /// Reshape this record into `target`.
    ///
    /// Fields present in both are copied by name and coerced to the target
    /// kind. Fields the target does not declare are moved into the returned
    /// [`Extensions`] and logged. Fields the target declares but the record
    /// lacks are filled with the kind's default under
    /// [`ConversionPolicy::Lenient`] and rejected under
    /// [`ConversionPolicy::Strict`]; mistyped values follow the same rule.
    ///
    /// # Errors
    ///
    /// Under `Strict`: [`RecordError::MissingFields`] or
    /// [`RecordError::Mistyped`].
    pub fn convert(
        &self,
        target: &Schema,
        policy: ConversionPolicy,
    ) -> Result<Conversion, RecordError> {
        let mut fields: FieldVec<Value> = FieldVec::with_capacity(target.len());
        let mut conversion = Conversion::default();

        for joined in MergeJoin::new(target.fields(), &self.fields) {
            match joined {
                Joined::Both((name, kind), (_, value)) => match kind.coerce(value) {
                    Some(v) => fields.push((name.clone(), v)),
                    None if policy == ConversionPolicy::Strict => {
                        return Err(RecordError::Mistyped {
                            field: name.clone(),
                            expected: *kind,
                        });
                    }
                    None => {
                        warn!(field = %name, expected = %kind, "Field has wrong kind, using default");
                        conversion.mistyped.push(name.clone());
                        fields.push((name.clone(), kind.default_value()));
                    }
                },
                Joined::Left((name, kind)) => {
                    conversion.missing.push(name.clone());
                    fields.push((name.clone(), kind.default_value()));
                }
                Joined::Right((name, value)) => {
                    warn!(field = %name, "Field does not belong to target record");
                    conversion.extras.insert(name.clone(), value.clone());
                }
            }
        }

        if !conversion.missing.is_empty() {
            if policy == ConversionPolicy::Strict {
                return Err(RecordError::MissingFields {
                    fields: conversion.missing,
                });
            }
            debug!(missing = ?conversion.missing, "Missing fields filled with defaults");
        }

        conversion.record = Self::from_sorted(fields);
        Ok(conversion)
    }

    /// JSON object holding every field.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    /// Typed view of this record through serde.
    ///
    /// # Errors
    ///
    /// [`RecordError::Deserialize`] when the fields do not fit `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, RecordError> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

impl FromIterator<(FieldName, Value)> for Record {
    /// Later entries replace earlier ones with the same key.
    fn from_iter<I: IntoIterator<Item = (FieldName, Value)>>(iter: I) -> Self {
        let map: BTreeMap<FieldName, Value> = iter.into_iter().collect();
        Self::from_sorted(map.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a (FieldName, Value);
    type IntoIter = std::slice::Iter<'a, (FieldName, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// How [`Record::convert`] treats fields the source cannot supply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionPolicy {
    /// Fill with defaults and log.
    #[default]
    Lenient,
    /// Fail the conversion.
    Strict,
}

impl ConversionPolicy {
    /// Parse `"strict"` / `"lenient"`, defaulting to lenient.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "strict" => ConversionPolicy::Strict,
            _ => ConversionPolicy::Lenient,
        }
    }
}

/// Outcome of [`Record::convert`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversion {
    /// The record reshaped to the target schema.
    pub record: Record,
    /// Source fields the target does not declare.
    pub extras: Extensions,
    /// Target fields the source lacked (filled with defaults).
    pub missing: Vec<FieldName>,
    /// Target fields whose source value had the wrong kind.
    pub mistyped: Vec<FieldName>,
}

/// Named side-channel for fields that did not fit a record's declared shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extensions(BTreeMap<FieldName, Value>);

impl Extensions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: FieldName, value: Value) -> Option<Value> {
        self.0.insert(name, value)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &Value)> + '_ {
        self.0.iter()
    }

    /// Absorb `other`; its entries replace existing ones with the same name.
    pub fn absorb(&mut self, other: Extensions) {
        self.0.extend(other.0);
    }
}
