//! Field names used as record keys.
//!
//! A [`FieldName`] is fixed once created: it is either a `&'static str` baked
//! into the route tree at construction time or a shared `Arc<str>` for names
//! discovered at runtime (JSON object keys, cookie names). Cloning is O(1) in
//! both cases, which matters because every record merge clones keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Clone)]
enum Repr {
    Static(&'static str),
    Shared(Arc<str>),
}

/// Immutable, totally ordered field name.
#[derive(Clone)]
pub struct FieldName(Repr);

impl FieldName {
    /// Build a field name from a string literal. Usable in `const` context.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Repr::Static(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match &self.0 {
            Repr::Static(s) => s,
            Repr::Shared(s) => s,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl From<&'static str> for FieldName {
    fn from(s: &'static str) -> Self {
        Self::from_static(s)
    }
}

impl From<String> for FieldName {
    fn from(s: String) -> Self {
        Self(Repr::Shared(Arc::from(s)))
    }
}

impl From<&String> for FieldName {
    fn from(s: &String) -> Self {
        Self(Repr::Shared(Arc::from(s.as_str())))
    }
}

impl From<Arc<str>> for FieldName {
    fn from(s: Arc<str>) -> Self {
        Self(Repr::Shared(s))
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for FieldName {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq for FieldName {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for FieldName {}

impl PartialEq<str> for FieldName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for FieldName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialOrd for FieldName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for FieldName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Debug for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(FieldName::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_ID: FieldName = FieldName::from_static("userId");

    #[test]
    fn static_and_shared_compare_equal() {
        let shared = FieldName::from("userId".to_string());
        assert_eq!(USER_ID, shared);
        assert_eq!(USER_ID.cmp(&shared), Ordering::Equal);
    }

    #[test]
    fn ordering_is_bytewise() {
        let mut names = vec![
            FieldName::from("b"),
            FieldName::from("B"),
            FieldName::from("a"),
        ];
        names.sort();
        let got: Vec<&str> = names.iter().map(FieldName::as_str).collect();
        assert_eq!(got, vec!["B", "a", "b"]);
    }

    #[test]
    fn serde_round_trips_as_plain_string() {
        let json = serde_json::to_string(&USER_ID).unwrap();
        assert_eq!(json, "\"userId\"");
        let back: FieldName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, USER_ID);
    }
}
