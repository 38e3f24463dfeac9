use crate::fixed_str::FieldName;
use crate::record::{FieldVec, Record, RecordError, Schema};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Character class for an ordinary `:name` capture. Excludes the separator
/// so a capture never spans path segments.
const SEGMENT_CLASS: &str = "[^/]+";
/// Character class for a trailing `*name` capture. Slash-inclusive.
const CATCH_ALL_CLASS: &str = ".+";

/// Errors raised while compiling a path pattern.
#[derive(Debug, Clone, Error)]
pub enum PatternError {
    /// A `:` or `*` marker is not followed by a valid parameter name.
    #[error("invalid parameter name at byte {position} in pattern `{pattern}`")]
    InvalidName { pattern: String, position: usize },

    /// The same parameter name appears twice in one pattern.
    #[error("parameter `{name}` appears more than once in pattern `{pattern}`")]
    DuplicateParam { pattern: String, name: FieldName },

    /// A `*name` catch-all is followed by more pattern text.
    #[error("catch-all parameter must end pattern `{pattern}`")]
    CatchAllNotLast { pattern: String },

    /// The generated regex was rejected.
    #[error("pattern `{pattern}` produced an invalid matcher: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Successful prefix match of a [`PathPattern`].
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    /// Bytes of the input consumed by the whole pattern.
    pub consumed: usize,
    /// One `String` field per parameter.
    pub captures: Record,
}

/// A compiled route pattern such as `/user/:userId`.
///
/// Matching is anchored at the start of the input and is a prefix match:
/// whatever follows the matched prefix is left for nested routes.
#[derive(Clone)]
pub struct PathPattern {
    source: Arc<str>,
    regex: Regex,
    /// Parameter names in declaration order.
    params: Vec<FieldName>,
    /// Parameter names sorted, one `String` field each.
    schema: Schema,
}

impl PathPattern {
    /// Compile `source` into a matcher.
    ///
    /// Literal text is matched verbatim. `:name` captures one or more
    /// non-separator characters. A final `*name` captures the rest of the
    /// path, slashes included. Names are `[A-Za-z_][A-Za-z0-9_]*`.
    ///
    /// # Errors
    ///
    /// See [`PatternError`].
    pub fn compile(source: &str) -> Result<Self, PatternError> {
        let mut pattern = String::with_capacity(source.len() + 16);
        pattern.push('^');
        let mut params: Vec<FieldName> = Vec::new();

        let mut offset = 0;
        let mut rest = source;
        while let Some(pos) = rest.find([':', '*']) {
            let (literal, tail) = rest.split_at(pos);
            pattern.push_str(&regex::escape(literal));

            let catch_all = tail.starts_with('*');
            let name_len = tail[1..]
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(tail.len() - 1);
            let name = &tail[1..1 + name_len];
            if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(PatternError::InvalidName {
                    pattern: source.to_string(),
                    position: offset + pos,
                });
            }
            if catch_all && 1 + name_len != tail.len() {
                return Err(PatternError::CatchAllNotLast {
                    pattern: source.to_string(),
                });
            }

            let class = if catch_all { CATCH_ALL_CLASS } else { SEGMENT_CLASS };
            pattern.push_str("(?P<");
            pattern.push_str(name);
            pattern.push('>');
            pattern.push_str(class);
            pattern.push(')');
            params.push(FieldName::from(name.to_string()));

            offset += pos + 1 + name_len;
            rest = &tail[1 + name_len..];
        }
        pattern.push_str(&regex::escape(rest));

        let schema = Schema::strings(params.iter().cloned()).map_err(|e| match e {
            RecordError::DuplicateField { name } => PatternError::DuplicateParam {
                pattern: source.to_string(),
                name,
            },
            // Schema::strings only reports duplicates
            _ => PatternError::InvalidName {
                pattern: source.to_string(),
                position: 0,
            },
        })?;

        let regex = Regex::new(&pattern).map_err(|e| PatternError::Regex {
            pattern: source.to_string(),
            source: e,
        })?;

        debug!(pattern = %source, regex = %pattern, params = ?params, "Path pattern compiled");

        Ok(Self {
            source: Arc::from(source),
            regex,
            params,
            schema,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn as_regex(&self) -> &str {
        self.regex.as_str()
    }

    /// Parameter names in the order they appear in the pattern.
    #[must_use]
    pub fn params(&self) -> &[FieldName] {
        &self.params
    }

    /// The record shape this pattern produces.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Length of the prefix of `path` this pattern matches, without building
    /// the capture record.
    #[must_use]
    pub fn prefix_len(&self, path: &str) -> Option<usize> {
        self.regex.find(path).map(|m| m.end())
    }

    /// Match a prefix of `path`, returning the consumed length and captures.
    #[must_use]
    pub fn match_prefix(&self, path: &str) -> Option<PatternMatch> {
        let caps = self.regex.captures(path)?;
        let consumed = caps.get(0)?.end();
        let fields: FieldVec<Value> = self
            .schema
            .names()
            .filter_map(|name| {
                caps.name(name.as_str())
                    .map(|m| (name.clone(), Value::String(m.as_str().to_string())))
            })
            .collect();
        Some(PatternMatch {
            consumed,
            captures: Record::from_sorted(fields),
        })
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPattern")
            .field("source", &self.source)
            .field("regex", &self.regex.as_str())
            .field("params", &self.params)
            .finish()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}
