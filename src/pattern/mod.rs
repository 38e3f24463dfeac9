//! # Pattern Module
//!
//! Compiles declarative route patterns such as `/user/:userId` into prefix
//! matchers that report how much of the path they consumed and which
//! parameters they captured.
//!
//! ## Syntax
//!
//! - literal text is matched verbatim (regex metacharacters are escaped)
//! - `:name` captures one path segment (`[^/]+`)
//! - a final `*name` captures the remainder of the path, slashes included
//!
//! Patterns are compiled once, when the route tree is built. Matching is
//! anchored at the start of the input only; the unmatched suffix is handed to
//! the nested route.
//!
//! ## Example
//!
//! ```rust
//! use routeloom::pattern::PathPattern;
//!
//! let pattern = PathPattern::compile("/user/:userId").unwrap();
//! let m = pattern.match_prefix("/user/42/name").unwrap();
//! assert_eq!(m.consumed, "/user/42".len());
//! assert_eq!(m.captures.get_str("userId"), Some("42"));
//! ```

mod core;

pub use core::{PathPattern, PatternError, PatternMatch};
