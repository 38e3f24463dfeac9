//! # CLI Module
//!
//! Command-line front end of the `routeloom` binary. It builds the
//! [`demo`](crate::demo) application and drives it through an in-memory
//! sink, so routes can be inspected and exercised without a listener.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! ```bash
//! routeloom routes
//! ```
//!
//! ### `probe`
//!
//! ```bash
//! routeloom probe --path /user/42/name
//! routeloom probe -m POST -p /user/42/age -b '{"age": 30}'
//! routeloom probe -p /greet -H 'cookie: name=Ada'
//! ```
//!
//! ## Global Options
//!
//! - `--config <FILE>` - runtime configuration (TOML)
//! - `--log-format <json|pretty>`
//! - `--log-level <LEVEL>`

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{
    demo_router, parse_header_arg, probe, render_routes, run_cli, Cli, Commands,
};
