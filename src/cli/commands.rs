use crate::demo;
use crate::dispatcher::{DispatchOutcome, Router};
use crate::middleware::MetricsMiddleware;
use crate::otel::{init_logging_with_config, LogConfig, LogFormat};
use crate::runtime_config::RuntimeConfig;
use crate::server::{DecodedRequest, HttpResponse, MemorySink};
use anyhow::Context;
use clap::{Parser, Subcommand};
use http::Method;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line interface for routeloom
///
/// Inspects and exercises the demo route tree without a network listener.
#[derive(Debug, Parser)]
#[command(name = "routeloom")]
#[command(about = "routeloom CLI", long_about = None, version)]
pub struct Cli {
    /// Runtime configuration file (TOML). `ROUTELOOM_*` variables override it.
    #[arg(long, global = true, env = "ROUTELOOM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format: json or pretty
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print every endpoint of the demo tree with its full pattern
    Routes,
    /// Dispatch one request through the demo tree and print the response
    Probe {
        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request target, e.g. /user/42/name?verbose=1
        #[arg(short, long)]
        path: String,

        /// Request body
        #[arg(short, long)]
        body: Option<String>,

        /// Request header as `name:value` (repeatable)
        #[arg(short = 'H', long = "header", value_parser = parse_header_arg)]
        headers: Vec<(String, String)>,
    },
}

/// Parse a `name:value` header argument.
///
/// # Errors
///
/// If there is no `:` or the name is empty.
pub fn parse_header_arg(arg: &str) -> Result<(String, String), String> {
    let (name, value) = arg
        .split_once(':')
        .ok_or_else(|| format!("expected name:value, got `{arg}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in `{arg}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

impl Cli {
    /// Logging configuration from the environment with CLI overrides.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::from_env();
        // stdout carries the command output.
        config.stderr = true;
        config.async_logging = false;
        if let Some(format) = &self.log_format {
            config.format = LogFormat::parse(format);
        }
        if let Some(level) = &self.log_level {
            config.log_level.clone_from(level);
        }
        config
    }

    /// Runtime configuration from `--config` (or defaults) plus env overrides.
    ///
    /// # Errors
    ///
    /// If the config file cannot be read or parsed.
    pub fn runtime_config(&self) -> anyhow::Result<RuntimeConfig> {
        match &self.config {
            Some(path) => RuntimeConfig::load(path)
                .with_context(|| format!("loading {}", path.display())),
            None => Ok(RuntimeConfig::from_env()),
        }
    }
}

/// Build the demo application router for `config`.
///
/// # Errors
///
/// If the demo tree fails its construction checks.
pub fn demo_router(config: RuntimeConfig) -> anyhow::Result<Router> {
    let metrics = Arc::new(MetricsMiddleware::new());
    let tree = demo::app(&config, metrics)?;
    Ok(Router::with_config(tree, config)?)
}

/// Endpoint listing, one line per route.
#[must_use]
pub fn render_routes(router: &Router) -> String {
    let mut out = String::new();
    for route in router.routes() {
        let _ = writeln!(out, "{route}");
    }
    out
}

/// Dispatch one request and render what came back.
///
/// # Errors
///
/// If `method` is not a valid HTTP method.
pub async fn probe(
    router: &Router,
    method: &str,
    target: &str,
    body: Option<&str>,
    headers: &[(String, String)],
) -> anyhow::Result<String> {
    let method: Method = method
        .to_ascii_uppercase()
        .parse()
        .with_context(|| format!("invalid method `{method}`"))?;

    let mut request = DecodedRequest::new(method, target);
    for (name, value) in headers {
        request = request.with_header(name, value);
    }
    if let Some(body) = body {
        request = request.with_body(body.as_bytes().to_vec());
    }

    let sink = MemorySink::new();
    let outcome = router.dispatch(request, Arc::<MemorySink>::clone(&sink)).await;
    Ok(render_probe(&outcome, &sink.take()))
}

fn render_probe(outcome: &DispatchOutcome, responses: &[HttpResponse]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "handled: {}  request-id: {}",
        outcome.handled, outcome.request_id
    );
    if responses.is_empty() {
        out.push_str("no response sent\n");
    }
    for response in responses {
        let _ = writeln!(out, "status: {}", response.status);
        for (name, value) in &response.headers {
            let _ = writeln!(out, "{name}: {value}");
        }
        out.push('\n');
        out.push_str(&response.body_str());
        out.push('\n');
    }
    out
}

/// Run a parsed command line.
///
/// # Errors
///
/// Configuration, logging setup or probe failures.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let _guard = init_logging_with_config(&cli.log_config())?;
    let router = demo_router(cli.runtime_config()?)?;

    match &cli.command {
        Commands::Routes => {
            print!("{}", render_routes(&router));
            Ok(())
        }
        Commands::Probe {
            method,
            path,
            body,
            headers,
        } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("building tokio runtime")?;
            let rendered =
                runtime.block_on(probe(&router, method, path, body.as_deref(), headers))?;
            print!("{rendered}");
            Ok(())
        }
    }
}
