//! Unit tests for CLI commands

use crate::cli::{demo_router, parse_header_arg, probe, render_routes, Cli, Commands};
use crate::runtime_config::RuntimeConfig;
use clap::Parser;

#[test]
fn test_routes_command_parses() {
    let cli = Cli::try_parse_from(["routeloom", "routes"]).unwrap();
    assert!(matches!(cli.command, Commands::Routes));
    assert!(cli.config.is_none());
}

#[test]
fn test_probe_command_with_flags() {
    let cli = Cli::try_parse_from([
        "routeloom",
        "--log-format",
        "pretty",
        "probe",
        "--method",
        "post",
        "--path",
        "/user/42/age",
        "--body",
        r#"{"age": 3}"#,
        "-H",
        "cookie: name=Ada",
        "--header",
        "x-request-id:01ARZ3NDEKTSV4RRFFQ69G5FAV",
    ])
    .unwrap();

    assert_eq!(cli.log_format.as_deref(), Some("pretty"));
    match cli.command {
        Commands::Probe {
            method,
            path,
            body,
            headers,
        } => {
            assert_eq!(method, "post");
            assert_eq!(path, "/user/42/age");
            assert_eq!(body.as_deref(), Some(r#"{"age": 3}"#));
            assert_eq!(
                headers,
                vec![
                    ("cookie".to_string(), "name=Ada".to_string()),
                    (
                        "x-request-id".to_string(),
                        "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string()
                    ),
                ]
            );
        }
        Commands::Routes => panic!("Expected Probe command"),
    }
}

#[test]
fn test_probe_requires_path() {
    assert!(Cli::try_parse_from(["routeloom", "probe"]).is_err());
}

#[test]
fn test_parse_header_arg() {
    assert_eq!(
        parse_header_arg("accept: text/plain").unwrap(),
        ("accept".to_string(), "text/plain".to_string())
    );
    assert!(parse_header_arg("no-colon").is_err());
    assert!(parse_header_arg(":value").is_err());
}

#[test]
fn test_render_routes_lists_demo_tree() {
    let router = demo_router(RuntimeConfig::default()).unwrap();
    let listing = render_routes(&router);
    assert!(listing.contains("GET     /user/:userId/name"));
    assert!(listing.contains("POST    /user/:userId/age"));
    assert!(listing.contains("GET     /static/*file"));
}

#[tokio::test]
async fn test_probe_renders_response() {
    let router = demo_router(RuntimeConfig::default()).unwrap();
    let out = probe(&router, "get", "/user/42/name", None, &[])
        .await
        .unwrap();
    assert!(out.contains("handled: true"));
    assert!(out.contains("status: 200"));
    assert!(out.contains("hello 42"));
}

#[tokio::test]
async fn test_probe_rejects_bad_method() {
    let router = demo_router(RuntimeConfig::default()).unwrap();
    assert!(probe(&router, "GE T", "/", None, &[]).await.is_err());
}
