//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;
use eeve_core::http::Method;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn cli_parse_fetch_defaults() {
    match parse(&["eeve", "fetch", "https://example.com/data.json"]).command {
        CliCommand::Fetch(args) => {
            assert_eq!(args.url, "https://example.com/data.json");
            assert_eq!(args.method, Method::Get);
            assert!(args.headers.is_empty());
            assert!(args.data.is_none());
            assert!(args.max_retries.is_none());
            assert!(args.max_elapsed.is_none());
            assert!(args.retry_statuses.is_empty());
            assert!(!args.include);
            assert!(!args.json);
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_fetch_options() {
    match parse(&[
        "eeve",
        "fetch",
        "https://example.com/",
        "-X",
        "DELETE",
        "-H",
        "A: 1",
        "--header",
        "B: 2",
        "-i",
        "--json",
    ])
    .command
    {
        CliCommand::Fetch(args) => {
            assert_eq!(args.method, Method::Delete);
            assert_eq!(args.headers, vec!["A: 1".to_string(), "B: 2".to_string()]);
            assert!(args.include);
            assert!(args.json);
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_rejects_unknown_method() {
    assert!(Cli::try_parse_from(["eeve", "fetch", "http://x/", "-X", "TRACE"]).is_err());
}

#[test]
fn cli_parse_rejects_bad_retry_status() {
    assert!(Cli::try_parse_from(["eeve", "fetch", "http://x/", "--retry-status", "abc"]).is_err());
}

#[test]
fn cli_parse_config_with_global_path() {
    let cli = parse(&["eeve", "config", "--config", "/tmp/eeve.toml"]);
    assert!(matches!(cli.command, CliCommand::Config));
    assert_eq!(
        cli.config.as_deref(),
        Some(std::path::Path::new("/tmp/eeve.toml"))
    );
}

#[test]
fn cli_parse_completions() {
    match parse(&["eeve", "completions", "bash"]).command {
        CliCommand::Completions { shell } => assert_eq!(shell, clap_complete::Shell::Bash),
        _ => panic!("expected Completions"),
    }
}

#[test]
fn cli_parse_man() {
    assert!(matches!(parse(&["eeve", "man"]).command, CliCommand::Man));
}

#[test]
fn cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
