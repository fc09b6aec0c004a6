//! `eeve fetch <url>` – one request through the retrying client.

use anyhow::{Context, Result};
use eeve_core::cancel::CancelToken;
use eeve_core::config::EeveConfig;
use eeve_core::http::{Method, Request};
use eeve_core::retry::{BackoffClient, Outcome, Termination};
use eeve_core::transport::{CurlOptions, CurlTransport};
use serde::Serialize;
use std::io::{self, Write};

use crate::cli::FetchArgs;

/// Machine-readable summary printed with `--json`.
#[derive(Debug, Serialize)]
struct FetchReport<'a> {
    url: &'a str,
    method: Method,
    status: Option<u16>,
    attempts: u32,
    termination: Termination,
    error: Option<String>,
    headers: &'a [(String, String)],
}

/// Split a `Name: value` header argument.
pub(crate) fn parse_header_arg(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("header {:?} is not in `Name: value` form", raw))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("header {:?} has an empty name", raw);
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Command-line overrides layered on top of the loaded config.
pub(crate) fn effective_config(cfg: &EeveConfig, args: &FetchArgs) -> EeveConfig {
    let mut cfg = cfg.clone();
    if let Some(n) = args.max_retries {
        cfg.backoff.max_retries = Some(n);
    }
    if let Some(secs) = args.max_elapsed {
        cfg.backoff.max_elapsed_secs = secs;
    }
    for code in &args.retry_statuses {
        if !cfg.classify.extra_retry_statuses.contains(code) {
            cfg.classify.extra_retry_statuses.push(*code);
        }
    }
    cfg
}

pub(crate) fn build_request(args: &FetchArgs) -> Result<Request> {
    let mut request = Request::new(args.method, &args.url)?;
    for raw in &args.headers {
        let (name, value) = parse_header_arg(raw)?;
        request = request.header(name, value);
    }
    if let Some(data) = &args.data {
        request = request.body(data.as_bytes());
    }
    Ok(request)
}

pub async fn run_fetch(cfg: &EeveConfig, args: &FetchArgs) -> Result<()> {
    let cfg = effective_config(cfg, args);
    let request = build_request(args)?;
    let transport = CurlTransport::new(CurlOptions::from(&cfg.transport));
    let client = BackoffClient::from_config(transport, &cfg);

    // Ctrl-C ends a pending backoff wait instead of killing the process mid-report.
    let token = CancelToken::new();
    let watcher = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling");
                token.cancel();
            }
        })
    };

    let outcome = client.execute_async(&request, Some(&token)).await;
    watcher.abort();
    tracing::info!(
        url = %request.url(),
        attempts = outcome.attempts(),
        termination = ?outcome.termination(),
        "fetch finished"
    );

    if args.json {
        print_report(&request, &outcome)?;
    } else {
        print_response(&outcome, args.include)?;
    }

    match outcome.error() {
        None => Ok(()),
        Some(err) => Err(anyhow::anyhow!(
            "{} (after {} attempt(s))",
            err,
            outcome.attempts()
        )),
    }
}

fn print_report(request: &Request, outcome: &Outcome) -> Result<()> {
    let report = FetchReport {
        url: request.url().as_str(),
        method: request.method(),
        status: outcome.status(),
        attempts: outcome.attempts(),
        termination: outcome.termination(),
        error: outcome.error().map(ToString::to_string),
        headers: outcome.response().map(|r| r.headers()).unwrap_or(&[]),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_response(outcome: &Outcome, include: bool) -> Result<()> {
    let Some(resp) = outcome.response() else {
        return Ok(());
    };
    let mut out = io::stdout().lock();
    if include {
        writeln!(out, "HTTP {}", resp.status())?;
        for (k, v) in resp.headers() {
            writeln!(out, "{}: {}", k, v)?;
        }
        writeln!(out)?;
    }
    out.write_all(resp.body())?;
    out.flush()?;
    Ok(())
}
