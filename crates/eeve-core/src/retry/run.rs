//! Retry loop: drive a transport until a response is accepted, an error is
//! permanent, or the backoff schedule says stop.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::sync::Arc;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::config::EeveConfig;
use crate::http::{Request, Response};
use crate::transport::{Transport, TransportError};

use super::classify::{ErrorClass, ErrorClassifier};
use super::outcome::{Outcome, Termination};
use super::policy::Limited;
use super::verdict::{Conditioner, StatusConditioner, Verdict};

/// HTTP client decorator that retries through a backoff schedule.
///
/// `B` is a template: every logical call clones it and resets the clone, so
/// concurrent calls never share backoff state or attempt counters. The
/// schedule alone bounds retries; the client has no cap of its own.
#[derive(Debug, Clone)]
pub struct BackoffClient<T, B, C> {
    transport: Arc<T>,
    backoff: B,
    conditioner: C,
    errors: ErrorClassifier,
}

impl<T, B, C> BackoffClient<T, B, C>
where
    T: Transport,
    B: Backoff + Clone,
    C: Conditioner,
{
    pub fn new(transport: T, backoff: B, conditioner: C) -> Self {
        Self {
            transport: Arc::new(transport),
            backoff,
            conditioner,
            errors: ErrorClassifier::default(),
        }
    }

    /// Replace the transport error classifier (default: structured kinds + `"EOF"` marker).
    pub fn with_error_classifier(mut self, errors: ErrorClassifier) -> Self {
        self.errors = errors;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn error_classifier(&self) -> &ErrorClassifier {
        &self.errors
    }

    /// Run one logical call, blocking the current thread during backoff waits.
    pub fn execute(&self, request: &Request) -> Outcome {
        self.execute_blocking(request, None)
    }

    /// Like [`execute`](Self::execute), but a cancelled token ends the
    /// current backoff wait early with [`RetryError::Cancelled`](super::RetryError::Cancelled).
    pub fn execute_cancellable(&self, request: &Request, cancel: &CancelToken) -> Outcome {
        self.execute_blocking(request, Some(cancel))
    }

    fn execute_blocking(&self, request: &Request, cancel: Option<&CancelToken>) -> Outcome {
        let mut call = self.start_call();
        loop {
            call.attempts += 1;
            tracing::debug!(
                attempt = call.attempts,
                method = %request.method(),
                url = %request.url(),
                "sending request"
            );
            let result = self.transport.send(request);
            match call.settle(result, &self.errors, &self.conditioner) {
                Next::Finish(outcome) => return outcome,
                Next::Wait(delay) => match cancel {
                    Some(token) => {
                        if token.wait_timeout(delay) {
                            return call.cancelled();
                        }
                    }
                    None => std::thread::sleep(delay),
                },
            }
        }
    }

    fn start_call(&self) -> Call<B> {
        let mut backoff = self.backoff.clone();
        backoff.reset();
        Call {
            backoff,
            attempts: 0,
            last_response: None,
        }
    }
}

impl<T, B, C> BackoffClient<T, B, C>
where
    T: Transport + Send + Sync + 'static,
    B: Backoff + Clone,
    C: Conditioner,
{
    /// Run one logical call on a tokio runtime.
    ///
    /// Each transport call runs on the blocking pool and backoff waits are
    /// `tokio::time::sleep`, so other tasks keep running. With a token, a
    /// cancel during a wait ends the call promptly.
    pub async fn execute_async(&self, request: &Request, cancel: Option<&CancelToken>) -> Outcome {
        let mut call = self.start_call();
        loop {
            call.attempts += 1;
            tracing::debug!(
                attempt = call.attempts,
                method = %request.method(),
                url = %request.url(),
                "sending request"
            );
            let transport = Arc::clone(&self.transport);
            let req = request.clone();
            let result = match tokio::task::spawn_blocking(move || transport.send(&req)).await {
                Ok(result) => result,
                Err(e) => Err(TransportError::other(format!("transport task failed: {}", e))),
            };
            match call.settle(result, &self.errors, &self.conditioner) {
                Next::Finish(outcome) => return outcome,
                Next::Wait(delay) => match cancel {
                    Some(token) => {
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = token.cancelled() => return call.cancelled(),
                        }
                    }
                    None => tokio::time::sleep(delay).await,
                },
            }
        }
    }
}

impl<T: Transport> BackoffClient<T, Limited<ExponentialBackoff>, StatusConditioner> {
    /// Client whose schedule, status policy and error markers come from configuration.
    pub fn from_config(transport: T, cfg: &EeveConfig) -> Self {
        BackoffClient::new(transport, cfg.backoff.build(), cfg.classify.conditioner())
            .with_error_classifier(cfg.classify.error_classifier())
    }
}

/// Retries 5xx, accepts 2xx, rejects everything else permanently, on the
/// `backoff` crate's default exponential schedule (15 minutes max elapsed).
pub fn default_5xx<T: Transport>(
    transport: T,
) -> BackoffClient<T, ExponentialBackoff, StatusConditioner> {
    BackoffClient::new(
        transport,
        ExponentialBackoff::default(),
        StatusConditioner::default(),
    )
}

enum Next {
    Finish(Outcome),
    Wait(Duration),
}

/// State owned by one logical call.
struct Call<B> {
    backoff: B,
    attempts: u32,
    last_response: Option<Response>,
}

impl<B: Backoff> Call<B> {
    /// Classify the latest attempt and decide whether to stop or wait.
    fn settle<C: Conditioner>(
        &mut self,
        result: Result<Response, TransportError>,
        errors: &ErrorClassifier,
        conditioner: &C,
    ) -> Next {
        match result {
            Err(err) => match errors.classify(&err) {
                ErrorClass::Permanent => {
                    tracing::debug!(
                        attempt = self.attempts,
                        kind = ?err.kind(),
                        "permanent transport error: {}",
                        err
                    );
                    Next::Finish(Outcome::failed(err, self.attempts, Termination::Permanent))
                }
                ErrorClass::Retry => match self.backoff.next_backoff() {
                    Some(delay) => {
                        tracing::warn!(
                            attempt = self.attempts,
                            delay_ms = delay.as_millis() as u64,
                            "retrying after transport error: {}",
                            err
                        );
                        self.last_response = None;
                        Next::Wait(delay)
                    }
                    None => {
                        tracing::debug!(
                            attempts = self.attempts,
                            "backoff exhausted after transport error: {}",
                            err
                        );
                        Next::Finish(Outcome::failed(err, self.attempts, Termination::Exhausted))
                    }
                },
            },
            Ok(response) => match conditioner.classify(&response) {
                Verdict::Accept => {
                    tracing::debug!(
                        attempts = self.attempts,
                        status = response.status(),
                        "response accepted"
                    );
                    Next::Finish(Outcome::accepted(response, self.attempts))
                }
                Verdict::Permanent(rejection) => {
                    tracing::debug!(
                        attempt = self.attempts,
                        status = response.status(),
                        "response rejected: {}",
                        rejection
                    );
                    Next::Finish(Outcome::rejected(
                        response,
                        rejection,
                        self.attempts,
                        Termination::Permanent,
                    ))
                }
                Verdict::Retry(rejection) => match self.backoff.next_backoff() {
                    Some(delay) => {
                        tracing::warn!(
                            attempt = self.attempts,
                            status = response.status(),
                            delay_ms = delay.as_millis() as u64,
                            "retrying rejected response: {}",
                            rejection
                        );
                        self.last_response = Some(response);
                        Next::Wait(delay)
                    }
                    None => {
                        tracing::debug!(
                            attempts = self.attempts,
                            status = response.status(),
                            "backoff exhausted: {}",
                            rejection
                        );
                        Next::Finish(Outcome::rejected(
                            response,
                            rejection,
                            self.attempts,
                            Termination::Exhausted,
                        ))
                    }
                },
            },
        }
    }

    fn cancelled(&mut self) -> Outcome {
        tracing::debug!(attempts = self.attempts, "cancelled during backoff wait");
        Outcome::cancelled(self.last_response.take(), self.attempts)
    }
}
