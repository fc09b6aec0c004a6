//! Response classification: the caller's say on whether a response is good enough.

use crate::http::Response;
use std::fmt;

/// Diagnostic attached to a rejected response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Rejection {
    message: String,
}

impl Rejection {
    pub fn new(message: impl fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result of classifying a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Done; hand the response to the caller.
    Accept,
    /// Try again if the backoff schedule allows. The rejection is surfaced
    /// only when retries run out.
    Retry(Rejection),
    /// Stop now and surface the rejection with the response.
    Permanent(Rejection),
}

impl Verdict {
    /// Accept the response.
    pub fn ok() -> Self {
        Verdict::Accept
    }

    /// Retriable rejection. Pass `format_args!(..)` for a formatted message.
    pub fn retriable(message: impl fmt::Display) -> Self {
        Verdict::Retry(Rejection::new(message))
    }

    /// Non-retriable rejection. Pass `format_args!(..)` for a formatted message.
    pub fn permanent(message: impl fmt::Display) -> Self {
        Verdict::Permanent(Rejection::new(message))
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Verdict::Accept => None,
            Verdict::Retry(r) | Verdict::Permanent(r) => Some(r),
        }
    }
}

/// Decides what to do with a response that arrived without a transport error.
///
/// Must be pure: the same response always gets the same verdict, and the
/// response must not be retained past the call.
pub trait Conditioner {
    fn classify(&self, response: &Response) -> Verdict;
}

impl<F> Conditioner for F
where
    F: Fn(&Response) -> Verdict,
{
    fn classify(&self, response: &Response) -> Verdict {
        self(response)
    }
}

/// Default policy: 5xx retried, 2xx accepted, anything else permanent.
///
/// Extra status codes (e.g. 429 Too Many Requests) can be made retriable
/// with [`StatusConditioner::retry_on`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusConditioner {
    extra_retry: Vec<u16>,
}

impl StatusConditioner {
    pub fn retry_on(mut self, status: u16) -> Self {
        if !self.extra_retry.contains(&status) {
            self.extra_retry.push(status);
        }
        self
    }

    /// Whether `status` is classified as retriable.
    pub fn retries(&self, status: u16) -> bool {
        (500..600).contains(&status) || self.extra_retry.contains(&status)
    }
}

impl Conditioner for StatusConditioner {
    fn classify(&self, response: &Response) -> Verdict {
        let status = response.status();
        if self.retries(status) {
            return Verdict::retriable(format_args!("bad status code {}", status));
        }
        if response.is_success() {
            return Verdict::ok();
        }
        Verdict::permanent(format_args!("bad status code {}", status))
    }
}
