//! Attempt tracking: what a logical call ended with, and how many tries it took.

use serde::Serialize;

use crate::http::Response;
use crate::transport::TransportError;

use super::error::RetryError;
use super::verdict::Rejection;

/// How the engine stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The conditioner accepted a response.
    Accepted,
    /// Retriable failures until the backoff schedule said stop.
    Exhausted,
    /// A permanent transport error or a permanent rejection.
    Permanent,
    /// Cancelled during a backoff wait.
    Cancelled,
}

/// Result of one logical call: response and/or error plus the attempt count.
///
/// A response may accompany an error when the server answered but the
/// conditioner rejected it; the raw status and headers stay inspectable.
#[derive(Debug)]
pub struct Outcome {
    response: Option<Response>,
    error: Option<RetryError>,
    attempts: u32,
    termination: Termination,
}

impl Outcome {
    pub(crate) fn accepted(response: Response, attempts: u32) -> Self {
        Self {
            response: Some(response),
            error: None,
            attempts,
            termination: Termination::Accepted,
        }
    }

    pub(crate) fn rejected(
        response: Response,
        rejection: Rejection,
        attempts: u32,
        termination: Termination,
    ) -> Self {
        Self {
            response: Some(response),
            error: Some(RetryError::Rejected(rejection)),
            attempts,
            termination,
        }
    }

    pub(crate) fn failed(err: TransportError, attempts: u32, termination: Termination) -> Self {
        Self {
            response: None,
            error: Some(RetryError::Transport(err)),
            attempts,
            termination,
        }
    }

    pub(crate) fn cancelled(last_response: Option<Response>, attempts: u32) -> Self {
        Self {
            response: last_response,
            error: Some(RetryError::Cancelled { attempts }),
            attempts,
            termination: Termination::Cancelled,
        }
    }

    /// Final response, if the last attempt produced one.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn error(&self) -> Option<&RetryError> {
        self.error.as_ref()
    }

    /// Number of transport invocations made (always >= 1).
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Status of the final response, if any.
    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(Response::status)
    }

    pub fn into_parts(self) -> (Option<Response>, Option<RetryError>, u32) {
        (self.response, self.error, self.attempts)
    }

    /// Accepted response, or the terminal error (any attached response is dropped).
    pub fn into_result(self) -> Result<Response, RetryError> {
        match (self.response, self.error) {
            (_, Some(err)) => Err(err),
            (Some(resp), None) => Ok(resp),
            (None, None) => unreachable!("accepted outcome always carries a response"),
        }
    }
}

/// Attempt count of a previously returned outcome; 0 when there is none.
pub fn attempts(outcome: Option<&Outcome>) -> u32 {
    outcome.map_or(0, Outcome::attempts)
}
