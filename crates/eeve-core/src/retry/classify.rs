//! Classify transport errors as retriable or permanent.

use crate::transport::{TransportError, TransportErrorKind};

/// Retry decision for a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient; try again if the backoff schedule allows.
    Retry,
    /// Surface immediately.
    Permanent,
}

/// Decides whether a [`TransportError`] is worth retrying.
///
/// Structured kinds come first: timeouts, temporary network errors and early
/// connection closes are retried. Only errors of kind
/// [`TransportErrorKind::Other`] fall through to the message heuristic, which
/// treats any configured end-of-stream marker in the message as an early close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClassifier {
    closed_markers: Vec<String>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::with_markers(["EOF"])
    }
}

impl ErrorClassifier {
    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            closed_markers: markers
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.is_empty())
                .collect(),
        }
    }

    /// Only structured kinds; error text is never inspected.
    pub fn structured_only() -> Self {
        Self {
            closed_markers: Vec::new(),
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.closed_markers
    }

    pub fn classify(&self, err: &TransportError) -> ErrorClass {
        match err.kind() {
            TransportErrorKind::Timeout
            | TransportErrorKind::Temporary
            | TransportErrorKind::ConnectionClosed => ErrorClass::Retry,
            TransportErrorKind::Other if self.looks_closed(err.message()) => ErrorClass::Retry,
            TransportErrorKind::Other => ErrorClass::Permanent,
        }
    }

    fn looks_closed(&self, message: &str) -> bool {
        self.closed_markers.iter().any(|m| message.contains(m.as_str()))
    }
}
