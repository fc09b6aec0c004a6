//! Terminal error of a retried call.

use crate::transport::TransportError;

use super::verdict::Rejection;

/// Why a logical call did not end with an accepted response.
///
/// Only the most recent attempt decides the error; diagnostics of earlier
/// attempts are dropped.
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    /// The transport failed (permanently, or retriably until the schedule ran out).
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The conditioner rejected the response (permanently, or until the schedule ran out).
    #[error(transparent)]
    Rejected(#[from] Rejection),
    /// A backoff wait was interrupted by the cancel token.
    #[error("request cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

impl RetryError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }

    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            RetryError::Transport(e) => Some(e),
            _ => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            RetryError::Rejected(r) => Some(r),
            _ => None,
        }
    }
}
