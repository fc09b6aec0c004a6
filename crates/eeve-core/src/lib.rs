//! eeve: an HTTP client decorator that retries failed or unsatisfactory
//! requests on an exponential-backoff schedule.
//!
//! The pieces, leaf to root:
//! - [`transport`]: the seam to the underlying HTTP client (libcurl by default).
//! - [`retry`]: error and response classification, the retry engine, and the
//!   [`Outcome`](retry::Outcome) that carries the attempt count back to the caller.
//! - [`cancel`]: a token that aborts a pending backoff wait.

pub mod config;
pub mod logging;

pub mod cancel;
pub mod http;
pub mod retry;
pub mod transport;
