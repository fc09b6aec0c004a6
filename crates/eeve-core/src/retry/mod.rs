//! Retry and backoff.
//!
//! This module holds the two classifiers (transport errors and responses),
//! the engine that drives a transport against a backoff schedule, and the
//! [`Outcome`] that reports the final response, error and attempt count.
//! The backoff algorithm itself comes from the `backoff` crate; the engine
//! only asks it for the next delay.

mod classify;
mod error;
mod outcome;
mod policy;
mod run;
mod verdict;

pub use classify::{ErrorClass, ErrorClassifier};
pub use error::RetryError;
pub use outcome::{attempts, Outcome, Termination};
pub use policy::Limited;
pub use run::{default_5xx, BackoffClient};
pub use verdict::{Conditioner, Rejection, StatusConditioner, Verdict};

pub use backoff::backoff::Backoff;
pub use backoff::ExponentialBackoff;
