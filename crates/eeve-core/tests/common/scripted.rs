//! In-memory transport that replays a fixed sequence of results.

#![allow(dead_code)]

use eeve_core::http::{Request, Response};
use eeve_core::retry::Backoff;
use eeve_core::transport::{Transport, TransportError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Replays `results` in order; panics if called more often than scripted.
pub struct Scripted {
    results: Mutex<VecDeque<Result<Response, TransportError>>>,
    calls: AtomicU32,
}

impl Scripted {
    pub fn new(results: Vec<Result<Response, TransportError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            calls: AtomicU32::new(0),
        }
    }

    /// Convenience: a script of plain status codes.
    pub fn statuses(codes: &[u16]) -> Self {
        Self::new(codes.iter().map(|c| Ok(Response::new(*c))).collect())
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> usize {
        self.results.lock().unwrap().len()
    }
}

impl Transport for Scripted {
    fn send(&self, _request: &Request) -> Result<Response, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .expect("transport called more often than scripted")
    }
}

/// Backoff that hands out `n` zero delays, then stops.
#[derive(Debug, Clone)]
pub struct Retries {
    left: u32,
    total: u32,
}

impl Retries {
    pub fn new(n: u32) -> Self {
        Self { left: n, total: n }
    }
}

impl Backoff for Retries {
    fn reset(&mut self) {
        self.left = self.total;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.left == 0 {
            return None;
        }
        self.left -= 1;
        Some(Duration::ZERO)
    }
}
