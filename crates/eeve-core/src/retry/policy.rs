use backoff::backoff::Backoff;
use std::time::Duration;

/// Caps any backoff schedule at a maximum number of retries.
///
/// After `max_retries` delays have been handed out, `next_backoff` returns
/// `None`, so a call makes at most `max_retries + 1` attempts. Elapsed-time
/// limits stay with the inner schedule.
#[derive(Debug, Clone)]
pub struct Limited<B> {
    inner: B,
    max_retries: Option<u32>,
    used: u32,
}

impl<B> Limited<B> {
    pub fn new(inner: B, max_retries: Option<u32>) -> Self {
        Self {
            inner,
            max_retries,
            used: 0,
        }
    }

    pub fn unbounded(inner: B) -> Self {
        Self::new(inner, None)
    }

    pub fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: Backoff> Backoff for Limited<B> {
    fn reset(&mut self) {
        self.used = 0;
        self.inner.reset();
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if let Some(max) = self.max_retries {
            if self.used >= max {
                return None;
            }
            self.used += 1;
        }
        self.inner.next_backoff()
    }
}
