//! The transport seam: whatever actually sends a request.
//!
//! The retry engine only needs "send this request, give me a response or an
//! error". Transports report failures as [`TransportError`] with a structured
//! [`TransportErrorKind`] so the engine can classify them without looking at
//! error text.

mod libcurl;

pub use self::libcurl::{classify_curl_error, CurlOptions, CurlTransport};

use crate::http::{Request, Response};
use std::fmt;
use std::sync::Arc;

/// Sends one request and returns the response or a transport-level failure.
///
/// Implementations must be safe to call repeatedly with the same request; the
/// retry engine does not serialize access across logical calls.
pub trait Transport {
    fn send(&self, request: &Request) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        (**self).send(request)
    }
}

/// Adapter turning a closure into a [`Transport`]. See [`transport_fn`].
#[derive(Clone)]
pub struct FnTransport<F>(F);

impl<F> fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnTransport")
    }
}

impl<F> Transport for FnTransport<F>
where
    F: Fn(&Request) -> Result<Response, TransportError>,
{
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        (self.0)(request)
    }
}

/// Use a closure as a transport (handy for stubs and for wrapping other clients).
pub fn transport_fn<F>(f: F) -> FnTransport<F>
where
    F: Fn(&Request) -> Result<Response, TransportError>,
{
    FnTransport(f)
}

/// What kind of transport failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connect or transfer deadline passed.
    Timeout,
    /// Transient network condition (e.g. connection refused while a server restarts).
    Temporary,
    /// Peer closed the connection before a complete response arrived.
    ConnectionClosed,
    /// Anything else: bad URL, DNS failure, TLS setup, local errors.
    Other,
}

/// Failure raised by a transport before any response was obtained.
#[derive(Debug)]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    pub fn temporary(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Temporary, message)
    }

    pub fn closed(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::ConnectionClosed, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Other, message)
    }

    /// Attach the underlying error (e.g. the libcurl error) for `source()` chains.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }

    pub fn is_temporary(&self) -> bool {
        self.kind == TransportErrorKind::Temporary
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
