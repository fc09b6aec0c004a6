//! libcurl transport (easy interface via the `curl` crate).
//!
//! Blocking: one `Easy` handle per request, run on the calling thread. Call
//! from `spawn_blocking` if used from async code (the retry engine's async
//! path already does).

use crate::config::TransportConfig;
use crate::http::{parse, Method, Request, Response};
use std::str;
use std::time::Duration;

use super::{Transport, TransportError, TransportErrorKind};

/// Per-handle libcurl settings.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Whole-transfer deadline.
    pub timeout: Duration,
    pub follow_redirects: bool,
    pub max_redirects: u32,
    pub user_agent: Option<String>,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self::from(&TransportConfig::default())
    }
}

impl From<&TransportConfig> for CurlOptions {
    fn from(cfg: &TransportConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
            follow_redirects: cfg.follow_redirects,
            max_redirects: cfg.max_redirects,
            user_agent: cfg.user_agent.clone(),
        }
    }
}

/// [`Transport`] backed by libcurl.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    options: CurlOptions,
}

impl CurlTransport {
    pub fn new(options: CurlOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CurlOptions {
        &self.options
    }

    fn configure(&self, easy: &mut curl::easy::Easy, request: &Request) -> Result<(), curl::Error> {
        easy.url(request.url().as_str())?;
        easy.connect_timeout(self.options.connect_timeout)?;
        easy.timeout(self.options.timeout)?;
        easy.follow_location(self.options.follow_redirects)?;
        if self.options.follow_redirects {
            easy.max_redirections(self.options.max_redirects)?;
        }
        if let Some(agent) = &self.options.user_agent {
            easy.useragent(agent)?;
        }

        if let Some(body) = request.body_bytes() {
            easy.post(true)?;
            easy.post_fields_copy(body)?;
        }
        match request.method() {
            Method::Get if request.body_bytes().is_none() => easy.get(true)?,
            Method::Head => easy.nobody(true)?,
            Method::Post => {
                easy.post(true)?;
                if request.body_bytes().is_none() {
                    easy.post_field_size(0)?;
                }
            }
            other => easy.custom_request(other.as_str())?,
        }

        // Build curl list for custom headers (e.g. "Name: value").
        if !request.headers().is_empty() {
            let mut list = curl::easy::List::new();
            for (k, v) in request.headers() {
                list.append(&format!("{}: {}", k.trim(), v.trim()))?;
            }
            easy.http_headers(list)?;
        }
        Ok(())
    }
}

impl Transport for CurlTransport {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        let mut head_lines: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        self.configure(&mut easy, request).map_err(into_transport_error)?;

        {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        head_lines.push(s.trim_end().to_string());
                    }
                    true
                })
                .map_err(into_transport_error)?;
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(into_transport_error)?;
            transfer.perform().map_err(into_transport_error)?;
        }

        let code = easy.response_code().map_err(into_transport_error)?;
        let status = u16::try_from(code)
            .map_err(|_| TransportError::other(format!("invalid HTTP status {}", code)))?;
        tracing::trace!(
            method = %request.method(),
            url = %request.url(),
            status,
            bytes = body.len(),
            "curl transfer finished"
        );

        Ok(Response::from_parts(
            status,
            parse::parse_header_lines(&head_lines),
            body,
        ))
    }
}

/// Map a libcurl error code to a transport error kind.
pub fn classify_curl_error(e: &curl::Error) -> TransportErrorKind {
    if e.is_operation_timedout() {
        return TransportErrorKind::Timeout;
    }
    if e.is_couldnt_connect() {
        return TransportErrorKind::Temporary;
    }
    if e.is_got_nothing() || e.is_recv_error() || e.is_send_error() || e.is_partial_file() {
        return TransportErrorKind::ConnectionClosed;
    }
    TransportErrorKind::Other
}

fn into_transport_error(e: curl::Error) -> TransportError {
    TransportError::new(classify_curl_error(&e), e.to_string()).with_source(e)
}
