//! Minimal HTTP/1.1 server that replays a script of replies for integration tests.
//!
//! Connection N (0-based) gets `script[N]`; once the script runs out the last
//! entry repeats. Every reply closes the connection so each attempt is a new
//! connection and a new script step.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub enum Reply {
    /// Respond with this status and a short body.
    Status(u16),
    /// Read the request, then close without answering (client sees an empty reply).
    Close,
    /// Read the request, then hold the connection open without answering.
    Stall(Duration),
}

/// A request as received by the server.
#[derive(Debug, Clone)]
pub struct Received {
    pub method: String,
    pub path: String,
    pub head: String,
    pub body: Vec<u8>,
}

pub struct StatusServer {
    /// Base URL, e.g. "http://127.0.0.1:12345/".
    pub url: String,
    hits: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<Received>>>,
}

impl StatusServer {
    /// Number of requests that reached the server.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start(script: Vec<Reply>) -> StatusServer {
    assert!(!script.is_empty(), "script must have at least one reply");
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let script = Arc::new(script);
    let hits = Arc::new(AtomicUsize::new(0));
    let received = Arc::new(Mutex::new(Vec::new()));
    {
        let hits = Arc::clone(&hits);
        let received = Arc::clone(&received);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let script = Arc::clone(&script);
                let hits = Arc::clone(&hits);
                let received = Arc::clone(&received);
                thread::spawn(move || handle(stream, &script, &hits, &received));
            }
        });
    }
    StatusServer {
        url: format!("http://127.0.0.1:{}/", port),
        hits,
        received,
    }
}

fn handle(
    mut stream: TcpStream,
    script: &[Reply],
    hits: &AtomicUsize,
    received: &Mutex<Vec<Received>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let request = match read_request(&mut stream) {
        Some(r) => r,
        None => return,
    };
    received.lock().unwrap().push(request);
    let n = hits.fetch_add(1, Ordering::SeqCst);
    let reply = script[n.min(script.len() - 1)];
    match reply {
        Reply::Status(code) => {
            let body = format!("status {}", code);
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nX-Attempt: {}\r\nConnection: close\r\n\r\n{}",
                code,
                reason(code),
                body.len(),
                n + 1,
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
        Reply::Close => {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        Reply::Stall(d) => {
            thread::sleep(d);
        }
    }
}

/// Reads the request head and (if `Content-Length` says so) the body.
fn read_request(stream: &mut TcpStream) -> Option<Received> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return None,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("").to_string();
    let path = first.next().unwrap_or("").to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = buf[head_end..].to_vec();
    while body.len() < content_length {
        let n = match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        body.extend_from_slice(&chunk[..n]);
    }
    Some(Received {
        method,
        path,
        head,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn reason(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
