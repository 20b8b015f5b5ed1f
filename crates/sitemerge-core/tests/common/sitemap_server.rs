//! Minimal HTTP/1.1 server for integration tests.
//!
//! Plays a script of replies, one per request; the last reply repeats once the
//! script is exhausted. Counts requests so tests can assert on retries.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond with a status and body.
    Status(u16, Vec<u8>),
    /// Accept the request and stay silent for this long (forces a client timeout).
    Hang(Duration),
}

impl Reply {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Reply::Status(200, body.into())
    }
}

pub struct SitemapServer {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl SitemapServer {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Serve `body` with 200 for every request.
pub fn start(body: impl Into<Vec<u8>>) -> SitemapServer {
    start_script(vec![Reply::ok(body)])
}

/// Serve `script` in order. Returns the sitemap URL (e.g. "http://127.0.0.1:12345/sitemap.xml").
pub fn start_script(script: Vec<Reply>) -> SitemapServer {
    assert!(!script.is_empty(), "script needs at least one reply");
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let script = Arc::new(script);
    let counter = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let reply = script[n.min(script.len() - 1)].clone();
            thread::spawn(move || handle(stream, reply));
        }
    });
    SitemapServer {
        url: format!("http://127.0.0.1:{}/sitemap.xml", port),
        hits,
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

fn handle(mut stream: TcpStream, reply: Reply) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(_) => {}
    }
    match reply {
        Reply::Hang(d) => thread::sleep(d),
        Reply::Status(status, body) => {
            let head = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                reason(status),
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
        }
    }
}
