// LeGuardian Bracelet - Minimal HTTP/1.1 Client
//
// Plaintext request/response over one short-lived stream per call. Reads are
// bounded by an overall deadline and stop at either the status line or peer
// close, depending on what the call site needs. The stream is released on
// every exit path by `StreamGuard`.

use std::fmt::Write as _;
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::capabilities::{Connector, Stream};
use crate::config::{ServerConfig, CONNECT_TIMEOUT_MS, HTTP_RESPONSE_MAX};
use crate::error::TransportError;

/// Upper bound on a single blocking read so the deadline is re-checked.
const READ_SLICE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// How much of the response the caller needs before the stream may close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Stop as soon as a CRLF-terminated status line is buffered.
    StatusLine,
    /// Accumulate until the peer closes (or the deadline passes).
    UntilClose,
}

#[derive(Debug, Clone)]
pub struct Request<'a> {
    pub method: Method,
    pub path: &'a str,
    pub body: Option<&'a str>,
    /// Send the `X-Bracelet-ID` identification header.
    pub identify: bool,
    pub read_mode: ReadMode,
    pub timeout: Duration,
}

impl<'a> Request<'a> {
    pub fn get(path: &'a str) -> Self {
        Self {
            method: Method::Get,
            path,
            body: None,
            identify: true,
            read_mode: ReadMode::UntilClose,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn post(path: &'a str, body: &'a str) -> Self {
        Self {
            method: Method::Post,
            path,
            body: Some(body),
            identify: true,
            read_mode: ReadMode::UntilClose,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn read_mode(mut self, read_mode: ReadMode) -> Self {
        self.read_mode = read_mode;
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Duration::from_millis(ms);
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.identify = false;
        self
    }
}

/// Whatever was read before the stop condition, lossily decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    Accepted,
    Rejected,
}

impl Response {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// First line without its terminator; empty if none was received.
    pub fn status_line(&self) -> &str {
        self.raw.split("\r\n").next().unwrap_or_default()
    }

    pub fn status_code(&self) -> Option<u16> {
        let mut parts = self.status_line().split_whitespace();
        let version = parts.next()?;
        if !version.starts_with("HTTP/") {
            return None;
        }
        parts.next()?.parse().ok()
    }

    /// Everything after the header block, or the whole buffer when the header
    /// terminator never arrived.
    pub fn body(&self) -> &str {
        match self.raw.find("\r\n\r\n") {
            Some(i) => &self.raw[i + 4..],
            None => &self.raw,
        }
    }

    /// Heartbeat-style classification: the status line mentions 200 or 201.
    pub fn outcome(&self) -> StatusOutcome {
        let line = self.status_line();
        if self.raw.contains("\r\n") && (line.contains("200") || line.contains("201")) {
            StatusOutcome::Accepted
        } else {
            StatusOutcome::Rejected
        }
    }
}

/// Closes the wrapped stream when dropped.
struct StreamGuard<S: Stream>(S);

impl<S: Stream> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        self.0.close();
    }
}

pub struct HttpClient<C: Connector> {
    connector: C,
    server: ServerConfig,
}

impl<C: Connector> HttpClient<C> {
    pub fn new(connector: C, server: ServerConfig) -> Self {
        Self { connector, server }
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    /// Heartbeat-style call: the request succeeds when the status line does.
    pub fn send(&mut self, request: &Request<'_>) -> Result<StatusOutcome, TransportError> {
        self.exchange(request).map(|response| response.outcome())
    }

    pub fn exchange(&mut self, request: &Request<'_>) -> Result<Response, TransportError> {
        let stream = self.connector.connect(
            &self.server.host,
            self.server.port,
            Duration::from_millis(CONNECT_TIMEOUT_MS),
        )?;
        let mut guard = StreamGuard(stream);

        let head = self.request_head(request);
        guard.0.write_all(head.as_bytes())?;
        if let Some(body) = request.body {
            guard.0.write_all(body.as_bytes())?;
        }
        guard.0.flush()?;

        read_response(&mut guard.0, request.read_mode, request.timeout)
    }

    fn request_head(&self, request: &Request<'_>) -> String {
        let body_len = request.body.map_or(0, str::len);
        let mut head = String::with_capacity(192);
        let _ = write!(head, "{} {} HTTP/1.1\r\n", request.method.as_str(), request.path);
        let _ = write!(head, "Host: {}\r\n", self.server.host);
        head.push_str("Content-Type: application/json\r\n");
        let _ = write!(head, "Content-Length: {body_len}\r\n");
        if request.identify {
            let _ = write!(head, "X-Bracelet-ID: {}\r\n", self.server.device_id);
        }
        head.push_str("Connection: close\r\n\r\n");
        head
    }
}

fn read_response<S: Stream>(
    stream: &mut S,
    mode: ReadMode,
    timeout: Duration,
) -> Result<Response, TransportError> {
    let deadline = Instant::now() + timeout;
    let mut buf = Vec::with_capacity(256);
    let mut chunk = [0u8; 256];

    loop {
        let now = Instant::now();
        if now >= deadline {
            // A partial body is still useful to the full-body call sites.
            if mode == ReadMode::UntilClose && !buf.is_empty() {
                log::debug!("HTTP read deadline hit with {} bytes buffered", buf.len());
                break;
            }
            return Err(TransportError::Timeout(timeout.as_millis() as u64));
        }

        stream.set_read_timeout(Some((deadline - now).min(READ_SLICE)))?;
        match stream.read(&mut chunk) {
            Ok(0) => {
                if buf.is_empty() {
                    return Err(TransportError::Disconnected);
                }
                break;
            }
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if mode == ReadMode::StatusLine && buf.windows(2).any(|w| w == b"\r\n") {
                    break;
                }
                if buf.len() >= HTTP_RESPONSE_MAX {
                    buf.truncate(HTTP_RESPONSE_MAX);
                    break;
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted) => {}
            Err(e) => return Err(TransportError::Io(e)),
        }
    }

    if mode == ReadMode::StatusLine && !buf.windows(2).any(|w| w == b"\r\n") {
        return Err(TransportError::Disconnected);
    }

    Ok(Response::from_raw(String::from_utf8_lossy(&buf)))
}

// ---------------------------------------------------------------------------
// std::net transport (modem PPP link on the device, loopback on the host)
// ---------------------------------------------------------------------------

impl Stream for TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn close(&mut self) {
        let _ = self.shutdown(std::net::Shutdown::Both);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<TcpStream, TransportError> {
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|source| TransportError::Connect {
                host: host.into(),
                port,
                source,
            })?
            .next()
            .ok_or_else(|| TransportError::Resolve(host.into()))?;

        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|source| TransportError::Connect {
            host: host.into(),
            port,
            source,
        })?;
        stream.set_write_timeout(Some(timeout))?;
        Ok(stream)
    }
}
