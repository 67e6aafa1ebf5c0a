use std::{
    io::{self, Read, Write},
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    time::{Duration, Instant},
};

use thiserror::Error;
use url::Url;

const MAX_STATUS_LINE_BYTES: usize = 1024;
const MIN_IO_TIMEOUT: Duration = Duration::from_millis(1);

#[derive(Debug, Error)]
pub(crate) enum ProbeError {
    #[error("unsupported probe URL scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("probe URL has no host: {0}")]
    MissingHost(String),

    #[error("failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("no reachable address for {0}")]
    Unreachable(String),

    #[error("probe request timed out")]
    TimedOut,

    #[error("probe I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("malformed HTTP response: {0}")]
    MalformedResponse(String),
}

fn host_header(url: &Url, host: &str) -> String {
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

fn request_target(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

fn remaining(deadline: Instant) -> Result<Duration, ProbeError> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left < MIN_IO_TIMEOUT {
        return Err(ProbeError::TimedOut);
    }
    Ok(left)
}

fn connect(addrs: &[SocketAddr], host: &str, deadline: Instant) -> Result<TcpStream, ProbeError> {
    let mut last_error = None;
    for address in addrs {
        match TcpStream::connect_timeout(address, remaining(deadline)?) {
            Ok(stream) => return Ok(stream),
            Err(error) => last_error = Some(error),
        }
    }
    match last_error {
        Some(error) if error.kind() == io::ErrorKind::TimedOut => Err(ProbeError::TimedOut),
        Some(error) => Err(ProbeError::Io(error)),
        None => Err(ProbeError::Unreachable(host.to_string())),
    }
}

fn parse_status_code(status_line: &str) -> Result<u16, ProbeError> {
    let mut parts = status_line.split_whitespace();
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(ProbeError::MalformedResponse(status_line.to_string()));
    }
    parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .filter(|code| (100..1000).contains(code))
        .ok_or_else(|| ProbeError::MalformedResponse(status_line.to_string()))
}

/// Sends one `GET` to `url` and returns the response status. Any well-formed
/// HTTP response counts, whatever its status. Connect, write and read are
/// bounded by `timeout`; name resolution blocks on the system resolver, and an
/// attempt whose resolve overran the deadline fails with `TimedOut`.
pub(crate) fn probe_http(url: &Url, timeout: Duration) -> Result<u16, ProbeError> {
    if url.scheme() != "http" {
        return Err(ProbeError::UnsupportedScheme(url.scheme().to_string()));
    }
    let host = url
        .host_str()
        .ok_or_else(|| ProbeError::MissingHost(url.to_string()))?;
    let port = url.port_or_known_default().unwrap_or(80);
    let deadline = Instant::now() + timeout;

    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ProbeError::Resolve {
            host: host.to_string(),
            source,
        })?
        .collect::<Vec<_>>();
    remaining(deadline)?;
    let mut stream = connect(&addrs, host, deadline)?;

    stream.set_write_timeout(Some(remaining(deadline)?))?;
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nUser-Agent: sample-manager-desktop\r\nAccept: */*\r\nConnection: close\r\n\r\n",
        request_target(url),
        host_header(url, host)
    );
    stream.write_all(request.as_bytes()).map_err(map_timeout)?;

    let mut received = Vec::with_capacity(256);
    let mut chunk = [0_u8; 256];
    loop {
        stream.set_read_timeout(Some(remaining(deadline)?))?;
        let read = stream.read(&mut chunk).map_err(map_timeout)?;
        if read == 0 {
            break;
        }
        received.extend_from_slice(&chunk[..read]);
        if received.windows(2).any(|window| window == b"\r\n")
            || received.len() >= MAX_STATUS_LINE_BYTES
        {
            break;
        }
    }

    let text = String::from_utf8_lossy(&received);
    let status_line = text.split("\r\n").next().unwrap_or_default();
    if status_line.is_empty() {
        return Err(ProbeError::MalformedResponse(
            "connection closed before status line".to_string(),
        ));
    }
    parse_status_code(status_line)
}

fn map_timeout(error: io::Error) -> ProbeError {
    match error.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ProbeError::TimedOut,
        _ => ProbeError::Io(error),
    }
}
