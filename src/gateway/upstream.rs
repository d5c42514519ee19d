//! Dispatching forwards to the identity server over HTTP/1.1
//!
//! Each forward opens a fresh connection, sends the rewritten request with
//! `Connection: close` and reads the complete response back.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::gateway::dispatch::{Dispatcher, ForwardRequest};
use crate::http::parser::find_headers_end;
use crate::http::headers::{header_value, Headers};
use crate::http::request::Method;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// Default buffer size for streaming
const BUFFER_SIZE: usize = 8192;

/// Upper bound for upstream response headers
const MAX_HEADER_SIZE: usize = 64 * 1024;

/// Hop-by-hop headers that must not cross the gateway
const HOP_BY_HOP: &[&str] = &[
    "Connection",
    "Keep-Alive",
    "Proxy-Connection",
    "Transfer-Encoding",
    "Upgrade",
    "TE",
    "Trailer",
];

/// Sends forwards to a single identity server.
pub struct UpstreamDispatcher {
    /// Identity server base URL (e.g., "http://localhost:8081")
    base_url: url::Url,

    /// Connection timeout duration
    connection_timeout: Duration,

    /// Request timeout duration
    request_timeout: Duration,
}

impl UpstreamDispatcher {
    pub fn new(
        base_url: &str,
        connection_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let base_url = url::Url::parse(base_url).context("Invalid upstream URL")?;
        if base_url.scheme() != "http" {
            anyhow::bail!("Unsupported upstream scheme: {}", base_url.scheme());
        }
        base_url.host_str().context("Upstream URL missing host")?;

        Ok(Self {
            base_url,
            connection_timeout,
            request_timeout,
        })
    }

    fn authority(&self) -> String {
        let host = self.base_url.host_str().unwrap_or("localhost");
        match self.base_url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Build HTTP request bytes to send upstream.
    ///
    /// The client's `Host` header is kept so the identity server sees the
    /// public host; it is only filled in when the client sent none.
    pub fn build_http_request(&self, request: &ForwardRequest) -> Vec<u8> {
        let mut buffer = Vec::new();

        let target = if request.target.is_empty() {
            "/"
        } else {
            &request.target
        };

        buffer.extend_from_slice(
            format!("{} {} HTTP/1.1\r\n", request.method, target).as_bytes()
        );

        let mut headers: Vec<(&str, String)> = request
            .headers
            .iter()
            .filter(|(k, _)| crosses_gateway(k))
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();

        if header_value(&request.headers, "Host").is_none() {
            headers.push(("Host", self.authority()));
        }
        if !request.body.is_empty() || request.method == Method::POST {
            headers.push(("Content-Length", request.body.len().to_string()));
        }
        headers.push(("Connection", "close".to_string()));

        for (key, value) in &headers {
            buffer.extend_from_slice(format!("{}: {}\r\n", key, value).as_bytes());
        }

        // End of headers
        buffer.extend_from_slice(b"\r\n");

        if !request.body.is_empty() {
            buffer.extend_from_slice(&request.body);
        }

        buffer
    }

    async fn send(&self, request: &ForwardRequest) -> Result<Response> {
        let addr = format!(
            "{}:{}",
            self.base_url.host_str().unwrap_or("localhost"),
            self.base_url.port_or_known_default().unwrap_or(80)
        );

        let stream = timeout(self.connection_timeout, TcpStream::connect(&addr))
            .await
            .context("Connection timeout")?
            .context("Failed to connect to identity server")?;

        tracing::trace!(upstream = %addr, "Connected to identity server");

        timeout(
            self.request_timeout,
            self.send_request_and_receive_response(stream, request),
        )
        .await
        .context("Request timeout")?
    }

    async fn send_request_and_receive_response(
        &self,
        mut stream: TcpStream,
        request: &ForwardRequest,
    ) -> Result<Response> {
        let request_bytes = self.build_http_request(request);
        stream.write_all(&request_bytes).await?;
        stream.flush().await?;

        read_http_response(&mut stream).await
    }
}

#[async_trait]
impl Dispatcher for UpstreamDispatcher {
    async fn dispatch(&self, request: ForwardRequest) -> Result<Response> {
        tracing::debug!(
            method = %request.method,
            path = %request.original_path,
            target = %request.target,
            "Dispatching forward"
        );
        self.send(&request).await
    }
}

/// False for hop-by-hop headers and the framing `Content-Length`, which the
/// gateway recomputes on each side.
fn crosses_gateway(name: &str) -> bool {
    !name.eq_ignore_ascii_case("Content-Length")
        && !HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Read a complete HTTP response from the identity server.
async fn read_http_response(stream: &mut TcpStream) -> Result<Response> {
    let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);

    loop {
        let n = stream.read_buf(&mut buffer).await?;

        if n == 0 {
            anyhow::bail!("Connection closed before complete response received");
        }

        if let Some(headers_end) = find_headers_end(&buffer) {
            let headers_bytes = buffer.split_to(headers_end + 4);
            let (status, headers) = parse_response_headers(&headers_bytes)?;

            let body = read_response_body(stream, &mut buffer, &headers).await?;

            let headers = headers
                .into_iter()
                .filter(|(k, _)| crosses_gateway(k))
                .collect();

            return Ok(ResponseBuilder::new(status)
                .headers(headers)
                .body(body)
                .build());
        }

        if buffer.len() > MAX_HEADER_SIZE {
            anyhow::bail!("Response headers too large");
        }
    }
}

fn parse_response_headers(headers_bytes: &[u8]) -> Result<(StatusCode, Headers)> {
    let headers_str = std::str::from_utf8(headers_bytes)
        .context("Invalid UTF-8 in response headers")?;

    let mut lines = headers_str.lines();

    let status_line = lines.next().context("Empty response")?;
    let parts: Vec<&str> = status_line.splitn(3, ' ').collect();

    if parts.len() < 2 {
        anyhow::bail!("Invalid status line: {}", status_line);
    }

    let status_code: u16 = parts[1].parse()
        .context("Invalid status code")?;

    let mut headers = Headers::new();
    for line in lines {
        if line.is_empty() {
            break;
        }

        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    Ok((StatusCode::from_u16(status_code), headers))
}

/// Read the response body: chunked, by Content-Length, or until close.
async fn read_response_body(
    stream: &mut TcpStream,
    buffer: &mut BytesMut,
    headers: &[(String, String)],
) -> Result<Vec<u8>> {
    let chunked = header_value(headers, "Transfer-Encoding")
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"));

    if chunked {
        read_to_close(stream, buffer).await?;
        return decode_chunked(buffer);
    }

    let Some(content_length) = header_value(headers, "Content-Length") else {
        read_to_close(stream, buffer).await?;
        return Ok(buffer.to_vec());
    };
    let content_length: usize = content_length
        .parse()
        .context("Invalid Content-Length in response")?;

    if content_length == 0 {
        return Ok(Vec::new());
    }

    let mut body = Vec::with_capacity(content_length);

    // Use existing buffer data first
    let from_buffer = buffer.len().min(content_length);
    body.extend_from_slice(&buffer[..from_buffer]);
    buffer.advance(from_buffer);

    let mut chunk = [0u8; BUFFER_SIZE];
    while body.len() < content_length {
        let to_read = (content_length - body.len()).min(BUFFER_SIZE);
        let n = stream.read(&mut chunk[..to_read]).await?;

        if n == 0 {
            anyhow::bail!("Connection closed before complete body received");
        }

        body.extend_from_slice(&chunk[..n]);
    }

    Ok(body)
}

async fn read_to_close(stream: &mut TcpStream, buffer: &mut BytesMut) -> Result<()> {
    loop {
        let n = stream.read_buf(buffer).await?;
        if n == 0 {
            return Ok(());
        }
    }
}

/// Decodes a complete chunked body. Trailers are discarded.
pub fn decode_chunked(raw: &[u8]) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let mut rest = raw;

    loop {
        let line_end = rest
            .windows(2)
            .position(|w| w == b"\r\n")
            .context("Truncated chunk size line")?;
        let size_line = std::str::from_utf8(&rest[..line_end]).context("Invalid chunk size line")?;
        let size_hex = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_hex, 16)
            .with_context(|| format!("Invalid chunk size: {}", size_hex))?;
        rest = &rest[line_end + 2..];

        if size == 0 {
            return Ok(body);
        }
        if rest.len() < size + 2 {
            anyhow::bail!("Truncated chunk");
        }

        body.extend_from_slice(&rest[..size]);
        rest = &rest[size + 2..];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_chunked_body() {
        let raw = b"4\r\nWiki\r\n5;ext=1\r\npedia\r\n0\r\n\r\n";
        assert_eq!(decode_chunked(raw).unwrap(), b"Wikipedia".to_vec());
    }

    #[test]
    fn truncated_chunk_is_an_error() {
        assert!(decode_chunked(b"a\r\nshort").is_err());
    }

    #[test]
    fn rejects_https_upstream() {
        let result = UpstreamDispatcher::new(
            "https://idp.example.org",
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }
}
