use crate::http::headers::{header_value, Headers};
use crate::http::request::{Method, Request};

#[derive(Debug)]
pub enum ParseError {
    InvalidRequest,
    InvalidMethod,
    InvalidHeader,
    InvalidContentLength,
    UnsupportedTransferEncoding,
    Incomplete,
}

pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {

    // Look for header/body separator
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let header_bytes = &buf[..headers_end];
    let body_bytes = &buf[headers_end + 4..];

    let headers_str = std::str::from_utf8(header_bytes)
        .map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let target = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    if !target.starts_with('/') || !version.starts_with("HTTP/") {
        return Err(ParseError::InvalidRequest);
    }

    let method = Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;

    // Headers
    let mut headers = Headers::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line
            .split_once(':')
            .ok_or(ParseError::InvalidHeader)?;

        headers.push((key.trim().to_string(), value.trim().to_string()));
    }

    // Chunked bodies are not forwarded
    if header_value(&headers, "Transfer-Encoding")
        .is_some_and(|v| !v.eq_ignore_ascii_case("identity"))
    {
        return Err(ParseError::UnsupportedTransferEncoding);
    }

    // Body
    let content_length = header_value(&headers, "Content-Length")
        .map(|v| v.parse::<usize>().map_err(|_| ParseError::InvalidContentLength))
        .transpose()?
        .unwrap_or(0);

    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let body = body_bytes[..content_length].to_vec();

    let request = Request {
        method,
        target: target.to_string(),
        version: version.to_string(),
        headers,
        body,
    };

    let total_consumed = headers_end + 4 + content_length;
    Ok((request, total_consumed))

}

pub(crate) fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET /oidc/certs HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let (parsed, consumed) = parse_http_request(req).unwrap();

        assert_eq!(parsed.target, "/oidc/certs");
        assert_eq!(parsed.header("host").unwrap(), "example.com");
        assert_eq!(consumed, req.len());
    }

    #[test]
    fn lowercase_content_length_is_honoured() {
        let req = b"POST /oidc/token HTTP/1.1\r\ncontent-length: 3\r\n\r\nabcdef";

        let (parsed, consumed) = parse_http_request(req).unwrap();

        assert_eq!(parsed.body, b"abc".to_vec());
        assert_eq!(consumed, req.len() - 3);
    }

    #[test]
    fn repeated_headers_are_kept_in_order() {
        let req = b"GET /login HTTP/1.1\r\nCookie: a=1\r\nHost: idp\r\nCookie: b=2\r\n\r\n";

        let (parsed, _) = parse_http_request(req).unwrap();

        assert_eq!(
            parsed.headers,
            vec![
                ("Cookie".to_string(), "a=1".to_string()),
                ("Host".to_string(), "idp".to_string()),
                ("Cookie".to_string(), "b=2".to_string()),
            ]
        );
    }

    #[test]
    fn chunked_body_is_rejected() {
        let req = b"POST /oidc/token HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n";

        assert!(matches!(
            parse_http_request(req),
            Err(ParseError::UnsupportedTransferEncoding)
        ));
    }
}
