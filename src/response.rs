use std::io;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;

use crate::error::{Error, Result};

/// Buffered response sink owned by a [`crate::Context`].
///
/// Handlers write status, headers and body here; the transport turns the
/// finished value into a wire response. Nothing is flushed while the chain
/// runs, so a later handler may still replace what an earlier one wrote.
#[derive(Debug, Clone, Default)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    /// Create an empty `200 OK` response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Get a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<()> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::msg(format!("invalid value for header {name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(())
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    pub fn write_str(&mut self, text: &str) {
        self.body.extend_from_slice(text.as_bytes());
    }

    /// Drop any buffered body bytes, keeping status and headers.
    pub fn clear_body(&mut self) {
        self.body.clear();
    }

    /// Restore the empty `200 OK` state.
    pub fn reset(&mut self) {
        self.status = StatusCode::OK;
        self.headers.clear();
        self.body.clear();
    }

    /// Consume the response, returning its parts.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

impl io::Write for Response {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;
    use std::io::Write;

    #[test]
    fn test_response_defaults() {
        let res = Response::new();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().is_empty());
        assert!(res.body().is_empty());
    }

    #[test]
    fn test_response_write_and_reset() {
        let mut res = Response::new();
        res.set_status(StatusCode::CREATED);
        res.set_header(CONTENT_TYPE, "text/plain").unwrap();
        res.write_str("abc");
        write!(res, "{}", 123).unwrap();
        assert_eq!(res.body_string(), "abc123");
        assert_eq!(res.header("content-type"), Some("text/plain"));

        res.reset();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().is_empty());
        assert_eq!(res.body_string(), "");
    }

    #[test]
    fn test_response_rejects_invalid_header() {
        let mut res = Response::new();
        assert!(res.set_header(CONTENT_TYPE, "bad\nvalue").is_err());
    }
}
