// Copyright 2025 Janek Bevendorff
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Record body handling policies.

use std::io::BufRead;

use crate::error::{Error, Result};
use crate::header::{parse_http_header_block, HeaderEncoding, HeaderMap};
use crate::record::is_http;
use crate::scanner::LineScanner;
use crate::value;

/// How a record body is consumed.
///
/// Implementations must consume exactly `length` bytes from `input`, even if
/// those bytes cannot be decoded. An error makes the reader discard the
/// record and resync.
pub trait Content: Default {
    /// Consume the body of a record with the given WARC headers.
    fn read_content<R: BufRead>(
        &mut self,
        input: &mut LineScanner<R>,
        headers: &HeaderMap,
        length: u64,
    ) -> Result<()>;

    /// Drop any state from a previous record.
    fn clear(&mut self);
}

/// Metadata-only body policy. The body is skipped without being buffered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoContent;

impl Content for NoContent {
    fn read_content<R: BufRead>(
        &mut self,
        input: &mut LineScanner<R>,
        _headers: &HeaderMap,
        length: u64,
    ) -> Result<()> {
        input.skip(length)
    }

    fn clear(&mut self) {}
}

/// Raw body bytes.
impl Content for Vec<u8> {
    fn read_content<R: BufRead>(
        &mut self,
        input: &mut LineScanner<R>,
        _headers: &HeaderMap,
        length: u64,
    ) -> Result<()> {
        *self = input.read_exact(length)?;
        Ok(())
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }
}

/// Body with the embedded HTTP message parsed.
///
/// Records whose WARC `Content-Type` is not `application/http` keep their
/// whole body as payload and have no HTTP headers.
#[derive(Debug, Clone, Default)]
pub struct HttpContent {
    http_headers: Option<HeaderMap>,
    http_charset: Option<String>,
    payload: Vec<u8>,
}

impl HttpContent {
    /// HTTP headers if the record is an HTTP record.
    pub fn http_headers(&self) -> Option<&HeaderMap> {
        self.http_headers.as_ref()
    }

    /// Whether the body contained an HTTP message.
    pub fn is_http(&self) -> bool {
        self.http_headers.is_some()
    }

    /// HTTP status code of a response.
    pub fn status_code(&self) -> Option<u16> {
        self.http_headers.as_ref()?.status_code()
    }

    /// Plain HTTP Content-Type without additional fields such as `charset=`.
    pub fn http_content_type(&self) -> Option<String> {
        let content_type = self.http_headers.as_ref()?.get_ignore_case("Content-Type")?;
        Some(value::extract_mime(content_type))
    }

    /// HTTP charset as returned by the server, lower-cased.
    pub fn http_charset(&self) -> Option<&str> {
        self.http_charset.as_deref()
    }

    /// Body after the HTTP headers (or the whole body for non-HTTP records).
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl Content for HttpContent {
    fn read_content<R: BufRead>(
        &mut self,
        input: &mut LineScanner<R>,
        headers: &HeaderMap,
        length: u64,
    ) -> Result<()> {
        let offset = input.position();
        let mut body = input.read_exact(length)?;
        if !is_http(headers) {
            self.payload = body;
            return Ok(());
        }

        let mut http_headers = HeaderMap::new(HeaderEncoding::Latin1);
        let consumed = parse_http_header_block(&body, &mut http_headers)
            .ok_or_else(|| Error::content_decode(offset, "unterminated HTTP header block"))?;
        if !http_headers.status_line().contains("HTTP/") {
            return Err(Error::content_decode(
                offset,
                format!("not an HTTP message: '{}'", http_headers.status_line()),
            ));
        }

        self.http_charset = http_headers
            .get_ignore_case("Content-Type")
            .map(value::extract_charset)
            .filter(|charset| !charset.is_empty());
        self.http_headers = Some(http_headers);
        self.payload = body.split_off(consumed);
        Ok(())
    }

    fn clear(&mut self) {
        self.http_headers = None;
        self.http_charset = None;
        self.payload.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scanner(data: &[u8]) -> LineScanner<Cursor<Vec<u8>>> {
        LineScanner::new(Cursor::new(data.to_vec()))
    }

    fn http_record_headers() -> HeaderMap {
        let mut headers = HeaderMap::default();
        headers.set("Content-Type", "application/http; msgtype=response");
        headers
    }

    #[test]
    fn test_no_content_skips_body() {
        let mut input = scanner(b"0123456789\r\n");
        let mut content = NoContent;
        content.read_content(&mut input, &HeaderMap::default(), 10).unwrap();
        assert_eq!(input.position(), 10);
        assert!(content.read_content(&mut input, &HeaderMap::default(), 10).is_err());
    }

    #[test]
    fn test_raw_content() {
        let mut input = scanner(b"hello\r\n");
        let mut content: Vec<u8> = Vec::new();
        content.read_content(&mut input, &HeaderMap::default(), 5).unwrap();
        assert_eq!(content, b"hello");
        Content::clear(&mut content);
        assert!(content.is_empty());
    }

    #[test]
    fn test_http_content() {
        let body = b"HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=UTF-8\r\n\r\n<p>hi</p>";
        let mut input = scanner(body);
        let mut content = HttpContent::default();
        content
            .read_content(&mut input, &http_record_headers(), body.len() as u64)
            .unwrap();
        assert!(content.is_http());
        assert_eq!(content.status_code(), Some(200));
        assert_eq!(content.http_content_type().as_deref(), Some("text/html"));
        assert_eq!(content.http_charset(), Some("utf-8"));
        assert_eq!(content.payload(), b"<p>hi</p>");
    }

    #[test]
    fn test_http_content_non_http_record() {
        let mut input = scanner(b"software: test\r\n");
        let mut headers = HeaderMap::default();
        headers.set("Content-Type", "application/warc-fields");
        let mut content = HttpContent::default();
        content.read_content(&mut input, &headers, 16).unwrap();
        assert!(!content.is_http());
        assert_eq!(content.payload(), b"software: test\r\n");
    }

    #[test]
    fn test_http_content_decode_failure_consumes_body() {
        let body = b"garbage without header terminator";
        let mut input = scanner(body);
        let mut content = HttpContent::default();
        let err = content
            .read_content(&mut input, &http_record_headers(), body.len() as u64)
            .unwrap_err();
        assert!(matches!(err, Error::ContentDecode { offset: 0, .. }));
        assert_eq!(input.position(), body.len() as u64);
    }

    #[test]
    fn test_http_content_bad_status_line() {
        let body = b"SPDY nonsense\r\n\r\n";
        let mut input = scanner(body);
        let mut content = HttpContent::default();
        assert!(content
            .read_content(&mut input, &http_record_headers(), body.len() as u64)
            .is_err());
    }
}
