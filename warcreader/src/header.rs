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


use std::collections::HashMap;
use std::io::BufRead;

use encoding::all::WINDOWS_1252;
use encoding::{DecoderTrap, Encoding};

use crate::error::{Error, Result};
use crate::scanner::LineScanner;

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum HeaderEncoding {
    Unicode,
    Latin1,
}

/// Dict-like type representing a WARC or HTTP header block.
///
/// Keys are case-sensitive and unique. Use [`HeaderMap::get_ignore_case`]
/// for HTTP-style lookups.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    encoding: HeaderEncoding,
    status_line: String,
    headers: HashMap<String, String>,
}

impl Default for HeaderMap {
    fn default() -> Self {
        Self::new(HeaderEncoding::Unicode)
    }
}

impl HeaderMap {
    /// Create a new header map with the specified encoding.
    ///
    /// # Arguments
    ///
    /// * `encoding` - Header source encoding
    pub fn new(encoding: HeaderEncoding) -> Self {
        HeaderMap {
            encoding,
            status_line: String::new(),
            headers: HashMap::new(),
        }
    }

    /// Get the header encoding.
    pub fn encoding(&self) -> HeaderEncoding {
        self.encoding
    }

    /// Decode raw header bytes according to the header encoding.
    pub fn decode(&self, byte_str: &[u8]) -> String {
        match self.encoding {
            HeaderEncoding::Unicode => String::from_utf8_lossy(byte_str).into_owned(),
            HeaderEncoding::Latin1 => WINDOWS_1252
                .decode(byte_str, DecoderTrap::Replace)
                .unwrap_or_else(|_| String::from_utf8_lossy(byte_str).into_owned()),
        }
    }

    /// Get the header status line (empty if there is none).
    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    /// Set status line contents.
    pub fn set_status_line(&mut self, status_line: impl Into<String>) {
        self.status_line = status_line.into();
    }

    /// HTTP status code (unset if header block is not an HTTP response header block).
    pub fn status_code(&self) -> Option<u16> {
        if !self.status_line.starts_with("HTTP/") {
            return None;
        }
        self.status_line.split(' ').nth(1)?.parse::<u16>().ok()
    }

    /// HTTP reason phrase.
    /// Returns None if the header block is not an HTTP header block or no reason phrase was given.
    pub fn reason_phrase(&self) -> Option<&str> {
        if !self.status_line.starts_with("HTTP/") {
            return None;
        }
        self.status_line.splitn(3, ' ').nth(2)
    }

    /// Get value for an exact header key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Get value for a header key, ignoring ASCII case.
    pub fn get_ignore_case(&self, key: &str) -> Option<&str> {
        self.get(key).or_else(|| {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_str())
        })
    }

    /// Check if a header key exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.headers.contains_key(key)
    }

    /// Insert new header and overwrite the existing value if the key already exists.
    ///
    /// Key and value are trimmed of surrounding whitespace.
    pub fn set(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) {
        self.headers.insert(
            key.as_ref().trim().to_string(),
            value.as_ref().trim().to_string(),
        );
    }

    /// Append header.
    ///
    /// If the key already exists, the new value is joined to the existing one with `","`.
    pub fn append(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) {
        let value = value.as_ref().trim();
        self.headers
            .entry(key.as_ref().trim().to_string())
            .and_modify(|v| {
                v.push(',');
                v.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    /// Extend the value of an existing header with a folded continuation line.
    fn add_continuation(&mut self, key: &str, value: &str) {
        if let Some(v) = self.headers.get_mut(key) {
            if !v.is_empty() {
                v.push(' ');
            }
            v.push_str(value.trim());
        }
    }

    /// Iterator of keys and values (in no particular order).
    pub fn items(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterator of header keys (in no particular order).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.headers.keys().map(String::as_str)
    }

    /// Get the number of headers.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Check if the header map is empty.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Clear all headers.
    pub fn clear(&mut self) {
        self.headers.clear();
        self.status_line.clear();
    }
}

/// Read a WARC header block up to and including the terminating blank line.
///
/// Each line is split at its first `:`; duplicate keys keep the last value.
/// A non-blank line without a `:` fails with [`Error::MalformedHeaderLine`].
pub fn read_header_block<R: BufRead>(
    input: &mut LineScanner<R>,
    target: &mut HeaderMap,
) -> Result<()> {
    loop {
        let offset = input.position();
        let line = input.read_line()?;
        if line.trim_ascii().is_empty() {
            return Ok(());
        }
        let Some(colon_pos) = line.iter().position(|&b| b == b':') else {
            let line = target.decode(line);
            return Err(Error::malformed_header_line(offset, line));
        };
        let key = target.decode(&line[..colon_pos]);
        let value = target.decode(&line[colon_pos + 1..]);
        target.set(key, value);
    }
}

/// Parse an HTTP header block from the start of `data`.
///
/// The first line is taken as the status (or request) line. Folded
/// continuation lines are joined to the previous header and lines without
/// a `:` are appended to it as well. Duplicate headers are joined with `","`.
///
/// Returns the number of bytes consumed including the terminating blank line,
/// or `None` if the block does not end inside `data`.
pub fn parse_http_header_block(data: &[u8], target: &mut HeaderMap) -> Option<usize> {
    let mut consumed = 0usize;
    let mut first_line = true;
    let mut last_key: Option<String> = None;

    for raw in data.split_inclusive(|&b| b == b'\n') {
        if raw.last() != Some(&b'\n') {
            return None;
        }
        consumed += raw.len();
        let line = raw.strip_suffix(b"\n").unwrap_or(raw);
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        if line.is_empty() {
            return Some(consumed);
        }

        if first_line {
            target.set_status_line(target.decode(line.trim_ascii()));
            first_line = false;
            continue;
        }

        let text = target.decode(line);
        if line[0].is_ascii_whitespace() {
            if let Some(key) = &last_key {
                target.add_continuation(key, &text);
            }
            continue;
        }

        match text.split_once(':') {
            Some((key, value)) => {
                let key = key.trim().to_string();
                target.append(&key, value);
                last_key = Some(key);
            }
            None => {
                // Invalid header, keep its content with the previous one
                if let Some(key) = &last_key {
                    target.add_continuation(key, &text);
                }
            }
        }
    }
    None
}
