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


use std::io::BufRead;

use chrono::{DateTime, Utc};

use crate::content::{Content, NoContent};
use crate::error::Result;
use crate::header::{read_header_block, HeaderMap};
use crate::scanner::LineScanner;
use crate::value;

pub const RECORD_ID_HEADER: &str = "WARC-Record-ID";
pub const TYPE_HEADER: &str = "WARC-Type";
pub const DATE_HEADER: &str = "WARC-Date";
pub const CONTENT_LENGTH_HEADER: &str = "Content-Length";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// WARC record type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarcRecordType {
    WarcInfo = 2,
    Response = 4,
    Resource = 8,
    Request = 16,
    Metadata = 32,
    Revisit = 64,
    Conversion = 128,
    Continuation = 256,
    Unknown = 512,
    AnyType = 65535,
    NoType = 0,
}

impl WarcRecordType {
    /// Lower-case name as used in the `WARC-Type` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            WarcRecordType::WarcInfo => "warcinfo",
            WarcRecordType::Response => "response",
            WarcRecordType::Resource => "resource",
            WarcRecordType::Request => "request",
            WarcRecordType::Metadata => "metadata",
            WarcRecordType::Revisit => "revisit",
            WarcRecordType::Conversion => "conversion",
            WarcRecordType::Continuation => "continuation",
            _ => "unknown",
        }
    }

    /// Whether this type is set in a bitmask of OR-ed type values.
    pub fn matches_bitmask(&self, bitmask: u16) -> bool {
        (*self as u16) & bitmask != 0
    }
}

impl TryFrom<u16> for WarcRecordType {
    type Error = &'static str;

    fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
        match value {
            2 => Ok(WarcRecordType::WarcInfo),
            4 => Ok(WarcRecordType::Response),
            8 => Ok(WarcRecordType::Resource),
            16 => Ok(WarcRecordType::Request),
            32 => Ok(WarcRecordType::Metadata),
            64 => Ok(WarcRecordType::Revisit),
            128 => Ok(WarcRecordType::Conversion),
            256 => Ok(WarcRecordType::Continuation),
            512 => Ok(WarcRecordType::Unknown),
            65535 => Ok(WarcRecordType::AnyType),
            0 => Ok(WarcRecordType::NoType),
            _ => Err("Invalid enum value."),
        }
    }
}

impl TryFrom<&str> for WarcRecordType {
    type Error = &'static str;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "warcinfo" => Ok(WarcRecordType::WarcInfo),
            "response" => Ok(WarcRecordType::Response),
            "resource" => Ok(WarcRecordType::Resource),
            "request" => Ok(WarcRecordType::Request),
            "metadata" => Ok(WarcRecordType::Metadata),
            "revisit" => Ok(WarcRecordType::Revisit),
            "conversion" => Ok(WarcRecordType::Conversion),
            "continuation" => Ok(WarcRecordType::Continuation),
            "unknown" => Ok(WarcRecordType::Unknown),
            _ => Err("Invalid enum value."),
        }
    }
}

impl From<WarcRecordType> for &'static str {
    fn from(value: WarcRecordType) -> Self {
        value.as_str()
    }
}

/// A WARC record.
///
/// The record is generic over its body representation. With the default
/// [`NoContent`] only metadata is kept and the body is skipped.
///
/// Records are meant to be reused: every successful read replaces all fields.
#[derive(Debug, Clone)]
pub struct Record<C = NoContent> {
    id: String,
    warc_type: String,
    date: String,
    headers: HeaderMap,
    length: u64,
    stream_pos: Option<u64>,
    content: C,
}

impl<C: Content> Default for Record<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Content> Record<C> {
    /// Create a new empty WARC record.
    pub fn new() -> Self {
        Record {
            id: String::new(),
            warc_type: String::new(),
            date: String::new(),
            headers: HeaderMap::default(),
            length: 0,
            stream_pos: None,
            content: C::default(),
        }
    }

    /// Reset all fields to their empty state.
    pub fn clear(&mut self) {
        self.id.clear();
        self.warc_type.clear();
        self.date.clear();
        self.headers.clear();
        self.length = 0;
        self.stream_pos = None;
        self.content.clear();
    }

    /// Consume the body according to the content policy of this record.
    pub(crate) fn read_content<R: BufRead>(&mut self, input: &mut LineScanner<R>) -> Result<()> {
        self.content.read_content(input, &self.headers, self.length)
    }
}

impl<C> Record<C> {
    /// Record ID as 32 lowercase hex digits, empty if the
    /// `WARC-Record-ID` header is missing or not a UUID URN.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Verbatim value of the `WARC-Type` header.
    pub fn warc_type(&self) -> &str {
        &self.warc_type
    }

    /// Record type enum derived from [`Record::warc_type`].
    pub fn record_type(&self) -> WarcRecordType {
        if self.warc_type.is_empty() {
            return WarcRecordType::NoType;
        }
        WarcRecordType::try_from(self.warc_type.as_str()).unwrap_or(WarcRecordType::Unknown)
    }

    /// Verbatim value of the `WARC-Date` header.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// `WARC-Date` parsed as an RFC 3339 timestamp.
    pub fn date_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// WARC record headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Declared body length in bytes (`0` if `Content-Length` is missing or invalid).
    pub fn content_length(&self) -> u64 {
        self.length
    }

    /// Whether the record body is an HTTP message.
    pub fn is_http(&self) -> bool {
        is_http(&self.headers)
    }

    /// Offset of the version line in the stream, `None` if unknown.
    pub fn stream_pos(&self) -> Option<u64> {
        self.stream_pos
    }

    pub(crate) fn set_stream_pos(&mut self, pos: u64) {
        self.stream_pos = Some(pos);
    }

    /// Record body.
    pub fn content(&self) -> &C {
        &self.content
    }

    /// Take the record body.
    pub fn into_content(self) -> C {
        self.content
    }

    fn derive_fields(&mut self) {
        self.id = self
            .headers
            .get(RECORD_ID_HEADER)
            .and_then(value::parse_id)
            .unwrap_or_default();
        self.warc_type = self.headers.get(TYPE_HEADER).unwrap_or_default().to_string();
        self.date = self.headers.get(DATE_HEADER).unwrap_or_default().to_string();
        self.length = self
            .headers
            .get(CONTENT_LENGTH_HEADER)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
    }
}

pub(crate) fn is_http(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE_HEADER)
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/http"))
}

/// Parse the WARC header block into `record` and derive its ID, type, date
/// and length.
///
/// Missing or malformed derived headers leave the field at its default.
pub fn parse_headers<R: BufRead, C>(
    input: &mut LineScanner<R>,
    record: &mut Record<C>,
) -> Result<()> {
    read_header_block(input, &mut record.headers)?;
    record.derive_fields();
    Ok(())
}
