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


//! Turning WARC records into CSV rows.

use std::fmt;
use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::{debug, trace};
use url::Url;
use warcreader::value;
use warcreader::{Content, HttpContent, NoContent, Record, WarcReader, WarcRecordType};

use crate::suffix::PublicSuffixList;

pub const TARGET_URI_HEADER: &str = "WARC-Target-URI";
pub const IP_ADDRESS_HEADER: &str = "WARC-IP-Address";

/// Columns written for every record.
pub const BASE_COLUMNS: &[&str] = &[
    "id",
    "url",
    "https",
    "hostname",
    "tld",
    "public suffix",
    "path depth",
    "pathsegment length",
];

/// Extra columns a body policy contributes to each row.
pub trait Columns: Content {
    /// Header names of the extra columns
    const EXTRA: &'static [&'static str];

    /// Extra column values for a record
    fn extra_columns(record: &Record<Self>, url: &str) -> Vec<String>;
}

impl Columns for NoContent {
    const EXTRA: &'static [&'static str] = &[];

    fn extra_columns(_record: &Record<Self>, _url: &str) -> Vec<String> {
        Vec::new()
    }
}

impl Columns for HttpContent {
    const EXTRA: &'static [&'static str] = &[
        "msgtype",
        "status",
        "mime",
        "charset",
        "server",
        "compression",
        "cdn",
        "ipv6",
    ];

    fn extra_columns(record: &Record<Self>, url: &str) -> Vec<String> {
        let http = record.content().http_headers();
        let http_header = |key: &str| {
            http.and_then(|h| h.get_ignore_case(key))
                .unwrap_or_default()
        };
        let warc_header = |key: &str| record.headers().get(key).unwrap_or_default();

        vec![
            value::extract_warc_msgtype(warc_header("Content-Type")),
            record
                .content()
                .status_code()
                .map(|code| code.to_string())
                .unwrap_or_default(),
            record.content().http_content_type().unwrap_or_default(),
            value::canonicalize_charset(record.content().http_charset().unwrap_or_default()),
            value::canonicalize_server(http_header("Server")),
            flag(value::uses_compression(http_header("Content-Encoding"))),
            flag(value::check_cdn(url)),
            flag(value::is_ipv6(warc_header(IP_ADDRESS_HEADER))),
        ]
    }
}

fn flag(value: bool) -> String {
    String::from(if value { "1" } else { "0" })
}

/// Why a record produced no row.
#[derive(Debug)]
pub enum Ignored {
    FilteredType(WarcRecordType),
    MissingTargetUri,
    InvalidUri(url::ParseError),
}

impl fmt::Display for Ignored {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ignored::FilteredType(t) => write!(f, "record type '{}' filtered", t.as_str()),
            Ignored::MissingTargetUri => write!(f, "no {} header", TARGET_URI_HEADER),
            Ignored::InvalidUri(e) => write!(f, "invalid target URI: {}", e),
        }
    }
}

/// URL metadata of a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMetadata {
    pub id: String,
    pub url: String,
    pub https: bool,
    pub hostname: String,
    pub tld: String,
    pub public_suffix: String,
    pub path_depth: u8,
    pub path_segment_length: u16,
}

impl UrlMetadata {
    /// Decompose the target URI of a record.
    pub fn from_record<C>(
        record: &Record<C>,
        suffixes: &PublicSuffixList,
    ) -> std::result::Result<Self, Ignored> {
        let target = record
            .headers()
            .get(TARGET_URI_HEADER)
            .ok_or(Ignored::MissingTargetUri)?;
        let url = Url::parse(target).map_err(Ignored::InvalidUri)?;
        let hostname = url.host_str().unwrap_or_default().to_string();

        let mut path_etc = url.path().to_string();
        if let Some(query) = url.query() {
            path_etc.push('?');
            path_etc.push_str(query);
        }
        if let Some(fragment) = url.fragment() {
            path_etc.push('#');
            path_etc.push_str(fragment);
        }

        Ok(UrlMetadata {
            id: record.id().to_string(),
            url: target.to_string(),
            https: url.scheme() == "https",
            tld: value::extract_tld(&hostname),
            public_suffix: suffixes.suffix(&hostname),
            path_depth: value::extract_path_depth(url.path()),
            path_segment_length: path_etc.len().min(u16::MAX as usize) as u16,
            hostname,
        })
    }

    /// Base column values in [`BASE_COLUMNS`] order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.url.clone(),
            flag(self.https),
            self.hostname.clone(),
            self.tld.clone(),
            self.public_suffix.clone(),
            self.path_depth.to_string(),
            self.path_segment_length.to_string(),
        ]
    }
}

/// Run statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub processed: u64,
    pub ignored: u64,
    pub skipped: u64,
}

/// Writes one CSV row per WARC record.
pub struct Extractor<'a, W: Write> {
    csv: csv::Writer<W>,
    suffixes: &'a PublicSuffixList,
    type_mask: u16,
}

impl<'a, W: Write> Extractor<'a, W> {
    pub fn new(output: W, suffixes: &'a PublicSuffixList) -> Self {
        Extractor {
            csv: csv::Writer::from_writer(output),
            suffixes,
            type_mask: WarcRecordType::AnyType as u16,
        }
    }

    /// Only emit rows for records of the given types (all types if empty).
    pub fn record_types(mut self, types: &[WarcRecordType]) -> Self {
        if !types.is_empty() {
            self.type_mask = types.iter().fold(0, |mask, t| mask | *t as u16);
        }
        self
    }

    /// Write the column header row.
    pub fn write_header<C: Columns>(&mut self) -> Result<()> {
        self.csv
            .write_record(BASE_COLUMNS.iter().chain(C::EXTRA))
            .context("failed to write CSV header")
    }

    /// Extract all remaining records of `reader`.
    pub fn process<R: BufRead, C: Columns>(&mut self, reader: &mut WarcReader<R>) -> Result<Stats> {
        let mut stats = Stats::default();
        let mut record: Record<C> = Record::new();

        while reader.read(&mut record).context("failed to read WARC stream")? {
            trace!(
                "{}, {}, {} bytes, {}",
                record.id(),
                record.date(),
                record.content_length(),
                record.headers().get("Content-Type").unwrap_or_default()
            );

            match self.row(&record) {
                Ok(row) => {
                    self.csv.write_record(&row).context("failed to write CSV row")?;
                    stats.processed += 1;
                }
                Err(reason) => {
                    debug!("Ignoring record {}: {}", record.id(), reason);
                    stats.ignored += 1;
                }
            }
        }
        self.csv.flush().context("failed to flush CSV output")?;

        stats.skipped = reader.skipped_records();
        Ok(stats)
    }

    fn row<C: Columns>(&self, record: &Record<C>) -> std::result::Result<Vec<String>, Ignored> {
        let record_type = record.record_type();
        if !record_type.matches_bitmask(self.type_mask) {
            return Err(Ignored::FilteredType(record_type));
        }
        let metadata = UrlMetadata::from_record(record, self.suffixes)?;
        let mut row = metadata.to_row();
        row.extend(C::extra_columns(record, &metadata.url));
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn suffixes() -> PublicSuffixList {
        PublicSuffixList::from_reader(Cursor::new("com\nuk\nco.uk\n")).unwrap()
    }

    fn record(headers: &str, body: &str) -> String {
        format!(
            "WARC/1.0\r\n{headers}Content-Length: {}\r\n\r\n{body}\r\n\r\n",
            body.len()
        )
    }

    fn response(uuid: &str, uri: &str) -> String {
        let body = "HTTP/1.1 200 OK\r\n\
                    Content-Type: text/html; charset=UTF-8\r\n\
                    Server: Apache/2.4\r\n\
                    Content-Encoding: gzip\r\n\r\n<html></html>";
        record(
            &format!(
                "WARC-Type: response\r\n\
                 WARC-Record-ID: <urn:uuid:{uuid}>\r\n\
                 WARC-Date: 2020-01-01T00:00:00Z\r\n\
                 WARC-Target-URI: {uri}\r\n\
                 WARC-IP-Address: 2001:db8::1\r\n\
                 Content-Type: application/http; msgtype=response\r\n"
            ),
            body,
        )
    }

    fn run<C: Columns>(data: String, types: &[WarcRecordType]) -> (String, Stats) {
        let suffixes = suffixes();
        let mut out = Vec::new();
        let stats = {
            let mut extractor = Extractor::new(&mut out, &suffixes).record_types(types);
            extractor.write_header::<C>().unwrap();
            let mut reader = WarcReader::new(Cursor::new(data.into_bytes()));
            extractor.process::<_, C>(&mut reader).unwrap()
        };
        (String::from_utf8(out).unwrap(), stats)
    }

    #[test]
    fn test_url_metadata() {
        let data = response(
            "ffbfb0c0-6456-42b0-af03-3867be6fc09f",
            "https://www.amazon.co.uk/gp/product/B01?ref=x#top",
        );
        let mut reader = WarcReader::new(Cursor::new(data.into_bytes()));
        let mut record: Record = Record::new();
        assert!(reader.read(&mut record).unwrap());

        let metadata = UrlMetadata::from_record(&record, &suffixes()).unwrap();
        assert_eq!(
            metadata,
            UrlMetadata {
                id: "ffbfb0c0645642b0af033867be6fc09f".to_string(),
                url: "https://www.amazon.co.uk/gp/product/B01?ref=x#top".to_string(),
                https: true,
                hostname: "www.amazon.co.uk".to_string(),
                tld: "uk".to_string(),
                public_suffix: "co.uk".to_string(),
                path_depth: 3,
                path_segment_length: 25,
            }
        );
    }

    #[test]
    fn test_base_rows() {
        let data = [
            record("WARC-Type: warcinfo\r\n", "software: test\r\n"),
            response("ffbfb0c0-6456-42b0-af03-3867be6fc09f", "http://example.com/"),
        ]
        .concat();
        let (csv, stats) = run::<NoContent>(data, &[]);
        assert_eq!(
            csv,
            "id,url,https,hostname,tld,public suffix,path depth,pathsegment length\n\
             ffbfb0c0645642b0af033867be6fc09f,http://example.com/,0,example.com,com,com,0,1\n"
        );
        assert_eq!(stats, Stats { processed: 1, ignored: 1, skipped: 0 });
    }

    #[test]
    fn test_extended_rows() {
        let data = response("ffbfb0c0-6456-42b0-af03-3867be6fc09f", "http://example.com/a");
        let (csv, stats) = run::<HttpContent>(data, &[]);
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].ends_with(",msgtype,status,mime,charset,server,compression,cdn,ipv6"));
        assert!(rows[1].ends_with(",response,200,text/html,utf,apache,1,0,1"));
        assert_eq!(stats.processed, 1);
    }

    #[test]
    fn test_type_filter_and_invalid_uri() {
        let data = [
            response("ffbfb0c0-6456-42b0-af03-3867be6fc09f", "not a url"),
            response("0d4c1f32-8a0e-4a35-9a4d-4f3a1e0b7c11", "http://example.com/"),
        ]
        .concat();
        let (_, stats) = run::<NoContent>(data.clone(), &[WarcRecordType::Request]);
        assert_eq!(stats, Stats { processed: 0, ignored: 2, skipped: 0 });

        let (csv, stats) = run::<NoContent>(data, &[WarcRecordType::Response]);
        assert_eq!(stats, Stats { processed: 1, ignored: 1, skipped: 0 });
        assert!(csv.contains("0d4c1f328a0e4a359a4d4f3a1e0b7c11"));
    }
}
