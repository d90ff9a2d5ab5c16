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


//! A resilient streaming reader for WARC (Web ARChive) files.
//!
//! The reader frames records out of any [`std::io::BufRead`] source, parses
//! the WARC header block and consumes exactly `Content-Length` body bytes.
//! Malformed records are skipped and the reader resynchronizes on the next
//! version line, so a single corrupt record does not end the extraction of a
//! large archive.
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use warcreader::{Record, WarcReader};
//!
//! let file = File::open("example.warc")?;
//! let mut reader = WarcReader::new(BufReader::new(file));
//! let mut record: Record = Record::new();
//! while reader.read(&mut record)? {
//!     println!("{} {}", record.id(), record.warc_type());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The body policy is chosen through the record's type parameter:
//! [`NoContent`] skips bodies, `Vec<u8>` keeps the raw bytes and
//! [`HttpContent`] parses embedded HTTP messages.

pub mod content;
pub mod error;
pub mod header;
pub mod reader;
pub mod record;
pub mod scanner;
pub mod value;

pub use content::{Content, HttpContent, NoContent};
pub use error::{Error, Result};
pub use header::{HeaderEncoding, HeaderMap};
pub use reader::{ReaderConfig, Records, State, WarcReader, DEFAULT_VERSION};
pub use record::{parse_headers, Record, WarcRecordType};
pub use scanner::LineScanner;
