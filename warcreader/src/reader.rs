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


//! The WARC record reader.
//!
//! [`WarcReader::read`] drives an explicit state machine over the stream:
//!
//! ```text
//! SeekingStart -> ReadingVersion -> ReadingHeaders -> ReadingBody -> ReadingTrailer -> Emit
//!       |               \________________\_______________\________________\
//!       v                                                                  v
//!  EndOfStream <-------------------------------------------------------- Resync
//! ```
//!
//! Any structural error moves the machine into `Resync`, which scans forward
//! line by line until it finds the next version marker and continues with the
//! headers of that record. Only genuine end of stream ends a read without a
//! record.

use std::io::BufRead;
use std::marker::PhantomData;

use tracing::{debug, trace, warn};

use crate::content::Content;
use crate::error::{Error, Result};
use crate::record::{parse_headers, Record};
use crate::scanner::{LineScanner, DEFAULT_MAX_LINE_LENGTH};

/// Version marker expected at the start of every record.
pub const DEFAULT_VERSION: &str = "WARC/1.0";

/// Configuration for the record reader
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Version line every record has to start with
    pub version: String,
    /// Maximum number of consecutive malformed records skipped within a
    /// single read before the reader gives up (`None` = unlimited)
    pub max_skipped: Option<usize>,
    /// Longest accepted line in bytes; longer lines are structural errors
    pub max_line_length: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            max_skipped: None,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl ReaderConfig {
    /// Creates a new reader config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the expected version marker
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the bound on consecutive skipped records
    pub fn max_skipped(mut self, max: Option<usize>) -> Self {
        self.max_skipped = max;
        self
    }

    /// Sets the maximum line length
    pub fn max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }
}

/// States of the record framing state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    SeekingStart,
    ReadingVersion,
    ReadingHeaders,
    ReadingBody,
    ReadingTrailer,
    Resync,
    Emit,
    EndOfStream,
}

/// Streaming WARC record reader.
///
/// The reader owns the stream cursor. After every call to [`WarcReader::read`]
/// the cursor sits at the start of the next record or at end of stream.
#[derive(Debug)]
pub struct WarcReader<R> {
    input: LineScanner<R>,
    config: ReaderConfig,
    exhausted: bool,
    skipped: u64,
}

impl<R: BufRead> WarcReader<R> {
    /// Create a reader with default configuration.
    pub fn new(input: R) -> Self {
        Self::with_config(input, ReaderConfig::default())
    }

    /// Create a reader with custom configuration.
    pub fn with_config(input: R, config: ReaderConfig) -> Self {
        WarcReader {
            input: LineScanner::new(input).with_max_line_length(config.max_line_length),
            config,
            exhausted: false,
            skipped: 0,
        }
    }

    /// Number of bytes consumed from the stream.
    pub fn position(&self) -> u64 {
        self.input.position()
    }

    /// Total number of malformed records skipped so far.
    pub fn skipped_records(&self) -> u64 {
        self.skipped
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.input.into_inner()
    }

    /// Read the next record into `record`.
    ///
    /// Returns `Ok(true)` with a fully populated record, or `Ok(false)` once
    /// the stream is exhausted (and on every call after that). Malformed
    /// records are skipped silently. Errors are only returned if the
    /// underlying stream fails.
    pub fn read<C: Content>(&mut self, record: &mut Record<C>) -> Result<bool> {
        record.clear();
        if self.exhausted {
            return Ok(false);
        }

        let mut state = State::SeekingStart;
        let mut failures = 0usize;
        loop {
            state = match state {
                State::Emit => {
                    trace!(
                        "Read record {} at offset {:?}",
                        record.id(),
                        record.stream_pos()
                    );
                    return Ok(true);
                }
                State::EndOfStream => {
                    self.exhausted = true;
                    return Ok(false);
                }
                _ => match self.step(state, record) {
                    Ok(next) => next,
                    Err(e) if e.is_recoverable() => {
                        debug!("Skipping malformed record in state {:?}: {}", state, e);
                        record.clear();
                        self.skipped += 1;
                        failures += 1;
                        if self.config.max_skipped.is_some_and(|max| failures > max) {
                            warn!(
                                "Giving up after {} consecutive malformed records at offset {}",
                                failures,
                                self.input.position()
                            );
                            self.exhausted = true;
                            return Ok(false);
                        }
                        match e {
                            Error::UnexpectedVersionLine { offset } => {
                                record.set_stream_pos(offset);
                                State::ReadingHeaders
                            }
                            _ => State::Resync,
                        }
                    }
                    Err(e) => return Err(e),
                },
            };
        }
    }

    /// Iterator over the remaining records.
    pub fn records<C: Content>(&mut self) -> Records<'_, R, C> {
        Records {
            reader: self,
            _content: PhantomData,
        }
    }

    /// Run a single state transition.
    fn step<C: Content>(&mut self, state: State, record: &mut Record<C>) -> Result<State> {
        let next = match state {
            State::SeekingStart => {
                if self.input.has_remaining()? {
                    State::ReadingVersion
                } else {
                    State::EndOfStream
                }
            }
            State::ReadingVersion => {
                let offset = self.input.position();
                let line = self.input.read_line()?;
                if line != self.config.version.as_bytes() {
                    return Err(Error::invalid_version(offset, String::from_utf8_lossy(line)));
                }
                record.set_stream_pos(offset);
                State::ReadingHeaders
            }
            State::ReadingHeaders => {
                match parse_headers(&mut self.input, record) {
                    Err(Error::MalformedHeaderLine { offset, line }) if line == self.config.version => {
                        return Err(Error::unexpected_version_line(offset));
                    }
                    result => result?,
                }
                State::ReadingBody
            }
            State::ReadingBody => {
                record.read_content(&mut self.input)?;
                State::ReadingTrailer
            }
            State::ReadingTrailer => {
                for _ in 0..2 {
                    let offset = self.input.position();
                    let line = self.input.read_line()?;
                    if line == self.config.version.as_bytes() {
                        return Err(Error::unexpected_version_line(offset));
                    }
                    if !line.is_empty() {
                        return Err(Error::missing_trailer(offset));
                    }
                }
                State::Emit
            }
            State::Resync => {
                if !self.input.has_remaining()? {
                    State::EndOfStream
                } else {
                    let offset = self.input.position();
                    if self.input.read_line()? == self.config.version.as_bytes() {
                        debug!("Resynchronized at offset {}", offset);
                        record.set_stream_pos(offset);
                        State::ReadingHeaders
                    } else {
                        State::Resync
                    }
                }
            }
            State::Emit | State::EndOfStream => state,
        };
        Ok(next)
    }
}

/// Iterator returned by [`WarcReader::records`].
pub struct Records<'a, R, C> {
    reader: &'a mut WarcReader<R>,
    _content: PhantomData<C>,
}

impl<R: BufRead, C: Content> Iterator for Records<'_, R, C> {
    type Item = Result<Record<C>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = Record::new();
        match self.reader.read(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
