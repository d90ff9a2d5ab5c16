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


//! Line-oriented access to the underlying WARC byte stream.

use std::io::{self, BufRead, Read};

use crate::error::{Error, Result};

/// Upper bound for the up-front buffer reservation of materialized bodies.
const MAX_PREALLOC: u64 = 1 << 20;

/// Default upper bound for a single line, terminator included.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1 << 20;

/// Byte stream cursor supporting line reads and exact-count consumption.
///
/// The scanner keeps track of the number of bytes consumed so far, which the
/// record reader uses as record offsets.
#[derive(Debug)]
pub struct LineScanner<R> {
    inner: R,
    pos: u64,
    line: Vec<u8>,
    max_line_length: usize,
}

impl<R: BufRead> LineScanner<R> {
    /// Wrap a buffered reader.
    pub fn new(inner: R) -> Self {
        LineScanner {
            inner,
            pos: 0,
            line: Vec::with_capacity(256),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Set the longest line accepted by [`LineScanner::read_line`].
    pub fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max.max(1);
        self
    }

    /// Number of bytes consumed from the stream.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Whether at least one more byte is available.
    ///
    /// This never consumes input and does not fail at end of stream.
    pub fn has_remaining(&mut self) -> Result<bool> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => return Ok(!buf.is_empty()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Read the next line with its `LF` or `CRLF` terminator stripped.
    ///
    /// Fails with [`Error::UnexpectedEndOfStream`] if no bytes are left or the
    /// stream ends in the middle of a line. A partial line is still consumed.
    /// Lines longer than the maximum line length fail with
    /// [`Error::LineTooLong`] after consuming the maximum number of bytes.
    pub fn read_line(&mut self) -> Result<&[u8]> {
        self.line.clear();
        let start = self.pos;
        let limit = self.max_line_length as u64;
        let n = (&mut self.inner).take(limit).read_until(b'\n', &mut self.line)?;
        self.pos += n as u64;
        if self.line.last() != Some(&b'\n') {
            if n as u64 == limit {
                return Err(Error::line_too_long(start, self.max_line_length));
            }
            return Err(Error::unexpected_eof(self.pos));
        }
        self.line.pop();
        if self.line.last() == Some(&b'\r') {
            self.line.pop();
        }
        Ok(&self.line)
    }

    /// Advance the cursor by exactly `n` bytes without keeping them.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        let skipped = io::copy(&mut (&mut self.inner).take(n), &mut io::sink())?;
        self.pos += skipped;
        if skipped < n {
            return Err(Error::unexpected_eof(self.pos));
        }
        Ok(())
    }

    /// Consume exactly `n` bytes and return them.
    pub fn read_exact(&mut self, n: u64) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(n.min(MAX_PREALLOC) as usize);
        let read = (&mut self.inner).take(n).read_to_end(&mut buf)?;
        self.pos += read as u64;
        if (read as u64) < n {
            return Err(Error::unexpected_eof(self.pos));
        }
        Ok(buf)
    }
}
