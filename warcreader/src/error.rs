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


//! Error types for the WARC reader.

use thiserror::Error;

/// Result type alias for reader operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while framing WARC records.
///
/// Everything except [`Error::Io`] is a structural framing error. The record
/// reader recovers from those internally and never hands them to the caller.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The underlying stream failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended where more bytes were required
    #[error("unexpected end of stream at offset {offset}")]
    UnexpectedEndOfStream {
        /// Stream offset at which input ran out
        offset: u64,
    },

    /// A record did not start with the expected version marker
    #[error("invalid version line at offset {offset}: '{found}'")]
    InvalidVersion {
        /// Stream offset of the offending line
        offset: u64,
        /// The line that was found instead
        found: String,
    },

    /// A line exceeded the maximum line length
    #[error("line at offset {offset} exceeds {max} bytes")]
    LineTooLong {
        /// Stream offset where the line started
        offset: u64,
        /// Maximum accepted line length
        max: usize,
    },

    /// A version line showed up where a header or trailer line was expected.
    /// The line is consumed, so the record starting there is read from its headers.
    #[error("unexpected version line at offset {offset}")]
    UnexpectedVersionLine {
        /// Stream offset of the version line
        offset: u64,
    },

    /// A non-blank header line without a `:` separator
    #[error("malformed header line at offset {offset}: '{line}'")]
    MalformedHeaderLine {
        /// Stream offset of the offending line
        offset: u64,
        /// The offending line
        line: String,
    },

    /// The blank-line record separator is missing after the body
    #[error("missing record trailer at offset {offset}")]
    MissingTrailer {
        /// Stream offset where a blank line was expected
        offset: u64,
    },

    /// The record body was consumed but could not be decoded
    #[error("failed to decode record content at offset {offset}: {details}")]
    ContentDecode {
        /// Stream offset of the record body
        offset: u64,
        /// What went wrong
        details: String,
    },
}

impl Error {
    /// Creates a new end-of-stream error
    pub fn unexpected_eof(offset: u64) -> Self {
        Self::UnexpectedEndOfStream { offset }
    }

    /// Creates a new version marker error
    pub fn invalid_version(offset: u64, found: impl Into<String>) -> Self {
        Self::InvalidVersion {
            offset,
            found: found.into(),
        }
    }

    /// Creates a new line length error
    pub fn line_too_long(offset: u64, max: usize) -> Self {
        Self::LineTooLong { offset, max }
    }

    /// Creates a new misplaced version line error
    pub fn unexpected_version_line(offset: u64) -> Self {
        Self::UnexpectedVersionLine { offset }
    }

    /// Creates a new header line error
    pub fn malformed_header_line(offset: u64, line: impl Into<String>) -> Self {
        Self::MalformedHeaderLine {
            offset,
            line: line.into(),
        }
    }

    /// Creates a new trailer error
    pub fn missing_trailer(offset: u64) -> Self {
        Self::MissingTrailer { offset }
    }

    /// Creates a new content decoding error
    pub fn content_decode(offset: u64, details: impl Into<String>) -> Self {
        Self::ContentDecode {
            offset,
            details: details.into(),
        }
    }

    /// Returns true if the reader should skip the current record and resync
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_version(42, "WARC/0.9");
        assert!(err.to_string().contains("offset 42"));
        assert!(err.to_string().contains("WARC/0.9"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::unexpected_eof(0).is_recoverable());
        assert!(Error::malformed_header_line(0, "junk").is_recoverable());
        assert!(Error::missing_trailer(0).is_recoverable());
        assert!(Error::content_decode(0, "bad").is_recoverable());
        assert!(Error::line_too_long(0, 16).is_recoverable());
        assert!(Error::unexpected_version_line(0).is_recoverable());
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        assert!(!Error::from(io).is_recoverable());
    }
}
