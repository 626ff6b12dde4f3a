//! # Record Stream Reader
//!
//! Reads fixed-size records from a byte source and decodes each one.
//!
//! Archive files start with a text header line (`GPS_LOG_V1.0\n`) that must be
//! consumed with [`read_header`] before records are read.

use std::io::{BufRead, ErrorKind, Read};

use tracing::{debug, warn};

use crate::codec::decoder::decode;
use crate::codec::heading::HeadingTracker;
use crate::codec::protocol::{TelemetryRecord, Variant};
use crate::error::{GpsLogError, Result};

/// Outcome of checking an archive header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderStatus {
    Matched,

    /// Header did not match; holds the line that was found (lossy UTF-8)
    Unexpected(String),
}

/// Consume and check the leading header line of an archive
///
/// A mismatch is logged and returned, never treated as fatal. The line is
/// consumed either way.
///
/// # Arguments
///
/// * `reader` - Archive source positioned at its first byte
/// * `expected` - Header text without the trailing newline
pub fn read_header<R: BufRead>(reader: &mut R, expected: &str) -> Result<HeaderStatus> {
    let mut line = Vec::new();
    reader.read_until(b'\n', &mut line)?;

    let content = line.strip_suffix(b"\n").unwrap_or(&line);
    if content == expected.as_bytes() {
        debug!("Archive header matched: {}", expected);
        return Ok(HeaderStatus::Matched);
    }

    let found = String::from_utf8_lossy(&line).into_owned();
    warn!("Unexpected archive header: {:?} (expected {:?})", found, expected);
    Ok(HeaderStatus::Unexpected(found))
}

/// Reader state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Full-size chunks are still arriving
    Reading,

    /// Source ended cleanly on a record boundary
    Exhausted,

    /// Source ended with a partial record of `bytes` bytes at record `index`
    Truncated { index: usize, bytes: usize },

    /// An I/O error ended the stream
    Failed,
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamState::Reading)
    }
}

/// Lazy, single-pass iterator of decoded records from a byte source
///
/// Each chunk is exactly `variant.size()` bytes. A short final chunk moves
/// the reader to [`StreamState::Truncated`] and ends iteration without an
/// error item.
pub struct RecordReader<R: Read> {
    reader: R,
    variant: Variant,
    state: StreamState,
    index: usize,
    headings: HeadingTracker,
    last_heading_delta: Option<f64>,
}

impl<R: Read> RecordReader<R> {
    /// Start a new stream; heading history begins empty
    pub fn new(reader: R, variant: Variant) -> Self {
        Self {
            reader,
            variant,
            state: StreamState::Reading,
            index: 0,
            headings: HeadingTracker::new(),
            last_heading_delta: None,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Number of full records read so far
    pub fn records_read(&self) -> usize {
        self.index
    }

    /// Heading change between the last two yielded records
    pub fn last_heading_delta(&self) -> Option<f64> {
        self.last_heading_delta
    }

    /// Fill `buf` as far as the source allows, returning the byte count
    fn read_chunk(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<TelemetryRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state.is_terminal() {
            return None;
        }

        let mut chunk = vec![0u8; self.variant.size()];
        let filled = match self.read_chunk(&mut chunk) {
            Ok(filled) => filled,
            Err(e) => {
                self.state = StreamState::Failed;
                return Some(Err(GpsLogError::Io(e)));
            }
        };

        if filled == 0 {
            self.state = StreamState::Exhausted;
            debug!("Stream exhausted after {} records", self.index);
            return None;
        }

        if filled < chunk.len() {
            self.state = StreamState::Truncated {
                index: self.index,
                bytes: filled,
            };
            warn!(
                "Incomplete record at index {} ({} of {} bytes), stopping",
                self.index,
                filled,
                chunk.len()
            );
            return None;
        }

        self.index += 1;
        match decode(&chunk, self.variant) {
            Ok(record) => {
                self.last_heading_delta = self.headings.observe(record.heading.degrees);
                Some(Ok(record))
            }
            // Chunks are always full-size, so this only covers FieldUnpack
            Err(e) => Some(Err(e.into())),
        }
    }
}
