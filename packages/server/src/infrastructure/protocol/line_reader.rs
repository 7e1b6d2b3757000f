//! Bounded line framing for the inbound half of a connection.
//!
//! Lines end at `\n`. Bytes that are not valid UTF-8 are replaced with
//! U+FFFD instead of failing the read, and a line longer than the limit is
//! reported once and skipped up to its terminator.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Longest accepted line, in bytes, without its terminator
pub const MAX_LINE_LEN: usize = 8192;

/// Result of one [`LineReader::next_line`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLine {
    /// A complete line without `\n`. A trailing `\r` is left in place.
    Line(String),
    /// A line exceeded the limit. The rest of it is discarded.
    TooLong,
    /// The peer closed its side
    Eof,
}

pub struct LineReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    max_len: usize,
    discarding: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_len(reader, MAX_LINE_LEN)
    }

    pub fn with_max_len(reader: R, max_len: usize) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
            max_len,
            discarding: false,
        }
    }

    /// Read the next line.
    ///
    /// Cancel safe: partially read bytes stay in the reader and the next
    /// call continues the same line.
    pub async fn next_line(&mut self) -> io::Result<ReadLine> {
        loop {
            let available = self.reader.fill_buf().await?;

            if available.is_empty() {
                if self.discarding || self.buf.is_empty() {
                    self.discarding = false;
                    return Ok(ReadLine::Eof);
                }
                // unterminated last line
                return Ok(ReadLine::Line(self.take_line()));
            }

            match available.iter().position(|byte| *byte == b'\n') {
                Some(end) => {
                    if !self.discarding {
                        self.buf.extend_from_slice(&available[..end]);
                    }
                    self.reader.consume(end + 1);

                    if self.discarding {
                        self.discarding = false;
                        continue;
                    }
                    if self.buf.len() > self.max_len {
                        self.buf.clear();
                        return Ok(ReadLine::TooLong);
                    }
                    return Ok(ReadLine::Line(self.take_line()));
                }
                None => {
                    let len = available.len();
                    if !self.discarding {
                        self.buf.extend_from_slice(available);
                    }
                    self.reader.consume(len);

                    if !self.discarding && self.buf.len() > self.max_len {
                        self.buf.clear();
                        self.discarding = true;
                        return Ok(ReadLine::TooLong);
                    }
                }
            }
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        line
    }
}
