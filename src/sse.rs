//! Line-framed server push records shared by the upstream reader and
//! the chat client.
//!
//! A record is one or more `data: ` lines terminated by a blank
//! line. Network reads do not line up with records so bytes are
//! buffered until a full record (including every byte of any
//! multi-byte character) has arrived.

use anyhow::{Result, anyhow};
use serde_json::{Value, json};

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_SENTINEL: &str = "[DONE]";
pub const DONE_RECORD: &str = "data: [DONE]\n\n";

/// Wrap a chunk envelope as a single record.
pub fn encode_data(chunk: &Value) -> String {
    format!("{DATA_PREFIX}{chunk}\n\n")
}

/// Error record sent to the caller when the upstream fails after the
/// stream was opened.
pub fn encode_error(message: &str) -> String {
    encode_data(&json!({ "error": { "message": message } }))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Data(String),
    Done,
}

impl Frame {
    /// Parse a complete record. Returns `None` for records with no
    /// data lines (comments, keep-alives, bare event names).
    pub fn parse(record: &str) -> Option<Frame> {
        let data_lines: Vec<&str> = record
            .lines()
            .filter_map(|line| {
                line.strip_prefix(DATA_PREFIX)
                    .or_else(|| line.strip_prefix("data:"))
            })
            .collect();

        if data_lines.is_empty() {
            return None;
        }

        let data = data_lines.join("\n");
        let data = data.trim();
        if data.is_empty() {
            return None;
        }
        if data == DONE_SENTINEL {
            return Some(Frame::Done);
        }
        Some(Frame::Data(data.to_string()))
    }

    /// Decode the payload of a data frame as JSON. A complete record
    /// that fails to decode is an error, never silently dropped.
    pub fn json(&self) -> Result<Option<Value>> {
        match self {
            Frame::Done => Ok(None),
            Frame::Data(data) => serde_json::from_str(data)
                .map(Some)
                .map_err(|e| anyhow!("Invalid record payload {}: {}", data, e)),
        }
    }
}

/// Accumulates raw bytes and hands back complete records.
#[derive(Debug, Default)]
pub struct RecordBuffer {
    buf: Vec<u8>,
    // Bytes before `start` were already handed out as records
    start: usize,
    // The separator search resumes here
    scanned: usize,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        // Compact once per push rather than once per record
        if self.start > 0 {
            self.buf.drain(..self.start);
            self.scanned -= self.start;
            self.start = 0;
        }
        self.buf.extend_from_slice(bytes);
    }

    /// Pop the next complete record if one is buffered.
    pub fn next_record(&mut self) -> Result<Option<String>> {
        let from = self.scanned.max(self.start);
        let Some((offset, sep_len)) = find_separator(&self.buf[from..]) else {
            // A separator can straddle the next push by at most 3 bytes
            self.scanned = self.buf.len().saturating_sub(3).max(self.start);
            return Ok(None);
        };
        let end = from + offset;
        let record = self.buf[self.start..end].to_vec();
        self.start = end + sep_len;
        self.scanned = self.start;

        let record = String::from_utf8(record)
            .map_err(|e| anyhow!("Record is not valid UTF-8: {}", e))?;
        Ok(Some(record))
    }

    /// Drain every complete record currently buffered.
    pub fn drain_records(&mut self) -> Result<Vec<String>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record()? {
            records.push(record);
        }
        Ok(records)
    }

    /// Take whatever is left once the byte stream has ended. Some
    /// servers close without a trailing blank line.
    pub fn finish(&mut self) -> Result<Option<String>> {
        let mut rest = std::mem::take(&mut self.buf);
        rest.drain(..self.start);
        self.start = 0;
        self.scanned = 0;

        let rest = String::from_utf8(rest)
            .map_err(|e| anyhow!("Trailing record is not valid UTF-8: {}", e))?;
        if rest.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(rest))
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.buf.len()
    }
}

// Returns the index where the separator starts and its length
fn find_separator(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buf
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}
