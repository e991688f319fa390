//! The record protocol carried by successful feedback replies.
//!
//! A structured reply starts with [`RESPONSE_MARKER`] and is followed by
//! records, each introduced by [`RECORD_SEPARATOR`]:
//!
//! ```text
//! { 0x01 key 0x02 status-html 0x01 key 0x03 v1 0x04 v2 ...
//! ```
//!
//! Anything before the first separator (the marker itself) is not a record.

use std::fmt;

use memchr::memchr_iter;

pub const RESPONSE_MARKER: char = '{';
pub const RECORD_SEPARATOR: u8 = 0x01;
pub const VALUE_SEPARATOR: u8 = 0x04;
/// A reply consisting of this byte alone means "nothing to report".
pub const SENTINEL: &str = "\u{7f}";

/// What a record does with its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Replace the contents of the element `<key>status`.
    Status = 0x02,
    /// Set the value of every control named `<key>`.
    Value = 0x03,
}

impl Opcode {
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x02 => Ok(Opcode::Status),
            0x03 => Ok(Opcode::Value),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub opcode: Opcode,
    pub payload: String,
}

impl Record {
    /// The payload split on [`VALUE_SEPARATOR`]; one entry per value.
    pub fn values(&self) -> Vec<&str> {
        split_on(&self.payload, VALUE_SEPARATOR).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The key was terminated by a control byte that is not an opcode.
    UnknownOpcode { key: String, byte: u8 },
    /// No control byte follows the key at all.
    MissingOpcode { record: String },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::UnknownOpcode { key, byte } => {
                write!(f, "Unrecognised opcode 0x{byte:02x} in feedback for {key}")
            }
            RecordError::MissingOpcode { record } => {
                write!(f, "Feedback record without opcode: {record}")
            }
        }
    }
}

impl std::error::Error for RecordError {}

/// How the body of a reply should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    Empty,
    Sentinel,
    /// Not a record stream; shown to the user as an error page.
    ErrorPage(&'a str),
    Records(&'a str),
}

pub fn classify(body: &str) -> Payload<'_> {
    if body.starts_with(RESPONSE_MARKER) {
        Payload::Records(body)
    } else if body.is_empty() {
        Payload::Empty
    } else if body == SENTINEL {
        Payload::Sentinel
    } else {
        Payload::ErrorPage(body)
    }
}

fn split_on(text: &str, separator: u8) -> impl Iterator<Item = &str> + '_ {
    let mut start = 0;
    memchr_iter(separator, text.as_bytes())
        .chain(std::iter::once(text.len()))
        .map(move |end| {
            let piece = &text[start..end];
            start = end + 1;
            piece
        })
}

fn parse_record(chunk: &str) -> Result<Record, RecordError> {
    let Some(position) = chunk.bytes().position(|byte| byte < 0x20) else {
        return Err(RecordError::MissingOpcode {
            record: chunk.to_string(),
        });
    };
    let key = &chunk[..position];
    let opcode = Opcode::try_from(chunk.as_bytes()[position]).map_err(|byte| {
        RecordError::UnknownOpcode {
            key: key.to_string(),
            byte,
        }
    })?;
    Ok(Record {
        key: key.to_string(),
        opcode,
        payload: chunk[position + 1..].to_string(),
    })
}

/// Iterator over the records of a reply body. Stops after yielding the
/// first malformed record.
pub struct Records<'a> {
    chunks: Box<dyn Iterator<Item = &'a str> + 'a>,
    failed: bool,
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let chunk = self.chunks.next()?;
        let record = parse_record(chunk);
        self.failed = record.is_err();
        Some(record)
    }
}

/// Parses the record section of a reply. The text before the first
/// [`RECORD_SEPARATOR`] is skipped, so both the full body (`{\x01...`) and a
/// bare record list (`\x01...`) are accepted.
pub fn parse_records(body: &str) -> Records<'_> {
    Records {
        chunks: Box::new(split_on(body, RECORD_SEPARATOR).skip(1)),
        failed: false,
    }
}

/// Encodes records the way a server would. Used by tests and benches.
pub fn encode_records(records: &[Record]) -> String {
    let mut body = String::from(RESPONSE_MARKER);
    for record in records {
        body.push(RECORD_SEPARATOR as char);
        body.push_str(&record.key);
        body.push(record.opcode.as_byte() as char);
        body.push_str(&record.payload);
    }
    body
}
