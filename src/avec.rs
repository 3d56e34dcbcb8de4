//! Convenience interfaces for common decoding patterns.
//!
//! The decoders in this module read whole documents from slices or readers,
//! publishing every decoded data message to a [`FromMessages`] receiver.
//! [`crate::Track`] is a receiver collecting GPS track points; a
//! `Vec<DecodedMessage>` collects everything.
//!
//! The slice decoder is also available as a step-wise [`slice::Parser`],
//! which a caller may stop driving between any two records.

pub mod reader;
pub mod slice;

pub use reader::{decode as decode_reader, decode_with as decode_reader_with};
pub use slice::{decode as decode_slice, decode_with as decode_slice_with};

use thiserror::Error;

use crate::sans::{
    definition::UndefinedLocalType,
    header::{FileHeader, HeaderError},
    session::{DecodedMessage, RecordError},
};

/// Receive decoded data messages, in document order.
pub trait FromMessages {
    /// Add a decoded message. Messages of no interest may simply be dropped.
    fn add_message(&mut self, message: DecodedMessage);
}

impl FromMessages for Vec<DecodedMessage> {
    fn add_message(&mut self, message: DecodedMessage) {
        self.push(message);
    }
}

/// A fatal error decoding a document, with the byte offset where it was
/// detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Incorrect filetype marker.
    #[error("Incorrect file type marker ({found:?}) at offset {offset}.")]
    BadSignature { offset: usize, found: [u8; 4] },
    /// Unknown header length.
    #[error("Unknown header length ({length}) at offset {offset}.")]
    UnknownHeaderLength { offset: usize, length: u8 },
    /// The data ended, or a record crossed the end of the record section.
    #[error("Stream truncated at offset {offset}.")]
    TruncatedStream { offset: usize },
    /// A data record referenced a local message type that was never defined.
    #[error("Undefined local message type {local} at offset {offset}.")]
    UndefinedLocalType { offset: usize, local: u8 },
}

impl DecodeError {
    /// Byte offset in the document where the error was detected.
    pub fn offset(&self) -> usize {
        match *self {
            Self::BadSignature { offset, .. }
            | Self::UnknownHeaderLength { offset, .. }
            | Self::TruncatedStream { offset }
            | Self::UndefinedLocalType { offset, .. } => offset,
        }
    }

    /// Convert a header error; the header always starts at offset 0.
    pub(crate) fn from_header(err: HeaderError) -> Self {
        match err {
            HeaderError::BadSignature(found) => Self::BadSignature { offset: 8, found },
            HeaderError::UnknownHeaderLength(length) => {
                Self::UnknownHeaderLength { offset: 0, length }
            }
            HeaderError::Truncated(e) => Self::TruncatedStream { offset: e.offset },
        }
    }

    /// Convert a record error, given the offset of the record's header byte.
    pub(crate) fn from_record(err: RecordError, record: usize) -> Self {
        match err {
            RecordError::Truncated(e) => Self::TruncatedStream { offset: e.offset },
            RecordError::UndefinedLocalType(UndefinedLocalType(local)) => {
                Self::UndefinedLocalType {
                    offset: record,
                    local,
                }
            }
        }
    }
}

/// Region of a document covered by a cyclic redundancy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrcRegion {
    /// The first 12 bytes of a 14-byte header.
    Header,
    /// The header and the record section.
    File,
}

/// A non-fatal problem found while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Warning {
    /// Calculated and found CRC values do not match.
    #[error("{region:?} CRC mismatch: calculated {calculated:#06x}, found {found:#06x}.")]
    CrcMismatch {
        region: CrcRegion,
        found: u16,
        calculated: u16,
    },
}

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Check the CRC of 14-byte headers.
    pub verify_header_crc: bool,
    /// Check the CRC trailing the record section.
    pub verify_file_crc: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            verify_header_crc: true,
            verify_file_crc: true,
        }
    }
}

/// Outcome of decoding a whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub header: FileHeader,
    pub warnings: Vec<Warning>,
    /// Number of records (definition and data) in the record section.
    pub records: usize,
}
