//! Document and record headers.

use either::Either::{self, Left, Right};
use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::{
    FromBytes,
    byteorder::little_endian::{U16, U32},
};

use super::cursor::{ByteCursor, Endian, OutOfBounds};

/// An error decoding a document header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// Incorrect filetype marker.
    #[error("Incorrect file type marker ({0:?}).")]
    BadSignature([u8; 4]),
    /// Unknown header length.
    #[error("Unknown header length ({0}).")]
    UnknownHeaderLength(u8),
    /// The document ended inside its header.
    #[error(transparent)]
    Truncated(#[from] OutOfBounds),
}

/// A decoded document header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Length of the header in bytes, 12 or 14.
    pub header_size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    /// Length of the record section in bytes, excluding header and trailing
    /// check value.
    pub data_size: u32,
    /// Check value over the first 12 header bytes, for 14-byte headers.
    pub crc: Option<u16>,
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct FileHeaderPrefix {
    header_size: u8,
    protocol_version: u8,
    profile_version: U16,
    data_size: U32,
    data_type: [u8; 4],
}

impl FileHeader {
    /// Length of the mandatory part of every document header.
    pub const PREFIX_LEN: usize = 12;

    /// Decode the mandatory 12 bytes of a document header.
    ///
    /// The filetype marker is checked before the header length, so data that
    /// is not FIT at all is always reported as such. The check value of a
    /// 14-byte header is not part of the prefix; `crc` is left empty for the
    /// caller to fill.
    pub fn from_prefix(r: [u8; 12]) -> Result<Self, HeaderError> {
        let FileHeaderPrefix {
            header_size,
            protocol_version,
            profile_version,
            data_size,
            data_type,
        } = zerocopy::transmute!(r);

        if &data_type != b".FIT" {
            Err(HeaderError::BadSignature(data_type))?;
        }

        if header_size != 12 && header_size != 14 {
            Err(HeaderError::UnknownHeaderLength(header_size))?;
        }

        Ok(Self {
            header_size,
            protocol_version,
            profile_version: profile_version.get(),
            data_size: data_size.get(),
            crc: None,
        })
    }

    /// Decode a full document header, including its check value if present.
    pub fn decode(c: &mut ByteCursor) -> Result<Self, HeaderError> {
        let mut header = Self::from_prefix(c.read_array()?)?;
        if header.header_size == 14 {
            header.crc = Some(c.read_u16(Endian::Little)?);
        }
        Ok(header)
    }

    /// Length of the header in bytes.
    pub fn len(&self) -> usize {
        self.header_size as usize
    }

    pub fn protocol_major(&self) -> u8 {
        self.protocol_version >> 4
    }

    pub fn protocol_minor(&self) -> u8 {
        self.protocol_version & 0x0F
    }

    pub fn profile_major(&self) -> u16 {
        self.profile_version / 100
    }

    pub fn profile_minor(&self) -> u16 {
        self.profile_version % 100
    }
}

/// Header of a definition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefinitionHeader {
    /// The definition lists developer fields after its regular fields.
    pub has_developer_fields: bool,
}

/// Header of a data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    /// Seconds into the current 32-second window, for compressed timestamp
    /// headers.
    pub time_offset: Option<u8>,
}

/// A decoded record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Local message type the record belongs to.
    pub local: u8,
    pub kind: Either<DefinitionHeader, DataHeader>,
}

impl RecordHeader {
    /// Decode a record header byte.
    pub fn decode(r: u8) -> Self {
        bitfield! {
            struct Header(u8) {
                [7] is_compressed,
            }
        }

        if Header(r).is_compressed() {
            bitfield! {
                struct CompressedHeader(u8) {
                    [0..5] time_offset: u8,
                    [5..7] local_message: u8,
                }
            }

            let header = CompressedHeader(r);

            Self {
                local: header.local_message(),
                kind: Right(DataHeader {
                    time_offset: Some(header.time_offset()),
                }),
            }
        } else {
            bitfield! {
                struct NormalHeader(u8) {
                    [0..4] local_message: u8,
                    [5] is_developer,
                    [6] is_definition,
                }
            }

            let header = NormalHeader(r);

            let kind = if header.is_definition() {
                Left(DefinitionHeader {
                    has_developer_fields: header.is_developer(),
                })
            } else {
                Right(DataHeader { time_offset: None })
            };

            Self {
                local: header.local_message(),
                kind,
            }
        }
    }
}
