//! Reader-based decoder implementation.

use std::io::{self, Read};

use either::Either::{Left, Right};
use log::{debug, warn};
use thiserror::Error;

use crate::sans::{
    Decoder,
    check::{compare_crc, compute_crc, verify_crc},
    cursor::ByteCursor,
    header::{FileHeader, RecordHeader},
};

use super::{CrcRegion, DecodeError, FromMessages, Options, Summary, Warning};

/// Errors occurring while decoding from a reader.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The document itself is malformed.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Decode records from a reader of a document, publishing to a receiver.
///
/// This method is also re-exported as `fit2gpx::avec::decode_reader`.
pub fn decode(r: &mut impl Read, o: &mut impl FromMessages) -> Result<Summary, Error> {
    decode_with(r, Options::default(), o)
}

/// As [`decode`], with explicit options.
///
/// Records are read one at a time, so memory use is bounded by the largest
/// record rather than the document. Results are identical to those of
/// [`super::slice::decode_with`] over the same bytes.
pub fn decode_with(
    r: &mut impl Read,
    options: Options,
    o: &mut impl FromMessages,
) -> Result<Summary, Error> {
    let mut s = Source {
        r,
        i: 0,
        c: 0,
        end: usize::MAX,
    };
    let mut warnings = Vec::new();
    let mut buf = Vec::new();

    s.fill(FileHeader::PREFIX_LEN, &mut buf)?;
    if buf.first() == Some(&14) {
        s.fill(2, &mut buf)?;
    }

    let header = FileHeader::decode(&mut ByteCursor::new(&buf)).map_err(DecodeError::from_header)?;

    debug!(
        "FIT protocol {}.{}, profile {}.{}, {} record bytes",
        header.protocol_major(),
        header.protocol_minor(),
        header.profile_major(),
        header.profile_minor(),
        header.data_size
    );

    if let (true, Some(found)) = (options.verify_header_crc, header.crc) {
        if let Err(calculated) = verify_crc(found, &buf[..FileHeader::PREFIX_LEN]) {
            push(&mut warnings, Warning::CrcMismatch {
                region: CrcRegion::Header,
                found,
                calculated,
            });
        }
    }

    // Offset to the end of the record section.
    let end = header.len().saturating_add(header.data_size as usize);
    s.end = end;

    let mut session = Decoder::new();
    let mut records = 0;

    while s.i < end {
        let start = s.i;

        buf.clear();
        s.fill(1, &mut buf)?;
        let Some(&byte) = buf.first() else {
            return Err(DecodeError::TruncatedStream { offset: start }.into());
        };

        let record = RecordHeader::decode(byte);

        match record.kind {
            Left(definition) => {
                // Fixed part, then field definitions, then developer field
                // definitions, each sized by a count in the part before.
                s.fill(5, &mut buf)?;
                if let Some(&count) = buf.get(5) {
                    s.fill(3 * count as usize, &mut buf)?;

                    let developer = buf.len();
                    if definition.has_developer_fields && s.fill(1, &mut buf)? == 1 {
                        let count = buf[developer];
                        s.fill(3 * count as usize, &mut buf)?;
                    }
                }

                session
                    .define(
                        record.local,
                        definition,
                        &mut ByteCursor::at(&buf[1..], start + 1),
                    )
                    .map_err(|e| DecodeError::TruncatedStream { offset: e.offset })?;
            }
            Right(data) => {
                let len = session
                    .data_len(record.local)
                    .map_err(|e| DecodeError::from_record(e.into(), start))?;
                s.fill(len, &mut buf)?;

                let message = session
                    .decode(record.local, data, &mut ByteCursor::at(&buf[1..], start + 1))
                    .map_err(|e| DecodeError::from_record(e, start))?;

                o.add_message(message);
            }
        }

        records += 1;
    }

    let calculated = s.c;

    buf.clear();
    s.end = usize::MAX;
    match (options.verify_file_crc, s.fill(2, &mut buf)?) {
        (true, 2) => {
            let found = u16::from_le_bytes([buf[0], buf[1]]);
            if let Err(calculated) = compare_crc(found, calculated) {
                push(&mut warnings, Warning::CrcMismatch {
                    region: CrcRegion::File,
                    found,
                    calculated,
                });
            }
        }
        (true, _) => debug!("no trailing CRC after offset {}", end),
        (false, _) => {}
    }

    Ok(Summary {
        header,
        warnings,
        records,
    })
}

fn push(warnings: &mut Vec<Warning>, warning: Warning) {
    warn!("{}", warning);
    warnings.push(warning);
}

/// A reader, counting bytes read and accumulating a CRC value over them.
struct Source<'r, R> {
    r: &'r mut R,
    /// Counter of bytes read.
    i: usize,
    /// Cyclic redundancy check accumulator value.
    c: u16,
    /// Offset no read may cross.
    end: usize,
}

impl<R: Read> Source<'_, R> {
    /// Append up to `n` bytes to `buf`, stopping early at the end of the
    /// stream or at `end`. Returns the number of bytes appended.
    ///
    /// Short reads are not errors here: decoding the buffer reports them
    /// with the offset of the first missing byte's read.
    fn fill(&mut self, n: usize, buf: &mut Vec<u8>) -> io::Result<usize> {
        let n = n.min(self.end.saturating_sub(self.i));
        let start = buf.len();

        self.r.by_ref().take(n as u64).read_to_end(buf)?;

        let read = &buf[start..];
        self.i += read.len();
        self.c = compute_crc(self.c, read);

        Ok(read.len())
    }
}
