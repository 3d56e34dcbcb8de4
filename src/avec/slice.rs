//! Slice-based decoder implementation.

use either::Either::{Left, Right};
use log::{debug, warn};

use crate::sans::{
    Decoder,
    check::verify_crc,
    cursor::ByteCursor,
    header::{FileHeader, RecordHeader},
    session::DecodedMessage,
};

use super::{CrcRegion, DecodeError, FromMessages, Options, Summary, Warning};

/// Decode records from a slice of a document, publishing to a receiver.
///
/// This method is also re-exported as `fit2gpx::avec::decode_slice`.
pub fn decode(r: &[u8], o: &mut impl FromMessages) -> Result<Summary, DecodeError> {
    decode_with(r, Options::default(), o)
}

/// As [`decode`], with explicit options.
pub fn decode_with(
    r: &[u8],
    options: Options,
    o: &mut impl FromMessages,
) -> Result<Summary, DecodeError> {
    let mut parser = Parser::with_options(r, options);

    loop {
        match parser.step()? {
            Step::Message(message) => o.add_message(message),
            Step::Done(summary) => return Ok(summary),
            Step::Header(_) | Step::Definition { .. } => {}
        }
    }
}

/// Position of a [`Parser`] in its document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    ReadingHeader,
    /// `remaining` bytes of the record section are still to be read.
    ReadingRecords {
        header: FileHeader,
        remaining: usize,
    },
    Done {
        header: FileHeader,
    },
    /// Decoding stopped at a fatal error; every further step returns it.
    Failed(DecodeError),
}

/// Result of advancing a [`Parser`] by one step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Header(FileHeader),
    Definition { local: u8, global: u16 },
    Message(DecodedMessage),
    Done(Summary),
}

/// Step-wise decoder over a document slice.
///
/// Each call to [`Parser::step`] reads the file header or exactly one record.
/// Callers may stop at any point without cleanup.
#[derive(Debug)]
pub struct Parser<'a> {
    r: &'a [u8],
    c: ByteCursor<'a>,
    options: Options,
    state: State,
    session: Decoder,
    warnings: Vec<Warning>,
    records: usize,
}

impl<'a> Parser<'a> {
    pub fn new(r: &'a [u8]) -> Self {
        Self::with_options(r, Options::default())
    }

    pub fn with_options(r: &'a [u8], options: Options) -> Self {
        Self {
            r,
            c: ByteCursor::new(r),
            options,
            state: State::ReadingHeader,
            session: Decoder::new(),
            warnings: Vec::new(),
            records: 0,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Warnings raised so far.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Advance by one step.
    pub fn step(&mut self) -> Result<Step, DecodeError> {
        let result = match self.state {
            State::ReadingHeader => self.read_header(),
            State::ReadingRecords { header, remaining } => self.read_record(header, remaining),
            State::Done { header } => Ok(Step::Done(Summary {
                header,
                warnings: self.warnings.clone(),
                records: self.records,
            })),
            State::Failed(err) => Err(err),
        };

        if let Err(err) = result {
            self.state = State::Failed(err);
        }

        result
    }

    fn read_header(&mut self) -> Result<Step, DecodeError> {
        let header = FileHeader::decode(&mut self.c).map_err(DecodeError::from_header)?;

        debug!(
            "FIT protocol {}.{}, profile {}.{}, {} record bytes",
            header.protocol_major(),
            header.protocol_minor(),
            header.profile_major(),
            header.profile_minor(),
            header.data_size
        );

        if let (true, Some(found)) = (self.options.verify_header_crc, header.crc) {
            let prefix = self.r.get(..FileHeader::PREFIX_LEN).unwrap_or_default();
            if let Err(calculated) = verify_crc(found, prefix) {
                self.warn(Warning::CrcMismatch {
                    region: CrcRegion::Header,
                    found,
                    calculated,
                });
            }
        }

        // Confine record reads to the declared record section.
        let start = header.len();
        let end = start.saturating_add(header.data_size as usize).min(self.r.len());
        self.c = ByteCursor::at(self.r.get(start..end).unwrap_or_default(), start);

        self.state = match header.data_size {
            0 => self.finish(header),
            remaining => State::ReadingRecords {
                header,
                remaining: remaining as usize,
            },
        };

        Ok(Step::Header(header))
    }

    fn read_record(&mut self, header: FileHeader, remaining: usize) -> Result<Step, DecodeError> {
        let start = self.c.position();

        let record = RecordHeader::decode(
            self.c
                .read_u8()
                .map_err(|e| DecodeError::TruncatedStream { offset: e.offset })?,
        );

        let step = match record.kind {
            Left(definition) => {
                let d = self
                    .session
                    .define(record.local, definition, &mut self.c)
                    .map_err(|e| DecodeError::TruncatedStream { offset: e.offset })?;

                Step::Definition {
                    local: record.local,
                    global: d.global,
                }
            }
            Right(data) => Step::Message(
                self.session
                    .decode(record.local, data, &mut self.c)
                    .map_err(|e| DecodeError::from_record(e, start))?,
            ),
        };

        self.records += 1;

        let remaining = remaining.saturating_sub(self.c.position() - start);
        self.state = match remaining {
            0 => self.finish(header),
            remaining => State::ReadingRecords { header, remaining },
        };

        Ok(step)
    }

    /// Check the trailing CRC, if present, and end decoding.
    fn finish(&mut self, header: FileHeader) -> State {
        let end = header.len().saturating_add(header.data_size as usize);

        if self.options.verify_file_crc {
            match (self.r.get(..end), self.r.get(end..end.saturating_add(2))) {
                (Some(covered), Some(&[lo, hi])) => {
                    let found = u16::from_le_bytes([lo, hi]);
                    if let Err(calculated) = verify_crc(found, covered) {
                        self.warn(Warning::CrcMismatch {
                            region: CrcRegion::File,
                            found,
                            calculated,
                        });
                    }
                }
                _ => debug!("no trailing CRC after offset {}", end),
            }
        }

        State::Done { header }
    }

    fn warn(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Iterate over decoded data messages, ending after the first error.
impl Iterator for Parser<'_> {
    type Item = Result<DecodedMessage, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let State::Failed(_) | State::Done { .. } = self.state {
                return None;
            }

            match self.step() {
                Ok(Step::Message(message)) => return Some(Ok(message)),
                Ok(_) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
