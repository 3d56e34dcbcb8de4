//! Decoding state shared by the records of one document.

use log::{debug, trace};
use thiserror::Error;

use crate::profile::{self, TIMESTAMP_FIELD, Timestamp};

use super::{
    cursor::{ByteCursor, OutOfBounds},
    data::{Value, decode_field},
    definition::{DefinitionTable, MessageDefinition, UndefinedLocalType},
    header::{DataHeader, DefinitionHeader},
};

/// An error decoding a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The record runs past the end of the available data.
    #[error(transparent)]
    Truncated(#[from] OutOfBounds),
    /// A data record referenced a local message type that was never defined.
    #[error(transparent)]
    UndefinedLocalType(#[from] UndefinedLocalType),
}

/// A field of a decoded data message.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedField {
    pub number: u8,
    /// Field name, if the profile knows the field.
    pub name: Option<&'static str>,
    pub units: Option<&'static str>,
    pub value: Value,
}

/// A developer field of a decoded data message, kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeveloperField {
    pub number: u8,
    pub developer_index: u8,
    pub bytes: Vec<u8>,
}

/// A decoded data message.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    /// Global message number.
    pub global: u16,
    /// Message name, if the profile knows the message.
    pub name: Option<&'static str>,
    /// Local message type of the record the message was decoded from.
    pub local: u8,
    pub fields: Vec<DecodedField>,
    pub developer_fields: Vec<DeveloperField>,
}

impl DecodedMessage {
    /// Value of the named field, unless missing or invalid.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.name == Some(name))
            .map(|f| &f.value)
            .filter(|v| !v.is_invalid())
    }

    /// Value of a field by number, unless missing or invalid.
    pub fn field(&self, number: u8) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.number == number)
            .map(|f| &f.value)
            .filter(|v| !v.is_invalid())
    }

    pub fn timestamp(&self) -> Option<Timestamp> {
        self.field(TIMESTAMP_FIELD).and_then(Value::as_timestamp)
    }
}

/// Expand the time offset of a compressed timestamp header against the last
/// full timestamp.
///
/// The offset holds the low five bits of the new timestamp. If they are
/// smaller than those of the last timestamp, the 32-second window has rolled
/// over.
pub fn expand_time_offset(last: Timestamp, offset: u8) -> Timestamp {
    const MASK: u32 = 0x1F;

    let offset = u32::from(offset) & MASK;
    let base = last.0 & !MASK;

    if offset >= last.0 & MASK {
        Timestamp(base.wrapping_add(offset))
    } else {
        Timestamp(base.wrapping_add(offset).wrapping_add(MASK + 1))
    }
}

/// Decoding state of one document: the definition table and the last full
/// timestamp.
///
/// A session must not be shared between documents.
#[derive(Debug, Default)]
pub struct Session {
    definitions: DefinitionTable,
    last_timestamp: Option<Timestamp>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn definitions(&self) -> &DefinitionTable {
        &self.definitions
    }

    /// The last full timestamp seen, used to expand compressed timestamps.
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.last_timestamp
    }

    /// Decode the body of a definition record and bind it to its local
    /// message type.
    pub fn define(
        &mut self,
        local: u8,
        header: DefinitionHeader,
        c: &mut ByteCursor,
    ) -> Result<&MessageDefinition, OutOfBounds> {
        let definition = MessageDefinition::decode(c, header)?;
        Ok(self.definitions.define(local, definition))
    }

    /// Length in bytes of the body of a data record of a local message type.
    pub fn data_len(&self, local: u8) -> Result<usize, UndefinedLocalType> {
        Ok(self.definitions.lookup(local)?.data_len())
    }

    /// Decode the body of a data record against the current definition of its
    /// local message type.
    pub fn decode(
        &mut self,
        local: u8,
        header: DataHeader,
        c: &mut ByteCursor,
    ) -> Result<DecodedMessage, RecordError> {
        let definition = self.definitions.lookup(local)?;

        let mut fields = definition
            .fields
            .iter()
            .map(|field| -> Result<_, OutOfBounds> {
                let raw = decode_field(c, field, definition.endian)?;
                let profile = profile::field(definition.global, field.number);

                Ok(DecodedField {
                    number: field.number,
                    name: profile.map(|p| p.name),
                    units: profile.and_then(|p| p.units),
                    value: match profile {
                        Some(p) => p.rule.apply(raw),
                        None => raw,
                    },
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let developer_fields = definition
            .developer_fields
            .iter()
            .map(|field| -> Result<_, OutOfBounds> {
                Ok(DeveloperField {
                    number: field.number,
                    developer_index: field.developer_index,
                    bytes: c.read_bytes(field.size as usize)?.to_vec(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let global = definition.global;

        let full = fields
            .iter()
            .find(|f| f.number == TIMESTAMP_FIELD)
            .and_then(|f| f.value.as_timestamp());

        if let Some(t) = full {
            self.last_timestamp = Some(t);
        } else if let Some(offset) = header.time_offset {
            match self.last_timestamp {
                Some(last) => {
                    let t = expand_time_offset(last, offset);
                    self.last_timestamp = Some(t);

                    let value = Value::Timestamp(t);
                    match fields.iter_mut().find(|f| f.number == TIMESTAMP_FIELD) {
                        Some(f) => f.value = value,
                        None => fields.push(DecodedField {
                            number: TIMESTAMP_FIELD,
                            name: Some("timestamp"),
                            units: Some("s"),
                            value,
                        }),
                    }
                }
                None => debug!(
                    "compressed timestamp in message {} before any full timestamp",
                    global
                ),
            }
        }

        trace!("message {} from local type {}", global, local);

        Ok(DecodedMessage {
            global,
            name: profile::message_name(global),
            local,
            fields,
            developer_fields,
        })
    }
}
