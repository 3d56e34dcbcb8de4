//! Definition records and the table holding them.

use log::debug;
use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::FromBytes;

use super::{
    cursor::{ByteCursor, Endian, OutOfBounds},
    header::DefinitionHeader,
};

/// The base type of a field, identifying its primitive and 'invalid' marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// `enum`
    Enum,
    /// `sint8`
    I8,
    /// `uint8`
    U8,
    /// `sint16`
    I16,
    /// `uint16`
    U16,
    /// `sint32`
    I32,
    /// `uint32`
    U32,
    /// `string`
    String,
    /// `float32`
    F32,
    /// `float64`
    F64,
    /// `uint8z`
    U8Z,
    /// `uint16z`
    U16Z,
    /// `uint32z`
    U32Z,
    /// `byte`, and any base type this decoder does not know.
    Byte,
    /// `sint64`
    I64,
    /// `uint64`
    U64,
    /// `uint64z`
    U64Z,
}

impl BaseType {
    /// Identify a base type from its definition byte.
    ///
    /// Only the base type number (the low five bits) is significant; the
    /// endian-ability flag is redundant.
    pub fn from_byte(r: u8) -> Self {
        bitfield! {
            struct BaseTypeByte(u8) {
                [0..5] number: u8,
            }
        }

        match BaseTypeByte(r).number() {
            0 => Self::Enum,
            1 => Self::I8,
            2 => Self::U8,
            3 => Self::I16,
            4 => Self::U16,
            5 => Self::I32,
            6 => Self::U32,
            7 => Self::String,
            8 => Self::F32,
            9 => Self::F64,
            10 => Self::U8Z,
            11 => Self::U16Z,
            12 => Self::U32Z,
            14 => Self::I64,
            15 => Self::U64,
            16 => Self::U64Z,
            _ => Self::Byte,
        }
    }

    /// Size of a single element of this base type in bytes.
    pub fn width(self) -> usize {
        match self {
            Self::Enum | Self::I8 | Self::U8 | Self::U8Z | Self::String | Self::Byte => 1,
            Self::I16 | Self::U16 | Self::U16Z => 2,
            Self::I32 | Self::U32 | Self::U32Z | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::U64Z | Self::F64 => 8,
        }
    }
}

/// Layout of a single field in a data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Field number, identifying the field within its global message.
    pub number: u8,
    /// Size of the field in bytes. A whole multiple of the base type's width
    /// makes the field an array.
    pub size: u8,
    pub base_type: BaseType,
}

/// Layout of a single developer field in a data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeveloperFieldDefinition {
    pub number: u8,
    pub size: u8,
    /// Index of the developer data identifying the field's owner.
    pub developer_index: u8,
}

/// Layout of the data records of one local message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDefinition {
    /// Global message number.
    pub global: u16,
    /// Byte order of multi-byte fields in corresponding data records.
    pub endian: Endian,
    pub fields: Vec<FieldDefinition>,
    pub developer_fields: Vec<DeveloperFieldDefinition>,
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct DefinitionMessage {
    _reserved: u8,
    architecture: u8,
    global_message: [u8; 2],
    fields_remaining: u8,
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct FieldHeader {
    field: u8,
    size: u8,
    base_type: u8,
}

impl MessageDefinition {
    /// Decode the body of a definition record (everything after its header).
    pub fn decode(c: &mut ByteCursor, header: DefinitionHeader) -> Result<Self, OutOfBounds> {
        let DefinitionMessage {
            architecture,
            global_message,
            fields_remaining,
            ..
        } = zerocopy::transmute!(c.read_array::<5>()?);

        let endian = if architecture == 0 {
            Endian::Little
        } else {
            Endian::Big
        };
        let global = match endian {
            Endian::Little => u16::from_le_bytes(global_message),
            Endian::Big => u16::from_be_bytes(global_message),
        };

        let fields = (0..fields_remaining)
            .map(|_| -> Result<_, OutOfBounds> {
                let FieldHeader {
                    field,
                    size,
                    base_type,
                } = zerocopy::transmute!(c.read_array::<3>()?);

                Ok(FieldDefinition {
                    number: field,
                    size,
                    base_type: BaseType::from_byte(base_type),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let developer_fields = if header.has_developer_fields {
            let count = c.read_u8()?;
            (0..count)
                .map(|_| -> Result<_, OutOfBounds> {
                    let FieldHeader {
                        field,
                        size,
                        base_type: developer_index,
                    } = zerocopy::transmute!(c.read_array::<3>()?);

                    Ok(DeveloperFieldDefinition {
                        number: field,
                        size,
                        developer_index,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        Ok(Self {
            global,
            endian,
            fields,
            developer_fields,
        })
    }

    /// Length in bytes of the corresponding data records, excluding their
    /// header byte.
    pub fn data_len(&self) -> usize {
        let fields = self.fields.iter().map(|f| f.size as usize);
        let developer = self.developer_fields.iter().map(|f| f.size as usize);
        fields.chain(developer).sum()
    }
}

/// A data record referenced a local message type that was never defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("No definition for local message type {0}.")]
pub struct UndefinedLocalType(pub u8);

/// Store of the latest definition for each of the 16 local message types.
#[derive(Debug, Default)]
pub struct DefinitionTable {
    slots: [Option<MessageDefinition>; 16],
}

impl DefinitionTable {
    /// Bind a definition to a local message type, replacing any earlier one.
    pub fn define(&mut self, local: u8, definition: MessageDefinition) -> &MessageDefinition {
        debug!(
            "local type {} -> global message {} ({} fields)",
            local,
            definition.global,
            definition.fields.len()
        );
        self.slots[(local & 0x0F) as usize].insert(definition)
    }

    /// Retrieve the current definition of a local message type.
    pub fn lookup(&self, local: u8) -> Result<&MessageDefinition, UndefinedLocalType> {
        self.slots
            .get(local as usize)
            .and_then(Option::as_ref)
            .ok_or(UndefinedLocalType(local))
    }
}
