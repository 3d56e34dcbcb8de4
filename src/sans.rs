//! Building blocks for implementing decoders, free of any I/O.
//!
//! This module is intended for applications that need fine control over
//! decoder internals. See [`crate::avec`] for implementations covering common
//! decoding patterns.
//!
//! # Architecture
//!
//! A FIT document is a file header, a section of records, and a trailing
//! cyclic redundancy check. Each record begins with a one-byte
//! [`header::RecordHeader`] naming a local message type (0 to 15) and whether
//! the record is a definition or data.
//!
//! - A definition record is decoded into a [`definition::MessageDefinition`]
//! and stored in the [`definition::DefinitionTable`] slot of its local type,
//! replacing whatever was there.
//!
//! - A data record is decoded by looking up the definition of its local type,
//! reading every field with a [`cursor::ByteCursor`], converting the raw bytes
//! to a [`crate::profile::Value`] per base type (see [`data`]), and applying
//! the semantic rules of [`crate::profile`].
//!
//! All state that survives between records (the definition table and the last
//! full timestamp, needed to expand compressed timestamp headers) lives in a
//! [`session::Session`], owned by exactly one decoder.
//!
//! Some areas of the decoding process are left to the caller and must be
//! carefully written:
//!
//! - Reading bytes from the correct place in the document, including
//! buffering as necessary.
//!
//! - Ending decoding once the specified number of document bytes have been
//! read.
//!
//! - Applying cyclic redundancy checks. A helper is provided in the [`check`]
//! module.
//!
//! Implementers are recommended to begin by studying and modifying a decoder
//! from the [`crate::avec`] module.

pub mod check;
pub mod cursor;
pub mod data;
pub mod definition;
pub mod header;
pub mod session;

/// Entrypoint for decoding records.
pub type Decoder = session::Session;
