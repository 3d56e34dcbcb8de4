//! A decoder for Garmin's Flexible and Interoperable Data Transfer protocol,
//! and a converter from FIT activity tracks to GPX.
//!
//! FIT files are self-describing: definition records announce the layout of
//! the data records that follow them, and a layout can be replaced at any
//! point in the stream. Fit2gpx reads definitions as they arrive, decodes
//! data records against them, and applies a small semantic profile (names,
//! scales, coordinate and time conversions) for the messages needed to
//! extract a GPS track.
//!
//! Most users should begin with [`Track::from_slice`] or
//! [`Track::from_reader`], then hand the points to [`gpx::write`]. The
//! [`avec`] module offers slice and reader decoders publishing every message
//! to a [`avec::FromMessages`] receiver, and the [`sans`] module exposes the
//! building blocks (cursor, headers, definitions, decoding session) for
//! applications needing finer control.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `cli`: build the `fit2gpx` command-line tool (default).

pub mod avec;
pub mod gpx;
pub mod profile;
pub mod sans;
pub mod track;

pub use avec::{DecodeError, Options, Summary, Warning};
pub use profile::{Timestamp, Value};
pub use track::{Track, TrackPoint};
