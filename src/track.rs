//! GPS track points assembled from `record` messages.

use std::io::Read;

use log::debug;

use crate::{
    avec::{self, DecodeError, FromMessages, Options, Summary, reader},
    profile::{Timestamp, Value, message},
    sans::session::DecodedMessage,
};

/// A single position of a track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    /// Degrees north, within [-90, 90].
    pub latitude: f64,
    /// Degrees east.
    pub longitude: f64,
    /// Metres above mean sea level.
    pub elevation: Option<f64>,
    pub timestamp: Option<Timestamp>,
    /// Beats per minute.
    pub heart_rate: Option<u8>,
    /// Revolutions per minute.
    pub cadence: Option<u8>,
}

impl TrackPoint {
    /// Build a point from a `record` message.
    ///
    /// Returns `None` unless the message holds both a valid latitude and a
    /// valid longitude, and the latitude is a real one.
    pub fn from_message(m: &DecodedMessage) -> Option<Self> {
        let latitude = degrees(m.get("position_lat"))?;
        let longitude = degrees(m.get("position_long"))?;

        if !(-90.0..=90.0).contains(&latitude) {
            debug!("skipping point with latitude {} out of range", latitude);
            return None;
        }

        let elevation = ["altitude", "enhanced_altitude"]
            .into_iter()
            .find_map(|name| m.get(name).and_then(Value::as_f64));

        let count = |name| {
            m.get(name)
                .and_then(Value::as_u64)
                .and_then(|x| u8::try_from(x).ok())
        };

        Some(Self {
            latitude,
            longitude,
            elevation,
            timestamp: m.timestamp(),
            heart_rate: count("heart_rate"),
            cadence: count("cadence"),
        })
    }
}

fn degrees(v: Option<&Value>) -> Option<f64> {
    match v? {
        Value::Degrees(d) => Some(*d),
        _ => None,
    }
}

/// Ordered track points of a document.
///
/// Points appear in stream order, without reordering, deduplication or
/// interpolation. A document without positions yields an empty track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub points: Vec<TrackPoint>,
}

impl Track {
    /// Decode a whole document held in memory.
    pub fn from_slice(r: &[u8], options: Options) -> Result<(Self, Summary), DecodeError> {
        let mut track = Self::default();
        let summary = avec::decode_slice_with(r, options, &mut track)?;
        Ok((track, summary))
    }

    /// Decode a whole document from a reader, one record at a time.
    pub fn from_reader(
        r: &mut impl Read,
        options: Options,
    ) -> Result<(Self, Summary), reader::Error> {
        let mut track = Self::default();
        let summary = avec::decode_reader_with(r, options, &mut track)?;
        Ok((track, summary))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromMessages for Track {
    fn add_message(&mut self, m: DecodedMessage) {
        if m.global != message::RECORD {
            return;
        }

        match TrackPoint::from_message(&m) {
            Some(point) => self.points.push(point),
            None => debug!("record message without a usable position"),
        }
    }
}
