//! Semantic profile for the messages needed to extract a GPS track.
//!
//! The profile maps a (global message number, field number) pair to a field
//! name, its units, and the rule converting raw values into meaningful ones.
//! Pairs missing from the profile keep their raw value and no name.

use chrono::{DateTime, Utc};

pub use crate::sans::data::Value;

/// Global message numbers named by the profile.
pub mod message {
    pub const FILE_ID: u16 = 0;
    pub const SESSION: u16 = 18;
    pub const LAP: u16 = 19;
    pub const RECORD: u16 = 20;
    pub const EVENT: u16 = 21;
    pub const ACTIVITY: u16 = 34;
}

/// Field number of the `timestamp` field, common to every message.
pub const TIMESTAMP_FIELD: u8 = 253;

/// Field number of the `message_index` field, common to every message.
pub const MESSAGE_INDEX_FIELD: u8 = 254;

/// Seconds since the FIT epoch, 1989-12-31T00:00:00Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub u32);

impl Timestamp {
    /// Number of seconds between the Unix epoch and the FIT epoch.
    pub const FIT_EPOCH: i64 = 631_065_600;

    /// Seconds since the Unix epoch.
    pub fn unix_seconds(self) -> i64 {
        i64::from(self.0) + Self::FIT_EPOCH
    }

    /// The calendar time this timestamp represents.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.unix_seconds(), 0)
    }
}

/// Convert a coordinate from semicircles (2^31 semicircles = 180 degrees) to
/// degrees.
pub fn semicircles_to_degrees(semicircles: i32) -> f64 {
    f64::from(semicircles) * (180.0 / 2_147_483_648.0)
}

/// Convert a coordinate from degrees to the nearest semicircle.
pub fn degrees_to_semicircles(degrees: f64) -> i32 {
    (degrees * (2_147_483_648.0 / 180.0)).round() as i32
}

/// How raw field values become meaningful ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// Keep the raw value.
    Raw,
    /// `raw / scale - offset`.
    Scaled { scale: f64, offset: f64 },
    /// A signed 32-bit coordinate in semicircles.
    Semicircles,
    /// An unsigned 32-bit count of seconds since the FIT epoch.
    DateTime,
}

impl Rule {
    /// Apply the rule to a raw value. Invalid values stay invalid, and values
    /// of an unexpected type pass through unchanged.
    pub fn apply(self, raw: Value) -> Value {
        match (self, raw) {
            (_, Value::Invalid) => Value::Invalid,
            (Self::Raw, v) => v,
            (_, Value::Array(values)) => {
                Value::Array(values.into_iter().map(|v| self.apply(v)).collect())
            }
            (Self::Scaled { scale, offset }, v) => match v.as_f64() {
                Some(x) => Value::Scaled(x / scale - offset),
                None => v,
            },
            (Self::Semicircles, Value::I32(s)) => Value::Degrees(semicircles_to_degrees(s)),
            (Self::DateTime, Value::U32(t)) => Value::Timestamp(Timestamp(t)),
            (_, v) => v,
        }
    }
}

/// Profile entry for a single field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldProfile {
    pub name: &'static str,
    pub units: Option<&'static str>,
    pub rule: Rule,
}

const fn raw(name: &'static str) -> FieldProfile {
    FieldProfile {
        name,
        units: None,
        rule: Rule::Raw,
    }
}

const fn counted(name: &'static str, units: &'static str) -> FieldProfile {
    FieldProfile {
        name,
        units: Some(units),
        rule: Rule::Raw,
    }
}

const fn scaled(name: &'static str, units: &'static str, scale: f64, offset: f64) -> FieldProfile {
    FieldProfile {
        name,
        units: Some(units),
        rule: Rule::Scaled { scale, offset },
    }
}

const fn position(name: &'static str) -> FieldProfile {
    FieldProfile {
        name,
        units: Some("deg"),
        rule: Rule::Semicircles,
    }
}

const fn date_time(name: &'static str) -> FieldProfile {
    FieldProfile {
        name,
        units: Some("s"),
        rule: Rule::DateTime,
    }
}

/// Name of a global message, if the profile knows it.
pub fn message_name(global: u16) -> Option<&'static str> {
    use message::*;

    Some(match global {
        FILE_ID => "file_id",
        SESSION => "session",
        LAP => "lap",
        RECORD => "record",
        EVENT => "event",
        ACTIVITY => "activity",
        _ => return None,
    })
}

/// Profile entry for a field of a global message, if the profile knows it.
pub fn field(global: u16, number: u8) -> Option<FieldProfile> {
    use message::*;

    const TIMESTAMP: FieldProfile = date_time("timestamp");
    const MESSAGE_INDEX: FieldProfile = raw("message_index");
    const EVENT_FIELD: FieldProfile = raw("event");
    const EVENT_TYPE: FieldProfile = raw("event_type");
    const START_TIME: FieldProfile = date_time("start_time");
    const START_LAT: FieldProfile = position("start_position_lat");
    const START_LONG: FieldProfile = position("start_position_long");
    const TOTAL_ELAPSED_TIME: FieldProfile = scaled("total_elapsed_time", "s", 1000.0, 0.0);
    const TOTAL_TIMER_TIME: FieldProfile = scaled("total_timer_time", "s", 1000.0, 0.0);
    const TOTAL_DISTANCE: FieldProfile = scaled("total_distance", "m", 100.0, 0.0);

    Some(match (global, number) {
        (_, TIMESTAMP_FIELD) => TIMESTAMP,
        (_, MESSAGE_INDEX_FIELD) => MESSAGE_INDEX,

        (FILE_ID, 0) => raw("type"),
        (FILE_ID, 1) => raw("manufacturer"),
        (FILE_ID, 2) => raw("product"),
        (FILE_ID, 3) => raw("serial_number"),
        (FILE_ID, 4) => date_time("time_created"),
        (FILE_ID, 5) => raw("number"),

        (RECORD, 0) => position("position_lat"),
        (RECORD, 1) => position("position_long"),
        (RECORD, 2) => scaled("altitude", "m", 5.0, 500.0),
        (RECORD, 3) => counted("heart_rate", "bpm"),
        (RECORD, 4) => counted("cadence", "rpm"),
        (RECORD, 5) => scaled("distance", "m", 100.0, 0.0),
        (RECORD, 6) => scaled("speed", "m/s", 1000.0, 0.0),
        (RECORD, 7) => counted("power", "watts"),
        (RECORD, 13) => counted("temperature", "C"),
        (RECORD, 73) => scaled("enhanced_speed", "m/s", 1000.0, 0.0),
        (RECORD, 78) => scaled("enhanced_altitude", "m", 5.0, 500.0),

        (EVENT, 0) => EVENT_FIELD,
        (EVENT, 1) => EVENT_TYPE,

        (LAP | SESSION, 0) => EVENT_FIELD,
        (LAP | SESSION, 1) => EVENT_TYPE,
        (LAP | SESSION, 2) => START_TIME,
        (LAP | SESSION, 3) => START_LAT,
        (LAP | SESSION, 4) => START_LONG,
        (LAP, 5) => position("end_position_lat"),
        (LAP, 6) => position("end_position_long"),
        (SESSION, 5) => raw("sport"),
        (SESSION, 6) => raw("sub_sport"),
        (LAP | SESSION, 7) => TOTAL_ELAPSED_TIME,
        (LAP | SESSION, 8) => TOTAL_TIMER_TIME,
        (LAP | SESSION, 9) => TOTAL_DISTANCE,

        (ACTIVITY, 0) => TOTAL_TIMER_TIME,
        (ACTIVITY, 1) => raw("num_sessions"),
        (ACTIVITY, 2) => raw("type"),
        (ACTIVITY, 3) => EVENT_FIELD,
        (ACTIVITY, 4) => EVENT_TYPE,
        (ACTIVITY, 5) => raw("local_timestamp"),

        _ => return None,
    })
}
