mod support;

use std::io;

use fit2gpx::{
    DecodeError, Options, Summary, Timestamp, Track, Value,
    avec::{
        self, CrcRegion, Warning, reader,
        slice::{Parser, State, Step},
    },
    sans::{check::compute_crc, session::DecodedMessage},
};

use support::{Crc, FitBuilder, RECORD, RECORD_FIELDS, record_body, ride};

/// Decode with both decoders, which must agree.
fn decode(bytes: &[u8], options: Options) -> Result<(Track, Summary), DecodeError> {
    let slice = Track::from_slice(bytes, options);
    let reader = Track::from_reader(&mut &bytes[..], options).map_err(|e| match e {
        reader::Error::Decode(e) => e,
        reader::Error::Io(e) => panic!("unexpected I/O error: {e}"),
    });
    assert_eq!(slice, reader);
    slice
}

fn messages(bytes: &[u8]) -> Vec<DecodedMessage> {
    let mut messages = Vec::new();
    avec::decode_slice(bytes, &mut messages).unwrap();
    messages
}

#[test]
fn minimal_record() {
    let bytes = ride(&[record_body(0, 0, 0, 5000, 0xFF, 0xFF)]).build();
    let (track, summary) = decode(&bytes, Options::default()).unwrap();

    assert_eq!(track.len(), 1);
    let point = track.points[0];
    assert_eq!(point.latitude, 0.0);
    assert_eq!(point.longitude, 0.0);
    assert_eq!(point.elevation, Some(500.0));
    assert_eq!(point.timestamp, Some(Timestamp(0)));
    assert_eq!(
        point.timestamp.and_then(Timestamp::to_datetime).map(|t| t.to_rfc3339()),
        Some("1989-12-31T00:00:00+00:00".into())
    );
    assert_eq!(point.heart_rate, None);
    assert_eq!(point.cadence, None);

    assert_eq!(summary.records, 2);
    assert_eq!(summary.header.len(), 14);
    assert!(summary.warnings.is_empty());
}

#[test]
fn bad_signature_comes_first() {
    let mut bytes = ride(&[record_body(0, 0, 0, 0, 0, 0)]).build();
    bytes[0] = 13;
    bytes[8..12].copy_from_slice(b"XFIT");

    assert_eq!(
        decode(&bytes, Options::default()),
        Err(DecodeError::BadSignature {
            offset: 8,
            found: *b"XFIT"
        })
    );
}

#[test]
fn unknown_header_length() {
    let mut bytes = FitBuilder::new().build();
    bytes[0] = 16;
    assert_eq!(
        decode(&bytes, Options::default()),
        Err(DecodeError::UnknownHeaderLength {
            offset: 0,
            length: 16
        })
    );
}

#[test]
fn data_before_definition() {
    let bytes = FitBuilder::new().data(3, &[0; 16]).build();
    let err = decode(&bytes, Options::default()).unwrap_err();
    assert_eq!(err, DecodeError::UndefinedLocalType { offset: 14, local: 3 });
    assert_eq!(err.offset(), 14);
}

#[test]
fn redefinition_and_developer_fields() {
    let bytes = FitBuilder::new()
        .define(0, RECORD, &RECORD_FIELDS)
        .data(0, &record_body(10, 1 << 30, 1 << 29, 2500, 120, 80))
        .define_big_endian(0, RECORD, &[(0, 4, 0x85), (1, 4, 0x85)], &[(7, 2, 0)])
        .raw(&[0x00])
        .raw(&(-(1_i32 << 30)).to_be_bytes())
        .raw(&(1_i32 << 29).to_be_bytes())
        .raw(&[0xAB, 0xCD])
        .build();

    let messages = messages(&bytes);
    assert_eq!(messages.len(), 2);

    assert_eq!(messages[0].get("position_lat"), Some(&Value::Degrees(90.0)));
    assert_eq!(messages[0].get("altitude"), Some(&Value::Scaled(0.0)));
    assert_eq!(messages[0].get("cadence"), Some(&Value::U8(80)));

    assert_eq!(messages[1].get("position_lat"), Some(&Value::Degrees(-90.0)));
    assert_eq!(messages[1].get("position_long"), Some(&Value::Degrees(45.0)));
    assert_eq!(messages[1].get("altitude"), None);
    assert_eq!(messages[1].developer_fields[0].number, 7);
    assert_eq!(messages[1].developer_fields[0].bytes, vec![0xAB, 0xCD]);

    let (track, _) = decode(&bytes, Options::default()).unwrap();
    assert_eq!(track.len(), 2);
    assert_eq!(track.points[1].timestamp, None);
}

#[test]
fn compressed_timestamps() {
    let invalid = u32::MAX;
    let mut b = ride(&[record_body(1000, 0, 0, 0, 0xFF, 0xFF)]);
    b.compressed(0, 4, &record_body(invalid, 1, 1, 0, 0xFF, 0xFF));
    b.compressed(0, 10, &record_body(invalid, 2, 2, 0, 0xFF, 0xFF));

    let (track, _) = decode(&b.build(), Options::default()).unwrap();
    let times: Vec<_> = track.points.iter().map(|p| p.timestamp).collect();

    // 1000 mod 32 = 8, so offset 4 rolls into the next window.
    assert_eq!(
        times,
        [Some(Timestamp(1000)), Some(Timestamp(1028)), Some(Timestamp(1034))]
    );
}

#[test]
fn half_positions_are_skipped() {
    let mut b = ride(&[
        record_body(1, 100, i32::MAX, 0, 0, 0),
        record_body(2, i32::MAX, 100, 0, 0, 0),
    ]);
    b.define(1, RECORD, &[(0, 4, 0x85)]).data(1, &[1, 0, 0, 0]);

    let (track, summary) = decode(&b.build(), Options::default()).unwrap();
    assert!(track.is_empty());
    assert_eq!(summary.records, 5);
}

#[test]
fn zero_crc_skips_verification() {
    let mut b = ride(&[record_body(0, 0, 0, 0, 0, 0)]);
    b.header_crc = Crc::Zero;
    b.file_crc = Crc::Zero;

    let (_, summary) = decode(&b.build(), Options::default()).unwrap();
    assert_eq!(summary.header.crc, Some(0));
    assert!(summary.warnings.is_empty());
}

#[test]
fn corrupted_file_crc_warns() {
    let mut b = ride(&[record_body(0, 0, 0, 0, 0, 0)]);
    b.file_crc = Crc::Corrupt;
    let bytes = b.build();

    let (track, summary) = decode(&bytes, Options::default()).unwrap();
    assert_eq!(track.len(), 1);

    let (covered, trailer) = bytes.split_at(bytes.len() - 2);
    assert_eq!(
        summary.warnings,
        [Warning::CrcMismatch {
            region: CrcRegion::File,
            found: u16::from_le_bytes([trailer[0], trailer[1]]),
            calculated: compute_crc(0, covered),
        }]
    );

    let options = Options {
        verify_file_crc: false,
        ..Options::default()
    };
    let (_, summary) = decode(&bytes, options).unwrap();
    assert!(summary.warnings.is_empty());
}

#[test]
fn corrupted_header_crc_warns() {
    let mut b = ride(&[record_body(0, 0, 0, 0, 0, 0)]);
    b.header_crc = Crc::Corrupt;

    let (track, summary) = decode(&b.build(), Options::default()).unwrap();
    assert_eq!(track.len(), 1);
    assert!(matches!(
        summary.warnings[..],
        [Warning::CrcMismatch {
            region: CrcRegion::Header,
            ..
        }]
    ));
}

#[test]
fn short_header_and_no_trailing_crc() {
    let mut b = ride(&[record_body(5, 0, 0, 0, 0, 0)]);
    b.header_crc = Crc::Absent;
    b.file_crc = Crc::Absent;

    let (track, summary) = decode(&b.build(), Options::default()).unwrap();
    assert_eq!(track.len(), 1);
    assert_eq!(summary.header.len(), 12);
    assert_eq!(summary.header.crc, None);
    assert!(summary.warnings.is_empty());
}

#[test]
fn truncated_stream() {
    let bytes = ride(&[record_body(0, 0, 0, 0, 0, 0), record_body(1, 0, 0, 0, 0, 0)]).build();
    assert_eq!(bytes.len(), 74);

    // The second data record's header is at 55, its latitude at 60.
    assert_eq!(
        decode(&bytes[..60], Options::default()),
        Err(DecodeError::TruncatedStream { offset: 60 })
    );
    assert_eq!(
        decode(&bytes[..10], Options::default()),
        Err(DecodeError::TruncatedStream { offset: 0 })
    );
}

#[test]
fn record_crossing_declared_end() {
    let b = ride(&[record_body(0, 0, 0, 0, 0, 0), record_body(1, 0, 0, 0, 0, 0)]);
    let bytes = b.build_declaring(b.records_len() as u32 - 5);

    // The section now ends at 67, inside the second record's longitude.
    assert_eq!(
        decode(&bytes, Options::default()),
        Err(DecodeError::TruncatedStream { offset: 64 })
    );
}

#[test]
fn largest_declared_size_without_records() {
    let mut b = FitBuilder::new();
    b.file_crc = Crc::Absent;
    let bytes = b.build_declaring(u32::MAX);
    assert_eq!(bytes.len(), 14);

    assert_eq!(
        decode(&bytes, Options::default()),
        Err(DecodeError::TruncatedStream { offset: 14 })
    );
}

#[test]
fn no_positions_is_an_empty_track() {
    let bytes = FitBuilder::new()
        .define(0, 0, &[(0, 1, 0x00), (4, 4, 0x86)])
        .data(0, &[4, 0x10, 0, 0, 0])
        .build();

    let (track, summary) = decode(&bytes, Options::default()).unwrap();
    assert!(track.is_empty());
    assert_eq!(summary.records, 2);

    let messages = messages(&bytes);
    assert_eq!(messages[0].name, Some("file_id"));
    assert_eq!(messages[0].get("type"), Some(&Value::Enum(4)));
    assert_eq!(
        messages[0].get("time_created"),
        Some(&Value::Timestamp(Timestamp(16)))
    );
}

#[test]
fn parser_steps() {
    let bytes = ride(&[record_body(0, 0, 0, 0, 0, 0)]).build();
    let mut parser = Parser::new(&bytes);
    assert_eq!(parser.state(), &State::ReadingHeader);

    assert!(matches!(parser.step(), Ok(Step::Header(h)) if h.data_size == 41));
    assert!(matches!(
        parser.state(),
        State::ReadingRecords { remaining: 41, .. }
    ));
    assert_eq!(
        parser.step(),
        Ok(Step::Definition {
            local: 0,
            global: RECORD
        })
    );
    assert!(matches!(parser.step(), Ok(Step::Message(m)) if m.global == RECORD));
    assert!(matches!(parser.state(), State::Done { .. }));

    let Ok(Step::Done(summary)) = parser.step() else {
        panic!("parser not done");
    };
    assert_eq!(summary.records, 2);
    assert_eq!(parser.step(), Ok(Step::Done(summary)));
}

#[test]
fn parser_failure_is_sticky() {
    let mut bytes = FitBuilder::new().build();
    bytes[9] = b'f';

    let mut parser = Parser::new(&bytes);
    let err = parser.step().unwrap_err();
    assert_eq!(parser.state(), &State::Failed(err));
    assert_eq!(parser.step(), Err(err));

    let mut parser = Parser::new(&bytes);
    assert!(matches!(parser.next(), Some(Err(_))));
    assert!(parser.next().is_none());
}

#[test]
fn parser_iterates_messages() {
    let bytes = ride(&[
        record_body(0, 0, 0, 0, 0, 0),
        record_body(1, 0, 0, 0, 0, 0),
        record_body(2, 0, 0, 0, 0, 0),
    ])
    .build();

    let timestamps: Vec<_> = Parser::new(&bytes)
        .map(|m| m.unwrap().timestamp())
        .collect();
    assert_eq!(
        timestamps,
        [Some(Timestamp(0)), Some(Timestamp(1)), Some(Timestamp(2))]
    );

    // Stopping early needs no cleanup.
    assert_eq!(Parser::new(&bytes).take(1).count(), 1);
}

#[test]
fn reader_errors_are_reported() {
    struct Failing;

    impl io::Read for Failing {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device unplugged"))
        }
    }

    let err = Track::from_reader(&mut Failing, Options::default()).unwrap_err();
    assert!(matches!(err, reader::Error::Io(_)));
}
