//! GPX 1.1 output.

use std::{borrow::Cow, io::Write};

use crate::track::TrackPoint;

const GPX_NS: &str = "http://www.topografix.com/GPX/1/1";
const GPXTPX_NS: &str = "http://www.garmin.com/xmlschemas/TrackPointExtensionv1";

/// Document-level settings of the written GPX.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpxOptions {
    /// Value of the `creator` attribute.
    pub creator: String,
    /// Track name, usually the stem of the input file.
    pub name: Option<String>,
}

impl Default for GpxOptions {
    fn default() -> Self {
        Self {
            creator: "Garmin FIT to GPX Converter".into(),
            name: None,
        }
    }
}

/// Write points as a single-segment GPX track.
///
/// Numbers are written in plain decimal notation, never with an exponent. A
/// point's elevation is rounded to centimetres; heart rate and cadence go in
/// a Garmin `TrackPointExtension` block, omitted when both are absent.
pub fn write(w: &mut impl Write, points: &[TrackPoint], options: &GpxOptions) -> std::io::Result<()> {
    writeln!(w, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        w,
        r#"<gpx version="1.1" creator="{}" xmlns="{GPX_NS}" xmlns:gpxtpx="{GPXTPX_NS}">"#,
        escape(&options.creator)
    )?;
    writeln!(w, "  <metadata/>")?;
    writeln!(w, "  <trk>")?;

    if let Some(name) = &options.name {
        writeln!(w, "    <name>{}</name>", escape(name))?;
    }

    if points.is_empty() {
        writeln!(w, "    <trkseg/>")?;
    } else {
        writeln!(w, "    <trkseg>")?;
        for p in points {
            write_point(w, p)?;
        }
        writeln!(w, "    </trkseg>")?;
    }

    writeln!(w, "  </trk>")?;
    writeln!(w, "</gpx>")?;

    Ok(())
}

fn write_point(w: &mut impl Write, p: &TrackPoint) -> std::io::Result<()> {
    writeln!(
        w,
        r#"      <trkpt lat="{}" lon="{}">"#,
        p.latitude, p.longitude
    )?;

    if let Some(ele) = p.elevation {
        writeln!(w, "        <ele>{}</ele>", (ele * 100.0).round() / 100.0)?;
    }

    if let Some(time) = p.timestamp.and_then(|t| t.to_datetime()) {
        writeln!(w, "        <time>{}</time>", time.format("%Y-%m-%dT%H:%M:%SZ"))?;
    }

    if p.heart_rate.is_some() || p.cadence.is_some() {
        writeln!(w, "        <extensions>")?;
        writeln!(w, "          <gpxtpx:TrackPointExtension>")?;
        if let Some(hr) = p.heart_rate {
            writeln!(w, "            <gpxtpx:hr>{hr}</gpxtpx:hr>")?;
        }
        if let Some(cadence) = p.cadence {
            writeln!(w, "            <gpxtpx:cadence>{cadence}</gpxtpx:cadence>")?;
        }
        writeln!(w, "          </gpxtpx:TrackPointExtension>")?;
        writeln!(w, "        </extensions>")?;
    }

    writeln!(w, "      </trkpt>")
}

/// Escape text for use in element content and attribute values.
fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            ch => out.push(ch),
        }
    }
    Cow::Owned(out)
}
