//! Line protocol encoding:
//!
//! ```text
//! measurement[,tag=value...] field=value[,field=value...] timestamp
//! ```
//!
//! Names and values are written as-is. Commas, spaces and equals signs inside
//! them corrupt the line, so callers must keep them out.

use crate::{
    config::{Fields, Tags},
    error::LineError,
    point::{Point, Time},
};

pub fn encode_line(wtr: &mut String, point: &Point) {
    wtr.push_str(&point.measurement);
    for (key, value) in &point.tags {
        wtr.push(',');
        encode_pair(wtr, key, value);
    }
    wtr.push(' ');
    for (i, (key, value)) in point.fields.iter().enumerate() {
        if i != 0 {
            wtr.push(',');
        }
        encode_pair(wtr, key, value);
    }
    wtr.push(' ');
    wtr.push_str(&point.time.to_string());
}
fn encode_pair(wtr: &mut String, key: &str, value: &str) {
    wtr.push_str(key);
    wtr.push('=');
    wtr.push_str(value);
}

pub fn decode_line(line: &str) -> Result<Point, LineError> {
    let (head, time) = line.rsplit_once(' ').ok_or(LineError::MissingTimestamp)?;
    let time: Time = time
        .parse()
        .map_err(|_| LineError::InvalidTimestamp(time.to_string()))?;
    let (series, fields) = head.split_once(' ').ok_or(LineError::MissingFields)?;

    let mut series = series.split(',');
    let measurement = series.next().unwrap_or_default();
    if measurement.is_empty() {
        return Err(LineError::EmptyMeasurement);
    }
    let tags = series.map(decode_pair).collect::<Result<Tags, _>>()?;
    let fields = match fields {
        "" => Fields::new(),
        fields => fields.split(',').map(decode_pair).collect::<Result<_, _>>()?,
    };
    Ok(Point {
        measurement: measurement.to_string(),
        time,
        tags,
        fields,
    })
}
fn decode_pair(pair: &str) -> Result<(String, String), LineError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(LineError::MalformedPair(pair.to_string())),
    }
}

impl Point {
    pub fn line(&self) -> String {
        let mut line = String::new();
        encode_line(&mut line, self);
        line
    }
}
