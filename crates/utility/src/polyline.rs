//! Encoded-polyline codec at the usual 5-decimal-digit precision.
//!
//! A route is a sequence of (latitude, longitude) deltas. Each delta is
//! zig-zag encoded, split into 5-bit groups from least significant up,
//! and every group gets bit 5 set as a continuation flag except the
//! last. Groups are shifted into printable ASCII by adding 63.

use std::error;
use std::fmt;

use crate::geo::LatLng;

const PRECISION: f64 = 1e5;
const CHUNK_BASE: u8 = 63;
const CONTINUATION_BIT: i64 = 0x20;
// A 63-bit zig-zagged value spans thirteen chunks, the last at shift
// 60. The next chunk would start at 65, past the width of an i64.
const MAX_VALUE_SHIFT: u32 = i64::BITS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended while the continuation bit of the current value was
    /// still set, or a latitude arrived without its longitude.
    UnexpectedEnd { offset: usize },
    /// A byte below the printable chunk base, or a continuation run
    /// longer than any encodable value.
    InvalidByte { byte: u8, offset: usize },
}

impl error::Error for DecodeError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::UnexpectedEnd { offset } => {
                write!(f, "polyline truncated at byte {}", offset)
            }
            DecodeError::InvalidByte { byte, offset } => {
                write!(f, "invalid polyline byte 0x{:02x} at {}", byte, offset)
            }
        }
    }
}

/// Decodes an encoded polyline into its points, in input order.
/// An empty string is an empty route, not an error.
pub fn decode(encoded: &str) -> Result<Vec<LatLng>, DecodeError> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut offset = 0;
    let mut lat = 0i64;
    let mut lng = 0i64;
    while offset < bytes.len() {
        let (delta_lat, next) = decode_value(bytes, offset)?;
        let (delta_lng, next) = decode_value(bytes, next)?;
        lat += delta_lat;
        lng += delta_lng;
        points.push(LatLng::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
        offset = next;
    }
    Ok(points)
}

/// Encodes points into the compact ASCII form. Inverse of [`decode`] for
/// coordinates already rounded to 5 decimal places.
pub fn encode(points: &[LatLng]) -> String {
    let mut encoded = String::new();
    let mut previous_lat = 0i64;
    let mut previous_lng = 0i64;
    for point in points {
        let lat = (point.lat * PRECISION).round() as i64;
        let lng = (point.lng * PRECISION).round() as i64;
        encode_value(lat - previous_lat, &mut encoded);
        encode_value(lng - previous_lng, &mut encoded);
        previous_lat = lat;
        previous_lng = lng;
    }
    encoded
}

fn decode_value(bytes: &[u8], start: usize) -> Result<(i64, usize), DecodeError> {
    let mut accumulator = 0i64;
    let mut shift = 0;
    let mut offset = start;
    loop {
        let Some(&byte) = bytes.get(offset) else {
            return Err(DecodeError::UnexpectedEnd { offset: start });
        };
        if byte < CHUNK_BASE {
            return Err(DecodeError::InvalidByte { byte, offset });
        }
        let chunk = (byte - CHUNK_BASE) as i64;
        if shift >= MAX_VALUE_SHIFT {
            // A continuation run longer than any value the format can
            // produce. Shifting further would leave the i64.
            return Err(DecodeError::InvalidByte { byte, offset });
        }
        accumulator |= (chunk & 0x1f) << shift;
        shift += 5;
        offset += 1;
        if chunk & CONTINUATION_BIT == 0 {
            break;
        }
    }
    // zig-zag: odd values are negative
    let delta = if accumulator & 1 != 0 {
        !(accumulator >> 1)
    } else {
        accumulator >> 1
    };
    Ok((delta, offset))
}

fn encode_value(delta: i64, out: &mut String) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while value >= CONTINUATION_BIT {
        out.push(((value & 0x1f | CONTINUATION_BIT) as u8 + CHUNK_BASE) as char);
        value >>= 5;
    }
    out.push((value as u8 + CHUNK_BASE) as char);
}
