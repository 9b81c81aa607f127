//! Encoded polyline decoding and encoding.
//!
//! Polylines arrive from clients in the compact "encoded polyline" format:
//! zig-zag signed deltas split into 5-bit groups, each group offset by 63 so
//! the result is printable ASCII. The same algorithm serves two dialects
//! that differ only in their scale factor.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Scale factor for standard five-decimal polylines.
pub const STANDARD_SCALE: f64 = 1.0e5;

/// Scale factor for Valhalla's six-decimal polylines.
pub const VALHALLA_SCALE: f64 = 1.0e6;

const GROUP_OFFSET: u8 = 63;
const CONTINUATION_BIT: i64 = 0x20;
const GROUP_MASK: i64 = 0x1f;
const MAX_SHIFT: u32 = 55;

/// Polyline dialect, i.e. the precision the deltas were scaled by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    #[default]
    Standard,
    Valhalla,
}

impl Dialect {
    /// Picks the high-precision dialect when the flag is set.
    pub fn from_flag(high_precision: bool) -> Self {
        if high_precision {
            Dialect::Valhalla
        } else {
            Dialect::Standard
        }
    }

    pub fn scale(self) -> f64 {
        match self {
            Dialect::Standard => STANDARD_SCALE,
            Dialect::Valhalla => VALHALLA_SCALE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("Invalid latitude {0}")]
    InvalidLatitude(f64),

    #[error("Invalid longitude {0}")]
    InvalidLongitude(f64),
}

/// A validated (latitude, longitude) pair in decimal degrees.
///
/// Serializes as a GeoJSON position, `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting values outside the WGS84 range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::InvalidLatitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Returns the coordinate as a (latitude, longitude) tuple.
    pub fn lat_lng(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.longitude, self.latitude].serialize(serializer)
    }
}

/// An ordered sequence of coordinates in path traversal order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CoordinatePath {
    coordinates: Vec<Coordinate>,
}

impl CoordinatePath {
    pub fn new(coordinates: Vec<Coordinate>) -> Self {
        Self { coordinates }
    }

    /// Builds a path from (latitude, longitude) tuples, validating each one.
    pub fn from_lat_lngs(points: &[(f64, f64)]) -> Result<Self, CoordinateError> {
        let coordinates = points
            .iter()
            .map(|&(lat, lng)| Coordinate::new(lat, lng))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { coordinates })
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn into_coordinates(self) -> Vec<Coordinate> {
        self.coordinates
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Coordinate> {
        self.coordinates.iter()
    }

    /// Pairs of consecutive coordinates along the path.
    pub fn segments(&self) -> impl Iterator<Item = (Coordinate, Coordinate)> + '_ {
        self.coordinates.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

impl<'a> IntoIterator for &'a CoordinatePath {
    type Item = &'a Coordinate;
    type IntoIter = std::slice::Iter<'a, Coordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.coordinates.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("Truncated polyline: input ends inside a value starting at byte {offset}")]
    Truncated { offset: usize },

    #[error("Invalid polyline character {byte:#04x} at byte {offset}")]
    InvalidByte { offset: usize, byte: u8 },

    #[error("Polyline value starting at byte {offset} overflows")]
    Overflow { offset: usize },

    #[error("Truncated polyline: latitude without a matching longitude")]
    DanglingLatitude,

    #[error(transparent)]
    InvalidCoordinate(#[from] CoordinateError),
}

/// Decodes an encoded polyline into a coordinate path.
///
/// `scale` is the precision factor the deltas were multiplied by before
/// encoding (see [`Dialect::scale`]). The empty string decodes to an empty
/// path.
pub fn decode(encoded: &str, scale: f64) -> Result<CoordinatePath, DecodeError> {
    let bytes = encoded.as_bytes();
    let mut coordinates = Vec::with_capacity(bytes.len() / 4);
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut count: usize = 0;
    let mut index = 0;

    while index < bytes.len() {
        let start = index;
        let (delta, next) = decode_value(bytes, index)?;
        index = next;

        let overflow = || DecodeError::Overflow { offset: start };
        if count % 2 == 0 {
            lat = lat.checked_add(delta).ok_or_else(overflow)?;
        } else {
            lng = lng.checked_add(delta).ok_or_else(overflow)?;
            let coordinate = Coordinate::new(lat as f64 / scale, lng as f64 / scale)?;
            coordinates.push(coordinate);
        }

        count += 1;
    }

    if count % 2 != 0 {
        return Err(DecodeError::DanglingLatitude);
    }

    Ok(CoordinatePath::new(coordinates))
}

/// Reads one zig-zag encoded value starting at `start`, returning the signed
/// value and the index of the first byte after it.
fn decode_value(bytes: &[u8], start: usize) -> Result<(i64, usize), DecodeError> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;
    let mut index = start;

    loop {
        let Some(&byte) = bytes.get(index) else {
            return Err(DecodeError::Truncated { offset: start });
        };
        if !(GROUP_OFFSET..=GROUP_OFFSET + 0x3f).contains(&byte) {
            return Err(DecodeError::InvalidByte {
                offset: index,
                byte,
            });
        }
        if shift > MAX_SHIFT {
            return Err(DecodeError::Overflow { offset: start });
        }

        let group = i64::from(byte - GROUP_OFFSET);
        index += 1;

        result |= (group & GROUP_MASK) << shift;
        shift += 5;

        if group < CONTINUATION_BIT {
            break;
        }
    }

    let value = if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    };

    Ok((value, index))
}

/// Encodes a coordinate path with the given scale factor.
///
/// Each coordinate is rounded to the nearest multiple of `1 / scale`, so
/// `decode(&encode(path, s), s)` reproduces `path` to within that precision.
pub fn encode(path: &CoordinatePath, scale: f64) -> String {
    let mut encoded = String::with_capacity(path.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for coordinate in path {
        let lat = (coordinate.latitude() * scale).round() as i64;
        let lng = (coordinate.longitude() * scale).round() as i64;

        encode_value(lat - prev_lat, &mut encoded);
        encode_value(lng - prev_lng, &mut encoded);

        prev_lat = lat;
        prev_lng = lng;
    }

    encoded
}

fn encode_value(value: i64, out: &mut String) {
    let mut zigzag = if value < 0 { !(value << 1) } else { value << 1 };

    while zigzag >= CONTINUATION_BIT {
        let group = (CONTINUATION_BIT | (zigzag & GROUP_MASK)) as u8;
        out.push(char::from(group + GROUP_OFFSET));
        zigzag >>= 5;
    }

    out.push(char::from(zigzag as u8 + GROUP_OFFSET));
}
