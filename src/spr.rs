//! Standard places result: the record a PIP index returns for each match.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::polyline::{Coordinate, CoordinateError};
use crate::traits::Place;

/// Existential flag: `-1` unknown, `0` false, `1` true.
pub type Flag = i8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardPlace {
    #[serde(rename = "wof:id")]
    pub id: i64,
    #[serde(rename = "wof:parent_id", default = "unknown_id")]
    pub parent_id: i64,
    #[serde(rename = "wof:name")]
    pub name: String,
    #[serde(rename = "wof:placetype")]
    pub placetype: String,
    #[serde(rename = "wof:country", default)]
    pub country: String,
    #[serde(rename = "wof:repo", default)]
    pub repo: String,
    #[serde(rename = "wof:path", default)]
    pub path: String,
    #[serde(rename = "mz:uri", default)]
    pub uri: String,
    #[serde(rename = "mz:latitude")]
    pub latitude: f64,
    #[serde(rename = "mz:longitude")]
    pub longitude: f64,
    #[serde(rename = "mz:min_latitude", default, skip_serializing_if = "Option::is_none")]
    pub min_latitude: Option<f64>,
    #[serde(rename = "mz:min_longitude", default, skip_serializing_if = "Option::is_none")]
    pub min_longitude: Option<f64>,
    #[serde(rename = "mz:max_latitude", default, skip_serializing_if = "Option::is_none")]
    pub max_latitude: Option<f64>,
    #[serde(rename = "mz:max_longitude", default, skip_serializing_if = "Option::is_none")]
    pub max_longitude: Option<f64>,
    #[serde(rename = "mz:is_current", default = "unknown_flag")]
    pub is_current: Flag,
    #[serde(rename = "mz:is_ceased", default = "unknown_flag")]
    pub is_ceased: Flag,
    #[serde(rename = "mz:is_deprecated", default = "unknown_flag")]
    pub is_deprecated: Flag,
    #[serde(rename = "mz:is_superseded", default = "unknown_flag")]
    pub is_superseded: Flag,
    #[serde(rename = "mz:is_superseding", default = "unknown_flag")]
    pub is_superseding: Flag,
    #[serde(rename = "wof:lastmodified", default)]
    pub last_modified: i64,
    /// Any other properties the index attached.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn unknown_id() -> i64 {
    -1
}

fn unknown_flag() -> Flag {
    -1
}

impl StandardPlace {
    /// The place's centroid.
    pub fn centroid(&self) -> Result<Coordinate, CoordinateError> {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Bounding box as `[min_lon, min_lat, max_lon, max_lat]`, when the
    /// record carries all four extents.
    pub fn bbox(&self) -> Option<[f64; 4]> {
        Some([
            self.min_longitude?,
            self.min_latitude?,
            self.max_longitude?,
            self.max_latitude?,
        ])
    }
}

impl Place for StandardPlace {
    type Id = i64;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
