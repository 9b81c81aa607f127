//! GeoJSON output for place results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::polyline::{Coordinate, CoordinateError};
use crate::spr::StandardPlace;
use crate::traits::{FeatureCollectionAdapter, SpatialIndex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: (f64, f64) },
}

impl From<Coordinate> for Geometry {
    fn from(coordinate: Coordinate) -> Self {
        Geometry::Point {
            coordinates: (coordinate.longitude(), coordinate.latitude()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Feature {
    Feature {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        bbox: Option<[f64; 4]>,
        geometry: Geometry,
        properties: Map<String, Value>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FeatureCollection {
    FeatureCollection { features: Vec<Feature> },
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        FeatureCollection::FeatureCollection { features }
    }

    pub fn features(&self) -> &[Feature] {
        match self {
            FeatureCollection::FeatureCollection { features } => features,
        }
    }
}

#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("place {id}: {source}")]
    Centroid {
        id: i64,
        #[source]
        source: CoordinateError,
    },

    #[error("place {id}: properties must serialize to an object")]
    Properties { id: i64 },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Builds one Point feature per place, located at its centroid, with the
/// serialized record as properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointFeatureAdapter;

impl PointFeatureAdapter {
    pub fn feature(&self, place: &StandardPlace) -> Result<Feature, GeoJsonError> {
        let centroid = place.centroid().map_err(|source| GeoJsonError::Centroid {
            id: place.id,
            source,
        })?;

        let properties = match serde_json::to_value(place)? {
            Value::Object(map) => map,
            _ => return Err(GeoJsonError::Properties { id: place.id }),
        };

        Ok(Feature::Feature {
            bbox: place.bbox(),
            geometry: centroid.into(),
            properties,
        })
    }
}

impl<I> FeatureCollectionAdapter<I> for PointFeatureAdapter
where
    I: SpatialIndex<Place = StandardPlace>,
{
    type Collection = FeatureCollection;
    type Error = GeoJsonError;

    fn to_feature_collection(
        &self,
        places: &[StandardPlace],
        _index: &I,
    ) -> Result<FeatureCollection, GeoJsonError> {
        let features = places
            .iter()
            .map(|place| self.feature(place))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FeatureCollection::new(features))
    }
}
