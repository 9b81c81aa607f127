//! Result shapes returned by the polyline pipeline.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::traits::Place;

/// Places matched by one segment of the queried path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentResult<P> {
    places: Vec<P>,
}

impl<P> SegmentResult<P> {
    pub fn new(places: Vec<P>) -> Self {
        Self { places }
    }

    pub fn places(&self) -> &[P] {
        &self.places
    }

    pub fn into_places(self) -> Vec<P> {
        self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

/// Places matched anywhere along the path, each listed once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniquePlaces<P> {
    places: Vec<P>,
}

impl<P> UniquePlaces<P> {
    pub fn places(&self) -> &[P] {
        &self.places
    }
}

impl<P: Place> UniquePlaces<P> {
    /// Flattens segment results in segment order, keeping the first
    /// occurrence of every place id.
    pub fn from_segments(segments: Vec<SegmentResult<P>>) -> Self {
        let mut seen: HashSet<P::Id> = HashSet::new();
        let mut places = Vec::new();

        for segment in segments {
            for place in segment.into_places() {
                if seen.insert(place.id().clone()) {
                    places.push(place);
                }
            }
        }

        Self { places }
    }
}

/// One feature collection per path segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCollectionSet<C> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "features")]
    collections: Vec<C>,
}

impl<C> FeatureCollectionSet<C> {
    pub fn new(collections: Vec<C>) -> Self {
        Self {
            kind: "FeatureCollectionSet",
            collections,
        }
    }

    pub fn collections(&self) -> &[C] {
        &self.collections
    }
}

/// Final response body, one case per (unique, geojson) combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultEnvelope<P, C> {
    /// Raw per-segment results.
    Segments(Vec<SegmentResult<P>>),
    /// Deduplicated places.
    Unique(UniquePlaces<P>),
    /// Per-segment results as GeoJSON.
    FeatureCollectionSet(FeatureCollectionSet<C>),
    /// Deduplicated places as GeoJSON.
    FeatureCollection(C),
}
