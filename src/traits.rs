//! Collaborator contracts for the polyline query pipeline.
//!
//! The pipeline only knows places by their identifiers and hands everything
//! else (intersection, filtering, GeoJSON construction) to implementations of
//! these traits.

use std::fmt::Display;
use std::hash::Hash;

use serde::Serialize;

use crate::pipeline::QueryParams;
use crate::polyline::CoordinatePath;
use crate::results::SegmentResult;

/// Unique identifier for places.
pub trait Id: Clone + Eq + Hash {}

impl<T> Id for T where T: Clone + Eq + Hash {}

/// A matched place record.
pub trait Place: Clone + Serialize + Send + Sync {
    type Id: Id;

    /// Stable identifier, used as the deduplication key.
    fn id(&self) -> &Self::Id;
}

/// A spatial index able to intersect a path with its polygons.
pub trait SpatialIndex: Send + Sync {
    type Place: Place;
    type Filters;
    type Error: Display;

    /// True while the index is being (re)built; queries are refused meanwhile.
    fn is_indexing(&self) -> bool;

    /// Returns one result set per path segment, in path order.
    fn intersects_by_path(
        &self,
        path: &CoordinatePath,
        filters: &Self::Filters,
    ) -> Result<Vec<SegmentResult<Self::Place>>, Self::Error>;
}

/// Turns request query parameters into index filters.
pub trait FilterParser: Send + Sync {
    type Filters;
    type Error: Display;

    fn parse(&self, params: &QueryParams) -> Result<Self::Filters, Self::Error>;
}

/// Builds a GeoJSON feature collection from a set of places.
pub trait FeatureCollectionAdapter<I: SpatialIndex>: Send + Sync {
    type Collection: Serialize;
    type Error: Display;

    fn to_feature_collection(
        &self,
        places: &[I::Place],
        index: &I,
    ) -> Result<Self::Collection, Self::Error>;
}
