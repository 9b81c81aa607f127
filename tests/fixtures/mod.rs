//! Test fixtures for pip-polyline.
//!
//! Provides an in-memory index, filter parser and GeoJSON adapter so the
//! pipeline can be driven without an upstream service.

#![allow(dead_code)]

pub mod upstream;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use pip_polyline::pipeline::{PolylineOptions, PolylinePipeline, QueryParams};
use pip_polyline::polyline::{self, CoordinatePath};
use pip_polyline::results::SegmentResult;
use pip_polyline::traits::{FeatureCollectionAdapter, FilterParser, Place, SpatialIndex};
use serde::Serialize;
use serde_json::{json, Value};

/// Canonical three-point polyline: (38.5,-120.2), (40.7,-120.95), (43.252,-126.453).
pub const REFERENCE_POLYLINE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockPlace {
    pub id: String,
    pub point: usize,
}

impl Place for MockPlace {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

pub type MockFilters = Vec<(String, String)>;

/// Returns, for the n-th coordinate of a path, the places listed in `table[n]`.
#[derive(Debug, Default)]
pub struct MockIndex {
    table: Vec<Vec<&'static str>>,
    indexing: AtomicBool,
    failure: Option<String>,
    pub queries: Mutex<Vec<(CoordinatePath, MockFilters)>>,
}

impl MockIndex {
    pub fn new(table: Vec<Vec<&'static str>>) -> Self {
        Self {
            table,
            ..Default::default()
        }
    }

    pub fn indexing(self) -> Self {
        self.indexing.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing(mut self, msg: &str) -> Self {
        self.failure = Some(msg.to_string());
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn last_query(&self) -> Option<(CoordinatePath, MockFilters)> {
        self.queries.lock().unwrap().last().cloned()
    }
}

impl SpatialIndex for MockIndex {
    type Place = MockPlace;
    type Filters = MockFilters;
    type Error = String;

    fn is_indexing(&self) -> bool {
        self.indexing.load(Ordering::SeqCst)
    }

    fn intersects_by_path(
        &self,
        path: &CoordinatePath,
        filters: &MockFilters,
    ) -> Result<Vec<SegmentResult<MockPlace>>, String> {
        self.queries
            .lock()
            .unwrap()
            .push((path.clone(), filters.clone()));

        if let Some(msg) = &self.failure {
            return Err(msg.clone());
        }

        Ok((0..path.len())
            .map(|point| {
                let ids = self.table.get(point).cloned().unwrap_or_default();
                SegmentResult::new(
                    ids.into_iter()
                        .map(|id| MockPlace {
                            id: id.to_string(),
                            point,
                        })
                        .collect(),
                )
            })
            .collect())
    }
}

/// Keeps every `filter_*` pair; rejects a `filter_bad` parameter.
#[derive(Debug, Default)]
pub struct MockFilterParser;

impl FilterParser for MockFilterParser {
    type Filters = MockFilters;
    type Error = String;

    fn parse(&self, params: &QueryParams) -> Result<MockFilters, String> {
        if params.get("filter_bad").is_some() {
            return Err("invalid filter 'filter_bad'".to_string());
        }
        Ok(params
            .pairs()
            .iter()
            .filter(|(k, _)| k.starts_with("filter_"))
            .cloned()
            .collect())
    }
}

/// Builds `{"type": "FeatureCollection", "features": [{"id": ..}, ..]}`,
/// failing when it meets the place named in `fail_on`.
#[derive(Debug, Default)]
pub struct MockAdapter {
    pub fail_on: Option<&'static str>,
}

impl FeatureCollectionAdapter<MockIndex> for MockAdapter {
    type Collection = Value;
    type Error = String;

    fn to_feature_collection(
        &self,
        places: &[MockPlace],
        _index: &MockIndex,
    ) -> Result<Value, String> {
        let features = places
            .iter()
            .map(|place| {
                if Some(place.id.as_str()) == self.fail_on {
                    Err(format!("cannot convert place {}", place.id))
                } else {
                    Ok(json!({"type": "Feature", "id": place.id}))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(json!({"type": "FeatureCollection", "features": features}))
    }
}

pub type MockPipeline = PolylinePipeline<MockIndex, MockFilterParser, MockAdapter>;

pub fn pipeline(index: MockIndex, options: PolylineOptions) -> MockPipeline {
    PolylinePipeline::new(index, MockFilterParser, MockAdapter::default(), options)
}

pub fn pipeline_with_adapter(
    index: MockIndex,
    adapter: MockAdapter,
    options: PolylineOptions,
) -> MockPipeline {
    PolylinePipeline::new(index, MockFilterParser, adapter, options)
}

pub fn geojson_enabled() -> PolylineOptions {
    PolylineOptions {
        allow_geojson: true,
        ..Default::default()
    }
}

pub fn params(pairs: &[(&str, &str)]) -> QueryParams {
    pairs.iter().copied().collect()
}

/// Encodes `n` distinct points along a short line.
pub fn encoded_line(n: usize) -> String {
    let points: Vec<(f64, f64)> = (0..n)
        .map(|i| (36.0 + i as f64 * 0.001, -115.0 - i as f64 * 0.001))
        .collect();
    let path = CoordinatePath::from_lat_lngs(&points).unwrap();
    polyline::encode(&path, polyline::STANDARD_SCALE)
}
