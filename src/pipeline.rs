//! Polyline query pipeline.
//!
//! Turns an encoded polyline plus request options into a single response:
//! decode, bound-check, intersect against the index, then optionally
//! deduplicate across segments and convert to GeoJSON.

use axum::http::StatusCode;
use tracing::{debug, error, warn};

use crate::error::PipelineError;
use crate::polyline::{self, CoordinatePath, Dialect};
use crate::results::{FeatureCollectionSet, ResultEnvelope, SegmentResult, UniquePlaces};
use crate::traits::{FeatureCollectionAdapter, FilterParser, SpatialIndex};

pub const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Debug, Clone)]
pub struct PolylineOptions {
    /// Whether `format=geojson` may be requested.
    pub allow_geojson: bool,
    /// Longest decoded path accepted.
    pub max_coords: usize,
}

impl Default for PolylineOptions {
    fn default() -> Self {
        Self {
            allow_geojson: false,
            max_coords: 500,
        }
    }
}

/// Raw query string pairs, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// First value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in request order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True when `key` carries a non-empty first value.
    ///
    /// `?unique=` and a missing `unique` are treated the same.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

impl From<Vec<(String, String)>> for QueryParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::new(pairs)
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    GeoJson,
}

impl OutputFormat {
    /// Only `geojson` selects GeoJSON; anything else is plain JSON.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("geojson") => OutputFormat::GeoJson,
            _ => OutputFormat::Json,
        }
    }
}

/// Options extracted from one request.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylineRequest {
    pub polyline: String,
    pub dialect: Dialect,
    pub unique: bool,
    pub format: OutputFormat,
}

impl PolylineRequest {
    pub fn from_params(
        params: &QueryParams,
        options: &PolylineOptions,
    ) -> Result<Self, PipelineError> {
        let polyline = match params.get("polyline") {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => return Err(PipelineError::MissingPolyline),
        };

        let format = OutputFormat::from_param(params.get("format"));
        if format == OutputFormat::GeoJson && !options.allow_geojson {
            return Err(PipelineError::InvalidFormat);
        }

        Ok(Self {
            polyline,
            dialect: Dialect::from_flag(params.flag("valhalla")),
            unique: params.flag("unique"),
            format,
        })
    }
}

/// A fully rendered response: status, headers and body.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylineResponse {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: Vec<u8>,
}

impl PolylineResponse {
    fn json(body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![
                ("content-type", CONTENT_TYPE_JSON),
                ("access-control-allow-origin", "*"),
            ],
            body,
        }
    }

    fn error(err: &PipelineError) -> Self {
        Self {
            status: err.status_code(),
            headers: vec![("content-type", "text/plain; charset=utf-8")],
            body: err.to_string().into_bytes(),
        }
    }
}

/// Answers polyline queries against one index.
#[derive(Debug, Clone)]
pub struct PolylinePipeline<I, F, G> {
    index: I,
    filter_parser: F,
    geojson: G,
    options: PolylineOptions,
}

impl<I, F, G> PolylinePipeline<I, F, G>
where
    I: SpatialIndex,
    F: FilterParser<Filters = I::Filters>,
    G: FeatureCollectionAdapter<I>,
{
    pub fn new(index: I, filter_parser: F, geojson: G, options: PolylineOptions) -> Self {
        Self {
            index,
            filter_parser,
            geojson,
            options,
        }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn options(&self) -> &PolylineOptions {
        &self.options
    }

    /// Runs the pipeline up to, but not including, serialization.
    pub fn run(
        &self,
        params: &QueryParams,
    ) -> Result<ResultEnvelope<I::Place, G::Collection>, PipelineError> {
        if self.index.is_indexing() {
            return Err(PipelineError::Indexing);
        }

        let request = PolylineRequest::from_params(params, &self.options)?;
        let path = polyline::decode(&request.polyline, request.dialect.scale())?;

        if path.len() > self.options.max_coords {
            return Err(PipelineError::ExcessiveCoordinates {
                count: path.len(),
                max: self.options.max_coords,
            });
        }

        let filters = self
            .filter_parser
            .parse(params)
            .map_err(PipelineError::invalid_filter)?;

        let segments = self.query(&path, &filters)?;
        debug!(
            coords = path.len(),
            segments = segments.len(),
            unique = request.unique,
            format = ?request.format,
            "polyline query complete"
        );

        match (request.unique, request.format) {
            (false, OutputFormat::Json) => Ok(ResultEnvelope::Segments(segments)),
            (true, OutputFormat::Json) => {
                Ok(ResultEnvelope::Unique(UniquePlaces::from_segments(segments)))
            }
            (true, OutputFormat::GeoJson) => {
                let unique = UniquePlaces::from_segments(segments);
                let collection = self
                    .geojson
                    .to_feature_collection(unique.places(), &self.index)
                    .map_err(PipelineError::conversion)?;
                Ok(ResultEnvelope::FeatureCollection(collection))
            }
            (false, OutputFormat::GeoJson) => {
                let collections = segments
                    .iter()
                    .map(|segment| {
                        self.geojson
                            .to_feature_collection(segment.places(), &self.index)
                            .map_err(PipelineError::conversion)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ResultEnvelope::FeatureCollectionSet(
                    FeatureCollectionSet::new(collections),
                ))
            }
        }
    }

    /// Runs the pipeline and renders either the JSON body or the error.
    pub fn respond(&self, params: &QueryParams) -> PolylineResponse {
        let body = self
            .run(params)
            .and_then(|envelope| serde_json::to_vec(&envelope).map_err(PipelineError::from));

        match body {
            Ok(body) => PolylineResponse::json(body),
            Err(err) => {
                if err.status_code().is_server_error() && !matches!(err, PipelineError::Indexing) {
                    error!(code = err.error_code(), error = %err, "polyline request failed");
                } else {
                    warn!(code = err.error_code(), error = %err, "polyline request rejected");
                }
                PolylineResponse::error(&err)
            }
        }
    }

    fn query(
        &self,
        path: &CoordinatePath,
        filters: &I::Filters,
    ) -> Result<Vec<SegmentResult<I::Place>>, PipelineError> {
        self.index
            .intersects_by_path(path, filters)
            .map_err(PipelineError::query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_flag_requires_non_empty_value() {
        let p = params(&[("unique", ""), ("valhalla", "0")]);
        assert!(!p.flag("unique"));
        // Any non-empty value counts, even "0".
        assert!(p.flag("valhalla"));
        assert!(!p.flag("missing"));
    }

    #[test]
    fn test_get_returns_first_value() {
        let p = params(&[("placetype", "region"), ("placetype", "county")]);
        assert_eq!(p.get("placetype"), Some("region"));
        assert_eq!(p.get_all("placetype").collect::<Vec<_>>(), vec!["region", "county"]);
    }

    #[test]
    fn test_request_requires_polyline() {
        let options = PolylineOptions::default();
        let err = PolylineRequest::from_params(&params(&[]), &options).unwrap_err();
        assert!(matches!(err, PipelineError::MissingPolyline));

        let err =
            PolylineRequest::from_params(&params(&[("polyline", "")]), &options).unwrap_err();
        assert!(matches!(err, PipelineError::MissingPolyline));
    }

    #[test]
    fn test_request_rejects_disabled_geojson() {
        let options = PolylineOptions::default();
        let err = PolylineRequest::from_params(
            &params(&[("polyline", "_p~iF~ps|U"), ("format", "geojson")]),
            &options,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFormat));
    }

    #[test]
    fn test_request_options() {
        let options = PolylineOptions {
            allow_geojson: true,
            ..Default::default()
        };
        let request = PolylineRequest::from_params(
            &params(&[
                ("polyline", "_p~iF~ps|U"),
                ("valhalla", "1"),
                ("unique", "true"),
                ("format", "geojson"),
            ]),
            &options,
        )
        .unwrap();

        assert_eq!(request.polyline, "_p~iF~ps|U");
        assert_eq!(request.dialect, Dialect::Valhalla);
        assert!(request.unique);
        assert_eq!(request.format, OutputFormat::GeoJson);
    }

    #[test]
    fn test_unknown_format_is_json() {
        assert_eq!(OutputFormat::from_param(Some("csv")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_param(None), OutputFormat::Json);
        assert_eq!(OutputFormat::from_param(Some("geojson")), OutputFormat::GeoJson);
    }

    #[test]
    fn test_default_options() {
        let options = PolylineOptions::default();
        assert!(!options.allow_geojson);
        assert_eq!(options.max_coords, 500);
    }
}
