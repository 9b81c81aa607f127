//! HTTP adapter for an upstream point-in-polygon service.
//!
//! A path query becomes one point lookup per decoded coordinate, so each
//! coordinate is one segment of the result.
//!
//! An upstream 503 marks the index as indexing. The mark holds for
//! `indexing_recheck_secs`; after that the availability gate asks the
//! upstream again before letting queries through.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::filter::PlaceFilters;
use crate::polyline::{Coordinate, CoordinatePath};
use crate::results::SegmentResult;
use crate::spr::StandardPlace;
use crate::traits::SpatialIndex;

#[derive(Debug, Clone)]
pub struct RemoteIndexConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// How long an upstream 503 is trusted before the upstream is asked again.
    pub indexing_recheck_secs: u64,
}

impl Default for RemoteIndexConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 10,
            indexing_recheck_secs: 5,
        }
    }
}

#[derive(Debug, Error)]
pub enum RemoteIndexError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream index is indexing records")]
    Indexing,

    #[error("upstream returned {status} for ({latitude}, {longitude})")]
    Status {
        status: StatusCode,
        latitude: f64,
        longitude: f64,
    },
}

#[derive(Debug)]
pub struct RemoteIndex {
    config: RemoteIndexConfig,
    client: reqwest::blocking::Client,
    /// When the upstream last answered 503, if it has not recovered since.
    indexing_since: Mutex<Option<Instant>>,
}

impl RemoteIndex {
    pub fn new(config: RemoteIndexConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            client,
            indexing_since: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &RemoteIndexConfig {
        &self.config
    }

    fn point_url(&self) -> String {
        format!("{}/", self.config.base_url.trim_end_matches('/'))
    }

    fn set_indexing(&self, since: Option<Instant>) {
        *self
            .indexing_since
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = since;
    }

    fn indexing_since(&self) -> Option<Instant> {
        *self
            .indexing_since
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Asks the upstream whether it is still indexing. Only a 503 counts as
    /// indexing; any other answer, or no answer, lets queries through again.
    fn recheck_indexing(&self) -> bool {
        match self.client.get(self.point_url()).send() {
            Ok(response) if response.status() == StatusCode::SERVICE_UNAVAILABLE => {
                self.set_indexing(Some(Instant::now()));
                true
            }
            Ok(response) => {
                info!(
                    base_url = %self.config.base_url,
                    status = %response.status(),
                    "upstream index is available again"
                );
                self.set_indexing(None);
                false
            }
            Err(err) => {
                warn!(
                    base_url = %self.config.base_url,
                    error = %err,
                    "upstream indexing recheck failed"
                );
                self.set_indexing(None);
                false
            }
        }
    }

    fn query_point(
        &self,
        coordinate: &Coordinate,
        filters: &[(String, String)],
    ) -> Result<SegmentResult<StandardPlace>, RemoteIndexError> {
        let mut query = vec![
            ("latitude".to_string(), coordinate.latitude().to_string()),
            ("longitude".to_string(), coordinate.longitude().to_string()),
        ];
        query.extend_from_slice(filters);

        let response = self.client.get(self.point_url()).query(&query).send()?;

        match response.status() {
            StatusCode::SERVICE_UNAVAILABLE => {
                self.set_indexing(Some(Instant::now()));
                warn!(base_url = %self.config.base_url, "upstream index is indexing");
                Err(RemoteIndexError::Indexing)
            }
            status if !status.is_success() => Err(RemoteIndexError::Status {
                status,
                latitude: coordinate.latitude(),
                longitude: coordinate.longitude(),
            }),
            _ => {
                let body = response.json::<PointResponse>()?;
                Ok(SegmentResult::new(body.places))
            }
        }
    }
}

impl SpatialIndex for RemoteIndex {
    type Place = StandardPlace;
    type Filters = PlaceFilters;
    type Error = RemoteIndexError;

    fn is_indexing(&self) -> bool {
        let Some(since) = self.indexing_since() else {
            return false;
        };
        if since.elapsed() < Duration::from_secs(self.config.indexing_recheck_secs) {
            return true;
        }
        self.recheck_indexing()
    }

    fn intersects_by_path(
        &self,
        path: &CoordinatePath,
        filters: &PlaceFilters,
    ) -> Result<Vec<SegmentResult<StandardPlace>>, RemoteIndexError> {
        if path.is_empty() {
            return Ok(Vec::new());
        }

        let filters = filters.to_query_pairs();
        debug!(coords = path.len(), filters = filters.len(), "querying upstream index");

        path.coordinates()
            .par_iter()
            .map(|coordinate| self.query_point(coordinate, &filters))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct PointResponse {
    #[serde(default)]
    places: Vec<StandardPlace>,
}
