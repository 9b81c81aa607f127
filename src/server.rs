//! HTTP routes for the polyline service

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tracing::error;

use crate::pipeline::{PolylinePipeline, PolylineResponse, QueryParams};
use crate::traits::{FeatureCollectionAdapter, FilterParser, SpatialIndex};

/// Build the application router
pub fn build_router<I, F, G>(pipeline: Arc<PolylinePipeline<I, F, G>>) -> Router
where
    I: SpatialIndex + 'static,
    F: FilterParser<Filters = I::Filters> + 'static,
    G: FeatureCollectionAdapter<I> + 'static,
{
    Router::new()
        .route("/polyline", get(polyline::<I, F, G>))
        .route("/health", get(health))
        .with_state(pipeline)
}

async fn health() -> &'static str {
    "ok"
}

/// GET /polyline
///
/// The pipeline is synchronous and may block on the index, so it runs on the
/// blocking pool.
async fn polyline<I, F, G>(
    State(pipeline): State<Arc<PolylinePipeline<I, F, G>>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response
where
    I: SpatialIndex + 'static,
    F: FilterParser<Filters = I::Filters> + 'static,
    G: FeatureCollectionAdapter<I> + 'static,
{
    let params = QueryParams::from(pairs);

    match tokio::task::spawn_blocking(move || pipeline.respond(&params)).await {
        Ok(response) => response.into_response(),
        Err(err) => {
            error!(error = %err, "polyline handler aborted");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

impl IntoResponse for PolylineResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            headers.insert(name, HeaderValue::from_static(value));
        }

        response
    }
}
