pub mod request;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::cache::TournamentCache;
use crate::challonge::FetchData;
use crate::matches::fetch_matches_concurrently;
use crate::models::TournamentMatches;
use request::RequestValues;

#[derive(Clone)]
pub struct AppState {
    pub cache: TournamentCache,
    pub client: Arc<dyn FetchData>,
}

/// Build the Axum router for the matches API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(health_handler))
        .route("/v1/matches", get(matches_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

/// Client-facing failure. Upstream detail is logged here, not returned.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(err: impl Display) -> Self {
        warn!("Rejected matches request: {}", err);
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: err.to_string(),
        }
    }

    fn internal(message: &str, err: impl Display) -> Self {
        error!("{}: {}", message, err);
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// GET /v1/health
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "UP" }))
}

/// GET /v1/matches?date=YYYY-MM-DD&tournamentOrg=..&games=a,b
async fn matches_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<TournamentMatches>>, ApiError> {
    if state.cache.should_clear_all().await {
        state.cache.clear_all().await;
    }

    let values = RequestValues::from_query(&params).map_err(ApiError::bad_request)?;
    let key = values.cache_key();

    let snapshots = state
        .cache
        .fresh_snapshots(key, Arc::clone(&state.client), &values.game_list)
        .await
        .map_err(|e| ApiError::internal("Error in getting tournament data", e))?;

    if snapshots.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let matches = fetch_matches_concurrently(snapshots, Arc::clone(&state.client))
        .await
        .map_err(|e| ApiError::internal("Error in getting match data", e))?;

    Ok(Json(matches))
}
