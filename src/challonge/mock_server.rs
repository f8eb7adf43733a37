//! In-process stand-in for the Challonge API used by tests.
//!
//! Fixtures:
//! - tournaments created after `2022-07-16`: none
//! - after `2023-07-16`: tournament `1` on a single page
//! - after `2023-11-25`: tournaments `1`..`6` across three pages of two
//! - after `ENDLESS_DATE`: tournament `7` on every page, never an empty one
//! - participants: odd tournaments have two pages (`1`..`8`), even ones a
//!   single page (`1`..`4`); names are `testName{id}`
//! - matches: tournament `1` has three open matches, tournament `broken`
//!   answers with a malformed body, every other tournament has none

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;

pub const MOCK_API_KEY: &str = "mock api key";
pub const MALFORMED_TOURNAMENT: &str = "broken";
pub const ENDLESS_DATE: &str = "1999-12-31";

type Params = Query<HashMap<String, String>>;

/// Serve the mock API on an ephemeral loopback port and return its base URL.
pub async fn spawn() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router()).await.unwrap();
    });
    format!("http://{}", addr)
}

fn router() -> Router {
    Router::new()
        .route("/tournaments.json", get(tournaments))
        .route("/tournaments/:id/participants.json", get(participants))
        .route("/tournaments/:id/matches.json", get(matches))
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|key| key == MOCK_API_KEY)
}

fn page_of(params: &HashMap<String, String>) -> usize {
    params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1)
}

fn document(data: Vec<Value>) -> Response {
    let count = data.len();
    Json(json!({ "data": data, "included": [], "meta": { "count": count } })).into_response()
}

fn tournament(id: usize) -> Value {
    json!({
        "id": id.to_string(),
        "type": "tournament",
        "attributes": { "name": format!("Weekly {}", id), "game_name": format!("test{}", id) }
    })
}

fn participant(id: usize) -> Value {
    // Participant ids come back as JSON numbers on some endpoints
    json!({
        "id": id,
        "type": "participant",
        "attributes": { "name": format!("testName{}", id), "seed": id }
    })
}

async fn tournaments(headers: HeaderMap, Query(params): Params) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let page = page_of(&params);
    let created_after = params.get("created_after").map(String::as_str);

    let ids: Vec<usize> = match (created_after, page) {
        (Some("2023-07-16"), 1) => vec![1],
        (Some("2023-11-25"), 1) => vec![1, 2],
        (Some("2023-11-25"), 2) => vec![3, 4],
        (Some("2023-11-25"), 3) => vec![5, 6],
        (Some(ENDLESS_DATE), _) => vec![7],
        _ => vec![],
    };
    document(ids.into_iter().map(tournament).collect())
}

async fn participants(
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Params,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let two_pages = id.parse::<usize>().map(|n| n % 2 == 1).unwrap_or(false);

    let ids: Vec<usize> = match (page_of(&params), two_pages) {
        (1, _) => (1..=4).collect(),
        (2, true) => (5..=8).collect(),
        _ => vec![],
    };
    document(ids.into_iter().map(participant).collect())
}

async fn matches(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if id == MALFORMED_TOURNAMENT {
        return (StatusCode::OK, "{\"data\": [").into_response();
    }
    if id != "1" {
        return document(vec![]);
    }

    Json(json!({
        "data": [
            {
                "id": "m4",
                "type": "match",
                "attributes": {
                    "round": 2,
                    "suggested_play_order": 4,
                    "points_by_participant": [{ "participant_id": 1 }, { "participant_id": 2 }],
                    "timestamps": { "underway_at": null }
                },
                "relationships": { "station": { "data": { "id": "404", "type": "station" } } }
            },
            {
                "id": "m1",
                "type": "match",
                "attributes": {
                    "round": 1,
                    "suggested_play_order": 1,
                    "points_by_participant": [{ "participant_id": 3 }, { "participant_id": 4 }],
                    "timestamps": { "underway_at": "2023-11-25T19:00:00.000-05:00" }
                },
                "relationships": { "station": { "data": { "id": "900", "type": "station" } } }
            },
            {
                "id": "m2",
                "type": "match",
                "attributes": {
                    "round": 1,
                    "suggested_play_order": 2,
                    "points_by_participant": [{ "participant_id": 5 }, { "participant_id": 6 }],
                    "timestamps": { "underway_at": null }
                },
                "relationships": { "station": { "data": null } }
            }
        ],
        "included": [
            { "id": "900", "type": "station", "attributes": { "name": "Stream Setup" } }
        ]
    }))
    .into_response()
}
