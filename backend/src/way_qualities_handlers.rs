// Handlers for the way qualities API

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;

use crate::database::DatabaseError;
use crate::models::{ApiError, WayQuality};
use crate::store::{QualityStore, Submission};
use crate::AppState;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// PUT /openskatemap/api/way-qualities - Append ratings
pub async fn store_way_qualities<S: QualityStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Json(entries): Json<Vec<WayQuality>>,
) -> ApiResult<StatusCode> {
    for entry in &entries {
        entry
            .validate()
            .map_err(|msg| db_error_to_api_error(DatabaseError::InvalidData(msg)))?;
    }

    let ip = client_ip(&headers, connect_info);
    tracing::info!("Storing {} way qualities from {:?}", entries.len(), ip);

    let submission = Submission {
        entries,
        ip,
        timestamp: Utc::now(),
    };

    state
        .store
        .store_qualities(submission)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(db_error_to_api_error)
}

/// POST /openskatemap/api/way-qualities - Latest rating per requested way id
pub async fn fetch_way_qualities<S: QualityStore>(
    State(state): State<AppState<S>>,
    Json(way_ids): Json<Vec<i64>>,
) -> ApiResult<Json<Vec<WayQuality>>> {
    if way_ids.is_empty() {
        return Ok(Json(Vec::new()));
    }

    state
        .store
        .latest_qualities(&way_ids)
        .await
        .map(Json)
        .map_err(db_error_to_api_error)
}

/// First `X-Forwarded-For` hop when behind a proxy, else the peer address.
fn client_ip(headers: &HeaderMap, connect_info: Option<ConnectInfo<SocketAddr>>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(String::from)
        .or_else(|| connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()))
}

/// Convert DatabaseError to API error response
fn db_error_to_api_error(err: DatabaseError) -> (StatusCode, Json<ApiError>) {
    let (status, message) = match err {
        DatabaseError::InvalidData(msg) => (StatusCode::BAD_REQUEST, msg),
        DatabaseError::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        DatabaseError::ConnectionError(e) => {
            tracing::error!("Database error: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Database connection error: {}", e),
            )
        }
    };

    (status, Json(ApiError { message }))
}
