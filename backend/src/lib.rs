pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod overpass;
pub mod store;
pub mod way_qualities_handlers;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::put,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::client::WAY_QUALITIES_PATH;
use crate::store::QualityStore;
use crate::way_qualities_handlers::{fetch_way_qualities, store_way_qualities};

pub struct AppState<S> {
    pub store: Arc<S>,
}

impl<S> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

pub fn create_router<S: QualityStore>(state: AppState<S>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route(
            WAY_QUALITIES_PATH,
            put(store_way_qualities::<S>).post(fetch_way_qualities::<S>),
        )
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE])
}
