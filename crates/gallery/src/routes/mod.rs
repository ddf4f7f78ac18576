use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

pub mod error;
pub mod photos;

pub use error::{ErrorResponse, RouteError};

use crate::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new().merge(photos::router())
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn health_router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
