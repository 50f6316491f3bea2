use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::api::AppState;

/// GET / - service banner with the registered endpoints
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let prefix = &state.config.api.prefix;

    let mut resources: Vec<String> = state
        .endpoints
        .resources()
        .map(|r| format!("{}/{}/:id", prefix, r.collection))
        .collect();
    resources.sort();

    let mut relations: Vec<String> = state
        .endpoints
        .relations()
        .map(|r| format!("{}/{}/:id/{}/:related", prefix, r.collection, r.relation))
        .collect();
    relations.sort();

    Json(json!({
        "success": true,
        "data": {
            "name": "Relations API",
            "version": version,
            "description": "Nested relation endpoints with soft-delete restore",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "resources": resources,
                "relations": relations,
            }
        }
    }))
}

/// GET /health - store reachability probe
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let backend = state.store.backend();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": backend
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed for {} store: {}", backend, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "store unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "store": backend
                    }
                })),
            )
        }
    }
}
