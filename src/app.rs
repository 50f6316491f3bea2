use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::api::AppState;
use crate::config::SecurityConfig;
use crate::handlers::{public, relations, resources};
use crate::middleware::principal_middleware;

/// Assemble the full router for a prepared state
pub fn app(state: AppState) -> Router {
    let prefix = state.config.api.prefix.clone();
    let api = api_routes().layer(from_fn_with_state(state.clone(), principal_middleware));

    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health));

    router = if prefix.is_empty() {
        router.merge(api)
    } else {
        router.nest(&prefix, api)
    };

    let mut router = router.with_state(state.clone());

    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security));
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Record-level operations
        .route("/:collection/:id", get(resources::resource_get))
        .route("/:collection/:id/restore", post(resources::resource_restore))
        // Nested relation operations
        .route(
            "/:collection/:id/:relation/:related",
            get(relations::relation_get).delete(relations::relation_delete),
        )
        .route(
            "/:collection/:id/:relation/:related/restore",
            post(relations::relation_restore),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
