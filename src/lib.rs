pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::SecurityConfig;
use crate::services::storage::URL_PREFIX;
use crate::state::AppState;

/// The full HTTP surface: public, protected and elevated tiers plus uploaded files.
pub fn app(state: AppState) -> Router {
    let api = &state.config.api;
    let mut router = Router::new()
        .merge(handlers::public::routes())
        .merge(handlers::protected::routes(state.clone()))
        .merge(handlers::elevated::routes(state.clone()))
        .nest_service(URL_PREFIX, ServeDir::new(state.uploads.root()))
        .layer(DefaultBodyLimit::max(api.max_request_size_bytes));

    if let Some(cors) = cors_layer(&state.config.security) {
        router = router.layer(cors);
    }
    if api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if security.cors_origins.iter().any(|o| o == "*") {
        return Some(layer.allow_origin(Any));
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    Some(layer.allow_origin(origins))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_can_be_disabled() {
        let mut security = config::AppConfig::development().security;
        security.enable_cors = false;
        assert!(cors_layer(&security).is_none());

        security.enable_cors = true;
        security.cors_origins = vec!["*".into()];
        assert!(cors_layer(&security).is_some());
    }
}
