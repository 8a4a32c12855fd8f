mod catalog;
mod health;
mod mastery;
mod practice;
mod progress;
mod sessions;

use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::middleware::require_learner;
use crate::response::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let healthcheck_endpoint = normalize_healthcheck_endpoint(
        std::env::var("HEALTHCHECK_ENDPOINT")
            .ok()
            .as_deref()
            .unwrap_or("/health"),
    );

    let learner_routes = Router::new()
        .nest("/api/levels", sessions::level_router())
        .nest("/api/sessions", sessions::session_router())
        .nest("/api/mastery", mastery::router())
        .nest("/api/practice", practice::router())
        .nest("/api/progress", progress::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_learner,
        ));

    let mut app = Router::new()
        .nest("/api/catalog", catalog::router())
        .merge(learner_routes);

    let mut health_paths = vec!["/health".to_string()];
    if healthcheck_endpoint != "/health" {
        health_paths.push(healthcheck_endpoint);
    }
    for path in &health_paths {
        app = app.nest(path.as_str(), health::router());
    }

    app.fallback(fallback_handler).with_state(state)
}

fn normalize_healthcheck_endpoint(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "/health".to_string();
    }

    let with_slash = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };

    if with_slash != "/" {
        with_slash.trim_end_matches('/').to_string()
    } else {
        "/health".to_string()
    }
}

async fn fallback_handler() -> Response {
    AppError::not_found("route not found").into_response()
}
