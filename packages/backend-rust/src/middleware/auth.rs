use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::response::AppError;
use crate::state::AppState;

/// Set by the upstream authentication layer
pub const USER_ID_HEADER: &str = "x-user-id";

/// The learner acting on this request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Learner(pub String);

impl Learner {
    pub fn id(&self) -> &str {
        &self.0
    }
}

fn header_learner(req: &Request<Body>) -> Option<Learner> {
    req.headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| Learner(value.to_string()))
}

pub async fn require_learner(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let learner = header_learner(&req).or_else(|| {
        state
            .config()
            .default_user_id
            .as_ref()
            .map(|id| Learner(id.clone()))
    });

    let Some(learner) = learner else {
        return AppError::unauthorized("missing learner identity").into_response();
    };

    req.extensions_mut().insert(learner);
    next.run(req).await
}
