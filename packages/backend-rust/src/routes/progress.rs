use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use chrono::Utc;
use serde::Serialize;
use shuxue_algo::{HistorySummary, LevelRecord};

use crate::middleware::Learner;
use crate::response::ok;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_progress))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressDto {
    user_id: String,
    total_stars: u32,
    completed_levels: Vec<String>,
    unlocked_levels: Vec<String>,
    levels: Vec<LevelRecord>,
    badges: Vec<String>,
    items: Vec<String>,
    weak_topic_count: usize,
    history: HistorySummary,
}

async fn get_progress(
    State(state): State<AppState>,
    Extension(learner): Extension<Learner>,
) -> impl IntoResponse {
    let progress = state.progress().snapshot(learner.id());
    let weak_topic_count = progress
        .mastery()
        .iter()
        .filter(|record| record.is_weak())
        .count();

    ok(ProgressDto {
        user_id: progress.user_id().to_string(),
        total_stars: progress.total_stars(),
        completed_levels: progress.completed_levels().to_vec(),
        unlocked_levels: progress.unlocked_levels().cloned().collect(),
        levels: progress.levels().cloned().collect(),
        badges: progress.badges().to_vec(),
        items: progress.items().to_vec(),
        weak_topic_count,
        history: progress.history_summary(Utc::now()),
    })
}
