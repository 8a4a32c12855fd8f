use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use serde::Serialize;
use shuxue_algo::{
    rank_weak_topics, trend_summary, MasteryRecord, MasteryState, TrendSummary,
    PROFICIENCY_THRESHOLD,
};

use crate::middleware::Learner;
use crate::response::ok;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_mastery))
        .route("/weak-points", get(get_weak_points))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MasterySnapshot {
    user_id: String,
    topics: MasteryState,
    trends: TrendSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WeakPoint {
    #[serde(flatten)]
    record: MasteryRecord,
    topic_name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WeakPointsResponse {
    threshold: f64,
    weak_points: Vec<WeakPoint>,
    trends: TrendSummary,
}

async fn get_mastery(
    State(state): State<AppState>,
    Extension(learner): Extension<Learner>,
) -> impl IntoResponse {
    let progress = state.progress().snapshot(learner.id());
    let mastery = progress.mastery().clone();
    let trends = trend_summary(&mastery);
    ok(MasterySnapshot {
        user_id: learner.0,
        topics: mastery,
        trends,
    })
}

async fn get_weak_points(
    State(state): State<AppState>,
    Extension(learner): Extension<Learner>,
) -> impl IntoResponse {
    let progress = state.progress().snapshot(learner.id());
    let ranked = rank_weak_topics(progress.mastery());
    let trends = trend_summary(&ranked);
    let weak_points = ranked
        .into_iter()
        .map(|record| WeakPoint {
            topic_name: state
                .catalog()
                .topic(&record.topic_id)
                .map(|topic| topic.name.clone()),
            record,
        })
        .collect();

    ok(WeakPointsResponse {
        threshold: PROFICIENCY_THRESHOLD,
        weak_points,
        trends,
    })
}
