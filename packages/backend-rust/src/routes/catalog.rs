use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use shuxue_algo::{KnowledgeTopic, Level, Question};

use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/topics", get(list_topics))
        .route("/levels", get(list_levels))
        .route("/questions/:id", get(get_question))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThemeAreaDto {
    id: String,
    name: String,
    description: String,
    color: String,
    levels: Vec<LevelDto>,
}

/// Level as shown on the map; question bodies stay behind the session API
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LevelDto {
    id: String,
    name: String,
    description: String,
    question_count: usize,
    topic_ids: Vec<String>,
    next_level_ids: Vec<String>,
    unlocked_by_default: bool,
}

impl From<&Level> for LevelDto {
    fn from(level: &Level) -> Self {
        Self {
            id: level.id.clone(),
            name: level.name.clone(),
            description: level.description.clone(),
            question_count: level.question_ids.len(),
            topic_ids: level.topic_ids.clone(),
            next_level_ids: level.next_level_ids.clone(),
            unlocked_by_default: level.unlocked_by_default,
        }
    }
}

async fn list_topics(State(state): State<AppState>) -> impl IntoResponse {
    let topics: Vec<KnowledgeTopic> = state.catalog().topics().to_vec();
    ok(topics)
}

async fn list_levels(State(state): State<AppState>) -> impl IntoResponse {
    let areas: Vec<ThemeAreaDto> = state
        .catalog()
        .theme_areas()
        .iter()
        .map(|area| ThemeAreaDto {
            id: area.id.clone(),
            name: area.name.clone(),
            description: area.description.clone(),
            color: area.color.clone(),
            levels: area.levels.iter().map(LevelDto::from).collect(),
        })
        .collect();
    ok(areas)
}

async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let question: Question = state.catalog().require_question(&id)?.clone();
    Ok(ok(question))
}
