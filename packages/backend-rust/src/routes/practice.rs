use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shuxue_algo::{record_answer, AlgoError, Answer, AnswerContext, AnswerRecord, Submission};
use uuid::Uuid;

use super::sessions::QuestionView;
use crate::middleware::Learner;
use crate::response::{ok, AppError};
use crate::state::AppState;

const MAX_BATCH_SIZE: usize = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_practice))
        .route("/answers", post(submit_practice))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PracticeSet {
    practice_id: String,
    weak_topic_ids: Vec<String>,
    questions: Vec<QuestionView>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PracticeAnswer {
    question_id: String,
    answer: Option<Answer>,
    #[serde(default)]
    time_spent: u32,
    #[serde(default)]
    timed_out: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PracticeBatch {
    practice_id: Option<String>,
    answers: Vec<PracticeAnswer>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PracticeResult {
    practice_id: String,
    applied: usize,
    correct: usize,
    records: Vec<AnswerRecord>,
    weak_topic_ids: Vec<String>,
}

async fn get_practice(
    State(state): State<AppState>,
    Extension(learner): Extension<Learner>,
) -> impl IntoResponse {
    let plan = state
        .progress()
        .practice_plan(learner.id(), state.config().practice_limit);

    ok(PracticeSet {
        practice_id: Uuid::new_v4().to_string(),
        questions: plan.questions.iter().map(QuestionView::from).collect(),
        weak_topic_ids: plan.weak_topic_ids,
    })
}

async fn submit_practice(
    State(state): State<AppState>,
    Extension(learner): Extension<Learner>,
    Json(payload): Json<PracticeBatch>,
) -> Result<impl IntoResponse, AppError> {
    if payload.answers.is_empty() {
        return Err(AppError::validation("answers must not be empty"));
    }
    if payload.answers.len() > MAX_BATCH_SIZE {
        return Err(AppError::validation(format!(
            "at most {MAX_BATCH_SIZE} answers per batch"
        )));
    }

    let practice_id = payload
        .practice_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let context = AnswerContext::practice(learner.id(), practice_id.clone());
    let now = Utc::now();

    // 先全部校验，任何一题失败则整批不写入
    let records = payload
        .answers
        .into_iter()
        .map(|item| {
            let question = state.catalog().require_question(&item.question_id)?;
            let submission = Submission {
                answer: item.answer,
                time_spent: item.time_spent,
                timed_out: item.timed_out,
            };
            Ok(record_answer(question, submission, &context, now)?)
        })
        .collect::<Result<Vec<_>, AlgoError>>()?;

    let correct = records.iter().filter(|record| record.is_correct).count();
    let applied = state
        .progress()
        .apply_practice(learner.id(), records.clone(), now)?;

    Ok(ok(PracticeResult {
        practice_id,
        applied: applied.applied,
        correct,
        records,
        weak_topic_ids: applied.weak_topic_ids,
    }))
}
