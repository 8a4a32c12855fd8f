use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shuxue_algo::{
    Advance, Answer, AnswerRecord, CompletionOutcome, Difficulty, LevelCompletion, Question,
    QuestionKind, Submission,
};

use crate::middleware::Learner;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn level_router() -> Router<AppState> {
    Router::new().route("/:level_id/sessions", post(start_session))
}

pub fn session_router() -> Router<AppState> {
    Router::new()
        .route("/:session_id/answers", post(submit_answer))
        .route("/:session_id/advance", post(advance_session))
}

/// Question as presented during play, without the key
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuestionView {
    id: String,
    text: String,
    kind: QuestionKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<String>,
    topic_ids: Vec<String>,
    difficulty: Difficulty,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_limit: Option<u32>,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            text: question.text.clone(),
            kind: question.kind,
            options: question.options.clone(),
            topic_ids: question.topic_ids.clone(),
            difficulty: question.difficulty,
            time_limit: question.time_limit,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionStarted {
    session_id: String,
    level_id: String,
    question_count: usize,
    index: usize,
    question: QuestionView,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitAnswerRequest {
    question_index: usize,
    answer: Option<Answer>,
    #[serde(default)]
    time_spent: u32,
    #[serde(default)]
    timed_out: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnswerFeedback {
    record: AnswerRecord,
    correct_answer: Answer,
    explanation: String,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
enum AdvanceResponse {
    Next {
        index: usize,
        question: QuestionView,
    },
    Completed {
        outcome: OutcomeSummary,
        completion: LevelCompletion,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeSummary {
    level_id: String,
    stars: u8,
    correct_count: u32,
    total_questions: u32,
    correct_rate: f64,
}

impl From<&CompletionOutcome> for OutcomeSummary {
    fn from(outcome: &CompletionOutcome) -> Self {
        Self {
            level_id: outcome.level_id.clone(),
            stars: outcome.stars,
            correct_count: outcome.correct_count,
            total_questions: outcome.total_questions,
            correct_rate: outcome.correct_rate,
        }
    }
}

async fn start_session(
    State(state): State<AppState>,
    Extension(learner): Extension<Learner>,
    Path(level_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .progress()
        .start_level(learner.id(), &level_id, Utc::now())?;
    let question = session
        .current_question(state.catalog())?
        .map(QuestionView::from)
        .ok_or_else(|| AppError::internal("new session has no current question"))?;
    let question_count = session.question_count();
    let ticket = state.sessions().insert(session);

    tracing::info!(user_id = %learner.id(), level_id = %level_id, session_id = %ticket.id, "play session started");

    Ok(ok(SessionStarted {
        session_id: ticket.id,
        level_id,
        question_count,
        index: 0,
        question,
    }))
}

async fn submit_answer(
    State(state): State<AppState>,
    Extension(learner): Extension<Learner>,
    Path(session_id): Path<String>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = state.sessions().get(learner.id(), &session_id)?;
    let submission = Submission {
        answer: payload.answer,
        time_spent: payload.time_spent,
        timed_out: payload.timed_out,
    };

    let record = {
        let mut session = ticket.session.lock();
        let record = session
            .submit(state.catalog(), payload.question_index, submission, Utc::now())?
            .clone();
        record
    };
    let question = state.catalog().require_question(&record.question_id)?;

    Ok(ok(AnswerFeedback {
        correct_answer: question.correct_answer.clone(),
        explanation: question.explanation.clone(),
        record,
    }))
}

async fn advance_session(
    State(state): State<AppState>,
    Extension(learner): Extension<Learner>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = state.sessions().get(learner.id(), &session_id)?;
    let mut session = ticket.session.lock();

    match session.advance()? {
        Advance::Next { index } => {
            let question = session
                .current_question(state.catalog())?
                .map(QuestionView::from)
                .ok_or_else(|| AppError::internal("session advanced past its questions"))?;
            Ok(ok(AdvanceResponse::Next { index, question }))
        }
        Advance::Completed(outcome) => {
            drop(session);
            state.sessions().remove(&ticket.id);

            let summary = OutcomeSummary::from(&outcome);
            let completion = state
                .progress()
                .complete_level(learner.id(), outcome, Utc::now())?;

            tracing::info!(
                user_id = %learner.id(),
                level_id = %summary.level_id,
                stars = summary.stars,
                "level completed"
            );

            Ok(ok(AdvanceResponse::Completed {
                outcome: summary,
                completion,
            }))
        }
    }
}
