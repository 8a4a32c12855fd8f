//! Error types for the mastery core.
//!
//! Degenerate input (no history, no weak topics) is never an error; those
//! operations return empty results instead.

use crate::types::{AnswerShape, QuestionKind};

/// Malformed submissions rejected at the recorder boundary
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("question {question_id} is {kind:?} and expects a {expected:?} answer, got {got:?}")]
    ShapeMismatch {
        question_id: String,
        kind: QuestionKind,
        expected: AnswerShape,
        got: AnswerShape,
    },
    #[error("answer submitted without a user id")]
    MissingUser,
    #[error("record belongs to user {got}, expected {expected}")]
    UserMismatch { expected: String, got: String },
}

/// Unknown or inconsistent reference data
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("topic not found: {0}")]
    UnknownTopic(String),
    #[error("question not found: {0}")]
    UnknownQuestion(String),
    #[error("level not found: {0}")]
    UnknownLevel(String),
    #[error("duplicate {entity} id: {id}")]
    DuplicateId { entity: &'static str, id: String },
    #[error("question {question_id} is {kind:?} but its correct answer is a {got:?}")]
    AnswerKindMismatch {
        question_id: String,
        kind: QuestionKind,
        got: AnswerShape,
    },
    #[error("question {0} has an empty correct answer")]
    EmptyAnswer(String),
    #[error("question {0} is not tagged with any topic")]
    Untagged(String),
    #[error("difficulty rank must be 1, 2 or 3, got {0}")]
    InvalidDifficulty(u8),
    #[error("invalid catalog document: {0}")]
    Parse(String),
}

/// Play-session state machine violations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("question {index} was already submitted")]
    Replayed { index: usize },
    #[error("expected question {expected}, got {got}")]
    OutOfOrder { expected: usize, got: usize },
    #[error("current question has not been submitted yet")]
    NotSubmitted,
    #[error("session is already completed")]
    Completed,
    #[error("level {0} has no questions")]
    EmptyLevel(String),
    #[error("level {0} is locked")]
    Locked(String),
    #[error("current question is answered, advance before submitting question {got}")]
    NotAdvanced { got: usize },
    #[error("outcome for level {level_id} does not match its questions: {reason}")]
    OutcomeMismatch { level_id: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlgoError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type AlgoResult<T> = Result<T, AlgoError>;
