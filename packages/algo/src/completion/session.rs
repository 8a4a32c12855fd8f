//! Play-session state machine.
//!
//! `InProgress(i) -> Submitted(i) -> InProgress(i + 1) -> ... -> Completed`
//!
//! Each question is submitted exactly once and in order. Reaching `Completed`
//! evaluates the attempt once; nothing is accepted afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{evaluate_completion, CompletionOutcome};
use crate::catalog::Catalog;
use crate::error::{AlgoResult, SessionError};
use crate::recorder::{record_answer, AnswerContext, Submission};
use crate::types::{AnswerRecord, Level, LevelId, Question, QuestionId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum SessionPhase {
    InProgress { index: usize },
    Submitted { index: usize },
    Completed,
}

/// What `advance` moved to
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Next { index: usize },
    Completed(CompletionOutcome),
}

#[derive(Debug, Clone)]
pub struct PlaySession {
    user_id: UserId,
    level_id: LevelId,
    question_ids: Vec<QuestionId>,
    phase: SessionPhase,
    records: Vec<AnswerRecord>,
    started_at: DateTime<Utc>,
}

impl PlaySession {
    pub fn start(
        user_id: impl Into<UserId>,
        level: &Level,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if level.question_ids.is_empty() {
            return Err(SessionError::EmptyLevel(level.id.clone()));
        }
        Ok(Self {
            user_id: user_id.into(),
            level_id: level.id.clone(),
            question_ids: level.question_ids.clone(),
            phase: SessionPhase::InProgress { index: 0 },
            records: Vec::with_capacity(level.question_ids.len()),
            started_at: now,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn level_id(&self) -> &str {
        &self.level_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn question_count(&self) -> usize {
        self.question_ids.len()
    }

    /// Records submitted so far in this attempt
    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.phase {
            SessionPhase::InProgress { index } | SessionPhase::Submitted { index } => Some(index),
            SessionPhase::Completed => None,
        }
    }

    /// The question currently on screen
    pub fn current_question<'c>(&self, catalog: &'c Catalog) -> AlgoResult<Option<&'c Question>> {
        match self.current_index() {
            Some(index) => Ok(Some(catalog.require_question(&self.question_ids[index])?)),
            None => Ok(None),
        }
    }

    /// Submit the answer for question `index`
    pub fn submit(
        &mut self,
        catalog: &Catalog,
        index: usize,
        submission: Submission,
        now: DateTime<Utc>,
    ) -> AlgoResult<&AnswerRecord> {
        let current = match self.phase {
            SessionPhase::Completed => return Err(SessionError::Completed.into()),
            SessionPhase::Submitted { index: current } => {
                let err = if index <= current {
                    SessionError::Replayed { index }
                } else if index == current + 1 {
                    SessionError::NotAdvanced { got: index }
                } else {
                    SessionError::OutOfOrder {
                        expected: current + 1,
                        got: index,
                    }
                };
                return Err(err.into());
            }
            SessionPhase::InProgress { index: current } => current,
        };
        if index < current {
            return Err(SessionError::Replayed { index }.into());
        }
        if index > current {
            return Err(SessionError::OutOfOrder {
                expected: current,
                got: index,
            }
            .into());
        }

        let question = catalog.require_question(&self.question_ids[current])?;
        let context = AnswerContext::level(self.user_id.clone(), self.level_id.clone());
        let record = record_answer(question, submission, &context, now)?;

        self.records.push(record);
        self.phase = SessionPhase::Submitted { index: current };
        Ok(&self.records[current])
    }

    /// Move past a submitted question. After the last one the attempt is
    /// evaluated and its records handed over in the outcome.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        match self.phase {
            SessionPhase::InProgress { .. } => Err(SessionError::NotSubmitted),
            SessionPhase::Completed => Err(SessionError::Completed),
            SessionPhase::Submitted { index } if index + 1 < self.question_ids.len() => {
                self.phase = SessionPhase::InProgress { index: index + 1 };
                Ok(Advance::Next { index: index + 1 })
            }
            SessionPhase::Submitted { .. } => {
                self.phase = SessionPhase::Completed;
                let records = std::mem::take(&mut self.records);
                Ok(Advance::Completed(evaluate_completion(
                    self.level_id.clone(),
                    records,
                )))
            }
        }
    }
}
