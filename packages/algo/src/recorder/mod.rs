//! Answer Event Recorder
//!
//! Turns a raw submission into an immutable [`AnswerRecord`]. The answer shape
//! is resolved here once, against the question kind:
//! - multiple-choice / fill-in-blank expect a scalar, compared by exact equality
//! - matching / drag-arrange expect a set; the submission is correct when it
//!   contains every required element (extra selections are not penalised)
//!
//! A timed-out question is recorded like any other submission. When no valid
//! answer came with it, the blank answer is recorded as incorrect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::types::{Answer, AnswerRecord, AttemptContext, Question, UserId};

/// What the learner handed in for one question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub answer: Option<Answer>,
    /// Seconds
    #[serde(default)]
    pub time_spent: u32,
    #[serde(default)]
    pub timed_out: bool,
}

impl Submission {
    pub fn answered(answer: Answer, time_spent: u32) -> Self {
        Self {
            answer: Some(answer),
            time_spent,
            timed_out: false,
        }
    }

    pub fn timed_out(answer: Option<Answer>, time_spent: u32) -> Self {
        Self {
            answer,
            time_spent,
            timed_out: true,
        }
    }
}

/// Who answered, and in which level or practice session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerContext {
    pub user_id: UserId,
    pub context: AttemptContext,
}

impl AnswerContext {
    pub fn level(user_id: impl Into<UserId>, level_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            context: AttemptContext::Level(level_id.into()),
        }
    }

    pub fn practice(user_id: impl Into<UserId>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            context: AttemptContext::Practice(session_id.into()),
        }
    }
}

/// Whether `submitted` satisfies `expected`.
///
/// Mixed shapes never match.
pub fn is_correct(expected: &Answer, submitted: &Answer) -> bool {
    match (expected, submitted) {
        (Answer::Scalar(expected), Answer::Scalar(submitted)) => expected == submitted,
        (Answer::Set(required), Answer::Set(submitted)) => {
            required.iter().all(|item| submitted.contains(item))
        }
        _ => false,
    }
}

/// Build the record for one submitted answer.
///
/// `question` must be the authoritative catalog definition; its topic tags are
/// copied into the record as they are right now.
pub fn record_answer(
    question: &Question,
    submission: Submission,
    context: &AnswerContext,
    now: DateTime<Utc>,
) -> Result<AnswerRecord, RecordError> {
    if context.user_id.trim().is_empty() {
        return Err(RecordError::MissingUser);
    }

    let expected_shape = question.kind.answer_shape();
    let answer = match submission.answer {
        Some(answer) if answer.shape() == expected_shape => answer,
        Some(_) | None if submission.timed_out => Answer::empty(expected_shape),
        Some(answer) => {
            return Err(RecordError::ShapeMismatch {
                question_id: question.id.clone(),
                kind: question.kind,
                expected: expected_shape,
                got: answer.shape(),
            });
        }
        None => Answer::empty(expected_shape),
    };

    let correct = is_correct(&question.correct_answer, &answer);

    tracing::trace!(
        user_id = %context.user_id,
        question_id = %question.id,
        correct,
        timed_out = submission.timed_out,
        "answer recorded"
    );

    Ok(AnswerRecord {
        user_id: context.user_id.clone(),
        context: context.context.clone(),
        question_id: question.id.clone(),
        answer,
        is_correct: correct,
        time_spent: submission.time_spent,
        timestamp: now,
        topic_ids: question.topic_ids.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::question;
    use crate::types::{Difficulty, QuestionKind};

    fn set_question(required: &[&str]) -> Question {
        let mut q = question("qm", &["kp5"], Difficulty::Medium);
        q.kind = QuestionKind::Matching;
        q.correct_answer = Answer::Set(required.iter().map(|s| s.to_string()).collect());
        q
    }

    fn set(items: &[&str]) -> Answer {
        Answer::Set(items.iter().map(|s| s.to_string()).collect())
    }

    fn ctx() -> AnswerContext {
        AnswerContext::level("user1", "level1")
    }

    #[test]
    fn test_scalar_exact_equality() {
        let q = question("q1", &["kp1"], Difficulty::Easy);
        let now = Utc::now();

        let right = record_answer(
            &q,
            Submission::answered(Answer::Scalar("42".into()), 7),
            &ctx(),
            now,
        )
        .unwrap();
        assert!(right.is_correct);
        assert_eq!(right.time_spent, 7);
        assert_eq!(right.timestamp, now);
        assert_eq!(right.topic_ids, vec!["kp1".to_string()]);

        let padded = record_answer(
            &q,
            Submission::answered(Answer::Scalar(" 42".into()), 7),
            &ctx(),
            now,
        )
        .unwrap();
        assert!(!padded.is_correct);
    }

    #[test]
    fn test_superset_submission_counts_as_correct() {
        let q = set_question(&["a", "b"]);
        let record = record_answer(
            &q,
            Submission::answered(set(&["a", "b", "c"]), 12),
            &ctx(),
            Utc::now(),
        )
        .unwrap();
        assert!(record.is_correct);
        assert_eq!(record.answer, set(&["a", "b", "c"]));
    }

    #[test]
    fn test_set_order_does_not_matter_but_missing_item_does() {
        let q = set_question(&["a", "b"]);
        let reversed = record_answer(&q, Submission::answered(set(&["b", "a"]), 3), &ctx(), Utc::now())
            .unwrap();
        assert!(reversed.is_correct);

        let partial = record_answer(&q, Submission::answered(set(&["a"]), 3), &ctx(), Utc::now())
            .unwrap();
        assert!(!partial.is_correct);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let q = question("q1", &["kp1"], Difficulty::Easy);
        let err = record_answer(&q, Submission::answered(set(&["42"]), 1), &ctx(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, RecordError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_timeout_without_answer_is_incorrect() {
        let q = set_question(&["a"]);
        let record = record_answer(&q, Submission::timed_out(None, 30), &ctx(), Utc::now()).unwrap();
        assert!(!record.is_correct);
        assert_eq!(record.answer, Answer::Set(Vec::new()));
    }

    #[test]
    fn test_timeout_with_malformed_answer_is_recorded_blank() {
        let q = question("q1", &["kp1"], Difficulty::Easy);
        let record = record_answer(
            &q,
            Submission::timed_out(Some(set(&["42"])), 30),
            &ctx(),
            Utc::now(),
        )
        .unwrap();
        assert!(!record.is_correct);
        assert_eq!(record.answer, Answer::Scalar(String::new()));
    }

    #[test]
    fn test_timeout_with_valid_answer_is_graded() {
        let q = question("q1", &["kp1"], Difficulty::Easy);
        let record = record_answer(
            &q,
            Submission::timed_out(Some(Answer::Scalar("42".into())), 30),
            &ctx(),
            Utc::now(),
        )
        .unwrap();
        assert!(record.is_correct);
    }

    #[test]
    fn test_missing_user_rejected() {
        let q = question("q1", &["kp1"], Difficulty::Easy);
        let err = record_answer(
            &q,
            Submission::answered(Answer::Scalar("42".into()), 1),
            &AnswerContext::practice("  ", "p1"),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, RecordError::MissingUser);
    }
}
