//! Level Completion Evaluator
//!
//! Maps a finished level attempt to a star tier and hands the attempt's
//! records on, together, so progress and mastery are updated in one step.
//!
//! Star tiers by correct rate: >= 0.90 three, >= 0.70 two, >= 0.50 one,
//! otherwise none.

mod session;

pub use session::{Advance, PlaySession, SessionPhase};

use serde::{Deserialize, Serialize};

use crate::types::{
    AnswerRecord, LevelId, ONE_STAR_RATE, THREE_STAR_RATE, TWO_STAR_RATE,
};

/// Result of a completed level attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    pub level_id: LevelId,
    pub stars: u8,
    pub correct_count: u32,
    pub total_questions: u32,
    pub correct_rate: f64,
    pub records: Vec<AnswerRecord>,
}

pub fn stars_for_rate(correct_rate: f64) -> u8 {
    if correct_rate >= THREE_STAR_RATE {
        3
    } else if correct_rate >= TWO_STAR_RATE {
        2
    } else if correct_rate >= ONE_STAR_RATE {
        1
    } else {
        0
    }
}

/// Evaluate one attempt; every record is one answered question.
///
/// An attempt without records earns nothing.
pub fn evaluate_completion(
    level_id: impl Into<LevelId>,
    records: Vec<AnswerRecord>,
) -> CompletionOutcome {
    let total_questions = records.len() as u32;
    let correct_count = records.iter().filter(|record| record.is_correct).count() as u32;
    let correct_rate = if total_questions == 0 {
        0.0
    } else {
        f64::from(correct_count) / f64::from(total_questions)
    };

    CompletionOutcome {
        level_id: level_id.into(),
        stars: stars_for_rate(correct_rate),
        correct_count,
        total_questions,
        correct_rate,
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Answer, AttemptContext};
    use chrono::Utc;

    fn results(correct: usize, total: usize) -> Vec<AnswerRecord> {
        (0..total)
            .map(|idx| AnswerRecord {
                user_id: "user1".to_string(),
                context: AttemptContext::Level("level1".to_string()),
                question_id: format!("q{idx}"),
                answer: Answer::Scalar(String::new()),
                is_correct: idx < correct,
                time_spent: 4,
                timestamp: Utc::now(),
                topic_ids: vec!["kp1".to_string()],
            })
            .collect()
    }

    #[test]
    fn test_star_tiers() {
        assert_eq!(stars_for_rate(1.0), 3);
        assert_eq!(stars_for_rate(0.9), 3);
        assert_eq!(stars_for_rate(0.89), 2);
        assert_eq!(stars_for_rate(0.72), 2);
        assert_eq!(stars_for_rate(0.7), 2);
        assert_eq!(stars_for_rate(0.5), 1);
        assert_eq!(stars_for_rate(0.49), 0);
        assert_eq!(stars_for_rate(0.0), 0);
    }

    #[test]
    fn test_exact_boundaries_from_counts() {
        assert_eq!(evaluate_completion("level1", results(9, 10)).stars, 3);
        assert_eq!(evaluate_completion("level1", results(7, 10)).stars, 2);
        assert_eq!(evaluate_completion("level1", results(1, 2)).stars, 1);
        assert_eq!(evaluate_completion("level1", results(18, 25)).stars, 2);
    }

    #[test]
    fn test_outcome_carries_records() {
        let outcome = evaluate_completion("level1", results(2, 4));
        assert_eq!(outcome.correct_count, 2);
        assert_eq!(outcome.total_questions, 4);
        assert_eq!(outcome.correct_rate, 0.5);
        assert_eq!(outcome.records.len(), 4);
    }

    #[test]
    fn test_empty_attempt_earns_nothing() {
        let outcome = evaluate_completion("level1", Vec::new());
        assert_eq!(outcome.stars, 0);
        assert_eq!(outcome.correct_rate, 0.0);
    }
}
