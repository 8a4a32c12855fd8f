//! Mastery Aggregator
//!
//! Folds batches of answer records into a user's per-topic mastery state.
//!
//! Per topic touched by a batch:
//! - new topic: rate = correct / total, attempts = total, trend = stable
//! - known topic: the prior correct count is rate x attempts, kept fractional
//!   when the stored record is not a whole count, then
//!   rate = (prior + correct) / (attempts + total)
//! - trend compares only the new rate with the previous one (single step)
//! - `last_practiced` becomes the aggregation time
//!
//! A record tagged with N topics counts once in each of those N topics. The
//! fold counts every tag occurrence; [`apply_answers`] rejects records that
//! repeat a tag before they get here.
//! Batches are not idempotent: applying the same batch twice counts it twice,
//! so callers must consume each batch exactly once.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::sanitize::sanitize_rate;
use crate::types::{AnswerRecord, MasteryRecord, MasteryState, TopicId, Trend, UserId};

/// Correct / total counts for one topic within one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicTally {
    pub correct: u32,
    pub total: u32,
}

/// Group a batch by topic tag, one count per tag occurrence
pub fn tally_by_topic(records: &[AnswerRecord]) -> BTreeMap<TopicId, TopicTally> {
    let mut tallies: BTreeMap<TopicId, TopicTally> = BTreeMap::new();
    for record in records {
        for topic_id in &record.topic_ids {
            let tally = tallies.entry(topic_id.clone()).or_default();
            tally.total += 1;
            if record.is_correct {
                tally.correct += 1;
            }
        }
    }
    tallies
}

/// Fold one topic's tally into its prior record (if any)
pub fn fold_topic(
    prior: Option<&MasteryRecord>,
    topic_id: &str,
    tally: TopicTally,
    now: DateTime<Utc>,
) -> MasteryRecord {
    match prior {
        None => MasteryRecord {
            topic_id: topic_id.to_string(),
            correct_rate: ratio(f64::from(tally.correct), tally.total),
            attempts: tally.total,
            last_practiced: now,
            trend: Trend::Stable,
        },
        Some(prior) => {
            let correct = prior.implied_correct() + f64::from(tally.correct);
            let attempts = prior.attempts + tally.total;
            let correct_rate = ratio(correct, attempts);
            MasteryRecord {
                topic_id: topic_id.to_string(),
                correct_rate,
                attempts,
                last_practiced: now,
                trend: Trend::classify(prior.correct_rate, correct_rate),
            }
        }
    }
}

/// Pure fold of a batch into a copy of `state`.
///
/// Does not look references up; see [`apply_answers`] for the checked entry
/// point.
pub fn fold_answers(
    state: &MasteryState,
    records: &[AnswerRecord],
    now: DateTime<Utc>,
) -> MasteryState {
    let mut next = state.clone();
    let tallies = tally_by_topic(records);
    for (topic_id, tally) in &tallies {
        if tally.total == 0 {
            continue;
        }
        let record = fold_topic(state.get(topic_id), topic_id, *tally, now);
        next.upsert(record);
    }

    tracing::debug!(
        records = records.len(),
        topics = tallies.len(),
        "mastery batch folded"
    );

    next
}

/// Validate a batch against the catalog, then fold it.
///
/// Any unknown question or topic rejects the whole batch; `state` is never
/// modified, so the caller commits the returned state or nothing.
pub fn apply_answers(
    state: &MasteryState,
    records: &[AnswerRecord],
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> Result<MasteryState, CatalogError> {
    catalog.check_records(records)?;
    Ok(fold_answers(state, records, now))
}

/// One user's pending batch
#[derive(Debug, Clone)]
pub struct UserBatch {
    pub user_id: UserId,
    pub state: MasteryState,
    pub records: Vec<AnswerRecord>,
}

#[derive(Debug, Clone)]
pub struct UserFoldResult {
    pub user_id: UserId,
    pub result: Result<MasteryState, CatalogError>,
}

/// Fold many users' batches in parallel.
///
/// Users are independent, so each result succeeds or fails on its own.
/// Batches for the same user must not appear twice in one call.
pub fn apply_answers_parallel(
    batches: Vec<UserBatch>,
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> Vec<UserFoldResult> {
    batches
        .into_par_iter()
        .map(|batch| UserFoldResult {
            result: apply_answers(&batch.state, &batch.records, catalog, now),
            user_id: batch.user_id,
        })
        .collect()
}

fn ratio(correct: f64, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    sanitize_rate(correct / f64::from(total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::sample_catalog;
    use crate::types::{Answer, AttemptContext};
    use chrono::TimeZone;

    fn record(topics: &[&str], correct: bool) -> AnswerRecord {
        AnswerRecord {
            user_id: "user1".to_string(),
            context: AttemptContext::Level("level1".to_string()),
            question_id: "q1".to_string(),
            answer: Answer::Scalar("42".to_string()),
            is_correct: correct,
            time_spent: 5,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
            topic_ids: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn existing(topic: &str, rate: f64, attempts: u32) -> MasteryState {
        std::iter::once(MasteryRecord {
            topic_id: topic.to_string(),
            correct_rate: rate,
            attempts,
            last_practiced: Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap(),
            trend: Trend::Stable,
        })
        .collect()
    }

    #[test]
    fn test_fold_into_existing_record_improves() {
        let state = existing("kp1", 0.4, 5);
        let batch = vec![
            record(&["kp1"], true),
            record(&["kp1"], true),
            record(&["kp1"], true),
            record(&["kp1"], false),
        ];
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();

        let next = fold_answers(&state, &batch, now);
        let kp1 = next.get("kp1").unwrap();
        assert_eq!(kp1.attempts, 9);
        assert!((kp1.correct_rate - 5.0 / 9.0).abs() < 1e-9);
        assert!((kp1.correct_rate - 0.5556).abs() < 1e-4);
        assert_eq!(kp1.trend, Trend::Improving);
        assert_eq!(kp1.last_practiced, now);
    }

    #[test]
    fn test_fractional_prior_is_not_rounded() {
        let state = existing("kp6", 0.3, 3);
        let next = fold_answers(&state, &[record(&["kp6"], true)], Utc::now());

        let kp6 = next.get("kp6").unwrap();
        assert_eq!(kp6.attempts, 4);
        assert!((kp6.correct_rate - 0.475).abs() < 1e-9);
        assert_eq!(kp6.trend, Trend::Improving);
    }

    #[test]
    fn test_repeated_tag_counts_per_occurrence() {
        let next = fold_answers(&MasteryState::new(), &[record(&["kp1", "kp1"], true)], Utc::now());
        assert_eq!(next.get("kp1").unwrap().attempts, 2);
    }

    #[test]
    fn test_repeated_tag_rejected_by_checked_fold() {
        let catalog = sample_catalog();
        let result = apply_answers(
            &MasteryState::new(),
            &[record(&["kp1", "kp1"], true)],
            &catalog,
            Utc::now(),
        );
        assert_eq!(
            result,
            Err(CatalogError::DuplicateId {
                entity: "record topic",
                id: "q1/kp1".to_string(),
            })
        );
    }

    #[test]
    fn test_first_observation_creates_stable_record() {
        let batch = vec![record(&["kp1"], true), record(&["kp1"], true)];
        let next = fold_answers(&MasteryState::new(), &batch, Utc::now());

        let kp1 = next.get("kp1").unwrap();
        assert_eq!(kp1.correct_rate, 1.0);
        assert_eq!(kp1.attempts, 2);
        assert_eq!(kp1.trend, Trend::Stable);
    }

    #[test]
    fn test_multi_topic_record_counts_in_each_topic() {
        let batch = vec![record(&["kp1", "kp2"], false), record(&["kp2"], true)];
        let next = fold_answers(&MasteryState::new(), &batch, Utc::now());

        assert_eq!(next.get("kp1").unwrap().attempts, 1);
        assert_eq!(next.get("kp1").unwrap().correct_rate, 0.0);
        assert_eq!(next.get("kp2").unwrap().attempts, 2);
        assert_eq!(next.get("kp2").unwrap().correct_rate, 0.5);
    }

    #[test]
    fn test_declining_and_untouched_topics() {
        let mut state = existing("kp1", 0.8, 5);
        state = fold_answers(&state, &[record(&["kp2"], true)], Utc::now());
        let before_kp2 = state.get("kp2").cloned().unwrap();

        let batch = vec![record(&["kp1"], false); 5];
        let next = fold_answers(&state, &batch, Utc::now());
        let kp1 = next.get("kp1").unwrap();
        assert_eq!(kp1.attempts, 10);
        assert!((kp1.correct_rate - 0.4).abs() < 1e-9);
        assert_eq!(kp1.trend, Trend::Declining);
        assert_eq!(next.get("kp2"), Some(&before_kp2));
    }

    #[test]
    fn test_same_batch_twice_is_not_a_noop() {
        let batch = vec![record(&["kp1"], true), record(&["kp1"], false)];
        let once = fold_answers(&MasteryState::new(), &batch, Utc::now());
        let twice = fold_answers(&once, &batch, Utc::now());

        assert_eq!(once.get("kp1").unwrap().attempts, 2);
        assert_eq!(twice.get("kp1").unwrap().attempts, 4);
        assert_ne!(once, twice);
    }

    #[test]
    fn test_oscillating_performance_flips_trend() {
        let mut state = fold_answers(&MasteryState::new(), &[record(&["kp1"], true)], Utc::now());
        state = fold_answers(&state, &[record(&["kp1"], false)], Utc::now());
        assert_eq!(state.get("kp1").unwrap().trend, Trend::Declining);
        state = fold_answers(&state, &vec![record(&["kp1"], true); 3], Utc::now());
        assert_eq!(state.get("kp1").unwrap().trend, Trend::Improving);
    }

    #[test]
    fn test_empty_batch_leaves_state_unchanged() {
        let state = existing("kp1", 0.5, 4);
        assert_eq!(fold_answers(&state, &[], Utc::now()), state);
    }

    #[test]
    fn test_unknown_topic_rejects_whole_batch() {
        let catalog = sample_catalog();
        let state = existing("kp1", 0.5, 4);
        let batch = vec![record(&["kp1"], true), record(&["kp404"], true)];

        let err = apply_answers(&state, &batch, &catalog, Utc::now()).unwrap_err();
        assert_eq!(err, CatalogError::UnknownTopic("kp404".to_string()));
        assert_eq!(state.get("kp1").unwrap().attempts, 4);
    }

    #[test]
    fn test_unknown_question_rejects_whole_batch() {
        let catalog = sample_catalog();
        let mut stray = record(&["kp1"], true);
        stray.question_id = "q404".to_string();

        let result = apply_answers(&MasteryState::new(), &[stray], &catalog, Utc::now());
        assert_eq!(result, Err(CatalogError::UnknownQuestion("q404".to_string())));
    }

    #[test]
    fn test_parallel_users_fail_independently() {
        let catalog = sample_catalog();
        let batches = vec![
            UserBatch {
                user_id: "alice".to_string(),
                state: MasteryState::new(),
                records: vec![record(&["kp1"], true)],
            },
            UserBatch {
                user_id: "bob".to_string(),
                state: MasteryState::new(),
                records: vec![record(&["kp404"], true)],
            },
        ];

        let results = apply_answers_parallel(batches, &catalog, Utc::now());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].user_id, "alice");
        assert!(results[0].result.is_ok());
        assert_eq!(results[1].user_id, "bob");
        assert!(results[1].result.is_err());
    }
}
