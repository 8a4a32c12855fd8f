//! Weakness Selector
//!
//! A topic is weak while its correct rate is below
//! [`crate::types::PROFICIENCY_THRESHOLD`].
//! A user without mastery records has no weak topics.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::{MasteryRecord, MasteryState, TopicId, Trend};

/// Ids of every weak topic.
///
/// No ordering is promised; the current implementation yields topic id order.
pub fn weak_topics(state: &MasteryState) -> Vec<TopicId> {
    state
        .iter()
        .filter(|record| record.is_weak())
        .map(|record| record.topic_id.clone())
        .collect()
}

/// Weak records, weakest first (ties by topic id)
pub fn rank_weak_topics(state: &MasteryState) -> Vec<MasteryRecord> {
    let mut weak: Vec<MasteryRecord> = state
        .iter()
        .filter(|record| record.is_weak())
        .cloned()
        .collect();
    weak.sort_by(|a, b| {
        a.correct_rate
            .partial_cmp(&b.correct_rate)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.topic_id.cmp(&b.topic_id))
    });
    weak
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub improving: usize,
    pub declining: usize,
    pub stable: usize,
    /// Improving if more topics improve than decline, declining if the
    /// reverse, otherwise stable
    pub overall: Trend,
}

pub fn trend_summary<'a>(records: impl IntoIterator<Item = &'a MasteryRecord>) -> TrendSummary {
    let mut summary = TrendSummary::default();
    for record in records {
        match record.trend {
            Trend::Improving => summary.improving += 1,
            Trend::Declining => summary.declining += 1,
            Trend::Stable => summary.stable += 1,
        }
    }
    summary.overall = match summary.improving.cmp(&summary.declining) {
        Ordering::Greater => Trend::Improving,
        Ordering::Less => Trend::Declining,
        Ordering::Equal => Trend::Stable,
    };
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(topic: &str, rate: f64, trend: Trend) -> MasteryRecord {
        MasteryRecord {
            topic_id: topic.to_string(),
            correct_rate: rate,
            attempts: 10,
            last_practiced: Utc::now(),
            trend,
        }
    }

    fn state() -> MasteryState {
        vec![
            record("kp1", 0.9, Trend::Stable),
            record("kp2", 0.7, Trend::Improving),
            record("kp3", 0.3, Trend::Declining),
            record("kp4", 0.69, Trend::Improving),
            record("kp5", 0.3, Trend::Improving),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_threshold_is_strict() {
        let weak = weak_topics(&state());
        assert_eq!(weak, vec!["kp3", "kp4", "kp5"]);
        assert!(!weak.contains(&"kp2".to_string()));
    }

    #[test]
    fn test_new_user_has_no_weak_topics() {
        assert!(weak_topics(&MasteryState::new()).is_empty());
        assert!(rank_weak_topics(&MasteryState::new()).is_empty());
    }

    #[test]
    fn test_rank_weakest_first() {
        let ranked: Vec<String> = rank_weak_topics(&state())
            .into_iter()
            .map(|r| r.topic_id)
            .collect();
        assert_eq!(ranked, vec!["kp3", "kp5", "kp4"]);
    }

    #[test]
    fn test_trend_summary() {
        let state = state();
        let weak = rank_weak_topics(&state);
        let summary = trend_summary(&weak);
        assert_eq!(summary.improving, 2);
        assert_eq!(summary.declining, 1);
        assert_eq!(summary.overall, Trend::Improving);

        assert_eq!(trend_summary(&MasteryState::new()).overall, Trend::Stable);
    }
}
