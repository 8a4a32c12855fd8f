use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::AnswerRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub answered: u32,
    pub correct: u32,
}

/// Answer history statistics for the progress screen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub total_answered: u32,
    pub correct_count: u32,
    /// Seconds, rounded
    pub average_time_spent: u32,
    /// Newest day first
    pub days: Vec<DailyActivity>,
    pub streak_days: u32,
}

impl HistorySummary {
    /// Days are UTC calendar dates. The streak counts consecutive active days
    /// ending at `today`, or at yesterday when nothing was answered today yet.
    pub fn from_records(records: &[AnswerRecord], today: NaiveDate) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let mut by_day: BTreeMap<NaiveDate, DailyActivity> = BTreeMap::new();
        let mut correct_count = 0u32;
        let mut total_time = 0u64;
        for record in records {
            let date = record.timestamp.date_naive();
            let day = by_day.entry(date).or_insert(DailyActivity {
                date,
                answered: 0,
                correct: 0,
            });
            day.answered += 1;
            total_time += u64::from(record.time_spent);
            if record.is_correct {
                day.correct += 1;
                correct_count += 1;
            }
        }

        let total_answered = records.len() as u32;
        let average_time_spent =
            (total_time as f64 / f64::from(total_answered)).round() as u32;
        let streak_days = streak_ending(&by_day, today);

        Self {
            total_answered,
            correct_count,
            average_time_spent,
            days: by_day.into_values().rev().collect(),
            streak_days,
        }
    }
}

fn streak_ending(by_day: &BTreeMap<NaiveDate, DailyActivity>, today: NaiveDate) -> u32 {
    let mut cursor = if by_day.contains_key(&today) {
        today
    } else {
        match today.checked_sub_days(Days::new(1)) {
            Some(yesterday) => yesterday,
            None => return 0,
        }
    };

    let mut streak = 0;
    while by_day.contains_key(&cursor) {
        streak += 1;
        cursor = match cursor.checked_sub_days(Days::new(1)) {
            Some(previous) => previous,
            None => break,
        };
    }
    streak
}
