//! Per-user progress aggregate.
//!
//! Owns everything one learner accumulates: mastery state, answer history,
//! level results, unlocked levels, rewards and the running star total. Every
//! mutation validates first and only then applies, so a failed call leaves the
//! aggregate exactly as it was.

mod summary;

pub use summary::{DailyActivity, HistorySummary};

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::completion::{evaluate_completion, CompletionOutcome, PlaySession};
use crate::error::{AlgoResult, RecordError, SessionError};
use crate::mastery::apply_answers;
use crate::types::{AnswerRecord, AttemptContext, Level, LevelId, MasteryState, UserId};

/// Best result on one level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRecord {
    pub level_id: LevelId,
    pub completed: bool,
    pub best_stars: u8,
    pub attempts: u32,
    /// Level reward handed out
    pub rewarded: bool,
}

/// What one level completion changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCompletion {
    pub level_id: LevelId,
    pub stars: u8,
    pub best_stars: u8,
    pub stars_gained: u32,
    pub total_stars: u32,
    pub correct_rate: f64,
    pub first_completion: bool,
    pub newly_unlocked: Vec<LevelId>,
    pub badges_awarded: Vec<String>,
    pub items_awarded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    user_id: UserId,
    mastery: MasteryState,
    history: Vec<AnswerRecord>,
    levels: BTreeMap<LevelId, LevelRecord>,
    unlocked: BTreeSet<LevelId>,
    completed: Vec<LevelId>,
    badges: Vec<String>,
    items: Vec<String>,
    total_stars: u32,
}

impl UserProgress {
    /// Fresh progress with the catalog's starting levels open
    pub fn new(user_id: impl Into<UserId>, catalog: &Catalog) -> Self {
        Self {
            user_id: user_id.into(),
            mastery: MasteryState::new(),
            history: Vec::new(),
            levels: BTreeMap::new(),
            unlocked: catalog.initially_unlocked().cloned().collect(),
            completed: Vec::new(),
            badges: Vec::new(),
            items: Vec::new(),
            total_stars: 0,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn mastery(&self) -> &MasteryState {
        &self.mastery
    }

    pub fn history(&self) -> &[AnswerRecord] {
        &self.history
    }

    pub fn level(&self, level_id: &str) -> Option<&LevelRecord> {
        self.levels.get(level_id)
    }

    pub fn levels(&self) -> impl Iterator<Item = &LevelRecord> {
        self.levels.values()
    }

    pub fn unlocked_levels(&self) -> impl Iterator<Item = &LevelId> {
        self.unlocked.iter()
    }

    pub fn is_unlocked(&self, level_id: &str) -> bool {
        self.unlocked.contains(level_id)
    }

    /// Completed levels in first-completion order
    pub fn completed_levels(&self) -> &[LevelId] {
        &self.completed
    }

    pub fn badges(&self) -> &[String] {
        &self.badges
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn total_stars(&self) -> u32 {
        self.total_stars
    }

    /// Star total recomputed from the level records.
    ///
    /// Always equal to [`Self::total_stars`]; used to reconcile the running
    /// total.
    pub fn recount_stars(&self) -> u32 {
        self.levels
            .values()
            .filter(|record| record.completed)
            .map(|record| u32::from(record.best_stars))
            .sum()
    }

    /// Open a play session on an unlocked level
    pub fn start_level(
        &self,
        catalog: &Catalog,
        level_id: &str,
        now: DateTime<Utc>,
    ) -> AlgoResult<PlaySession> {
        let level = catalog.require_level(level_id)?;
        if !self.is_unlocked(level_id) {
            return Err(SessionError::Locked(level_id.to_string()).into());
        }
        Ok(PlaySession::start(self.user_id.clone(), level, now)?)
    }

    /// Apply a finished level attempt: mastery, level result, star total,
    /// rewards, unlocks and history move together.
    ///
    /// The records must answer the level's questions in play order. Stars and
    /// rate are recomputed from them; the tallies carried by `outcome` are
    /// ignored.
    pub fn complete_level(
        &mut self,
        catalog: &Catalog,
        outcome: CompletionOutcome,
        now: DateTime<Utc>,
    ) -> AlgoResult<LevelCompletion> {
        let level = catalog.require_level(&outcome.level_id)?;
        if !self.is_unlocked(&level.id) {
            return Err(SessionError::Locked(level.id.clone()).into());
        }
        self.check_ownership(&outcome.records)?;
        check_level_records(level, &outcome.records)?;
        let mastery = apply_answers(&self.mastery, &outcome.records, catalog, now)?;
        let outcome = evaluate_completion(level.id.clone(), outcome.records);

        // Nothing below can fail
        let record = self
            .levels
            .entry(level.id.clone())
            .or_insert_with(|| LevelRecord {
                level_id: level.id.clone(),
                ..LevelRecord::default()
            });
        let first_completion = !record.completed;
        let previous_best = if record.completed { record.best_stars } else { 0 };
        record.completed = true;
        record.attempts += 1;
        record.best_stars = previous_best.max(outcome.stars);
        let best_stars = record.best_stars;
        let stars_gained = u32::from(best_stars - previous_best);

        let mut badges_awarded = Vec::new();
        let mut items_awarded = Vec::new();
        if !record.rewarded && outcome.stars > 0 {
            record.rewarded = true;
            for badge in &level.reward.badges {
                if !self.badges.contains(badge) {
                    badges_awarded.push(badge.clone());
                }
            }
            items_awarded.extend(level.reward.items.iter().cloned());
        }

        if first_completion {
            self.completed.push(level.id.clone());
        }
        self.total_stars += stars_gained;
        self.badges.extend(badges_awarded.iter().cloned());
        self.items.extend(items_awarded.iter().cloned());

        let mut newly_unlocked = Vec::new();
        for next_id in &level.next_level_ids {
            if self.unlocked.insert(next_id.clone()) {
                newly_unlocked.push(next_id.clone());
            }
        }

        self.mastery = mastery;
        self.history.extend(outcome.records);

        tracing::debug!(
            user_id = %self.user_id,
            level_id = %level.id,
            stars = outcome.stars,
            stars_gained,
            unlocked = newly_unlocked.len(),
            "level completion applied"
        );

        Ok(LevelCompletion {
            level_id: level.id.clone(),
            stars: outcome.stars,
            best_stars,
            stars_gained,
            total_stars: self.total_stars,
            correct_rate: outcome.correct_rate,
            first_completion,
            newly_unlocked,
            badges_awarded,
            items_awarded,
        })
    }

    /// Apply practice answers: mastery and history only
    pub fn apply_practice(
        &mut self,
        catalog: &Catalog,
        records: Vec<AnswerRecord>,
        now: DateTime<Utc>,
    ) -> AlgoResult<()> {
        self.check_ownership(&records)?;
        let mastery = apply_answers(&self.mastery, &records, catalog, now)?;
        self.mastery = mastery;
        self.history.extend(records);
        Ok(())
    }

    pub fn history_summary(&self, now: DateTime<Utc>) -> HistorySummary {
        HistorySummary::from_records(&self.history, now.date_naive())
    }

    /// Answers given inside one level or practice session
    pub fn history_for<'a>(
        &'a self,
        context: &'a AttemptContext,
    ) -> impl Iterator<Item = &'a AnswerRecord> + 'a {
        self.history
            .iter()
            .filter(move |record| &record.context == context)
    }

    fn check_ownership(&self, records: &[AnswerRecord]) -> Result<(), RecordError> {
        match records.iter().find(|record| record.user_id != self.user_id) {
            Some(foreign) => Err(RecordError::UserMismatch {
                expected: self.user_id.clone(),
                got: foreign.user_id.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// A level attempt answers every question of the level once, in order
fn check_level_records(level: &Level, records: &[AnswerRecord]) -> Result<(), SessionError> {
    let mismatch = |reason: String| SessionError::OutcomeMismatch {
        level_id: level.id.clone(),
        reason,
    };

    if records.len() != level.question_ids.len() {
        return Err(mismatch(format!(
            "expected {} answers, got {}",
            level.question_ids.len(),
            records.len()
        )));
    }
    let context = AttemptContext::Level(level.id.clone());
    for (idx, (record, expected)) in records.iter().zip(&level.question_ids).enumerate() {
        if &record.question_id != expected {
            return Err(mismatch(format!(
                "answer {idx} is for {}, expected {expected}",
                record.question_id
            )));
        }
        if record.context != context {
            return Err(mismatch(format!("answer {idx} was given outside the level")));
        }
    }
    Ok(())
}
