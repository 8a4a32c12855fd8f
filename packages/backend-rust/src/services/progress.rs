use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use shuxue_algo::{
    select_practice, weak_topics, AlgoResult, AnswerRecord, Catalog, CompletionOutcome,
    LevelCompletion, PlaySession, Question, TopicId, UserProgress,
};

/// Weak topics and the questions drawn from them, read under one lock
#[derive(Debug, Clone, PartialEq)]
pub struct PracticePlan {
    pub weak_topic_ids: Vec<TopicId>,
    pub questions: Vec<Question>,
}

/// A committed practice batch and the weak topics right after it
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeApplied {
    pub applied: usize,
    pub weak_topic_ids: Vec<TopicId>,
}

/// In-memory registry of learner aggregates, one lock per learner.
///
/// A fold for one learner never waits on another learner.
pub struct ProgressService {
    catalog: Arc<Catalog>,
    users: RwLock<HashMap<String, Arc<Mutex<UserProgress>>>>,
}

impl ProgressService {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            users: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn handle(&self, user_id: &str) -> Arc<Mutex<UserProgress>> {
        if let Some(existing) = self.users.read().get(user_id) {
            return Arc::clone(existing);
        }
        let mut users = self.users.write();
        let entry = users.entry(user_id.to_string()).or_insert_with(|| {
            tracing::debug!(user_id, "progress created");
            Arc::new(Mutex::new(UserProgress::new(user_id, &self.catalog)))
        });
        Arc::clone(entry)
    }

    /// Consistent copy of one learner's aggregate
    pub fn snapshot(&self, user_id: &str) -> UserProgress {
        self.handle(user_id).lock().clone()
    }

    pub fn start_level(
        &self,
        user_id: &str,
        level_id: &str,
        now: DateTime<Utc>,
    ) -> AlgoResult<PlaySession> {
        self.handle(user_id)
            .lock()
            .start_level(&self.catalog, level_id, now)
    }

    pub fn complete_level(
        &self,
        user_id: &str,
        outcome: CompletionOutcome,
        now: DateTime<Utc>,
    ) -> AlgoResult<LevelCompletion> {
        let handle = self.handle(user_id);
        let mut progress = handle.lock();
        let level_id = outcome.level_id.clone();
        progress
            .complete_level(&self.catalog, outcome, now)
            .inspect_err(|err| {
                tracing::warn!(user_id, level_id = %level_id, error = %err, "level completion rejected");
            })
    }

    pub fn apply_practice(
        &self,
        user_id: &str,
        records: Vec<AnswerRecord>,
        now: DateTime<Utc>,
    ) -> AlgoResult<PracticeApplied> {
        let count = records.len();
        let handle = self.handle(user_id);
        let mut progress = handle.lock();
        progress
            .apply_practice(&self.catalog, records, now)
            .inspect_err(|err| {
                tracing::warn!(user_id, count, error = %err, "practice batch rejected");
            })?;
        tracing::debug!(user_id, count, "practice batch applied");
        Ok(PracticeApplied {
            applied: count,
            weak_topic_ids: weak_topics(progress.mastery()),
        })
    }

    /// Weak topics of one learner and their questions, easiest first, at most
    /// `limit`
    pub fn practice_plan(&self, user_id: &str, limit: usize) -> PracticePlan {
        let weak_topic_ids = {
            let handle = self.handle(user_id);
            let progress = handle.lock();
            weak_topics(progress.mastery())
        };
        let questions = select_practice(&weak_topic_ids, &self.catalog)
            .into_iter()
            .take(limit)
            .cloned()
            .collect();
        PracticePlan {
            weak_topic_ids,
            questions,
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }
}
