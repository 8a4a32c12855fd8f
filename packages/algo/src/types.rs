//! Common Types and Constants
//!
//! Shared data structures used across all mastery modules. Reference data
//! (topics, questions, levels) is immutable after catalog load; answer records
//! are immutable after creation; mastery records are only replaced wholesale by
//! the aggregator.

use std::collections::btree_map;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

// ==================== Constants ====================

/// Topics whose correct rate is below this value are weak
pub const PROFICIENCY_THRESHOLD: f64 = 0.70;

/// Single-update rate change that moves the trend off `Stable`
pub const TREND_DELTA: f64 = 0.10;

/// Minimum level correct rate for three stars
pub const THREE_STAR_RATE: f64 = 0.90;

/// Minimum level correct rate for two stars
pub const TWO_STAR_RATE: f64 = 0.70;

/// Minimum level correct rate for one star
pub const ONE_STAR_RATE: f64 = 0.50;

/// Highest star tier a level attempt can earn
pub const MAX_STARS: u8 = 3;

pub type TopicId = String;
pub type QuestionId = String;
pub type LevelId = String;
pub type UserId = String;

// ==================== Reference Data ====================

/// Knowledge topic category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopicCategory {
    IntegerOps,
    Fractions,
    Decimals,
    Geometry,
    Statistics,
    WordProblems,
}

impl TopicCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntegerOps => "integer-ops",
            Self::Fractions => "fractions",
            Self::Decimals => "decimals",
            Self::Geometry => "geometry",
            Self::Statistics => "statistics",
            Self::WordProblems => "word-problems",
        }
    }
}

/// An atomic skill a question can be tagged with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeTopic {
    pub id: TopicId,
    pub name: String,
    pub description: String,
    pub category: TopicCategory,
}

/// Question presentation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    FillInBlank,
    Matching,
    DragArrange,
}

impl QuestionKind {
    /// Answer shape every question of this kind expects
    pub fn answer_shape(&self) -> AnswerShape {
        match self {
            Self::MultipleChoice | Self::FillInBlank => AnswerShape::Scalar,
            Self::Matching | Self::DragArrange => AnswerShape::Set,
        }
    }
}

/// Difficulty rank, ordered easy < medium < hard.
///
/// Serialized as its rank number (1, 2, 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    Easy = 1,
    Medium = 2,
    Hard = 3,
}

impl Difficulty {
    pub fn rank(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = CatalogError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Easy),
            2 => Ok(Self::Medium),
            3 => Ok(Self::Hard),
            other => Err(CatalogError::InvalidDifficulty(other)),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value.rank()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerShape {
    Scalar,
    Set,
}

/// A correct answer or a learner submission.
///
/// On the wire a scalar is a JSON string and a set is an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Scalar(String),
    Set(Vec<String>),
}

impl Answer {
    pub fn shape(&self) -> AnswerShape {
        match self {
            Self::Scalar(_) => AnswerShape::Scalar,
            Self::Set(_) => AnswerShape::Set,
        }
    }

    /// The blank answer recorded when nothing valid was supplied
    pub fn empty(shape: AnswerShape) -> Self {
        match shape {
            AnswerShape::Scalar => Self::Scalar(String::new()),
            AnswerShape::Set => Self::Set(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(value) => value.trim().is_empty(),
            Self::Set(values) => values.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub correct_answer: Answer,
    pub explanation: String,
    pub topic_ids: Vec<TopicId>,
    pub difficulty: Difficulty,
    /// Countdown in seconds, enforced by the presentation layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
}

impl Question {
    pub fn is_tagged_with(&self, topic_id: &str) -> bool {
        self.topic_ids.iter().any(|id| id == topic_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelReward {
    pub stars: u8,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub id: LevelId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub theme_area_id: String,
    pub question_ids: Vec<QuestionId>,
    #[serde(default)]
    pub topic_ids: Vec<TopicId>,
    #[serde(default)]
    pub reward: LevelReward,
    #[serde(default)]
    pub next_level_ids: Vec<LevelId>,
    /// Open from the start, without completing a predecessor
    #[serde(default)]
    pub unlocked_by_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeArea {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
    pub levels: Vec<Level>,
}

// ==================== Answer Records ====================

/// Where an answer was given
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum AttemptContext {
    Level(LevelId),
    Practice(String),
}

/// One submitted answer. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub user_id: UserId,
    pub context: AttemptContext,
    pub question_id: QuestionId,
    pub answer: Answer,
    pub is_correct: bool,
    /// Seconds
    pub time_spent: u32,
    pub timestamp: DateTime<Utc>,
    /// Question tags as they were at submission time
    pub topic_ids: Vec<TopicId>,
}

// ==================== Mastery ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    #[default]
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
        }
    }

    /// Classify a single update by its rate delta
    pub fn classify(old_rate: f64, new_rate: f64) -> Self {
        let delta = new_rate - old_rate;
        if delta > TREND_DELTA {
            Self::Improving
        } else if delta < -TREND_DELTA {
            Self::Declining
        } else {
            Self::Stable
        }
    }
}

/// Rolling accuracy for one user on one topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    pub topic_id: TopicId,
    /// In [0, 1], equal to correct / attempts
    pub correct_rate: f64,
    pub attempts: u32,
    pub last_practiced: DateTime<Utc>,
    pub trend: Trend,
}

impl MasteryRecord {
    /// Correct answers implied by the stored rate, `rate x attempts`.
    ///
    /// Kept fractional when the record does not describe a whole count (for
    /// example `0.3` over 3 attempts); only float noise within
    /// [`crate::sanitize::RATE_EPSILON`] of an integer is snapped.
    pub fn implied_correct(&self) -> f64 {
        let attempts = f64::from(self.attempts);
        let implied = (self.correct_rate * attempts).clamp(0.0, attempts);
        let nearest = implied.round();
        if (implied - nearest).abs() <= crate::sanitize::RATE_EPSILON * attempts.max(1.0) {
            nearest
        } else {
            implied
        }
    }

    pub fn is_weak(&self) -> bool {
        self.correct_rate < PROFICIENCY_THRESHOLD
    }
}

/// All mastery records of one user, keyed by topic
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MasteryState {
    records: BTreeMap<TopicId, MasteryRecord>,
}

impl MasteryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, topic_id: &str) -> Option<&MasteryRecord> {
        self.records.get(topic_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in topic id order
    pub fn iter(&self) -> btree_map::Values<'_, TopicId, MasteryRecord> {
        self.records.values()
    }

    pub(crate) fn upsert(&mut self, record: MasteryRecord) {
        self.records.insert(record.topic_id.clone(), record);
    }
}

impl FromIterator<MasteryRecord> for MasteryState {
    fn from_iter<I: IntoIterator<Item = MasteryRecord>>(iter: I) -> Self {
        Self {
            records: iter
                .into_iter()
                .map(|record| (record.topic_id.clone(), record))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MasteryState {
    type Item = &'a MasteryRecord;
    type IntoIter = btree_map::Values<'a, TopicId, MasteryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}
