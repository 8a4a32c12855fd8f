//! Question Catalog
//!
//! Immutable index over the reference data the game ships with: knowledge
//! topics, questions, theme areas and their levels.
//!
//! Catalog order (used wherever a stable question order matters):
//! - theme area order, then level order, then question order within a level
//! - questions not attached to any level follow, in definition order
//! - a question shared by several levels keeps its first position

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::types::{
    AnswerRecord, KnowledgeTopic, Level, LevelId, Question, QuestionId, ThemeArea, TopicId,
};

/// Catalog document as stored on disk or shipped by the content team
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSource {
    pub topics: Vec<KnowledgeTopic>,
    pub questions: Vec<Question>,
    #[serde(default)]
    pub theme_areas: Vec<ThemeArea>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    topics: Vec<KnowledgeTopic>,
    topic_index: HashMap<TopicId, usize>,
    questions: Vec<Question>,
    question_index: HashMap<QuestionId, usize>,
    theme_areas: Vec<ThemeArea>,
    level_index: HashMap<LevelId, (usize, usize)>,
}

impl Catalog {
    /// Parse and validate a JSON catalog document
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let source: CatalogSource =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_source(source)
    }

    /// Validate reference data and build the lookup indexes
    pub fn from_source(source: CatalogSource) -> Result<Self, CatalogError> {
        let CatalogSource {
            topics,
            questions,
            theme_areas,
        } = source;

        let mut topic_index = HashMap::with_capacity(topics.len());
        for (idx, topic) in topics.iter().enumerate() {
            if topic_index.insert(topic.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateId {
                    entity: "topic",
                    id: topic.id.clone(),
                });
            }
        }

        let mut by_id: HashMap<QuestionId, Question> = HashMap::with_capacity(questions.len());
        let mut definition_order = Vec::with_capacity(questions.len());
        for question in questions {
            validate_question(&question, &topic_index)?;
            if by_id.contains_key(&question.id) {
                return Err(CatalogError::DuplicateId {
                    entity: "question",
                    id: question.id,
                });
            }
            definition_order.push(question.id.clone());
            by_id.insert(question.id.clone(), question);
        }

        let mut area_ids = HashSet::new();
        let mut level_index = HashMap::new();
        for (area_idx, area) in theme_areas.iter().enumerate() {
            if !area_ids.insert(area.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    entity: "theme area",
                    id: area.id.clone(),
                });
            }
            for (level_idx, level) in area.levels.iter().enumerate() {
                if level_index
                    .insert(level.id.clone(), (area_idx, level_idx))
                    .is_some()
                {
                    return Err(CatalogError::DuplicateId {
                        entity: "level",
                        id: level.id.clone(),
                    });
                }
            }
        }

        for level in theme_areas.iter().flat_map(|area| area.levels.iter()) {
            validate_level(level, &topic_index, &by_id, &level_index)?;
        }

        // Lay questions out in catalog order
        let mut ordered_ids: Vec<QuestionId> = Vec::with_capacity(by_id.len());
        let mut placed: HashSet<QuestionId> = HashSet::with_capacity(by_id.len());
        let level_questions = theme_areas
            .iter()
            .flat_map(|area| area.levels.iter())
            .flat_map(|level| level.question_ids.iter());
        for id in level_questions.chain(definition_order.iter()) {
            if placed.insert(id.clone()) {
                ordered_ids.push(id.clone());
            }
        }

        let mut questions = Vec::with_capacity(ordered_ids.len());
        let mut question_index = HashMap::with_capacity(ordered_ids.len());
        for id in ordered_ids {
            if let Some(question) = by_id.remove(&id) {
                question_index.insert(id, questions.len());
                questions.push(question);
            }
        }

        tracing::debug!(
            topics = topics.len(),
            questions = questions.len(),
            levels = level_index.len(),
            "catalog loaded"
        );

        Ok(Self {
            topics,
            topic_index,
            questions,
            question_index,
            theme_areas,
            level_index,
        })
    }

    pub fn topic(&self, id: &str) -> Option<&KnowledgeTopic> {
        self.topic_index.get(id).map(|&idx| &self.topics[idx])
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.question_index.get(id).map(|&idx| &self.questions[idx])
    }

    pub fn level(&self, id: &str) -> Option<&Level> {
        self.level_index
            .get(id)
            .map(|&(area, level)| &self.theme_areas[area].levels[level])
    }

    pub fn require_topic(&self, id: &str) -> Result<&KnowledgeTopic, CatalogError> {
        self.topic(id)
            .ok_or_else(|| CatalogError::UnknownTopic(id.to_string()))
    }

    pub fn require_question(&self, id: &str) -> Result<&Question, CatalogError> {
        self.question(id)
            .ok_or_else(|| CatalogError::UnknownQuestion(id.to_string()))
    }

    pub fn require_level(&self, id: &str) -> Result<&Level, CatalogError> {
        self.level(id)
            .ok_or_else(|| CatalogError::UnknownLevel(id.to_string()))
    }

    pub fn topics(&self) -> &[KnowledgeTopic] {
        &self.topics
    }

    /// Questions in catalog order
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn theme_areas(&self) -> &[ThemeArea] {
        &self.theme_areas
    }

    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        self.theme_areas.iter().flat_map(|area| area.levels.iter())
    }

    /// Levels open to a brand new player
    pub fn initially_unlocked(&self) -> impl Iterator<Item = &LevelId> {
        self.levels()
            .filter(|level| level.unlocked_by_default)
            .map(|level| &level.id)
    }

    /// Questions of a level, in play order
    pub fn level_questions(&self, level_id: &str) -> Result<Vec<&Question>, CatalogError> {
        let level = self.require_level(level_id)?;
        level
            .question_ids
            .iter()
            .map(|id| self.require_question(id))
            .collect()
    }

    /// Check every reference a batch of records carries.
    ///
    /// Fails on the first unknown question or topic, or a topic repeated on
    /// one record, so the caller can drop the whole batch.
    pub fn check_records(&self, records: &[AnswerRecord]) -> Result<(), CatalogError> {
        for record in records {
            self.require_question(&record.question_id)?;
            let mut seen = HashSet::with_capacity(record.topic_ids.len());
            for topic_id in &record.topic_ids {
                self.require_topic(topic_id)?;
                if !seen.insert(topic_id.as_str()) {
                    return Err(CatalogError::DuplicateId {
                        entity: "record topic",
                        id: format!("{}/{}", record.question_id, topic_id),
                    });
                }
            }
        }
        Ok(())
    }
}

fn validate_question(
    question: &Question,
    topic_index: &HashMap<TopicId, usize>,
) -> Result<(), CatalogError> {
    let got = question.correct_answer.shape();
    if got != question.kind.answer_shape() {
        return Err(CatalogError::AnswerKindMismatch {
            question_id: question.id.clone(),
            kind: question.kind,
            got,
        });
    }

    if question.correct_answer.is_empty() {
        return Err(CatalogError::EmptyAnswer(question.id.clone()));
    }

    if question.topic_ids.is_empty() {
        return Err(CatalogError::Untagged(question.id.clone()));
    }

    let mut seen = HashSet::with_capacity(question.topic_ids.len());
    for topic_id in &question.topic_ids {
        if !topic_index.contains_key(topic_id) {
            return Err(CatalogError::UnknownTopic(topic_id.clone()));
        }
        if !seen.insert(topic_id.as_str()) {
            return Err(CatalogError::DuplicateId {
                entity: "question topic",
                id: format!("{}/{}", question.id, topic_id),
            });
        }
    }

    Ok(())
}

fn validate_level(
    level: &Level,
    topic_index: &HashMap<TopicId, usize>,
    questions: &HashMap<QuestionId, Question>,
    level_index: &HashMap<LevelId, (usize, usize)>,
) -> Result<(), CatalogError> {
    if let Some(missing) = level
        .question_ids
        .iter()
        .find(|id| !questions.contains_key(id.as_str()))
    {
        return Err(CatalogError::UnknownQuestion(missing.clone()));
    }
    if let Some(missing) = level
        .topic_ids
        .iter()
        .find(|id| !topic_index.contains_key(id.as_str()))
    {
        return Err(CatalogError::UnknownTopic(missing.clone()));
    }
    if let Some(missing) = level
        .next_level_ids
        .iter()
        .find(|id| !level_index.contains_key(id.as_str()))
    {
        return Err(CatalogError::UnknownLevel(missing.clone()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::types::{Answer, Difficulty, LevelReward, QuestionKind, TopicCategory};

    pub fn topic(id: &str) -> KnowledgeTopic {
        KnowledgeTopic {
            id: id.to_string(),
            name: format!("topic {id}"),
            description: String::new(),
            category: TopicCategory::IntegerOps,
        }
    }

    pub fn question(id: &str, topics: &[&str], difficulty: Difficulty) -> Question {
        Question {
            id: id.to_string(),
            text: format!("question {id}"),
            kind: QuestionKind::FillInBlank,
            options: Vec::new(),
            correct_answer: Answer::Scalar("42".to_string()),
            explanation: String::new(),
            topic_ids: topics.iter().map(|t| t.to_string()).collect(),
            difficulty,
            time_limit: None,
        }
    }

    pub fn level(id: &str, questions: &[&str], next: &[&str], open: bool) -> Level {
        Level {
            id: id.to_string(),
            name: format!("level {id}"),
            description: String::new(),
            theme_area_id: "area1".to_string(),
            question_ids: questions.iter().map(|q| q.to_string()).collect(),
            topic_ids: Vec::new(),
            reward: LevelReward {
                stars: 3,
                badges: vec![format!("badge-{id}")],
                items: Vec::new(),
            },
            next_level_ids: next.iter().map(|l| l.to_string()).collect(),
            unlocked_by_default: open,
        }
    }

    /// kp1..kp9 topics, three levels chained level1 -> level2 -> level3
    pub fn sample_catalog() -> Catalog {
        let topics = (1..=9).map(|n| topic(&format!("kp{n}"))).collect();
        let questions = vec![
            question("q1", &["kp1"], Difficulty::Easy),
            question("q2", &["kp1", "kp2"], Difficulty::Medium),
            question("q3", &["kp3"], Difficulty::Hard),
            question("q4", &["kp3", "kp6"], Difficulty::Easy),
            question("q5", &["kp9"], Difficulty::Easy),
            question("q6", &["kp2"], Difficulty::Easy),
        ];
        let theme_areas = vec![ThemeArea {
            id: "area1".to_string(),
            name: "Number Kingdom".to_string(),
            description: String::new(),
            color: "#4F46E5".to_string(),
            levels: vec![
                level("level1", &["q1", "q2"], &["level2"], true),
                level("level2", &["q3", "q4"], &["level3"], false),
                level("level3", &["q5"], &[], false),
            ],
        }];

        Catalog::from_source(CatalogSource {
            topics,
            questions,
            theme_areas,
        })
        .expect("sample catalog is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::types::{Answer, Difficulty};

    #[test]
    fn test_catalog_order_follows_levels_then_definitions() {
        let catalog = sample_catalog();
        let ids: Vec<&str> = catalog.questions().iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q2", "q3", "q4", "q5", "q6"]);
        assert_eq!(catalog.initially_unlocked().count(), 1);
    }

    #[test]
    fn test_unknown_topic_rejected() {
        let source = CatalogSource {
            topics: vec![topic("kp1")],
            questions: vec![question("q1", &["kp1", "kp404"], Difficulty::Easy)],
            theme_areas: Vec::new(),
        };
        let err = Catalog::from_source(source).unwrap_err();
        assert_eq!(err, CatalogError::UnknownTopic("kp404".to_string()));
    }

    #[test]
    fn test_duplicate_question_rejected() {
        let source = CatalogSource {
            topics: vec![topic("kp1")],
            questions: vec![
                question("q1", &["kp1"], Difficulty::Easy),
                question("q1", &["kp1"], Difficulty::Hard),
            ],
            theme_areas: Vec::new(),
        };
        assert!(matches!(
            Catalog::from_source(source),
            Err(CatalogError::DuplicateId { entity: "question", .. })
        ));
    }

    #[test]
    fn test_answer_shape_must_match_kind() {
        let mut q = question("q1", &["kp1"], Difficulty::Easy);
        q.correct_answer = Answer::Set(vec!["a".to_string()]);
        let source = CatalogSource {
            topics: vec![topic("kp1")],
            questions: vec![q],
            theme_areas: Vec::new(),
        };
        assert!(matches!(
            Catalog::from_source(source),
            Err(CatalogError::AnswerKindMismatch { .. })
        ));
    }

    #[test]
    fn test_level_with_unknown_successor_rejected() {
        let source = CatalogSource {
            topics: vec![topic("kp1")],
            questions: vec![question("q1", &["kp1"], Difficulty::Easy)],
            theme_areas: vec![ThemeArea {
                id: "area1".to_string(),
                name: "area".to_string(),
                description: String::new(),
                color: String::new(),
                levels: vec![level("level1", &["q1"], &["level9"], true)],
            }],
        };
        assert_eq!(
            Catalog::from_source(source).unwrap_err(),
            CatalogError::UnknownLevel("level9".to_string())
        );
    }

    #[test]
    fn test_from_json_document() {
        let json = r#"{
            "topics": [{"id": "kp1", "name": "Addition", "description": "", "category": "integer-ops"}],
            "questions": [{
                "id": "q1", "text": "25 + 47 = ?", "kind": "multiple-choice",
                "options": ["62", "72"], "correctAnswer": "72", "explanation": "",
                "topicIds": ["kp1"], "difficulty": 1, "timeLimit": 30
            }]
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        let q = catalog.require_question("q1").unwrap();
        assert_eq!(q.time_limit, Some(30));
        assert!(matches!(
            Catalog::from_json("{not json"),
            Err(CatalogError::Parse(_))
        ));
    }
}
