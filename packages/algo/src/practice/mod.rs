//! Practice Question Selector
//!
//! Builds the practice set for a group of weak topics:
//! 1. keep every question tagged with at least one weak topic
//! 2. keep each question once, even when it hits several weak topics
//! 3. stable sort by difficulty, easy first; equal difficulties keep catalog order
//!
//! The set is unbounded. Callers cap it for their own screen.

use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::types::Question;

/// Practice set drawn from the whole catalog
pub fn select_practice<'a, T>(weak_topics: &[T], catalog: &'a Catalog) -> Vec<&'a Question>
where
    T: AsRef<str>,
{
    select_practice_from(weak_topics, catalog.questions())
}

/// Practice set drawn from an explicit question sequence, kept in its order
pub fn select_practice_from<'a, T, I>(weak_topics: &[T], questions: I) -> Vec<&'a Question>
where
    T: AsRef<str>,
    I: IntoIterator<Item = &'a Question>,
{
    if weak_topics.is_empty() {
        return Vec::new();
    }

    let weak: HashSet<&str> = weak_topics.iter().map(AsRef::as_ref).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut selected: Vec<&'a Question> = questions
        .into_iter()
        .filter(|&question| {
            question
                .topic_ids
                .iter()
                .any(|topic| weak.contains(topic.as_str()))
        })
        .filter(|&question| seen.insert(question.id.as_str()))
        .collect();

    // Vec::sort_by_key is stable
    selected.sort_by_key(|question| question.difficulty);
    selected
}
