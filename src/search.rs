use std::collections::BTreeSet;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Category, Frequency, TrainingDefinition};
use crate::report::MAX_ROWS;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingMatch {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub frequency: Frequency,
    pub match_score: usize,
}

/// Lowercased, distinct query terms of at least two characters.
pub fn tokenize(query: &str) -> Vec<String> {
    let distinct: BTreeSet<String> = query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|token| token.chars().count() >= 2)
        .collect();
    distinct.into_iter().collect()
}

/// Scores each training by how many query terms appear in its searchable text.
///
/// A query with no usable terms lists the whole catalog.
pub fn rank(trainings: &[TrainingDefinition], query: &str) -> Vec<TrainingMatch> {
    let tokens = tokenize(query);

    let mut matches: Vec<TrainingMatch> = trainings
        .iter()
        .filter_map(|training| {
            let score = if tokens.is_empty() {
                1
            } else {
                let haystack = haystack(training);
                tokens
                    .iter()
                    .filter(|token| haystack.contains(token.as_str()))
                    .count()
            };

            (score > 0).then(|| TrainingMatch {
                id: training.id,
                title: training.title.clone(),
                description: training.description.clone(),
                category: training.category,
                frequency: training.frequency,
                match_score: score,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.id.cmp(&b.id))
    });
    matches.truncate(MAX_ROWS);
    matches
}

fn haystack(training: &TrainingDefinition) -> String {
    format!(
        "{} {} {} {}",
        training.title,
        training.description,
        training.category.as_str(),
        training.frequency.as_str()
    )
    .to_lowercase()
}
