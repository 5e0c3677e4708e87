//! Reproducible quiz sets keyed by `(theme, difficulty, count, seed, version)`

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::config::QuestConfig;
use crate::core::error::{QuestError, Result};
use crate::core::types::Difficulty;
use crate::quizset::rng::rng_for;
use crate::quizset::templates::template_at;
use crate::storage::{NewQuizQuestion, QuizQuestion, QuizSet, QuizSetKey, Store, StoreError};

/// A quiz set request; omitted fields take the documented defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizRequest {
    pub theme: String,
    pub difficulty: Difficulty,
    /// `None` means `quiz_default_count`
    pub count: Option<u32>,
    pub seed: String,
    pub version: u32,
}

impl Default for QuizRequest {
    fn default() -> Self {
        Self {
            theme: String::new(),
            difficulty: Difficulty::Mixed,
            count: None,
            seed: "default".into(),
            version: 1,
        }
    }
}

impl QuizRequest {
    /// Lookup key, with the count clamped to `1..=quiz_max_count`
    pub fn key(&self, config: &QuestConfig) -> QuizSetKey {
        let count = self
            .count
            .unwrap_or(config.quiz_default_count)
            .clamp(1, config.quiz_max_count.max(1));
        QuizSetKey {
            theme: self.theme.clone(),
            difficulty: self.difficulty,
            count,
            seed: self.seed.clone(),
            version: self.version,
        }
    }
}

/// Render the questions for `key`. Same key, same questions.
pub fn generate_questions(key: &QuizSetKey) -> Vec<NewQuizQuestion> {
    let mut rng = rng_for(key);
    (0..key.count as usize)
        .map(|i| {
            let template = template_at(i);
            let difficulty = match key.difficulty {
                Difficulty::Mixed => Difficulty::DISCRETE[rng.gen_range(0..Difficulty::DISCRETE.len())],
                discrete => discrete,
            };
            NewQuizQuestion {
                idx: i as u32,
                title: template.title_for(&key.theme),
                situation: template.render(difficulty),
                options: template.options.map(str::to_string),
                correct_option: template.correct,
                rule_note: template.rule.to_string(),
            }
        })
        .collect()
}

/// Stored set for the request, generating and storing it on a miss.
///
/// A set that already exists is returned with its stored questions and is
/// never regenerated. Losing an insert race to another caller re-reads the
/// winner's row. If the questions fail to store after the set row went in,
/// the set comes back with no questions; a later call for the same key
/// stores them, and since generation is seeded they are the same questions.
pub fn get_or_create<S: Store>(
    store: &S,
    request: &QuizRequest,
    config: &QuestConfig,
) -> Result<(QuizSet, Vec<QuizQuestion>)> {
    let key = request.key(config);

    if let Some(existing) = store.find_quiz_set(&key)? {
        let questions = store.select_quiz_questions(existing.id)?;
        if questions.is_empty() {
            warn!(set = %existing.id, "quiz set has no questions, filling it in");
            return Ok(fill_questions(store, existing));
        }
        return Ok((existing, questions));
    }

    let set = match store.insert_quiz_set(&key, true) {
        Ok(set) => set,
        Err(StoreError::Conflict(msg)) => {
            info!("quiz set inserted concurrently ({}), re-reading", msg);
            let existing = store
                .find_quiz_set(&key)?
                .ok_or_else(|| QuestError::NotFound(format!("quiz set after conflict: {}", msg)))?;
            let questions = store.select_quiz_questions(existing.id)?;
            return Ok((existing, questions));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(fill_questions(store, set))
}

/// Store the generated questions for `set`; a failure leaves it empty
fn fill_questions<S: Store>(store: &S, set: QuizSet) -> (QuizSet, Vec<QuizQuestion>) {
    let key = &set.key;
    let rows = generate_questions(key);
    match store.insert_quiz_questions(set.id, &rows) {
        Ok(questions) => {
            info!(
                set = %set.id,
                theme = %key.theme,
                difficulty = %key.difficulty,
                count = questions.len(),
                "quiz questions stored"
            );
            (set, questions)
        }
        Err(e) => {
            warn!(set = %set.id, "quiz questions not stored, set left empty: {}", e);
            (set, Vec::new())
        }
    }
}
