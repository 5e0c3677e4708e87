//! Persistence collaborator
//!
//! The game core sees storage as a handle with per-entity insert, select,
//! update, delete and count operations. Each call is atomic on its own;
//! nothing here spans several rows in one transaction.

pub mod memory;
pub mod models;

pub use memory::MemoryStore;
pub use models::*;

use thiserror::Error;

use crate::core::types::{Category, OptionId, QuizSetId, ScenarioId, WrongAnswerId};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the insert
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Equality filter for scenario queries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioFilter {
    pub category: Option<Category>,
    pub theme: Option<String>,
    pub limit: Option<usize>,
}

impl ScenarioFilter {
    pub fn themed(category: Category, theme: &str) -> Self {
        Self {
            category: Some(category),
            theme: Some(theme.to_string()),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn matches(&self, scenario: &Scenario) -> bool {
        self.category.map_or(true, |c| scenario.category == c)
            && self.theme.as_deref().map_or(true, |t| scenario.theme == t)
    }
}

/// Storage handle used by every component
pub trait Store {
    // === SCENARIOS ===
    fn insert_scenario(&self, new: NewScenario) -> StoreResult<Scenario>;
    fn insert_option(&self, new: NewScenarioOption) -> StoreResult<ScenarioOption>;
    /// Scenarios matching `filter` with their options (unsorted)
    fn select_scenarios(&self, filter: &ScenarioFilter) -> StoreResult<Vec<ScenarioWithOptions>>;
    fn count_scenarios(&self, filter: &ScenarioFilter) -> StoreResult<usize>;
    /// Overwrite title and situation in place
    fn update_scenario_text(&self, id: ScenarioId, title: &str, situation: &str) -> StoreResult<()>;
    fn update_option_text(&self, id: OptionId, text: &str) -> StoreResult<()>;

    // === CUSTOM THEMES ===
    fn insert_custom_theme(&self, theme_name: &str, description: &str) -> StoreResult<CustomTheme>;
    /// Newest first
    fn select_custom_themes(&self) -> StoreResult<Vec<CustomTheme>>;

    // === PROGRESS LOG ===
    fn insert_progress(&self, new: NewUserProgress) -> StoreResult<UserProgress>;
    fn select_progress(&self, scenario_id: Option<ScenarioId>) -> StoreResult<Vec<UserProgress>>;

    // === WRONG-ANSWER LEDGER ===
    fn insert_wrong_answer(&self, scenario_id: ScenarioId, user_session: &str) -> StoreResult<WrongAnswer>;
    /// Newest first, joined with scenario and options
    fn select_wrong_answers(&self) -> StoreResult<Vec<WrongAnswerWithScenario>>;
    fn get_wrong_answer(&self, id: WrongAnswerId) -> StoreResult<WrongAnswer>;
    fn update_wrong_answer_count(&self, id: WrongAnswerId, correct_count: u32) -> StoreResult<()>;
    fn delete_wrong_answer(&self, id: WrongAnswerId) -> StoreResult<()>;

    // === QUIZ SETS ===
    fn find_quiz_set(&self, key: &QuizSetKey) -> StoreResult<Option<QuizSet>>;
    /// Fails with `Conflict` when a set with the same key already exists
    fn insert_quiz_set(&self, key: &QuizSetKey, published: bool) -> StoreResult<QuizSet>;
    fn insert_quiz_questions(
        &self,
        quiz_set_id: QuizSetId,
        rows: &[NewQuizQuestion],
    ) -> StoreResult<Vec<QuizQuestion>>;
    /// Ordered by `idx`
    fn select_quiz_questions(&self, quiz_set_id: QuizSetId) -> StoreResult<Vec<QuizQuestion>>;
}
