//! Record types owned by the persistence layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::{
    Category, Difficulty, OptionId, ProgressId, QuizQuestionId, QuizSetId, ScenarioId, ThemeId,
    WrongAnswerId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub title: String,
    pub situation: String,
    pub category: Category,
    pub theme: String,
    /// Present in the schema, never read or written by game logic
    #[serde(default)]
    pub difficulty_level: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScenario {
    pub title: String,
    pub situation: String,
    pub category: Category,
    pub theme: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOption {
    pub id: OptionId,
    pub scenario_id: ScenarioId,
    pub text: String,
    /// 0-based display index, unique per scenario
    pub option_order: u32,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScenarioOption {
    pub scenario_id: ScenarioId,
    pub text: String,
    pub option_order: u32,
    pub is_correct: bool,
}

/// A scenario joined with its options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioWithOptions {
    pub scenario: Scenario,
    pub options: Vec<ScenarioOption>,
}

impl ScenarioWithOptions {
    /// Put options in display order.
    ///
    /// Answers are compared against `option_order`, so display order must
    /// match it before any index is shown to a player.
    pub fn sort_options(&mut self) {
        self.options.sort_by_key(|o| o.option_order);
    }

    /// The option flagged correct (first one if the data is inconsistent)
    pub fn correct_option(&self) -> Option<&ScenarioOption> {
        self.options.iter().find(|o| o.is_correct)
    }

    /// Exactly one correct option and dense 0-based `option_order` values
    pub fn is_well_formed(&self) -> bool {
        let correct = self.options.iter().filter(|o| o.is_correct).count();
        let mut orders: Vec<u32> = self.options.iter().map(|o| o.option_order).collect();
        orders.sort_unstable();
        correct == 1 && orders.iter().enumerate().all(|(i, &o)| o as usize == i)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTheme {
    pub id: ThemeId,
    /// Join key for scenarios (string equality, not a foreign key)
    pub theme_name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    pub id: ProgressId,
    pub scenario_id: ScenarioId,
    pub user_session: String,
    pub is_correct: bool,
    pub attempts: u32,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUserProgress {
    pub scenario_id: ScenarioId,
    pub user_session: String,
    pub is_correct: bool,
    pub attempts: u32,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrongAnswer {
    pub id: WrongAnswerId,
    pub scenario_id: ScenarioId,
    pub user_session: String,
    pub correct_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A ledger entry joined with its scenario and options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrongAnswerWithScenario {
    pub entry: WrongAnswer,
    pub scenario: ScenarioWithOptions,
}

/// Full lookup key of a deterministic quiz set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuizSetKey {
    pub theme: String,
    pub difficulty: Difficulty,
    pub count: u32,
    pub seed: String,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSet {
    pub id: QuizSetId,
    pub key: QuizSetKey,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuizQuestion {
    pub idx: u32,
    pub title: String,
    pub situation: String,
    pub options: [String; 3],
    pub correct_option: u8,
    pub rule_note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: QuizQuestionId,
    pub quiz_set_id: QuizSetId,
    pub idx: u32,
    pub title: String,
    pub situation: String,
    pub options: [String; 3],
    pub correct_option: u8,
    pub rule_note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(order: u32, correct: bool) -> ScenarioOption {
        ScenarioOption {
            id: OptionId::new(),
            scenario_id: ScenarioId::new(),
            text: format!("option {}", order),
            option_order: order,
            is_correct: correct,
        }
    }

    fn scenario(options: Vec<ScenarioOption>) -> ScenarioWithOptions {
        let now = Utc::now();
        ScenarioWithOptions {
            scenario: Scenario {
                id: ScenarioId::new(),
                title: "t".into(),
                situation: "s".into(),
                category: Category::Main,
                theme: "school".into(),
                difficulty_level: None,
                created_at: now,
                updated_at: now,
            },
            options,
        }
    }

    #[test]
    fn test_sort_options_by_order() {
        let mut s = scenario(vec![option(2, false), option(0, false), option(1, true)]);
        s.sort_options();
        let orders: Vec<u32> = s.options.iter().map(|o| o.option_order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(s.correct_option().unwrap().option_order, 1);
    }

    #[test]
    fn test_well_formed_requires_single_correct_and_dense_orders() {
        assert!(scenario(vec![option(0, true), option(1, false)]).is_well_formed());
        assert!(!scenario(vec![option(0, true), option(1, true)]).is_well_formed());
        assert!(!scenario(vec![option(0, true), option(2, false)]).is_well_formed());
        assert!(!scenario(vec![]).is_well_formed());
    }
}
