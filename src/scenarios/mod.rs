//! Themed scenario sets and play
//!
//! A play session walks a loaded set one scenario at a time. A correct
//! answer moves on; a wrong one is logged to the ledger and the same
//! scenario stays up for another try.

pub mod loader;
pub mod seed;

pub use loader::{fetch, load, load_delegated};
pub use seed::{main_theme, seed_theme, MainTheme, MAIN_THEMES};

use tracing::{error, info};

use crate::core::error::{QuestError, Result};
use crate::core::session::SessionIdentity;
use crate::core::types::Category;
use crate::progress::record_answer;
use crate::routes::Route;
use crate::storage::{CustomTheme, ScenarioFilter, ScenarioWithOptions, Store};

/// Whether display index `choice` picks the correct option.
///
/// Options must already be sorted: the comparison is against the correct
/// option's `option_order`, not its position in the vector.
pub fn is_correct_choice(scenario: &ScenarioWithOptions, choice: usize) -> bool {
    scenario
        .correct_option()
        .map_or(false, |o| o.option_order as usize == choice)
}

/// A custom theme with the number of scenarios filed under its name
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeSummary {
    pub theme: CustomTheme,
    pub scenario_count: usize,
}

/// Custom themes newest first, for the secret-mission listing
pub fn custom_themes<S: Store>(store: &S) -> Result<Vec<ThemeSummary>> {
    store
        .select_custom_themes()?
        .into_iter()
        .map(|theme| -> Result<ThemeSummary> {
            let filter = ScenarioFilter::themed(Category::Custom, &theme.theme_name);
            let scenario_count = store.count_scenarios(&filter)?;
            Ok(ThemeSummary { theme, scenario_count })
        })
        .collect()
}

/// What happened after one answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    /// Every scenario of the set has been answered correctly
    pub finished: bool,
    /// Progress (and ledger) rows were written
    pub recorded: bool,
}

/// One pass through a loaded scenario set
#[derive(Debug, Clone)]
pub struct PlaySession {
    category: Category,
    theme: String,
    scenarios: Vec<ScenarioWithOptions>,
    index: usize,
}

impl PlaySession {
    pub fn new(category: Category, theme: &str, scenarios: Vec<ScenarioWithOptions>) -> Self {
        Self {
            category,
            theme: theme.to_string(),
            scenarios,
            index: 0,
        }
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// 0-based index of the current scenario
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&ScenarioWithOptions> {
        self.scenarios.get(self.index)
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.scenarios.len()
    }

    /// Submit display index `choice` for the current scenario.
    ///
    /// Progress logging is fire-and-forget: a failed write is logged and
    /// play continues.
    pub fn answer<S: Store>(
        &mut self,
        store: &S,
        session: &SessionIdentity,
        choice: usize,
    ) -> Result<AnswerOutcome> {
        let scenario = self
            .current()
            .ok_or_else(|| QuestError::InvalidInput("scenario set already finished".into()))?;
        if choice >= scenario.options.len() {
            return Err(QuestError::InvalidInput(format!(
                "choice {} out of range (0..{})",
                choice,
                scenario.options.len()
            )));
        }

        let correct = is_correct_choice(scenario, choice);
        let recorded = match record_answer(store, scenario.scenario.id, session, correct) {
            Ok(_) => true,
            Err(e) => {
                error!(scenario = %scenario.scenario.id, "failed to record answer: {}", e);
                false
            }
        };

        if correct {
            self.index += 1;
            if self.is_finished() {
                info!(theme = %self.theme, count = self.scenarios.len(), "scenario set finished");
            }
        }

        Ok(AnswerOutcome {
            correct,
            finished: self.is_finished(),
            recorded,
        })
    }

    /// Where to go once the set is done
    pub fn destination(&self) -> Route {
        match self.category {
            Category::Main => Route::Home,
            Category::Custom => Route::SecretMissions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::QuestConfig;
    use crate::storage::MemoryStore;

    fn school_set(store: &MemoryStore) -> Vec<ScenarioWithOptions> {
        fetch(store, "school", Category::Main, &QuestConfig::default()).unwrap()
    }

    #[test]
    fn test_correct_choice_uses_option_order() {
        let store = MemoryStore::new();
        for scenario in school_set(&store) {
            let order = scenario.correct_option().unwrap().option_order as usize;
            assert!(is_correct_choice(&scenario, order));
            assert!(!is_correct_choice(&scenario, (order + 1) % scenario.options.len()));
        }
    }

    #[test]
    fn test_wrong_answer_keeps_scenario_and_logs_ledger() {
        let store = MemoryStore::new();
        let session = SessionIdentity::ephemeral();
        let mut play = PlaySession::new(Category::Main, "school", school_set(&store));
        let first = play.current().unwrap().scenario.id;

        let outcome = play.answer(&store, &session, 0).unwrap();
        assert!(!outcome.correct);
        assert!(outcome.recorded);
        assert_eq!(play.current().unwrap().scenario.id, first);
        assert_eq!(store.select_wrong_answers().unwrap().len(), 1);

        let outcome = play.answer(&store, &session, 1).unwrap();
        assert!(outcome.correct);
        assert_eq!(play.position(), 1);

        let progress = store.select_progress(Some(first)).unwrap();
        assert_eq!(progress.len(), 2);
        assert!(progress.iter().any(|p| p.is_correct && p.completed_at.is_some()));
        assert!(progress.iter().any(|p| !p.is_correct && p.completed_at.is_none()));
    }

    #[test]
    fn test_finishing_routes_by_category() {
        let store = MemoryStore::new();
        let session = SessionIdentity::ephemeral();
        let mut play = PlaySession::new(Category::Main, "school", school_set(&store));
        while !play.is_finished() {
            let choice = play.current().unwrap().correct_option().unwrap().option_order as usize;
            play.answer(&store, &session, choice).unwrap();
        }
        assert_eq!(play.destination(), Route::Home);
        assert!(play.answer(&store, &session, 0).is_err());

        let custom = PlaySession::new(Category::Custom, "숙제", Vec::new());
        assert!(custom.is_finished());
        assert_eq!(custom.destination(), Route::SecretMissions);
    }

    #[test]
    fn test_out_of_range_choice_is_rejected() {
        let store = MemoryStore::new();
        let session = SessionIdentity::ephemeral();
        let mut play = PlaySession::new(Category::Main, "school", school_set(&store));
        assert!(play.answer(&store, &session, 9).is_err());
        assert!(store.select_progress(None).unwrap().is_empty());
    }
}
