//! Answer log and wrong-answer review
//!
//! Every answer appends a progress row. A wrong answer also opens a ledger
//! entry, which leaves the ledger after `review_mastery_threshold` correct
//! reviews or when removed by hand.

use chrono::Utc;
use tracing::{debug, info};

use crate::core::error::{QuestError, Result};
use crate::core::session::SessionIdentity;
use crate::core::types::{Level, ScenarioId, WrongAnswerId};
use crate::rewrite::RuleEngine;
use crate::scenarios::is_correct_choice;
use crate::storage::{NewUserProgress, Store, WrongAnswer, WrongAnswerWithScenario};

/// Append a progress row and, for a wrong answer, a new ledger entry.
///
/// Ledger entries are not deduplicated: missing the same scenario twice
/// opens two entries.
pub fn record_answer<S: Store>(
    store: &S,
    scenario_id: ScenarioId,
    session: &SessionIdentity,
    is_correct: bool,
) -> Result<Option<WrongAnswer>> {
    store.insert_progress(NewUserProgress {
        scenario_id,
        user_session: session.as_str().to_string(),
        is_correct,
        attempts: 1,
        completed_at: is_correct.then(Utc::now),
    })?;

    if is_correct {
        return Ok(None);
    }
    let entry = store.insert_wrong_answer(scenario_id, session.as_str())?;
    debug!(scenario = %scenario_id, entry = %entry.id, "wrong answer logged");
    Ok(Some(entry))
}

/// Ledger entries newest first, options in display order, text leveled
pub fn list_wrong_answers<S: Store>(
    store: &S,
    rules: &RuleEngine,
    level: Level,
) -> Result<Vec<WrongAnswerWithScenario>> {
    let mut rows = store.select_wrong_answers()?;
    rows.sort_by(|a, b| b.entry.created_at.cmp(&a.entry.created_at));
    for row in rows.iter_mut() {
        row.scenario.sort_options();
        row.scenario = rules.rewrite_scenario(&row.scenario, level);
    }
    Ok(rows)
}

/// Drop an entry regardless of its count
pub fn remove_wrong_answer<S: Store>(store: &S, id: WrongAnswerId) -> Result<()> {
    store.delete_wrong_answer(id)?;
    info!(entry = %id, "wrong answer removed");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Listing,
    Reviewing,
    AnsweredCorrect,
    AnsweredIncorrect,
}

/// Result of completing a correct review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFeedback {
    /// Entry kept; this many more correct reviews remove it
    Remaining(u32),
    /// Threshold reached, entry deleted
    Mastered,
}

/// Review flow over the ledger.
///
/// `listing -> reviewing -> answered-correct | answered-incorrect`. A wrong
/// pick can only go back to `reviewing`; completing a correct pick writes
/// the new count once and returns to `listing`.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    state: ReviewState,
    entry: Option<WrongAnswerWithScenario>,
    selected: Option<usize>,
    threshold: u32,
}

impl ReviewSession {
    pub fn new(threshold: u32) -> Self {
        Self {
            state: ReviewState::Listing,
            entry: None,
            selected: None,
            threshold: threshold.max(1),
        }
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn entry(&self) -> Option<&WrongAnswerWithScenario> {
        self.entry.as_ref()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    fn expect_state(&self, expected: ReviewState, action: &str) -> Result<()> {
        if self.state != expected {
            return Err(QuestError::InvalidInput(format!(
                "cannot {} while {:?}",
                action, self.state
            )));
        }
        Ok(())
    }

    /// Open an entry for review; options must be in display order
    pub fn start(&mut self, entry: WrongAnswerWithScenario) -> Result<()> {
        self.expect_state(ReviewState::Listing, "start a review")?;
        self.entry = Some(entry);
        self.selected = None;
        self.state = ReviewState::Reviewing;
        Ok(())
    }

    /// Pick display index `choice`; returns whether it was correct
    pub fn select(&mut self, choice: usize) -> Result<bool> {
        self.expect_state(ReviewState::Reviewing, "select an option")?;
        let entry = self
            .entry
            .as_ref()
            .ok_or_else(|| QuestError::InvalidInput("no entry under review".into()))?;
        if choice >= entry.scenario.options.len() {
            return Err(QuestError::InvalidInput(format!(
                "choice {} out of range (0..{})",
                choice,
                entry.scenario.options.len()
            )));
        }

        let correct = is_correct_choice(&entry.scenario, choice);
        self.selected = Some(choice);
        self.state = if correct {
            ReviewState::AnsweredCorrect
        } else {
            ReviewState::AnsweredIncorrect
        };
        Ok(correct)
    }

    /// Clear a wrong pick and try again
    pub fn retry(&mut self) -> Result<()> {
        self.expect_state(ReviewState::AnsweredIncorrect, "retry")?;
        self.selected = None;
        self.state = ReviewState::Reviewing;
        Ok(())
    }

    /// Leave the review without writing anything
    pub fn cancel(&mut self) {
        if self.state != ReviewState::AnsweredCorrect {
            self.entry = None;
            self.selected = None;
            self.state = ReviewState::Listing;
        }
    }

    /// Count a correct review.
    ///
    /// The session leaves `answered-correct` before touching storage, so a
    /// second call is rejected instead of counting twice.
    pub fn complete<S: Store>(&mut self, store: &S) -> Result<ReviewFeedback> {
        self.expect_state(ReviewState::AnsweredCorrect, "complete a review")?;
        let entry = self
            .entry
            .take()
            .ok_or_else(|| QuestError::InvalidInput("no entry under review".into()))?;
        self.selected = None;
        self.state = ReviewState::Listing;

        let id = entry.entry.id;
        let current = store.get_wrong_answer(id)?;
        let new_count = current.correct_count + 1;

        if new_count >= self.threshold {
            store.delete_wrong_answer(id)?;
            info!(entry = %id, "wrong answer mastered");
            Ok(ReviewFeedback::Mastered)
        } else {
            store.update_wrong_answer_count(id, new_count)?;
            debug!(entry = %id, count = new_count, "review counted");
            Ok(ReviewFeedback::Remaining(self.threshold - new_count))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Category;
    use crate::storage::{MemoryStore, NewScenario, NewScenarioOption};

    fn scenario_id(store: &MemoryStore) -> ScenarioId {
        let scenario = store
            .insert_scenario(NewScenario {
                title: "그네를 타고 싶을 때".into(),
                situation: "그네를 타고 싶은데 한 친구가 계속 타고 있어요.".into(),
                category: Category::Main,
                theme: "playground".into(),
            })
            .unwrap();
        for i in (0..3).rev() {
            store
                .insert_option(NewScenarioOption {
                    scenario_id: scenario.id,
                    text: format!("선택 {}", i),
                    option_order: i,
                    is_correct: i == 2,
                })
                .unwrap();
        }
        scenario.id
    }

    fn listed(store: &MemoryStore) -> Vec<WrongAnswerWithScenario> {
        let rules = RuleEngine::builtin().unwrap();
        list_wrong_answers(store, &rules, Level::Intermediate).unwrap()
    }

    #[test]
    fn test_wrong_answers_are_not_deduplicated() {
        let store = MemoryStore::new();
        let session = SessionIdentity::ephemeral();
        let id = scenario_id(&store);

        assert!(record_answer(&store, id, &session, false).unwrap().is_some());
        assert!(record_answer(&store, id, &session, false).unwrap().is_some());
        assert!(record_answer(&store, id, &session, true).unwrap().is_none());

        assert_eq!(store.select_wrong_answers().unwrap().len(), 2);
        assert_eq!(store.select_progress(Some(id)).unwrap().len(), 3);
    }

    #[test]
    fn test_listing_sorts_options() {
        let store = MemoryStore::new();
        let id = scenario_id(&store);
        record_answer(&store, id, &SessionIdentity::ephemeral(), false).unwrap();

        let rows = listed(&store);
        let orders: Vec<u32> = rows[0].scenario.options.iter().map(|o| o.option_order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_incorrect_pick_only_allows_retry() {
        let store = MemoryStore::new();
        let id = scenario_id(&store);
        record_answer(&store, id, &SessionIdentity::ephemeral(), false).unwrap();

        let mut review = ReviewSession::new(3);
        review.start(listed(&store).remove(0)).unwrap();
        assert!(!review.select(0).unwrap());
        assert_eq!(review.state(), ReviewState::AnsweredIncorrect);
        assert!(review.complete(&store).is_err());
        assert!(review.select(2).is_err());

        review.retry().unwrap();
        assert_eq!(review.selected(), None);
        assert!(review.select(2).unwrap());
    }

    #[test]
    fn test_double_complete_counts_once() {
        let store = MemoryStore::new();
        let id = scenario_id(&store);
        let entry = record_answer(&store, id, &SessionIdentity::ephemeral(), false)
            .unwrap()
            .unwrap();

        let mut review = ReviewSession::new(3);
        review.start(listed(&store).remove(0)).unwrap();
        review.select(2).unwrap();
        assert_eq!(review.complete(&store).unwrap(), ReviewFeedback::Remaining(2));
        assert!(review.complete(&store).is_err());
        assert_eq!(review.state(), ReviewState::Listing);
        assert_eq!(store.get_wrong_answer(entry.id).unwrap().correct_count, 1);
    }

    #[test]
    fn test_manual_remove() {
        let store = MemoryStore::new();
        let id = scenario_id(&store);
        let entry = record_answer(&store, id, &SessionIdentity::ephemeral(), false)
            .unwrap()
            .unwrap();
        remove_wrong_answer(&store, entry.id).unwrap();
        assert!(store.select_wrong_answers().unwrap().is_empty());
        assert!(remove_wrong_answer(&store, entry.id).is_err());
    }
}
