//! Integration tests for the wrong-answer ledger
//!
//! Play a set, miss a question, then review it until it leaves the ledger.

mod common;

use std::sync::atomic::Ordering;

use common::{add_scenario, FlakyStore};

use scenario_quest::core::config::QuestConfig;
use scenario_quest::core::session::SessionIdentity;
use scenario_quest::core::types::{Category, Level};
use scenario_quest::progress::{list_wrong_answers, ReviewFeedback, ReviewSession, ReviewState};
use scenario_quest::rewrite::RuleEngine;
use scenario_quest::scenarios::{fetch, PlaySession};
use scenario_quest::storage::{MemoryStore, Store};

fn rules() -> RuleEngine {
    RuleEngine::builtin().unwrap()
}

fn miss_once(store: &MemoryStore) {
    let scenario = add_scenario(
        store,
        Category::Main,
        "library",
        "책 반납",
        "빌린 책을 돌려줄 날이에요.",
        &["반납함에 넣는다", "집에 둔다", "친구에게 준다"],
        0,
    );
    let mut play = PlaySession::new(Category::Main, "library", vec![scenario]);
    let outcome = play.answer(store, &SessionIdentity::ephemeral(), 1).unwrap();
    assert!(!outcome.correct);
    assert!(outcome.recorded);
}

fn review_correctly(store: &MemoryStore, threshold: u32) -> ReviewFeedback {
    let entry = list_wrong_answers(store, &rules(), Level::Intermediate)
        .unwrap()
        .remove(0);
    let mut review = ReviewSession::new(threshold);
    review.start(entry).unwrap();
    assert!(review.select(0).unwrap());
    review.complete(store).unwrap()
}

// ============================================================================
// Mastery threshold
// ============================================================================

#[test]
fn test_third_correct_review_removes_entry() {
    let store = MemoryStore::new();
    miss_once(&store);
    let id = store.select_wrong_answers().unwrap()[0].entry.id;
    store.update_wrong_answer_count(id, 2).unwrap();

    assert_eq!(review_correctly(&store, 3), ReviewFeedback::Mastered);
    assert!(store.select_wrong_answers().unwrap().is_empty());
}

#[test]
fn test_first_correct_review_increments_count() {
    let store = MemoryStore::new();
    miss_once(&store);

    assert_eq!(review_correctly(&store, 3), ReviewFeedback::Remaining(2));
    let rows = store.select_wrong_answers().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].entry.correct_count, 1);
}

#[test]
fn test_full_flow_from_play_to_mastery() {
    let store = MemoryStore::new();
    miss_once(&store);
    let threshold = QuestConfig::default().review_mastery_threshold;

    assert_eq!(review_correctly(&store, threshold), ReviewFeedback::Remaining(2));
    assert_eq!(review_correctly(&store, threshold), ReviewFeedback::Remaining(1));
    assert_eq!(review_correctly(&store, threshold), ReviewFeedback::Mastered);
    assert!(list_wrong_answers(&store, &rules(), Level::Beginner).unwrap().is_empty());

    let progress = store.select_progress(None).unwrap();
    assert_eq!(progress.len(), 1);
    assert!(!progress[0].is_correct);
    assert!(progress[0].completed_at.is_none());
}

#[test]
fn test_wrong_pick_then_retry() {
    let store = MemoryStore::new();
    miss_once(&store);
    let entry = list_wrong_answers(&store, &rules(), Level::Advanced).unwrap().remove(0);

    let mut review = ReviewSession::new(3);
    review.start(entry).unwrap();
    assert!(!review.select(2).unwrap());
    assert_eq!(review.state(), ReviewState::AnsweredIncorrect);
    assert!(review.complete(&store).is_err());

    review.retry().unwrap();
    assert!(review.select(0).unwrap());
    assert_eq!(review.complete(&store).unwrap(), ReviewFeedback::Remaining(2));
    assert_eq!(review.state(), ReviewState::Listing);
}

// ============================================================================
// Progress logging failures
// ============================================================================

#[test]
fn test_progress_failure_does_not_block_play() {
    let store = FlakyStore::new();
    store.fail_progress.store(true, Ordering::SeqCst);
    let set = fetch(&store, "home", Category::Main, &QuestConfig::default()).unwrap();
    let correct = set[0].correct_option().unwrap().option_order as usize;

    let mut play = PlaySession::new(Category::Main, "home", set);
    let outcome = play.answer(&store, &SessionIdentity::ephemeral(), correct).unwrap();
    assert!(outcome.correct);
    assert!(!outcome.recorded);
    assert_eq!(play.position(), 1);
    assert!(store.select_wrong_answers().unwrap().is_empty());
}
