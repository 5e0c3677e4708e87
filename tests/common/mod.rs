//! Shared doubles for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use scenario_quest::core::error::{QuestError, Result};
use scenario_quest::core::types::{Category, OptionId, QuizSetId, ScenarioId, WrongAnswerId};
use scenario_quest::llm::TextGenerator;
use scenario_quest::storage::*;

/// Generation service that replays canned replies in order
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(text.to_string()))
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Err(QuestError::LlmError(message.to_string())))
    }

    fn push(self, reply: Result<String>) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, _system: &str, _user: &str, _temperature: f32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(QuestError::LlmError("no scripted reply left".into())))
    }
}

/// Store wrapper with switchable failures
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_selects: AtomicBool,
    pub fail_quiz_questions: AtomicBool,
    /// Insert the set through `inner`, then report a uniqueness conflict
    pub lose_quiz_set_race: AtomicBool,
    pub fail_updates_for: Mutex<Vec<ScenarioId>>,
    pub fail_progress: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn backend(op: &str) -> StoreError {
        StoreError::Backend(format!("{} unavailable", op))
    }
}

impl Store for FlakyStore {
    fn insert_scenario(&self, new: NewScenario) -> StoreResult<Scenario> {
        self.inner.insert_scenario(new)
    }

    fn insert_option(&self, new: NewScenarioOption) -> StoreResult<ScenarioOption> {
        self.inner.insert_option(new)
    }

    fn select_scenarios(&self, filter: &ScenarioFilter) -> StoreResult<Vec<ScenarioWithOptions>> {
        if self.fail_selects.load(Ordering::SeqCst) {
            return Err(Self::backend("select"));
        }
        self.inner.select_scenarios(filter)
    }

    fn count_scenarios(&self, filter: &ScenarioFilter) -> StoreResult<usize> {
        self.inner.count_scenarios(filter)
    }

    fn update_scenario_text(&self, id: ScenarioId, title: &str, situation: &str) -> StoreResult<()> {
        if self.fail_updates_for.lock().unwrap().contains(&id) {
            return Err(Self::backend("update"));
        }
        self.inner.update_scenario_text(id, title, situation)
    }

    fn update_option_text(&self, id: OptionId, text: &str) -> StoreResult<()> {
        self.inner.update_option_text(id, text)
    }

    fn insert_custom_theme(&self, theme_name: &str, description: &str) -> StoreResult<CustomTheme> {
        self.inner.insert_custom_theme(theme_name, description)
    }

    fn select_custom_themes(&self) -> StoreResult<Vec<CustomTheme>> {
        self.inner.select_custom_themes()
    }

    fn insert_progress(&self, new: NewUserProgress) -> StoreResult<UserProgress> {
        if self.fail_progress.load(Ordering::SeqCst) {
            return Err(Self::backend("progress"));
        }
        self.inner.insert_progress(new)
    }

    fn select_progress(&self, scenario_id: Option<ScenarioId>) -> StoreResult<Vec<UserProgress>> {
        self.inner.select_progress(scenario_id)
    }

    fn insert_wrong_answer(&self, scenario_id: ScenarioId, user_session: &str) -> StoreResult<WrongAnswer> {
        self.inner.insert_wrong_answer(scenario_id, user_session)
    }

    fn select_wrong_answers(&self) -> StoreResult<Vec<WrongAnswerWithScenario>> {
        self.inner.select_wrong_answers()
    }

    fn get_wrong_answer(&self, id: WrongAnswerId) -> StoreResult<WrongAnswer> {
        self.inner.get_wrong_answer(id)
    }

    fn update_wrong_answer_count(&self, id: WrongAnswerId, correct_count: u32) -> StoreResult<()> {
        self.inner.update_wrong_answer_count(id, correct_count)
    }

    fn delete_wrong_answer(&self, id: WrongAnswerId) -> StoreResult<()> {
        self.inner.delete_wrong_answer(id)
    }

    fn find_quiz_set(&self, key: &QuizSetKey) -> StoreResult<Option<QuizSet>> {
        self.inner.find_quiz_set(key)
    }

    fn insert_quiz_set(&self, key: &QuizSetKey, published: bool) -> StoreResult<QuizSet> {
        if self.lose_quiz_set_race.load(Ordering::SeqCst) {
            // Another writer commits the same key between our lookup and insert
            self.inner.insert_quiz_set(key, published)?;
            return Err(StoreError::Conflict("quiz set key taken".into()));
        }
        self.inner.insert_quiz_set(key, published)
    }

    fn insert_quiz_questions(
        &self,
        quiz_set_id: QuizSetId,
        rows: &[NewQuizQuestion],
    ) -> StoreResult<Vec<QuizQuestion>> {
        if self.fail_quiz_questions.load(Ordering::SeqCst) {
            return Err(Self::backend("insert questions"));
        }
        self.inner.insert_quiz_questions(quiz_set_id, rows)
    }

    fn select_quiz_questions(&self, quiz_set_id: QuizSetId) -> StoreResult<Vec<QuizQuestion>> {
        self.inner.select_quiz_questions(quiz_set_id)
    }
}

/// Store a scenario with its options; `correct` is the index into `options`
pub fn add_scenario<S: Store>(
    store: &S,
    category: Category,
    theme: &str,
    title: &str,
    situation: &str,
    options: &[&str],
    correct: usize,
) -> ScenarioWithOptions {
    let scenario = store
        .insert_scenario(NewScenario {
            title: title.into(),
            situation: situation.into(),
            category,
            theme: theme.into(),
        })
        .unwrap();
    let options = options
        .iter()
        .enumerate()
        .map(|(i, text)| {
            store
                .insert_option(NewScenarioOption {
                    scenario_id: scenario.id,
                    text: text.to_string(),
                    option_order: i as u32,
                    is_correct: i == correct,
                })
                .unwrap()
        })
        .collect();
    ScenarioWithOptions { scenario, options }
}

/// JSON reply for one adjusted scenario
pub fn adjusted_json(title: &str, situation: &str, options: &[&str]) -> String {
    serde_json::json!({
        "title": title,
        "situation": situation,
        "options": options,
    })
    .to_string()
}
