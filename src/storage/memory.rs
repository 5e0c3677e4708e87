//! In-process store, optionally mirrored to a JSON snapshot file
//!
//! With a snapshot path every successful write rewrites the file, so a
//! restarted process sees the same rows. A write whose snapshot fails is
//! not applied in memory either.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::core::types::{
    OptionId, ProgressId, QuizQuestionId, QuizSetId, ScenarioId, ThemeId, WrongAnswerId,
};
use crate::storage::models::*;
use crate::storage::{ScenarioFilter, Store, StoreError, StoreResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    scenarios: Vec<Scenario>,
    scenario_options: Vec<ScenarioOption>,
    custom_themes: Vec<CustomTheme>,
    user_progress: Vec<UserProgress>,
    wrong_answers: Vec<WrongAnswer>,
    quiz_sets: Vec<QuizSet>,
    quiz_questions: Vec<QuizQuestion>,
}

impl Tables {
    fn with_options(&self, scenario: &Scenario) -> ScenarioWithOptions {
        ScenarioWithOptions {
            scenario: scenario.clone(),
            options: self
                .scenario_options
                .iter()
                .filter(|o| o.scenario_id == scenario.id)
                .cloned()
                .collect(),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    snapshot: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by `path`, loading the snapshot if it exists
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let tables = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| StoreError::Backend(format!("read {}: {}", path.display(), e)))?;
            serde_json::from_str(&content)
                .map_err(|e| StoreError::Backend(format!("parse {}: {}", path.display(), e)))?
        } else {
            Tables::default()
        };
        tracing::info!("store opened at {}", path.display());
        Ok(Self {
            tables: Arc::new(Mutex::new(tables)),
            snapshot: Some(path),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }

    /// Run `op` against a staged copy; it replaces the live tables only once
    /// the snapshot holding it is on disk.
    fn write<T>(&self, op: impl FnOnce(&mut Tables) -> StoreResult<T>) -> StoreResult<T> {
        let mut tables = self.lock()?;
        if self.snapshot.is_none() {
            return op(&mut *tables);
        }
        let mut staged = Tables::clone(&tables);
        let out = op(&mut staged)?;
        self.flush(&staged)?;
        *tables = staged;
        Ok(out)
    }

    fn flush(&self, tables: &Tables) -> StoreResult<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(tables)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Backend(e.to_string()))?;
            }
        }
        std::fs::write(path, content)
            .map_err(|e| StoreError::Backend(format!("write {}: {}", path.display(), e)))
    }
}

impl Store for MemoryStore {
    fn insert_scenario(&self, new: NewScenario) -> StoreResult<Scenario> {
        self.write(|tables| {
            let now = Utc::now();
            let scenario = Scenario {
                id: ScenarioId::new(),
                title: new.title,
                situation: new.situation,
                category: new.category,
                theme: new.theme,
                difficulty_level: None,
                created_at: now,
                updated_at: now,
            };
            tables.scenarios.push(scenario.clone());
            Ok(scenario)
        })
    }

    fn insert_option(&self, new: NewScenarioOption) -> StoreResult<ScenarioOption> {
        self.write(|tables| {
            if !tables.scenarios.iter().any(|s| s.id == new.scenario_id) {
                return Err(StoreError::NotFound(format!("scenario {}", new.scenario_id)));
            }
            if tables
                .scenario_options
                .iter()
                .any(|o| o.scenario_id == new.scenario_id && o.option_order == new.option_order)
            {
                return Err(StoreError::Conflict(format!(
                    "option_order {} already used by scenario {}",
                    new.option_order, new.scenario_id
                )));
            }
            let option = ScenarioOption {
                id: OptionId::new(),
                scenario_id: new.scenario_id,
                text: new.text,
                option_order: new.option_order,
                is_correct: new.is_correct,
            };
            tables.scenario_options.push(option.clone());
            Ok(option)
        })
    }

    fn select_scenarios(&self, filter: &ScenarioFilter) -> StoreResult<Vec<ScenarioWithOptions>> {
        let tables = self.lock()?;
        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(tables
            .scenarios
            .iter()
            .filter(|s| filter.matches(s))
            .take(limit)
            .map(|s| tables.with_options(s))
            .collect())
    }

    fn count_scenarios(&self, filter: &ScenarioFilter) -> StoreResult<usize> {
        let tables = self.lock()?;
        Ok(tables.scenarios.iter().filter(|s| filter.matches(s)).count())
    }

    fn update_scenario_text(&self, id: ScenarioId, title: &str, situation: &str) -> StoreResult<()> {
        self.write(|tables| {
            let scenario = tables
                .scenarios
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("scenario {}", id)))?;
            scenario.title = title.to_string();
            scenario.situation = situation.to_string();
            scenario.updated_at = Utc::now();
            Ok(())
        })
    }

    fn update_option_text(&self, id: OptionId, text: &str) -> StoreResult<()> {
        self.write(|tables| {
            let option = tables
                .scenario_options
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("option {}", id)))?;
            option.text = text.to_string();
            Ok(())
        })
    }

    fn insert_custom_theme(&self, theme_name: &str, description: &str) -> StoreResult<CustomTheme> {
        self.write(|tables| {
            let now = Utc::now();
            let theme = CustomTheme {
                id: ThemeId::new(),
                theme_name: theme_name.to_string(),
                description: description.to_string(),
                created_at: now,
                updated_at: now,
            };
            tables.custom_themes.push(theme.clone());
            Ok(theme)
        })
    }

    fn select_custom_themes(&self) -> StoreResult<Vec<CustomTheme>> {
        let tables = self.lock()?;
        let mut themes: Vec<CustomTheme> = tables.custom_themes.iter().rev().cloned().collect();
        themes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(themes)
    }

    fn insert_progress(&self, new: NewUserProgress) -> StoreResult<UserProgress> {
        self.write(|tables| {
            let row = UserProgress {
                id: ProgressId::new(),
                scenario_id: new.scenario_id,
                user_session: new.user_session,
                is_correct: new.is_correct,
                attempts: new.attempts,
                completed_at: new.completed_at,
            };
            tables.user_progress.push(row.clone());
            Ok(row)
        })
    }

    fn select_progress(&self, scenario_id: Option<ScenarioId>) -> StoreResult<Vec<UserProgress>> {
        let tables = self.lock()?;
        Ok(tables
            .user_progress
            .iter()
            .filter(|p| scenario_id.map_or(true, |id| p.scenario_id == id))
            .cloned()
            .collect())
    }

    fn insert_wrong_answer(&self, scenario_id: ScenarioId, user_session: &str) -> StoreResult<WrongAnswer> {
        self.write(|tables| {
            let now = Utc::now();
            let row = WrongAnswer {
                id: WrongAnswerId::new(),
                scenario_id,
                user_session: user_session.to_string(),
                correct_count: 0,
                created_at: now,
                updated_at: now,
            };
            tables.wrong_answers.push(row.clone());
            Ok(row)
        })
    }

    fn select_wrong_answers(&self) -> StoreResult<Vec<WrongAnswerWithScenario>> {
        let tables = self.lock()?;
        let mut rows: Vec<WrongAnswerWithScenario> = tables
            .wrong_answers
            .iter()
            .rev()
            .filter_map(|entry| {
                let scenario = tables.scenarios.iter().find(|s| s.id == entry.scenario_id)?;
                Some(WrongAnswerWithScenario {
                    entry: entry.clone(),
                    scenario: tables.with_options(scenario),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.entry.created_at.cmp(&a.entry.created_at));
        Ok(rows)
    }

    fn get_wrong_answer(&self, id: WrongAnswerId) -> StoreResult<WrongAnswer> {
        let tables = self.lock()?;
        tables
            .wrong_answers
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("wrong answer {}", id)))
    }

    fn update_wrong_answer_count(&self, id: WrongAnswerId, correct_count: u32) -> StoreResult<()> {
        self.write(|tables| {
            let row = tables
                .wrong_answers
                .iter_mut()
                .find(|w| w.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("wrong answer {}", id)))?;
            row.correct_count = correct_count;
            row.updated_at = Utc::now();
            Ok(())
        })
    }

    fn delete_wrong_answer(&self, id: WrongAnswerId) -> StoreResult<()> {
        self.write(|tables| {
            let before = tables.wrong_answers.len();
            tables.wrong_answers.retain(|w| w.id != id);
            if tables.wrong_answers.len() == before {
                return Err(StoreError::NotFound(format!("wrong answer {}", id)));
            }
            Ok(())
        })
    }

    fn find_quiz_set(&self, key: &QuizSetKey) -> StoreResult<Option<QuizSet>> {
        let tables = self.lock()?;
        Ok(tables.quiz_sets.iter().find(|s| &s.key == key).cloned())
    }

    fn insert_quiz_set(&self, key: &QuizSetKey, published: bool) -> StoreResult<QuizSet> {
        self.write(|tables| {
            if tables.quiz_sets.iter().any(|s| &s.key == key) {
                return Err(StoreError::Conflict(format!(
                    "quiz set ({}, {}, {}, {}, {}) already exists",
                    key.theme, key.difficulty, key.count, key.seed, key.version
                )));
            }
            let set = QuizSet {
                id: QuizSetId::new(),
                key: key.clone(),
                published,
                created_at: Utc::now(),
            };
            tables.quiz_sets.push(set.clone());
            Ok(set)
        })
    }

    fn insert_quiz_questions(
        &self,
        quiz_set_id: QuizSetId,
        rows: &[NewQuizQuestion],
    ) -> StoreResult<Vec<QuizQuestion>> {
        self.write(|tables| {
            if !tables.quiz_sets.iter().any(|s| s.id == quiz_set_id) {
                return Err(StoreError::NotFound(format!("quiz set {}", quiz_set_id)));
            }
            let inserted: Vec<QuizQuestion> = rows
                .iter()
                .map(|row| QuizQuestion {
                    id: QuizQuestionId::new(),
                    quiz_set_id,
                    idx: row.idx,
                    title: row.title.clone(),
                    situation: row.situation.clone(),
                    options: row.options.clone(),
                    correct_option: row.correct_option,
                    rule_note: row.rule_note.clone(),
                })
                .collect();
            tables.quiz_questions.extend(inserted.iter().cloned());
            Ok(inserted)
        })
    }

    fn select_quiz_questions(&self, quiz_set_id: QuizSetId) -> StoreResult<Vec<QuizQuestion>> {
        let tables = self.lock()?;
        let mut rows: Vec<QuizQuestion> = tables
            .quiz_questions
            .iter()
            .filter(|q| q.quiz_set_id == quiz_set_id)
            .cloned()
            .collect();
        rows.sort_by_key(|q| q.idx);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Category, Difficulty};

    fn seed_scenario(store: &MemoryStore, theme: &str, category: Category) -> Scenario {
        let scenario = store
            .insert_scenario(NewScenario {
                title: "줄 서기".into(),
                situation: "친구들이 줄을 서 있어요.".into(),
                category,
                theme: theme.into(),
            })
            .unwrap();
        for i in 0..3 {
            store
                .insert_option(NewScenarioOption {
                    scenario_id: scenario.id,
                    text: format!("선택 {}", i),
                    option_order: i,
                    is_correct: i == 1,
                })
                .unwrap();
        }
        scenario
    }

    #[test]
    fn test_select_filters_by_category_and_theme() {
        let store = MemoryStore::new();
        seed_scenario(&store, "school", Category::Main);
        seed_scenario(&store, "school", Category::Custom);
        seed_scenario(&store, "home", Category::Main);

        let rows = store
            .select_scenarios(&ScenarioFilter::themed(Category::Main, "school"))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].options.len(), 3);
        assert_eq!(
            store
                .count_scenarios(&ScenarioFilter::themed(Category::Main, "home"))
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_limit_caps_rows() {
        let store = MemoryStore::new();
        for _ in 0..5 {
            seed_scenario(&store, "school", Category::Main);
        }
        let filter = ScenarioFilter::themed(Category::Main, "school").with_limit(Some(2));
        assert_eq!(store.select_scenarios(&filter).unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_option_order_conflicts() {
        let store = MemoryStore::new();
        let scenario = seed_scenario(&store, "school", Category::Main);
        let err = store
            .insert_option(NewScenarioOption {
                scenario_id: scenario.id,
                text: "again".into(),
                option_order: 0,
                is_correct: false,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn test_wrong_answers_join_and_delete() {
        let store = MemoryStore::new();
        let scenario = seed_scenario(&store, "school", Category::Main);
        let first = store.insert_wrong_answer(scenario.id, "session_a").unwrap();
        let second = store.insert_wrong_answer(scenario.id, "session_a").unwrap();

        let listed = store.select_wrong_answers().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].entry.id, second.id);
        assert_eq!(listed[1].scenario.options.len(), 3);

        store.delete_wrong_answer(first.id).unwrap();
        assert!(matches!(
            store.get_wrong_answer(first.id),
            Err(StoreError::NotFound(_))
        ));
        assert!(store.delete_wrong_answer(first.id).is_err());
    }

    #[test]
    fn test_quiz_set_key_is_unique() {
        let store = MemoryStore::new();
        let key = QuizSetKey {
            theme: "school".into(),
            difficulty: Difficulty::Mixed,
            count: 2,
            seed: "seed-A".into(),
            version: 1,
        };
        store.insert_quiz_set(&key, true).unwrap();
        assert!(matches!(
            store.insert_quiz_set(&key, true),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn test_snapshot_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = MemoryStore::open(&path).unwrap();
        let scenario = seed_scenario(&store, "library", Category::Main);
        store
            .update_scenario_text(scenario.id, "새 제목", "새 상황이에요.")
            .unwrap();

        let reopened = MemoryStore::open(&path).unwrap();
        let rows = reopened
            .select_scenarios(&ScenarioFilter::themed(Category::Main, "library"))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].scenario.title, "새 제목");
        assert_eq!(rows[0].options.len(), 3);
    }

    #[test]
    fn test_failed_snapshot_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "plain file").unwrap();
        let store = MemoryStore::open(blocker.join("store.json")).unwrap();

        let result = store.insert_scenario(NewScenario {
            title: "줄 서기".into(),
            situation: "친구들이 줄을 서 있어요.".into(),
            category: Category::Custom,
            theme: "queue".into(),
        });
        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert_eq!(store.count_scenarios(&ScenarioFilter::default()).unwrap(), 0);
        assert!(store.insert_custom_theme("줄 서기", "새치기").is_err());
        assert!(store.select_custom_themes().unwrap().is_empty());
    }
}
