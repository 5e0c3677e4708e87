//! Literacy pretest and level classification
//!
//! Three graded questions (one per tier) seed the player's reading level.
//! Questions come from the session cache, then the generation service, and
//! fall back to a fixed set so every tier always has one data point.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::core::config::QuestConfig;
use crate::core::error::{QuestError, Result};
use crate::core::types::{Level, Tier};
use crate::llm::authoring::generate_literacy_quiz;
use crate::llm::client::TextGenerator;
use crate::settings::{SessionCache, SettingsStore};

/// One graded multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PretestQuestion {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub level: Tier,
}

fn question(id: u32, text: &str, options: [&str; 4], correct_answer: usize, level: Tier) -> PretestQuestion {
    PretestQuestion {
        id,
        question: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_answer,
        level,
    }
}

/// Fixed questions used when the service is unavailable
pub fn fallback_questions() -> Vec<PretestQuestion> {
    vec![
        question(
            1,
            "친구가 울고 있어요. 어떻게 해야 할까요?",
            ["그냥 지나간다", "달려가서 도와준다", "다른 친구와 논다", "모르는 척한다"],
            1,
            Tier::Easy,
        ),
        question(
            2,
            "민수가 교실에서 책을 읽고 있는데 친구들이 시끄럽게 떠들고 있습니다. 민수는 어떻게 해야 할까요?",
            ["같이 떠든다", "조용히 해달라고 말한다", "화를 낸다", "그냥 참는다"],
            1,
            Tier::Medium,
        ),
        question(
            3,
            "수업 시간에 짝꿍이 지우개를 빌려달라고 했는데, 내가 가져온 지우개는 새 것이고 하나밖에 없습니다. 하지만 짝꿍은 평소에 물건을 잘 잃어버리는 편이에요. 어떻게 하는 것이 가장 좋을까요?",
            ["절대 빌려주지 않는다", "조건을 정하고 빌려준다", "선생님께 말씀드린다", "다른 친구에게 부탁한다"],
            1,
            Tier::Hard,
        ),
    ]
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Answer index as sent by the service; negative, fractional or
/// non-numeric values have no valid index
fn answer_index(value: &Value) -> Option<usize> {
    match value {
        Value::Null => Some(0),
        Value::Number(n) => n.as_u64().and_then(|i| usize::try_from(i).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce loosely-typed service questions into `PretestQuestion`s.
///
/// Missing or out-of-range ids become the 1-based position, options are cut
/// to four and stringified, a missing answer index is 0 and an unknown tier
/// is medium. Questions that cannot be answered (fewer than two options, or
/// no valid answer index among them) are dropped.
pub fn normalize_questions(raw: &[Value]) -> Vec<PretestQuestion> {
    raw.iter()
        .enumerate()
        .filter(|(_, q)| q.is_object())
        .filter_map(|(i, q)| {
            let options: Vec<String> = q["options"]
                .as_array()
                .map(|opts| opts.iter().take(4).map(stringify).collect())
                .unwrap_or_default();
            let correct_answer = answer_index(&q["correctAnswer"]).filter(|a| *a < options.len());
            let Some(correct_answer) = correct_answer.filter(|_| options.len() >= 2) else {
                warn!(position = i + 1, "dropping unanswerable pretest question");
                return None;
            };
            let level = match q["level"].as_str() {
                Some("easy") => Tier::Easy,
                Some("hard") => Tier::Hard,
                _ => Tier::Medium,
            };
            let id = q["id"]
                .as_u64()
                .and_then(|id| u32::try_from(id).ok())
                .unwrap_or(i as u32 + 1);
            Some(PretestQuestion {
                id,
                question: stringify(&q["question"]),
                options,
                correct_answer,
                level,
            })
        })
        .collect()
}

/// Correct answers per tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierScore {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl TierScore {
    /// Score answers (selected option indices) against `questions` position by position
    pub fn from_answers(answers: &[usize], questions: &[PretestQuestion]) -> Self {
        let mut score = Self::default();
        for (answer, q) in answers.iter().zip(questions) {
            if *answer == q.correct_answer {
                match q.level {
                    Tier::Easy => score.easy += 1,
                    Tier::Medium => score.medium += 1,
                    Tier::Hard => score.hard += 1,
                }
            }
        }
        score
    }

    pub fn total(&self) -> usize {
        self.easy + self.medium + self.hard
    }
}

/// Which classifier turns a score into a level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scheme {
    /// Weighs correct answers by tier
    #[default]
    Tiered,
    /// Counts correct answers only
    Simple,
}

pub fn classify_tiered(score: &TierScore) -> Level {
    if score.hard == 0 && score.medium <= 1 {
        Level::Beginner
    } else if score.hard >= 1 && score.medium >= 1 {
        Level::Advanced
    } else {
        Level::Intermediate
    }
}

pub fn classify_simple(score: &TierScore) -> Level {
    match score.total() {
        0 | 1 => Level::Beginner,
        2 => Level::Intermediate,
        _ => Level::Advanced,
    }
}

pub fn classify(answers: &[usize], questions: &[PretestQuestion], scheme: Scheme) -> Level {
    let score = TierScore::from_answers(answers, questions);
    match scheme {
        Scheme::Tiered => classify_tiered(&score),
        Scheme::Simple => classify_simple(&score),
    }
}

/// Where a question set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionSource {
    Cache,
    Service,
    Fallback,
}

fn covers_every_tier(questions: &[PretestQuestion]) -> bool {
    [Tier::Easy, Tier::Medium, Tier::Hard]
        .iter()
        .all(|t| questions.iter().any(|q| q.level == *t))
}

/// Pretest questions for this session.
///
/// A cached set wins. Otherwise the service is asked and the first
/// `pretest_question_count` questions are cached. Any service failure, or a
/// set missing a tier, falls back to the fixed questions (which are not cached).
pub async fn load_questions<G: TextGenerator>(
    generator: Option<&G>,
    cache: &mut SessionCache,
    config: &QuestConfig,
) -> (Vec<PretestQuestion>, QuestionSource) {
    let tag = config.literacy_cache_tag.as_str();
    if let Some(cached) = cache.get::<Vec<PretestQuestion>>(tag) {
        return (cached, QuestionSource::Cache);
    }

    let Some(generator) = generator else {
        return (fallback_questions(), QuestionSource::Fallback);
    };

    match generate_literacy_quiz(generator, config.pretest_question_count, config).await {
        Ok(mut questions) => {
            questions.truncate(config.pretest_question_count);
            if !covers_every_tier(&questions) {
                warn!(count = questions.len(), "generated pretest misses a tier, using fallback");
                return (fallback_questions(), QuestionSource::Fallback);
            }
            if let Err(e) = cache.put(tag, &questions) {
                warn!("could not cache pretest questions: {}", e);
            }
            (questions, QuestionSource::Service)
        }
        Err(e) => {
            warn!("pretest generation failed, using fallback: {}", e);
            (fallback_questions(), QuestionSource::Fallback)
        }
    }
}

/// One run through the pretest
#[derive(Debug, Clone)]
pub struct Pretest {
    questions: Vec<PretestQuestion>,
    answers: Vec<usize>,
}

impl Pretest {
    pub fn new(questions: Vec<PretestQuestion>) -> Self {
        Self {
            questions,
            answers: Vec::new(),
        }
    }

    pub fn questions(&self) -> &[PretestQuestion] {
        &self.questions
    }

    pub fn answers(&self) -> &[usize] {
        &self.answers
    }

    /// Question awaiting an answer, `None` once all are answered
    pub fn current(&self) -> Option<&PretestQuestion> {
        self.questions.get(self.answers.len())
    }

    /// 0-based index of the current question
    pub fn position(&self) -> usize {
        self.answers.len()
    }

    pub fn is_complete(&self) -> bool {
        self.answers.len() >= self.questions.len()
    }

    /// Record an answer for the current question
    pub fn answer(&mut self, choice: usize) -> Result<()> {
        let current = self
            .current()
            .ok_or_else(|| QuestError::InvalidInput("pretest already complete".into()))?;
        if choice >= current.options.len() {
            return Err(QuestError::InvalidInput(format!(
                "choice {} out of range (0..{})",
                choice,
                current.options.len()
            )));
        }
        self.answers.push(choice);
        Ok(())
    }

    /// Classify and persist the level; both the level and the completed flag are written
    pub fn finish(&self, settings: &mut SettingsStore) -> Result<Level> {
        if !self.is_complete() {
            return Err(QuestError::InvalidInput(format!(
                "{} of {} questions answered",
                self.answers.len(),
                self.questions.len()
            )));
        }
        let level = classify(&self.answers, &self.questions, Scheme::Tiered);
        info!(?level, answers = ?self.answers, "pretest finished");
        settings.record_level(level)?;
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fallback_has_one_question_per_tier() {
        let questions = fallback_questions();
        assert_eq!(questions.len(), 3);
        assert!(covers_every_tier(&questions));
        assert!(questions.iter().all(|q| q.correct_answer == 1));
    }

    #[test]
    fn test_tiered_classification() {
        let questions = fallback_questions();
        assert_eq!(classify(&[1, 1, 0], &questions, Scheme::Tiered), Level::Beginner);
        assert_eq!(classify(&[1, 1, 1], &questions, Scheme::Tiered), Level::Advanced);
        assert_eq!(classify(&[0, 0, 1], &questions, Scheme::Tiered), Level::Intermediate);
        assert_eq!(classify(&[0, 0, 0], &questions, Scheme::Tiered), Level::Beginner);
    }

    #[test]
    fn test_simple_classification() {
        let questions = fallback_questions();
        assert_eq!(classify(&[1, 1, 1], &questions, Scheme::Simple), Level::Advanced);
        assert_eq!(classify(&[1, 1, 0], &questions, Scheme::Simple), Level::Intermediate);
        assert_eq!(classify(&[1, 0, 0], &questions, Scheme::Simple), Level::Beginner);
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let raw = vec![
            json!({"question": "친구와 놀았어요", "options": ["a", 2, true, "d", "e"], "level": "easy"}),
            json!({"id": 9, "question": "문장", "options": ["가", "나", "다"], "correctAnswer": "2", "level": "tricky"}),
            json!({"id": 5_000_000_000u64, "question": "큰 번호", "options": ["가", "나"], "correctAnswer": 1}),
            json!("not a question"),
        ];
        let questions = normalize_questions(&raw);
        assert_eq!(questions.len(), 3);

        assert_eq!(questions[0].id, 1);
        assert_eq!(questions[0].options, vec!["a", "2", "true", "d"]);
        assert_eq!(questions[0].correct_answer, 0);
        assert_eq!(questions[0].level, Tier::Easy);

        assert_eq!(questions[1].id, 9);
        assert_eq!(questions[1].correct_answer, 2);
        assert_eq!(questions[1].level, Tier::Medium);

        assert_eq!(questions[2].id, 3);
    }

    #[test]
    fn test_normalize_drops_unanswerable_questions() {
        let raw = vec![
            json!({"question": "보기 없음", "options": [], "level": "easy"}),
            json!({"question": "보기 하나", "options": ["가"], "level": "easy"}),
            json!({"question": "범위 밖", "options": ["가", "나"], "correctAnswer": 7}),
            json!({"question": "음수", "options": ["가", "나"], "correctAnswer": -1}),
            json!({"question": "소수", "options": ["가", "나"], "correctAnswer": 1.5}),
            json!({"question": "글자", "options": ["가", "나"], "correctAnswer": "첫째"}),
            json!({"question": "정상", "options": ["가", "나"], "correctAnswer": 1, "level": "hard"}),
        ];
        let questions = normalize_questions(&raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "정상");
        assert_eq!(questions[0].id, 7);
        assert_eq!(questions[0].correct_answer, 1);
    }

    #[test]
    fn test_pretest_flow_records_level() {
        let mut settings = SettingsStore::in_memory();
        let mut pretest = Pretest::new(fallback_questions());

        assert!(pretest.finish(&mut settings).is_err());
        assert!(pretest.answer(7).is_err());

        for _ in 0..3 {
            pretest.answer(1).unwrap();
        }
        assert!(pretest.is_complete());
        assert!(pretest.current().is_none());
        assert!(pretest.answer(1).is_err());

        assert_eq!(pretest.finish(&mut settings).unwrap(), Level::Advanced);
        assert_eq!(settings.literacy_level(), Some(Level::Advanced));
        assert!(settings.test_completed());
    }

    #[test]
    fn test_question_serializes_camel_case() {
        let json = serde_json::to_value(&fallback_questions()[0]).unwrap();
        assert_eq!(json["correctAnswer"], 1);
        assert_eq!(json["level"], "easy");
    }
}
