//! Deterministic rewrite rule engine
//!
//! Every `(level, field)` pair owns an ordered list of steps. Situation text
//! passes a sentence-count post-condition after its steps run; anything else
//! the contract still objects to is logged, not padded.

use std::fs;
use std::path::Path;

use ahash::AHashMap;
use regex::{NoExpand, Regex};
use tracing::debug;

use crate::core::error::{QuestError, Result};
use crate::core::types::{Field, Level};
use crate::rewrite::contract::{
    is_adverb, is_clause_marker, is_connective, is_time_place, join_sentences, split_sentences,
    strip_meta_phrases, word_groups, ComplexityContract, Sentence,
};
use crate::storage::ScenarioWithOptions;

const BUILTIN_RULES: &str = include_str!("../../data/rewrite_rules.toml");

/// Second sentence for an advanced situation when no rule supplied one
const FALLBACK_BACKGROUND: &str = "다른 사람의 마음도 생각해야 해서 고민이 되었어요.";

/// Background sentence chosen when any keyword appears in the text
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundCue {
    pub keywords: Vec<String>,
    pub sentence: String,
}

/// One rewrite step
#[derive(Debug, Clone)]
pub enum Step {
    Replace { pattern: Regex, with: String },
    FirstSentence,
    /// Drop a leading subordinate clause, keeping its subject if the main clause has none
    MainClause,
    DropConnectives,
    /// Cut at a word boundary
    CapChars(usize),
    /// Trim word groups just before each predicate
    CapWordGroups(usize),
    Append(String),
    PrefixUnlessTimePlace(String),
    PrefixUnlessAdverb(String),
    AddBackground {
        cues: Vec<BackgroundCue>,
        default: String,
    },
}

impl Step {
    pub fn apply(&self, text: &str) -> String {
        match self {
            Step::Replace { pattern, with } => {
                pattern.replace_all(text, NoExpand(with.as_str())).into_owned()
            }
            Step::FirstSentence => match split_sentences(text).into_iter().next() {
                Some(first) => first.to_string(),
                None => text.to_string(),
            },
            Step::MainClause => map_sentences(text, main_clause),
            Step::DropConnectives => map_sentences(text, |body| {
                body.split_whitespace()
                    .filter(|w| !is_connective(w))
                    .collect::<Vec<_>>()
                    .join(" ")
            }),
            Step::CapChars(max) => cap_chars(text, *max),
            Step::CapWordGroups(max) => cap_word_groups(text, *max),
            Step::Append(suffix) => format!("{}{}", text, suffix),
            Step::PrefixUnlessTimePlace(prefix) => prefix_unless(text, prefix, is_time_place),
            Step::PrefixUnlessAdverb(prefix) => prefix_unless(text, prefix, is_adverb),
            Step::AddBackground { cues, default } => add_background(text, cues, default),
        }
    }
}

/// Apply `f` to each sentence body; a body that comes back empty is kept as it was
fn map_sentences(text: &str, f: impl Fn(&str) -> String) -> String {
    let sentences: Vec<Sentence> = split_sentences(text)
        .into_iter()
        .map(|s| {
            let body = f(&s.body);
            if body.trim().is_empty() {
                s
            } else {
                Sentence { body, ..s }
            }
        })
        .collect();
    if sentences.is_empty() {
        return text.to_string();
    }
    join_sentences(&sentences)
}

fn is_subject(word: &str) -> bool {
    let w = word.trim_matches(|c: char| !c.is_alphanumeric());
    w.chars().count() >= 2
        && ["가", "는", "은", "이"].iter().any(|p| w.ends_with(p))
        && !is_time_place(w)
        && !is_adverb(w)
        && !is_clause_marker(w)
}

fn main_clause(body: &str) -> String {
    let words: Vec<&str> = body.split_whitespace().collect();
    let last = words.len().saturating_sub(1);
    let cut = match (0..last).rev().find(|&i| is_clause_marker(words[i])) {
        Some(i) => i,
        None => return body.to_string(),
    };

    let rest = &words[cut + 1..];
    let mut kept: Vec<&str> = Vec::with_capacity(rest.len() + 1);
    if !rest.iter().any(|w| is_subject(w)) {
        if let Some(subject) = words[..cut].iter().find(|w| is_subject(w)) {
            kept.push(*subject);
        }
    }
    kept.extend_from_slice(rest);
    kept.join(" ")
}

fn cap_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    for word in text.split_whitespace() {
        let candidate = if out.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", out, word)
        };
        if candidate.chars().count() > max {
            break;
        }
        out = candidate;
    }
    if out.is_empty() {
        text.chars().take(max).collect()
    } else {
        out
    }
}

fn cap_word_groups(text: &str, max: usize) -> String {
    let mut sentences = split_sentences(text);
    let mut total: usize = sentences.iter().map(|s| word_groups(&s.body).len()).sum();
    if total <= max {
        return text.to_string();
    }

    for sentence in sentences.iter_mut() {
        let mut words = word_groups(&sentence.body);
        while total > max && words.len() > 2 {
            words.remove(words.len() - 2);
            total -= 1;
        }
        let body = words.join(" ");
        sentence.body = body;
    }
    join_sentences(&sentences)
}

fn prefix_unless(text: &str, prefix: &str, present: fn(&str) -> bool) -> String {
    let mut sentences = split_sentences(text);
    match sentences.first_mut() {
        Some(first) if !first.body.split_whitespace().any(present) => {
            first.body = format!("{} {}", prefix, first.body);
        }
        Some(_) => return text.to_string(),
        None => return text.to_string(),
    }
    join_sentences(&sentences)
}

fn add_background(text: &str, cues: &[BackgroundCue], default: &str) -> String {
    let mut sentences = split_sentences(text);
    sentences.truncate(1);
    if sentences.is_empty() {
        return text.to_string();
    }
    let background = cues
        .iter()
        .find(|c| c.keywords.iter().any(|k| text.contains(k.as_str())))
        .map_or(default, |c| c.sentence.as_str());
    sentences.extend(split_sentences(background).into_iter().take(1));
    join_sentences(&sentences)
}

/// Beginner situations keep one sentence, advanced ones exactly two
fn enforce_sentence_count(text: &str, original: &str, level: Level) -> String {
    let mut sentences = split_sentences(text);
    if sentences.is_empty() {
        sentences = split_sentences(original);
    }
    match level {
        Level::Beginner => sentences.truncate(1),
        Level::Advanced => {
            sentences.truncate(2);
            if sentences.len() < 2 {
                sentences.extend(split_sentences(FALLBACK_BACKGROUND));
            }
        }
        Level::Intermediate => {}
    }
    join_sentences(&sentences)
}

/// Leveled rule tables keyed by `(level, field)`
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: AHashMap<(Level, Field), Vec<Step>>,
}

impl RuleEngine {
    /// Rules compiled into the binary
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_RULES).map_err(QuestError::Config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| QuestError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, String> {
        let toml: toml::Value = content
            .parse()
            .map_err(|e| format!("Invalid TOML: {}", e))?;

        if toml.get(Level::Intermediate.as_str()).is_some() {
            return Err("intermediate text is canonical and takes no rules".to_string());
        }

        let mut rules = AHashMap::new();
        for level in [Level::Beginner, Level::Advanced] {
            let table = match toml.get(level.as_str()).and_then(|v| v.as_table()) {
                Some(t) => t,
                None => continue,
            };
            for field in Field::ALL {
                let Some(steps) = table.get(field.as_str()).and_then(|v| v.as_array()) else {
                    continue;
                };
                let parsed = steps
                    .iter()
                    .enumerate()
                    .map(|(i, step)| {
                        parse_step(step, &format!("{}.{}[{}]", level, field.as_str(), i))
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rules.insert((level, field), parsed);
            }
        }

        Ok(Self { rules })
    }

    pub fn steps(&self, level: Level, field: Field) -> &[Step] {
        self.rules
            .get(&(level, field))
            .map(|s| s.as_slice())
            .unwrap_or(&[])
    }

    /// Rewrite one field for `level`. Intermediate and wordless text pass through.
    ///
    /// Meta phrases are removed before the steps run and again after them,
    /// so no rule table can leave one in beginner or advanced text.
    pub fn rewrite(&self, text: &str, field: Field, level: Level) -> String {
        if level == Level::Intermediate || word_groups(text).is_empty() {
            return text.to_string();
        }

        let source = strip_meta_phrases(text);
        let mut out = source.clone();
        for step in self.steps(level, field) {
            out = step.apply(&out);
        }
        out = strip_meta_phrases(&out);

        if field == Field::Situation {
            out = enforce_sentence_count(&out, &source, level);
            let violations = ComplexityContract::for_level(level).check(&out);
            if !violations.is_empty() {
                let summary: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
                debug!(%level, text = %out, "rewrite leaves contract gaps: {}", summary.join("; "));
            }
        }
        out
    }

    /// Leveled copy of a scenario; option order and ids are untouched
    pub fn rewrite_scenario(&self, scenario: &ScenarioWithOptions, level: Level) -> ScenarioWithOptions {
        let mut out = scenario.clone();
        out.scenario.title = self.rewrite(&scenario.scenario.title, Field::Title, level);
        out.scenario.situation = self.rewrite(&scenario.scenario.situation, Field::Situation, level);
        for option in out.options.iter_mut() {
            option.text = self.rewrite(&option.text, Field::Option, level);
        }
        out
    }
}

fn parse_step(value: &toml::Value, context: &str) -> std::result::Result<Step, String> {
    let table = value
        .as_table()
        .ok_or_else(|| format!("{}: step must be a table", context))?;
    let op = table
        .get("op")
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("{}: missing 'op'", context))?;

    let text = |key: &str| {
        table
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| format!("{}: {} needs '{}'", context, op, key))
    };
    let max = || {
        table
            .get("max")
            .and_then(|v| v.as_integer())
            .filter(|n| *n > 0)
            .map(|n| n as usize)
            .ok_or_else(|| format!("{}: {} needs a positive 'max'", context, op))
    };

    match op {
        "replace" => {
            let source = text("pattern")?;
            let pattern = Regex::new(&source)
                .map_err(|e| format!("{}: bad pattern '{}': {}", context, source, e))?;
            Ok(Step::Replace {
                pattern,
                with: text("with")?,
            })
        }
        "first_sentence" => Ok(Step::FirstSentence),
        "main_clause" => Ok(Step::MainClause),
        "drop_connectives" => Ok(Step::DropConnectives),
        "cap_chars" => Ok(Step::CapChars(max()?)),
        "cap_word_groups" => Ok(Step::CapWordGroups(max()?)),
        "append" => Ok(Step::Append(text("text")?)),
        "prefix_unless_time_place" => Ok(Step::PrefixUnlessTimePlace(text("text")?)),
        "prefix_unless_adverb" => Ok(Step::PrefixUnlessAdverb(text("text")?)),
        "add_background" => {
            let cues = table
                .get("cues")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(parse_cue).collect())
                .unwrap_or_default();
            Ok(Step::AddBackground {
                cues,
                default: text("default")?,
            })
        }
        other => Err(format!("{}: unknown op '{}'", context, other)),
    }
}

fn parse_cue(value: &toml::Value) -> Option<BackgroundCue> {
    let keywords = value
        .get("keywords")?
        .as_array()?
        .iter()
        .filter_map(|k| k.as_str().map(str::to_string))
        .collect();
    let sentence = value.get("sentence")?.as_str()?.to_string();
    Some(BackgroundCue { keywords, sentence })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::contract::{count_terminals, Violation};

    fn engine() -> RuleEngine {
        RuleEngine::builtin().unwrap()
    }

    #[test]
    fn test_builtin_rules_parse() {
        let engine = engine();
        assert!(!engine.steps(Level::Beginner, Field::Situation).is_empty());
        assert!(!engine.steps(Level::Advanced, Field::Title).is_empty());
        assert!(engine.steps(Level::Intermediate, Field::Title).is_empty());
    }

    #[test]
    fn test_intermediate_is_identity() {
        let engine = engine();
        let text = "선생님께서 숙제를 보여달라고 하셨어요. 하지만 숙제를 집에 두고 왔어요.";
        for field in Field::ALL {
            assert_eq!(engine.rewrite(text, field, Level::Intermediate), text);
        }
    }

    #[test]
    fn test_beginner_situation_simplifies_register() {
        let out = engine().rewrite(
            "선생님께서 숙제를 보여달라고 하셨어요. 하지만 숙제를 집에 두고 왔어요.",
            Field::Situation,
            Level::Beginner,
        );
        assert_eq!(out, "선생님이 숙제를 보여달래요.");
    }

    #[test]
    fn test_beginner_keeps_subject_of_dropped_clause() {
        let engine = engine();
        assert_eq!(
            engine.rewrite("지우가 늦어서 급식을 빨리 먹었어요.", Field::Situation, Level::Beginner),
            "지우가 급식을 빨리 먹었어요."
        );
        assert_eq!(
            engine.rewrite("친구가 늦어서 선생님이 화가 났어요.", Field::Situation, Level::Beginner),
            "선생님이 화가 났어요."
        );
    }

    #[test]
    fn test_beginner_caps_word_groups() {
        let out = engine().rewrite(
            "지우가 오늘 아침 학교 운동장에서 친구들과 함께 축구를 재미있게 했어요.",
            Field::Situation,
            Level::Beginner,
        );
        assert_eq!(word_groups(&out).len(), 6);
        assert!(out.starts_with("지우가"));
        assert!(out.ends_with("했어요."));
    }

    #[test]
    fn test_beginner_title_and_option() {
        let engine = engine();
        assert_eq!(
            engine.rewrite("숙제를 안 해왔을 때", Field::Title, Level::Beginner),
            "숙제 안 했어요"
        );
        assert_eq!(
            engine.rewrite("선생님께 말씀드린다", Field::Option, Level::Beginner),
            "선생님께 말해요"
        );
        let capped = engine.rewrite("친구에게 사과하고 함께 정리한다", Field::Option, Level::Beginner);
        assert!(capped.chars().count() <= 15);
        assert_eq!(capped, "친구에게 사과하고 함께");
    }

    #[test]
    fn test_advanced_situation_meets_contract() {
        let out = engine().rewrite(
            "미끄럼틀에 많은 친구들이 줄을 서 있어요. 빨리 타고 싶어요.",
            Field::Situation,
            Level::Advanced,
        );
        assert_eq!(
            out,
            "마침 미끄럼틀에 많은 친구들이 줄을 서 있어요. 놀이터에는 어린 친구들도 많아서 더 조심해야 했어요."
        );
        assert!(ComplexityContract::for_level(Level::Advanced).is_satisfied_by(&out));
    }

    #[test]
    fn test_advanced_title_and_option() {
        let engine = engine();
        assert_eq!(
            engine.rewrite("숙제를 안 해왔을 때", Field::Title, Level::Advanced),
            "숙제를 안 해왔을 때 - 상황 판단하기"
        );
        assert_eq!(
            engine.rewrite("친구에게 사과한다", Field::Option, Level::Advanced),
            "친구에게 진심으로 사과하고 앞으로 조심하겠다고 약속한다"
        );
    }

    #[test]
    fn test_meta_phrases_never_survive_leveling() {
        let engine = engine();
        let text = "이러한 복잡한 상황에서 친구가 울고 있어요.";
        for level in [Level::Beginner, Level::Advanced] {
            let out = engine.rewrite(text, Field::Situation, level);
            assert!(!out.contains("이러한 복잡한 상황에서"), "{}", out);
            assert!(out.contains("친구가"));
            let violations = ComplexityContract::for_level(level).check(&out);
            assert!(!violations.iter().any(|v| matches!(v, Violation::MetaCommentary(_))));
        }
        let title = engine.rewrite("가장 적절한 대응 방법 고르기", Field::Title, Level::Advanced);
        assert!(!title.contains("가장 적절한 대응 방법"), "{}", title);
        assert_eq!(engine.rewrite(text, Field::Situation, Level::Intermediate), text);
    }

    #[test]
    fn test_sentence_count_post_condition_without_rules() {
        let engine = RuleEngine::default();
        let beginner = engine.rewrite("하나예요. 둘이에요. 셋이에요.", Field::Situation, Level::Beginner);
        assert_eq!(count_terminals(&beginner), 1);
        let advanced = engine.rewrite("하나예요", Field::Situation, Level::Advanced);
        assert_eq!(count_terminals(&advanced), 2);
    }

    #[test]
    fn test_rule_table_errors() {
        assert!(RuleEngine::from_toml_str("[[intermediate.title]]\nop = \"first_sentence\"").is_err());
        assert!(RuleEngine::from_toml_str("[[beginner.title]]\nop = \"shout\"").is_err());
        assert!(RuleEngine::from_toml_str("[[beginner.title]]\nop = \"cap_chars\"\nmax = 0").is_err());
        assert!(
            RuleEngine::from_toml_str("[[beginner.title]]\nop = \"replace\"\npattern = \"(\"\nwith = \"\"").is_err()
        );
    }

    #[test]
    fn test_rewrite_scenario_keeps_option_order() {
        use crate::core::types::{Category, OptionId, ScenarioId};
        use crate::storage::{Scenario, ScenarioOption};
        use chrono::Utc;

        let id = ScenarioId::new();
        let now = Utc::now();
        let scenario = ScenarioWithOptions {
            scenario: Scenario {
                id,
                title: "숙제를 안 해왔을 때".into(),
                situation: "선생님께서 숙제를 보여달라고 하셨어요.".into(),
                category: Category::Main,
                theme: "school".into(),
                difficulty_level: None,
                created_at: now,
                updated_at: now,
            },
            options: (0..3)
                .map(|i| ScenarioOption {
                    id: OptionId::new(),
                    scenario_id: id,
                    text: "선생님께 말씀드린다".into(),
                    option_order: i,
                    is_correct: i == 1,
                })
                .collect(),
        };

        let out = engine().rewrite_scenario(&scenario, Level::Beginner);
        assert_eq!(out.scenario.id, id);
        assert_eq!(out.scenario.title, "숙제 안 했어요");
        let orders: Vec<u32> = out.options.iter().map(|o| o.option_order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert!(out.options[1].is_correct);
        assert!(out.options.iter().all(|o| o.text == "선생님께 말해요"));
    }
}
