//! Sentence complexity contract per reading level
//!
//! | level        | sentences | word groups | extra                                   |
//! |--------------|-----------|-------------|-----------------------------------------|
//! | beginner     | 1         | 4-6         | no connectives, no subordinate clauses  |
//! | intermediate | 1         | 7-11        | <=1 time/place modifier, <=1 connective |
//! | advanced     | 2         | 12-18       | time/place + adverb + reason clause     |
//!
//! No level may contain meta-commentary about the question itself.
//! A word group is a whitespace-delimited phrase.

use std::fmt;
use std::ops::RangeInclusive;

use crate::core::types::Level;

/// Characters that end a sentence
pub const TERMINALS: [char; 5] = ['.', '?', '!', '。', '…'];

/// Stock phrases that never scale with the contract and must not appear
pub const META_PHRASES: &[&str] = &[
    "이러한 복잡한 상황에서",
    "이런 상황에서 여러분은",
    "가장 적절한 대응 방법",
    "어떤 선택을 하시겠습니까",
    "신중히 고려해보세요",
    "in this complex situation",
];

/// Sentence-joining words
pub const CONNECTIVES: &[&str] = &[
    "그리고", "그래서", "하지만", "그런데", "그러나", "그러면", "그러니까", "왜냐하면", "또한",
];

/// Word-group endings that open a subordinate or reason clause
pub const CLAUSE_MARKERS: &[&str] = &[
    "때문에", "는데", "은데", "니까", "면서", "지만", "라서", "아서", "어서", "해서", "려고", "므로",
];

const REASON_MARKERS: &[&str] = &[
    "때문에", "라서", "아서", "어서", "해서", "니까", "므로", "려고", "위해", "위해서",
];

const TIME_WORDS: &[&str] = &[
    "오늘", "어제", "내일", "아침", "저녁", "밤", "그날", "그때", "방금", "주말", "오후", "오전",
];

const ADVERBS: &[&str] = &[
    "서둘러", "마침", "빨리", "갑자기", "몰래", "살짝", "함께", "같이", "꼭", "정말", "아주", "너무",
    "먼저", "계속", "다시", "또",
];

/// One sentence and the mark that ended it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub body: String,
    pub terminal: char,
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.body, self.terminal)
    }
}

/// Split text into sentences; runs of terminals collapse into one and a
/// trailing fragment without a terminal gets a period.
pub fn split_sentences(text: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if TERMINALS.contains(&c) {
            let body = normalize_spaces(&current);
            if !body.is_empty() {
                let terminal = if c == '?' || c == '!' { c } else { '.' };
                sentences.push(Sentence { body, terminal });
            }
            current.clear();
        } else {
            current.push(c);
        }
    }

    let rest = normalize_spaces(&current);
    if !rest.is_empty() {
        sentences.push(Sentence {
            body: rest,
            terminal: '.',
        });
    }
    sentences
}

pub fn join_sentences(sentences: &[Sentence]) -> String {
    sentences
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn normalize_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove every meta phrase, collapsing the whitespace it leaves behind
pub fn strip_meta_phrases(text: &str) -> String {
    if !META_PHRASES.iter().any(|p| text.contains(p)) {
        return text.to_string();
    }
    let mut out = text.to_string();
    for phrase in META_PHRASES {
        out = out.replace(phrase, " ");
    }
    normalize_spaces(&out)
}

/// Whitespace-delimited phrases, ignoring bare punctuation
pub fn word_groups(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
        .collect()
}

pub fn count_terminals(text: &str) -> usize {
    text.chars().filter(|c| TERMINALS.contains(c)).count()
}

fn strip_punctuation(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

pub fn is_connective(word: &str) -> bool {
    CONNECTIVES.contains(&strip_punctuation(word))
}

/// Word group that opens a subordinate clause (never the sentence predicate)
pub fn is_clause_marker(word: &str) -> bool {
    let w = strip_punctuation(word);
    w == "때문에" || CLAUSE_MARKERS.iter().any(|m| w.ends_with(m) && w != *m)
}

pub fn is_time_place(word: &str) -> bool {
    let w = strip_punctuation(word);
    TIME_WORDS.contains(&w) || (w.chars().count() > 1 && (w.ends_with("에서") || w.ends_with('에')))
}

pub fn is_adverb(word: &str) -> bool {
    let w = strip_punctuation(word);
    ADVERBS.contains(&w) || (w.chars().count() > 1 && (w.ends_with('게') || w.ends_with('히')))
}

pub fn is_reason(word: &str) -> bool {
    let w = strip_punctuation(word);
    REASON_MARKERS.iter().any(|m| w.ends_with(m))
}

/// Measured features of a piece of text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextProfile {
    pub sentences: usize,
    pub word_groups: usize,
    pub connectives: usize,
    pub subordinate_clauses: usize,
    pub time_place_modifiers: usize,
    pub adverbs: usize,
    pub reason_clauses: usize,
    pub meta_phrases: Vec<&'static str>,
}

impl TextProfile {
    pub fn measure(text: &str) -> Self {
        let sentences = split_sentences(text);
        let mut profile = TextProfile {
            sentences: sentences.len(),
            meta_phrases: META_PHRASES
                .iter()
                .copied()
                .filter(|p| text.contains(p))
                .collect(),
            ..Default::default()
        };

        for sentence in &sentences {
            let groups = word_groups(&sentence.body);
            profile.word_groups += groups.len();
            let last = groups.len().saturating_sub(1);
            for (i, word) in groups.iter().enumerate() {
                if is_connective(word) {
                    profile.connectives += 1;
                }
                if i < last && is_clause_marker(word) {
                    profile.subordinate_clauses += 1;
                }
                if is_time_place(word) {
                    profile.time_place_modifiers += 1;
                }
                if is_adverb(word) {
                    profile.adverbs += 1;
                }
                if i < last && is_reason(word) {
                    profile.reason_clauses += 1;
                }
            }
        }
        profile
    }
}

/// A broken clause of the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    SentenceCount { expected: RangeInclusive<usize>, actual: usize },
    WordGroups { expected: RangeInclusive<usize>, actual: usize },
    TooManyConnectives { max: usize, actual: usize },
    TooManyModifiers { max: usize, actual: usize },
    MissingTimePlace,
    MissingAdverb,
    MissingReason,
    MetaCommentary(&'static str),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::SentenceCount { expected, actual } => {
                write!(f, "{} sentences, expected {:?}", actual, expected)
            }
            Violation::WordGroups { expected, actual } => {
                write!(f, "{} word groups, expected {:?}", actual, expected)
            }
            Violation::TooManyConnectives { max, actual } => {
                write!(f, "{} connectives, at most {}", actual, max)
            }
            Violation::TooManyModifiers { max, actual } => {
                write!(f, "{} time/place modifiers, at most {}", actual, max)
            }
            Violation::MissingTimePlace => f.write_str("no time or place modifier"),
            Violation::MissingAdverb => f.write_str("no adverb"),
            Violation::MissingReason => f.write_str("no reason or background clause"),
            Violation::MetaCommentary(p) => write!(f, "meta-commentary '{}'", p),
        }
    }
}

/// Contract for situation text at one level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexityContract {
    pub sentences: RangeInclusive<usize>,
    pub word_groups: RangeInclusive<usize>,
    /// Connective words plus subordinate clauses
    pub max_connectives: usize,
    pub max_time_place: Option<usize>,
    pub require_time_place: bool,
    pub require_adverb: bool,
    pub require_reason: bool,
}

impl ComplexityContract {
    pub fn for_level(level: Level) -> Self {
        match level {
            Level::Beginner => Self {
                sentences: 1..=1,
                word_groups: 4..=6,
                max_connectives: 0,
                max_time_place: None,
                require_time_place: false,
                require_adverb: false,
                require_reason: false,
            },
            Level::Intermediate => Self {
                sentences: 1..=1,
                word_groups: 7..=11,
                max_connectives: 1,
                max_time_place: Some(1),
                require_time_place: false,
                require_adverb: false,
                require_reason: false,
            },
            Level::Advanced => Self {
                sentences: 2..=2,
                word_groups: 12..=18,
                max_connectives: usize::MAX,
                max_time_place: None,
                require_time_place: true,
                require_adverb: true,
                require_reason: true,
            },
        }
    }

    pub fn check(&self, text: &str) -> Vec<Violation> {
        let profile = TextProfile::measure(text);
        let mut violations = Vec::new();

        if !self.sentences.contains(&profile.sentences) {
            violations.push(Violation::SentenceCount {
                expected: self.sentences.clone(),
                actual: profile.sentences,
            });
        }
        if !self.word_groups.contains(&profile.word_groups) {
            violations.push(Violation::WordGroups {
                expected: self.word_groups.clone(),
                actual: profile.word_groups,
            });
        }
        let connectives = profile.connectives + profile.subordinate_clauses;
        if connectives > self.max_connectives {
            violations.push(Violation::TooManyConnectives {
                max: self.max_connectives,
                actual: connectives,
            });
        }
        if let Some(max) = self.max_time_place {
            if profile.time_place_modifiers > max {
                violations.push(Violation::TooManyModifiers {
                    max,
                    actual: profile.time_place_modifiers,
                });
            }
        }
        if self.require_time_place && profile.time_place_modifiers == 0 {
            violations.push(Violation::MissingTimePlace);
        }
        if self.require_adverb && profile.adverbs == 0 {
            violations.push(Violation::MissingAdverb);
        }
        if self.require_reason && profile.reason_clauses == 0 {
            violations.push(Violation::MissingReason);
        }
        for phrase in profile.meta_phrases {
            violations.push(Violation::MetaCommentary(phrase));
        }
        violations
    }

    pub fn is_satisfied_by(&self, text: &str) -> bool {
        self.check(text).is_empty()
    }
}

/// Contract text handed to the generation service
pub fn prompt_rules() -> &'static str {
    "- beginner(하): 정확히 1문장, 4~6어절, 연결어/종속절 없음, 단순 동사, '~해요' 체. 예) \"친구와 놀이터에서 신나게 놀았어요.\"\n\
     - intermediate(중): 1문장, 7~11어절, 장소/시간 수식어 1개 이내, 간단 연결어 1개 이내. 예) \"나는 친구와 같이 놀이터에서 그네를 재미있게 탔어요.\"\n\
     - advanced(상): 정확히 2문장, 총 12~18어절, 시간/장소 수식어 + 부사 1개 + 이유/배경 1개. 예) \"학교가 끝난 뒤 나는 친구와 놀이터에서 신나게 놀았어요. 집에 가기 전이라서 더 신났어요.\"\n\
     - 금지: '이러한 복잡한 상황에서', '가장 적절한 대응 방법' 같은 메타 문구, 해설형 문장, 문제 외 설명."
}
