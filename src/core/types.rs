//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

record_id!(
    /// Identifier of a stored scenario
    ScenarioId
);
record_id!(
    /// Identifier of a stored scenario option
    OptionId
);
record_id!(ThemeId);
record_id!(ProgressId);
record_id!(
    /// Identifier of a wrong-answer ledger entry
    WrongAnswerId
);
record_id!(QuizSetId);
record_id!(QuizQuestionId);

/// Reading level of a player
///
/// `Intermediate` is the canonical level: stored scenario text is written
/// at this level and rewriting to it is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }

    /// Generator-side difficulty with the same sentence contract
    pub fn difficulty(&self) -> Difficulty {
        match self {
            Level::Beginner => Difficulty::Low,
            Level::Intermediate => Difficulty::Mid,
            Level::Advanced => Difficulty::High,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            other => Err(format!("unknown level '{}'", other)),
        }
    }
}

/// Difficulty used by the deterministic quiz generator (하/중/상/혼합)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "하")]
    Low,
    #[serde(rename = "중")]
    Mid,
    #[serde(rename = "상")]
    High,
    /// Resolved per item to one of the three discrete levels
    #[serde(rename = "혼합")]
    Mixed,
}

impl Difficulty {
    pub const DISCRETE: [Difficulty; 3] = [Difficulty::Low, Difficulty::Mid, Difficulty::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Low => "하",
            Difficulty::Mid => "중",
            Difficulty::High => "상",
            Difficulty::Mixed => "혼합",
        }
    }

    /// Reading level for a discrete difficulty, `None` for `Mixed`
    pub fn level(&self) -> Option<Level> {
        match self {
            Difficulty::Low => Some(Level::Beginner),
            Difficulty::Mid => Some(Level::Intermediate),
            Difficulty::High => Some(Level::Advanced),
            Difficulty::Mixed => None,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Mixed
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "하" => Ok(Difficulty::Low),
            "중" => Ok(Difficulty::Mid),
            "상" => Ok(Difficulty::High),
            "혼합" => Ok(Difficulty::Mixed),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// Intrinsic difficulty tag of a pretest question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Easy,
    Medium,
    Hard,
}

impl Tier {
    /// Reading level whose sentence contract a question of this tier follows
    pub fn level(&self) -> Level {
        match self {
            Tier::Easy => Level::Beginner,
            Tier::Medium => Level::Intermediate,
            Tier::Hard => Level::Advanced,
        }
    }
}

/// Scenario category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Main,
    Custom,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Main => "main",
            Category::Custom => "custom",
        }
    }
}

/// Scenario field a rewrite applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Situation,
    Option,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Title, Field::Situation, Field::Option];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Situation => "situation",
            Field::Option => "option",
        }
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "title" => Ok(Field::Title),
            "situation" => Ok(Field::Situation),
            "option" => Ok(Field::Option),
            other => Err(format!("unknown field '{}'", other)),
        }
    }
}
