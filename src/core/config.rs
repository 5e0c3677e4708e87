//! Application configuration with documented constants
//!
//! Every tunable number lives here with a note on what it bounds. Values
//! load from an optional TOML file; anything missing falls back to
//! `QuestConfig::default()`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{QuestError, Result};
use crate::core::session::SessionPolicy;

/// Configuration for the quiz engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestConfig {
    // === REVIEW LEDGER ===
    /// Correct review answers needed before a wrong answer leaves the ledger
    pub review_mastery_threshold: u32,

    // === SCENARIO LOADING ===
    /// Row cap for the main-category scenario query
    pub main_scenario_limit: usize,

    /// Row cap for custom themes (`None` = every scenario of the theme)
    pub custom_scenario_limit: Option<usize>,

    // === RULE ENGINE ===
    /// Rule table replacing the built-in one (`None` = built-in)
    pub rules_path: Option<PathBuf>,

    // === PRETEST ===
    /// Number of graded pretest questions kept from the service
    ///
    /// The tiered classifier needs at least one question per tier, so this
    /// never drops below 3.
    pub pretest_question_count: usize,

    /// Session cache tag for the generated pretest questions
    pub literacy_cache_tag: String,

    // === DETERMINISTIC QUIZ SETS ===
    /// Questions per set when a request omits the count
    pub quiz_default_count: u32,

    /// Upper clamp for requested set size
    pub quiz_max_count: u32,

    // === GENERATION SERVICE ===
    /// Per-request timeout for generation calls (seconds)
    ///
    /// A hung call would otherwise block the flow until the transport
    /// gives up.
    pub request_timeout_secs: u64,

    /// Scenarios requested from one authoring call
    pub authoring_batch_size: usize,

    /// Maximum characters of a generated theme name
    pub theme_name_max_chars: usize,

    /// How long a session identifier lives
    pub session_policy: SessionPolicy,

    pub llm: LlmSettings,
}

/// Model parameters for the generation service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Sampling temperature for difficulty rewrites (low: stay close to source)
    pub rewrite_temperature: f32,
    /// Sampling temperature for scenario authoring
    pub authoring_temperature: f32,
    /// Sampling temperature for pretest question authoring
    pub quiz_temperature: f32,
    /// Sampling temperature for custom theme names
    pub naming_temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".into(),
            model: "gpt-4o-mini".into(),
            max_tokens: 3000,
            rewrite_temperature: 0.3,
            authoring_temperature: 0.7,
            quiz_temperature: 0.2,
            naming_temperature: 0.3,
        }
    }
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            review_mastery_threshold: 3,

            main_scenario_limit: 20,
            custom_scenario_limit: None,

            rules_path: None,

            pretest_question_count: 3,
            literacy_cache_tag: "literacy_quiz_v1".into(),

            quiz_default_count: 20,
            quiz_max_count: 50,

            request_timeout_secs: 20,
            authoring_batch_size: 10,
            theme_name_max_chars: 15,
            session_policy: SessionPolicy::PerProcess,

            llm: LlmSettings::default(),
        }
    }
}

impl QuestConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: QuestConfig = toml::from_str(content)?;
        config.validate().map_err(QuestError::Config)?;
        Ok(config)
    }

    /// Load a config file, or defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.review_mastery_threshold == 0 {
            return Err("review_mastery_threshold must be at least 1".into());
        }

        if self.pretest_question_count < 3 {
            return Err(format!(
                "pretest_question_count ({}) must cover all three tiers",
                self.pretest_question_count
            ));
        }

        if self.quiz_default_count == 0 || self.quiz_default_count > self.quiz_max_count {
            return Err(format!(
                "quiz_default_count ({}) should be in 1..={}",
                self.quiz_default_count, self.quiz_max_count
            ));
        }

        if !(15..=30).contains(&self.request_timeout_secs) {
            return Err(format!(
                "request_timeout_secs ({}) should be between 15 and 30",
                self.request_timeout_secs
            ));
        }

        if self.authoring_batch_size == 0 || self.theme_name_max_chars == 0 {
            return Err("authoring_batch_size and theme_name_max_chars must be positive".into());
        }

        Ok(())
    }
}
