//! Generation service integration
//!
//! The service is an opaque text transformer. This module owns the HTTP
//! client, the prompts, and the fallback rules for each call site.

pub mod adjust;
pub mod authoring;
pub mod client;
pub mod parser;
pub mod prompts;

pub use adjust::{adjust_or_original, adjust_scenarios, AdjustOutcome};
pub use authoring::{author_custom_theme, generate_literacy_quiz, AuthoredTheme};
pub use client::{LlmClient, TextGenerator};
