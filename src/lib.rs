//! Scenario Quest - leveled situational-judgment quizzes for young readers

pub mod core;
pub mod llm;
pub mod pretest;
pub mod progress;
pub mod quizset;
pub mod rewrite;
pub mod routes;
pub mod scenarios;
pub mod settings;
pub mod storage;
