//! Difficulty rewriting
//!
//! `contract` measures text against the per-level complexity contract,
//! `engine` is the deterministic rule-based rewriter. Delegated rewriting
//! through the generation service lives in `llm::adjust`.

pub mod contract;
pub mod engine;

pub use contract::{ComplexityContract, TextProfile, Violation};
pub use engine::{RuleEngine, Step};
