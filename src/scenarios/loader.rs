//! Scenario set loading
//!
//! Query by `(category, theme)`, seed an empty main theme once, sort
//! options into display order, shuffle, then level the text.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};

use crate::core::config::QuestConfig;
use crate::core::error::Result;
use crate::core::types::{Category, Level};
use crate::llm::adjust::adjust_or_original;
use crate::llm::client::TextGenerator;
use crate::rewrite::RuleEngine;
use crate::scenarios::seed::seed_theme;
use crate::storage::{ScenarioFilter, ScenarioWithOptions, Store};

/// Stored scenarios for a theme with options sorted by `option_order`.
///
/// An empty main theme is seeded from the built-in catalog and queried
/// again, once. Custom themes are never seeded. Any storage error aborts.
pub fn fetch<S: Store>(
    store: &S,
    theme: &str,
    category: Category,
    config: &QuestConfig,
) -> Result<Vec<ScenarioWithOptions>> {
    let limit = match category {
        Category::Main => Some(config.main_scenario_limit),
        Category::Custom => config.custom_scenario_limit,
    };
    let filter = ScenarioFilter::themed(category, theme).with_limit(limit);

    let mut rows = store.select_scenarios(&filter)?;
    if rows.is_empty() && category == Category::Main {
        info!(theme, "main theme is empty, seeding");
        if seed_theme(store, theme)? > 0 {
            rows = store.select_scenarios(&filter)?;
        }
    }

    for scenario in rows.iter_mut() {
        scenario.sort_options();
        if !scenario.is_well_formed() {
            warn!(scenario = %scenario.scenario.id, "scenario options are not well formed");
        }
    }
    Ok(rows)
}

/// Load, shuffle and level a scenario set with the rule engine
pub fn load<S, R>(
    store: &S,
    rules: &RuleEngine,
    theme: &str,
    category: Category,
    level: Level,
    config: &QuestConfig,
    rng: &mut R,
) -> Result<Vec<ScenarioWithOptions>>
where
    S: Store,
    R: Rng + ?Sized,
{
    let mut rows = fetch(store, theme, category, config)?;
    rows.shuffle(rng);
    info!(theme, category = category.as_str(), %level, count = rows.len(), "scenario set loaded");
    Ok(rows.iter().map(|s| rules.rewrite_scenario(s, level)).collect())
}

/// Load and shuffle a set, then level it through the generation service.
///
/// A service outage yields the set at its stored wording; scenarios whose
/// rewrite came back malformed are left out.
pub async fn load_delegated<G, S, R>(
    generator: &G,
    store: &S,
    theme: &str,
    category: Category,
    level: Level,
    config: &QuestConfig,
    rng: &mut R,
) -> Result<Vec<ScenarioWithOptions>>
where
    G: TextGenerator,
    S: Store,
    R: Rng + ?Sized,
{
    let mut rows = fetch(store, theme, category, config)?;
    rows.shuffle(rng);
    Ok(adjust_or_original(generator, store, rows, level, &config.llm).await)
}
