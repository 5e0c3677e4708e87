//! Seed catalog for the main themes
//!
//! The catalog is compiled in from `data/seed_scenarios.toml` and only ever
//! written to storage when a main theme turns up empty.

use tracing::{debug, info};

use crate::core::error::{QuestError, Result};
use crate::core::types::Category;
use crate::storage::{NewScenario, NewScenarioOption, Store};

const SEED_CATALOG: &str = include_str!("../../data/seed_scenarios.toml");

/// A main theme: storage key and display label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainTheme {
    pub key: &'static str,
    pub label: &'static str,
    pub blurb: &'static str,
}

pub const MAIN_THEMES: [MainTheme; 6] = [
    MainTheme { key: "school", label: "학교", blurb: "친구들과 선생님과의 상황" },
    MainTheme { key: "playground", label: "놀이터/키즈카페", blurb: "놀이하며 생기는 상황들" },
    MainTheme { key: "transport", label: "대중교통", blurb: "버스나 지하철에서의 상황" },
    MainTheme { key: "hospital", label: "병원", blurb: "의사선생님과 병원에서" },
    MainTheme { key: "library", label: "도서관", blurb: "조용히 공부하는 공간에서" },
    MainTheme { key: "home", label: "가정", blurb: "집에서 가족과 함께" },
];

pub fn main_theme(key: &str) -> Option<&'static MainTheme> {
    MAIN_THEMES.iter().find(|t| t.key == key)
}

/// One catalog entry before it gets ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedScenario {
    pub title: String,
    pub situation: String,
    pub options: Vec<String>,
    pub correct: usize,
}

/// Parse a seed catalog (`[[theme]]` arrays of tables)
pub fn parse_catalog(content: &str, theme: &str) -> std::result::Result<Vec<SeedScenario>, String> {
    let toml: toml::Value = content
        .parse()
        .map_err(|e| format!("Invalid TOML: {}", e))?;

    let Some(entries) = toml.get(theme).and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };

    let mut scenarios = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let context = format!("{}[{}]", theme, i);
        let text = |key: &str| {
            entry
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| format!("{}: missing '{}'", context, key))
        };

        let options: Vec<String> = entry
            .get("options")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|o| o.as_str()).map(str::to_string).collect())
            .unwrap_or_default();
        if options.is_empty() {
            return Err(format!("{}: no options", context));
        }

        let correct = entry
            .get("correct")
            .and_then(|v| v.as_integer())
            .filter(|n| *n >= 0 && (*n as usize) < options.len())
            .ok_or_else(|| format!("{}: 'correct' must index one of the options", context))?
            as usize;

        scenarios.push(SeedScenario {
            title: text("title")?,
            situation: text("situation")?,
            options,
            correct,
        });
    }
    Ok(scenarios)
}

/// Built-in catalog entries for `theme` (empty for unknown themes)
pub fn catalog_for(theme: &str) -> Result<Vec<SeedScenario>> {
    parse_catalog(SEED_CATALOG, theme).map_err(QuestError::Config)
}

/// Insert the catalog for `theme`, each scenario followed by its options.
///
/// Returns how many scenarios were written. The first storage error stops
/// the run; rows written before it stay.
pub fn seed_theme<S: Store>(store: &S, theme: &str) -> Result<usize> {
    let catalog = catalog_for(theme)?;
    if catalog.is_empty() {
        debug!(theme, "no seed catalog for theme");
        return Ok(0);
    }

    for entry in &catalog {
        let scenario = store.insert_scenario(NewScenario {
            title: entry.title.clone(),
            situation: entry.situation.clone(),
            category: Category::Main,
            theme: theme.to_string(),
        })?;
        for (i, text) in entry.options.iter().enumerate() {
            store.insert_option(NewScenarioOption {
                scenario_id: scenario.id,
                text: text.clone(),
                option_order: i as u32,
                is_correct: i == entry.correct,
            })?;
        }
    }

    info!(theme, count = catalog.len(), "seeded main theme");
    Ok(catalog.len())
}
