//! Content authoring through the generation service
//!
//! Custom ("secret mission") themes and the literacy pretest questions.

use tracing::{debug, error, info, warn};

use crate::core::config::QuestConfig;
use crate::core::error::{QuestError, Result};
use crate::core::types::Category;
use crate::llm::client::TextGenerator;
use crate::llm::parser::{clean_theme_name, parse_array, GeneratedScenario};
use crate::llm::prompts;
use crate::pretest::{normalize_questions, PretestQuestion};
use crate::storage::{CustomTheme, NewScenario, NewScenarioOption, Scenario, Store};

/// A saved custom theme and the scenarios that made it into storage
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoredTheme {
    pub theme: CustomTheme,
    pub scenarios: Vec<Scenario>,
    pub count: usize,
}

/// Ask for a batch of scenarios about `description`
pub async fn generate_scenarios<G: TextGenerator>(
    generator: &G,
    description: &str,
    config: &QuestConfig,
) -> Result<Vec<GeneratedScenario>> {
    let batch = config.authoring_batch_size;
    let response = generator
        .complete(
            &prompts::authoring_system(batch),
            &prompts::authoring_user(description, batch),
            config.llm.authoring_temperature,
        )
        .await?;
    parse_array(&response).map_err(|e| {
        debug!(response = %response, "unparseable scenario batch");
        e
    })
}

/// Short child-friendly name for a custom theme
pub async fn name_theme<G: TextGenerator>(
    generator: &G,
    description: &str,
    config: &QuestConfig,
) -> Result<String> {
    let max = config.theme_name_max_chars;
    let response = generator
        .complete(
            &prompts::theme_name_system(max),
            &prompts::theme_name_user(description),
            config.llm.naming_temperature,
        )
        .await?;
    clean_theme_name(&response, max)
        .ok_or_else(|| QuestError::MalformedResponse("empty theme name".into()))
}

/// Generate, name and store a custom theme.
///
/// The theme row goes in first, then each scenario followed by its options.
/// A scenario that fails to insert is skipped; a failed option insert is
/// logged and ignored. Earlier rows stay committed if a later one fails.
pub async fn author_custom_theme<G, S>(
    generator: &G,
    store: &S,
    description: &str,
    config: &QuestConfig,
) -> Result<AuthoredTheme>
where
    G: TextGenerator,
    S: Store,
{
    let description = description.trim();
    if description.is_empty() {
        return Err(QuestError::InvalidInput("problem description is empty".into()));
    }

    info!("authoring scenarios for a custom theme");
    let generated = generate_scenarios(generator, description, config).await?;
    let theme_name = name_theme(generator, description, config).await?;
    let theme = store.insert_custom_theme(&theme_name, description)?;

    let mut scenarios = Vec::with_capacity(generated.len());
    for item in generated {
        if item.correct_option >= item.options.len() {
            warn!(title = %item.title, "skipping scenario without a valid correct option");
            continue;
        }

        let scenario = match store.insert_scenario(NewScenario {
            title: item.title,
            situation: item.situation,
            category: Category::Custom,
            theme: theme.theme_name.clone(),
        }) {
            Ok(s) => s,
            Err(e) => {
                error!("failed to save scenario: {}", e);
                continue;
            }
        };

        for (i, text) in item.options.into_iter().enumerate() {
            let option = NewScenarioOption {
                scenario_id: scenario.id,
                text,
                option_order: i as u32,
                is_correct: i == item.correct_option,
            };
            if let Err(e) = store.insert_option(option) {
                error!(scenario = %scenario.id, "failed to save option {}: {}", i, e);
            }
        }
        scenarios.push(scenario);
    }

    info!(theme = %theme.theme_name, count = scenarios.len(), "custom theme saved");
    Ok(AuthoredTheme {
        count: scenarios.len(),
        theme,
        scenarios,
    })
}

/// Literacy pretest questions, normalized; asks for at least three
pub async fn generate_literacy_quiz<G: TextGenerator>(
    generator: &G,
    count: usize,
    config: &QuestConfig,
) -> Result<Vec<PretestQuestion>> {
    let count = count.max(3);
    let response = generator
        .complete(
            &prompts::literacy_quiz_system(count),
            &prompts::literacy_quiz_user(count),
            config.llm.quiz_temperature,
        )
        .await?;
    let raw: Vec<serde_json::Value> = parse_array(&response)?;
    Ok(normalize_questions(&raw))
}
