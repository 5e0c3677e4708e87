//! Delegated difficulty adjustment
//!
//! Each scenario goes to the generation service on its own. A malformed
//! reply skips that scenario and the batch moves on; a service failure
//! fails the batch, and `adjust_or_original` turns that into the untouched
//! input so the player is never blocked.

use tracing::{debug, info, warn};

use crate::core::config::LlmSettings;
use crate::core::error::Result;
use crate::core::types::Level;
use crate::llm::client::TextGenerator;
use crate::llm::parser::{parse_object, AdjustedScenario};
use crate::llm::prompts;
use crate::storage::{ScenarioWithOptions, Store};

/// Result of one adjustment batch
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustOutcome {
    /// Rewritten scenarios, in input order, minus the skipped ones
    pub scenarios: Vec<ScenarioWithOptions>,
    pub count: usize,
    pub level: Level,
}

/// Rewrite `scenarios` for `level` and persist the new text by id.
///
/// Stored text is overwritten in place; the previous wording is not kept.
pub async fn adjust_scenarios<G, S>(
    generator: &G,
    store: &S,
    scenarios: &[ScenarioWithOptions],
    level: Level,
    settings: &LlmSettings,
) -> Result<AdjustOutcome>
where
    G: TextGenerator,
    S: Store,
{
    if level == Level::Intermediate {
        return Ok(AdjustOutcome {
            scenarios: scenarios.to_vec(),
            count: scenarios.len(),
            level,
        });
    }

    info!(%level, count = scenarios.len(), "adjusting scenario difficulty");
    let system = prompts::adjust_system(level);
    let mut adjusted = Vec::with_capacity(scenarios.len());

    for scenario in scenarios {
        let user = prompts::adjust_user(scenario, level);
        let response = generator
            .complete(&system, &user, settings.rewrite_temperature)
            .await?;

        let rewritten: AdjustedScenario = match parse_object(&response) {
            Ok(r) => r,
            Err(e) => {
                warn!(scenario = %scenario.scenario.id, "skipping scenario: {}", e);
                debug!(response = %response, "unparseable adjustment");
                continue;
            }
        };

        let id = scenario.scenario.id;
        if let Err(e) = store.update_scenario_text(id, &rewritten.title, &rewritten.situation) {
            warn!(scenario = %id, "skipping scenario, update failed: {}", e);
            continue;
        }

        let mut out = scenario.clone();
        out.scenario.title = rewritten.title;
        out.scenario.situation = rewritten.situation;
        for (option, text) in out.options.iter_mut().zip(rewritten.options) {
            if text.trim().is_empty() {
                continue;
            }
            if let Err(e) = store.update_option_text(option.id, &text) {
                warn!(option = %option.id, "option update failed: {}", e);
            }
            option.text = text;
        }
        adjusted.push(out);
    }

    info!(%level, adjusted = adjusted.len(), "adjustment batch finished");
    Ok(AdjustOutcome {
        count: adjusted.len(),
        scenarios: adjusted,
        level,
    })
}

/// `adjust_scenarios`, falling back to the unmodified input when the service fails
pub async fn adjust_or_original<G, S>(
    generator: &G,
    store: &S,
    scenarios: Vec<ScenarioWithOptions>,
    level: Level,
    settings: &LlmSettings,
) -> Vec<ScenarioWithOptions>
where
    G: TextGenerator,
    S: Store,
{
    match adjust_scenarios(generator, store, &scenarios, level, settings).await {
        Ok(outcome) => outcome.scenarios,
        Err(e) => {
            warn!(%level, "difficulty service unavailable, keeping original text: {}", e);
            scenarios
        }
    }
}
