//! Orchestration of one generate-content request.
//!
//! A request moves through validation, guide fetching, payload assembly and
//! dispatch. Validation never touches the network, guide failures never end
//! the request, and only categorized errors leave this module.

use crate::dispatch::Dispatcher;
use crate::error::GenerateError;
use crate::guide::{validate_guide_url, GuideFetcher};
use gamesense_core::api::GenerateRequest;
use gamesense_core::payload::{build_payload, resolve_prompt, ContextBudget, PayloadInput};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Fetching,
    Assembling,
    Dispatching,
    Responding,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Fetching => "fetching",
            Stage::Assembling => "assembling",
            Stage::Dispatching => "dispatching",
            Stage::Responding => "responding",
        };
        f.write_str(name)
    }
}

/// The augmentation-and-dispatch pipeline, built once and shared by all requests.
#[derive(Clone)]
pub struct GenerateService {
    guides: GuideFetcher,
    dispatcher: Dispatcher,
    budget: ContextBudget,
}

impl GenerateService {
    pub fn new(guides: GuideFetcher, dispatcher: Dispatcher, budget: ContextBudget) -> Self {
        Self {
            guides,
            dispatcher,
            budget,
        }
    }

    pub async fn handle(&self, request: GenerateRequest) -> Result<String, GenerateError> {
        enter(Stage::Validating);
        let guide_urls = validate(&request)?;

        enter(Stage::Fetching);
        let guides = self.guides.fetch_all(&guide_urls).await;
        let loaded = guides.iter().filter(|g| g.is_loaded()).count();
        if loaded < guides.len() {
            log::info!(
                "Continuing with {}/{} guides loaded",
                loaded,
                guides.len()
            );
        }

        enter(Stage::Assembling);
        let payload = build_payload(
            PayloadInput {
                history: request.history(),
                prompt: request.prompt.as_deref(),
                system_instruction: request.system_instruction.as_deref(),
                guides: &guides,
            },
            self.budget,
        )?;
        log::debug!(
            "Payload has {} turns, {} chars",
            payload.contents.len(),
            payload.total_chars()
        );

        enter(Stage::Dispatching);
        let text = self.dispatcher.generate(&payload).await?;

        enter(Stage::Responding);
        Ok(text)
    }
}

fn enter(stage: Stage) {
    log::debug!("generate-content: {}", stage);
}

/// Check the request shape and return its guide URLs.
fn validate(request: &GenerateRequest) -> Result<Vec<String>, GenerateError> {
    resolve_prompt(request.history(), request.prompt.as_deref())?;

    let urls = request.guide_urls();
    for url in &urls {
        validate_guide_url(url)?;
    }
    Ok(urls)
}
