mod cli;
mod routes;

pub use cli::ServeOptions;
pub use routes::router;

use crate::dispatch::Dispatcher;
use crate::guide::{FetchLimits, GuideFetcher, HttpPageSource};
use crate::handler::GenerateService;
use crate::model::{GeminiClient, GeminiConfig};
use crate::prelude::{eprintln, *};
use gamesense_core::payload::ContextBudget;
use gamesense_core::retry::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;

/// Wire the production collaborators into a service.
///
/// A missing API key is a startup failure, never a per-request error.
pub fn build_service(options: &ServeOptions) -> Result<GenerateService> {
    let api_key = options
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_eyre("GEMINI_API_KEY is not set")?;

    let model = GeminiClient::new(&GeminiConfig {
        api_key: api_key.to_string(),
        model: options.model.clone(),
        base_url: options.base_url.clone(),
        timeout: Duration::from_secs(options.model_timeout),
    })?;

    let pages = HttpPageSource::new(
        Duration::from_secs(options.fetch_timeout),
        options.max_page_bytes,
    )?;

    Ok(GenerateService::new(
        GuideFetcher::new(
            Arc::new(pages),
            FetchLimits {
                max_chars: options.max_guide_chars,
                concurrency: options.fetch_concurrency,
                deadline: Duration::from_secs(options.fetch_deadline),
            },
        ),
        Dispatcher::new(
            Arc::new(model),
            RetryPolicy::default().with_max_attempts(options.max_attempts),
        ),
        ContextBudget {
            max_input_chars: options.max_input_chars,
        },
    ))
}

pub async fn run(options: ServeOptions, global: crate::Global) -> Result<()> {
    let service = build_service(&options)?;

    let addr = f!("{}:{}", options.host, options.port);

    if global.verbose {
        eprintln!("Gemini model: {}", options.model);
        eprintln!("Generate endpoint: http://{}/api/generate-content", addr);
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    log::info!("GameSense proxy listening on http://{}", addr);

    axum::serve(listener, router(Arc::new(service)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    log::info!("GameSense proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
