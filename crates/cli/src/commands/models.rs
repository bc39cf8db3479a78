//! `toaster models`: list what the backend can serve.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use toaster_agent::ModelInvoker;
use toaster_config::BotConfig;
use toaster_providers::build_provider;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = BotConfig::load_with_overrides(config_path)
        .map_err(|e| format!("Failed to load config: {e}"))?;

    let invoker = ModelInvoker::new(
        Arc::new(build_provider(&config)),
        Duration::from_secs(config.models.timeout_secs),
    );
    let models = invoker.list_models().await?;

    println!("Models at {}", config.model_api_url());
    if models.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for model in &models {
        let mut marks = Vec::new();
        if model.id == config.models.decision_model {
            marks.push("decision");
        }
        if model.id == config.models.chat_model {
            marks.push("chat");
        }
        if marks.is_empty() {
            println!("  - {}", model.id);
        } else {
            println!("  - {} ({})", model.id, marks.join(", "));
        }
    }
    Ok(())
}
