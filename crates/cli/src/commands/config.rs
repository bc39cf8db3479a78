//! `toaster config`: configuration management commands.

use std::path::Path;

use toaster_config::BotConfig;

pub async fn validate(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating {}...", config_path.display());

    match BotConfig::load_with_overrides(config_path) {
        Ok(config) => {
            println!("   ✅ Config parsed and validated");

            let mut warnings = Vec::new();
            if config.platform.token.is_none() {
                warnings.push("No platform token set (set TOKEN)");
            }
            if config.platform.bot_user_id.is_none() {
                warnings.push("No bot account id set (set TOASTER_BOT_USER_ID); `run` will refuse to start");
            }
            if config.relay.host == "0.0.0.0" && config.relay.shared_secret.is_none() {
                warnings.push("Relay bound to 0.0.0.0 without a shared secret");
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Platform:  {}", config.platform.base_url);
            println!("   Backend:   {}", config.model_api_url());
            println!("   Decision:  {}", config.models.decision_model);
            println!("   Chat:      {}", config.models.chat_model);
            println!("   Ceiling:   {} tokens", config.models.token_ceiling);
            println!("   Persona:   {}", config.behavior.persona);
            println!(
                "   Relay:     {}:{}",
                config.relay.host, config.relay.port
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = BotConfig::load_with_overrides(config_path)
        .map_err(|e| format!("Failed to load config: {e}"))?;
    // Debug output redacts secrets.
    println!("{config:#?}");
    Ok(())
}

pub async fn path(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", config_path.display());
    Ok(())
}
