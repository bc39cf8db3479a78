//! `toaster doctor`: diagnose configuration and backend reachability.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use toaster_agent::ModelInvoker;
use toaster_config::BotConfig;
use toaster_providers::build_provider;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Toaster Doctor - System Diagnostics");
    println!("===================================\n");

    let mut issues = 0;

    if !config_path.exists() {
        println!("  ⚠️  No config file at {} - using defaults and environment", config_path.display());
        issues += 1;
    }

    let config = match BotConfig::load_with_overrides(config_path) {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  Fix the configuration first.");
            return Ok(());
        }
    };

    if config.platform.token.is_some() {
        println!("  ✅ Platform token configured");
    } else {
        println!("  ❌ No platform token - set platform.token or TOKEN");
        issues += 1;
    }

    if config.platform.bot_user_id.is_some() {
        println!("  ✅ Bot account id configured");
    } else {
        println!("  ❌ No bot account id - set platform.bot_user_id or TOASTER_BOT_USER_ID");
        issues += 1;
    }

    let invoker = ModelInvoker::new(
        Arc::new(build_provider(&config)),
        Duration::from_secs(config.models.timeout_secs.min(10)),
    );
    match invoker.list_models().await {
        Ok(models) => {
            println!("  ✅ Model backend reachable ({} models)", models.len());
            for (role, id) in [
                ("decision", &config.models.decision_model),
                ("chat", &config.models.chat_model),
            ] {
                if models.iter().any(|m| &m.id == id) {
                    println!("  ✅ {role} model '{id}' available");
                } else {
                    println!("  ⚠️  {role} model '{id}' not listed by the backend");
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  ❌ Model backend unreachable: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
