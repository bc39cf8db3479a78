//! `toaster onboard`: first-time setup.

use std::path::Path;

use toaster_config::BotConfig;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Toaster - First-Time Setup");
    println!("==========================\n");

    if let Some(dir) = config_path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        }
    }

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(config_path, BotConfig::default_toml())?;
    println!("✅ Created config at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Set platform.base_url, platform.token and platform.bot_user_id");
    println!("      (or WEBUI_URL, TOKEN and TOASTER_BOT_USER_ID)");
    println!("   2. Pick models: `toaster models`");
    println!("   3. Start the bot: `toaster run`\n");

    Ok(())
}
