//! `toaster run`: relay server plus the bot event loop.

use std::path::Path;
use std::sync::Arc;

use toaster_agent::ToasterBot;
use toaster_channels::{OpenWebUiChannel, RelayState, build_router};
use toaster_config::BotConfig;
use toaster_core::channel::Channel;
use toaster_providers::{build_gif_search, build_provider};
use tracing::{info, warn};

pub async fn run(config_path: &Path, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = BotConfig::load_with_overrides(config_path)
        .map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(port) = port {
        config.relay.port = port;
    }

    let channel = Arc::new(OpenWebUiChannel::from_config(&config));
    let bot = ToasterBot::from_config(
        &config,
        Arc::new(build_provider(&config)),
        channel.clone(),
        channel.clone(),
        Arc::new(build_gif_search(&config)),
    )?;

    let events = channel.start().await?;

    let app = build_router(Arc::new(RelayState {
        channel: channel.clone(),
        shared_secret: config.relay.shared_secret.clone(),
    }));
    let addr = format!("{}:{}", config.relay.host, config.relay.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        addr = %addr,
        platform = %config.platform.base_url,
        signed = config.relay.shared_secret.is_some(),
        "Relay listening on POST /channel-events"
    );
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    tokio::select! {
        _ = bot.run(events) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Signal handler failed");
            }
            info!("Shutdown requested");
        }
    }

    channel.stop().await?;
    server.abort();
    Ok(())
}
