//! Model backend and media collaborators for Toaster.
//!
//! The model backend implements `toaster_core::Provider`; the GIF client
//! implements `toaster_core::GifSearch`. Both are plain HTTP clients built
//! from `toaster_config::BotConfig`.

pub mod openai_compat;
pub mod tenor;

pub use openai_compat::OpenAiCompatProvider;
pub use tenor::TenorGifSearch;

use toaster_config::BotConfig;

/// Build the model backend described by `config`.
pub fn build_provider(config: &BotConfig) -> OpenAiCompatProvider {
    OpenAiCompatProvider::new(
        "openwebui",
        config.model_api_url(),
        config.model_api_key().unwrap_or_default(),
    )
}

/// Build the GIF search client described by `config`.
pub fn build_gif_search(config: &BotConfig) -> TenorGifSearch {
    TenorGifSearch::new(
        config.gif.api_url.clone(),
        config.gif.api_key.clone(),
        config.gif.limit,
    )
}
