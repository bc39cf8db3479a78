//! Collaborators shared by the bot loop and command handlers.

use std::sync::Arc;
use std::time::Duration;

use toaster_config::{BotConfig, ContentFormat};
use toaster_core::channel::HistorySource;
use toaster_core::message::Turn;
use toaster_core::provider::Provider;
use toaster_core::GifSearch;

use crate::context::ContextAssembler;
use crate::invoke::ModelInvoker;
use crate::persona::Persona;

/// Read-only services handed to every command and used by the bot loop.
pub struct BotServices {
    pub invoker: ModelInvoker,
    pub history: Arc<dyn HistorySource>,
    pub gifs: Arc<dyn GifSearch>,
    pub assembler: ContextAssembler,
    pub history_limit: usize,
    pub bot_name: String,
    pub sentinel: char,
    pub custom_persona: Option<String>,
}

impl BotServices {
    pub fn from_config(
        config: &BotConfig,
        provider: Arc<dyn Provider>,
        history: Arc<dyn HistorySource>,
        gifs: Arc<dyn GifSearch>,
    ) -> Self {
        let invoker = ModelInvoker::new(provider, Duration::from_secs(config.models.timeout_secs))
            .with_temperature(config.models.temperature);
        Self {
            invoker,
            history,
            gifs,
            assembler: ContextAssembler::from_config(config),
            history_limit: config.platform.history_limit,
            bot_name: config.behavior.bot_name.clone(),
            sentinel: config.behavior.sentinel,
            custom_persona: config.behavior.custom_persona.clone(),
        }
    }

    pub fn format(&self) -> ContentFormat {
        self.assembler.format()
    }

    /// The system preamble for `persona`.
    pub fn preamble(&self, persona: &Persona) -> Turn {
        Turn::system(persona.preamble(&self.bot_name, self.format()))
    }
}
