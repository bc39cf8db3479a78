use toaster_config::BotConfig;

use crate::persona::Persona;

/// Settings every command can read and some commands change.
///
/// The dispatcher hands handlers a staged copy and commits it only when the
/// handler succeeds, so a dispatch never leaves a partial update behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotSettings {
    pub decision_model: String,
    pub chat_model: String,
    pub persona: Persona,
}

impl BotSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            decision_model: config.models.decision_model.clone(),
            chat_model: config.models.chat_model.clone(),
            persona: Persona::resolve(
                &config.behavior.persona,
                config.behavior.custom_persona.as_deref(),
            ),
        }
    }
}
