//! The bot event loop.
//!
//! One inbound event at a time:
//!
//! 1. **Filter** typing events and the bot's own messages
//! 2. **Dispatch** sentinel-prefixed messages as commands
//! 3. **Assemble** the channel window from platform history and trim it
//! 4. **Arbitrate** with the decision model
//! 5. **Reply** with the chat model when the verdict says so
//!
//! Failures never end the loop; each one degrades to a posted message or
//! silence.

use std::sync::Arc;

use tokio::sync::mpsc;
use toaster_config::BotConfig;
use toaster_core::channel::{Channel, ChannelEvent, HistorySource, InboundMessage};
use toaster_core::error::{ChannelError, Error};
use toaster_core::provider::Provider;
use toaster_core::GifSearch;
use tracing::{debug, info, warn};

use crate::arbitration::{Arbiter, Verdict};
use crate::commands::{BotSettings, CommandRegistry, Dispatcher};
use crate::context::{ConversationStore, trim};
use crate::services::BotServices;

/// Posted when the channel history cannot be read.
pub const HISTORY_UNAVAILABLE: &str = "*failed to fetch history*";

/// Posted when the chat model fails after the bot decided to speak.
pub const APOLOGY: &str = "*Sorry, my brain just short-circuited. Try me again in a sec.*";

/// What handling one event amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    Command(String),
    Silent,
    Replied(String),
    Apologized,
    HistoryUnavailable,
}

pub struct ToasterBot {
    channel: Arc<dyn Channel>,
    services: BotServices,
    dispatcher: Dispatcher,
    arbiter: Arbiter,
    settings: BotSettings,
    conversations: ConversationStore,
    bot_user_id: String,
    token_ceiling: usize,
    speak_unparseable: bool,
}

impl ToasterBot {
    /// Wire the bot from configuration and its collaborators.
    pub fn from_config(
        config: &BotConfig,
        provider: Arc<dyn Provider>,
        channel: Arc<dyn Channel>,
        history: Arc<dyn HistorySource>,
        gifs: Arc<dyn GifSearch>,
    ) -> Result<Self, Error> {
        let bot_user_id = config
            .platform
            .bot_user_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::Config {
                message: "platform.bot_user_id is required".into(),
            })?;

        let registry = CommandRegistry::with_builtins().map_err(|e| Error::Config {
            message: e.to_string(),
        })?;

        Ok(Self {
            channel,
            services: BotServices::from_config(config, provider, history, gifs),
            dispatcher: Dispatcher::new(registry, config.behavior.sentinel),
            arbiter: Arbiter::from_config(&config.behavior),
            settings: BotSettings::from_config(config),
            conversations: ConversationStore::new(),
            bot_user_id,
            token_ceiling: config.models.token_ceiling,
            speak_unparseable: config.behavior.speak_unparseable_verdicts,
        })
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    /// Consume events until the stream closes.
    pub async fn run(mut self, mut events: mpsc::Receiver<Result<ChannelEvent, ChannelError>>) {
        info!(
            channel = self.channel.name(),
            decision_model = %self.settings.decision_model,
            chat_model = %self.settings.chat_model,
            "Bot loop started"
        );
        while let Some(event) = events.recv().await {
            match event {
                Ok(event) => {
                    let outcome = self.handle_event(event).await;
                    debug!(?outcome, "Event handled");
                }
                Err(e) => warn!(error = %e, "Channel delivered an error"),
            }
        }
        info!("Event stream closed, bot loop stopping");
    }

    /// Handle one inbound event.
    pub async fn handle_event(&mut self, event: ChannelEvent) -> Outcome {
        let inbound = match event {
            ChannelEvent::Message(inbound) => inbound,
            ChannelEvent::Typing { .. } => return Outcome::Ignored,
        };
        if inbound.message.author.id == self.bot_user_id {
            return Outcome::Ignored;
        }

        let channel_id = inbound.channel_id.as_str();
        let raw = inbound.message.text.as_str();
        if self.services.assembler.is_command(raw) {
            self.conversations
                .observe(channel_id, inbound.message.created_at);
            let reply = self
                .dispatcher
                .dispatch(
                    raw.trim_end(),
                    channel_id,
                    &mut self.settings,
                    &mut self.conversations,
                    &self.services,
                )
                .await;
            self.post(channel_id, &reply).await;
            return Outcome::Command(reply);
        }
        if raw.trim().is_empty() {
            return Outcome::Ignored;
        }

        self.converse(&inbound).await
    }

    async fn converse(&mut self, inbound: &InboundMessage) -> Outcome {
        let channel_id = inbound.channel_id.as_str();

        let history = match self
            .services
            .history
            .fetch(channel_id, self.services.history_limit, None)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(channel_id, error = %e, "History fetch failed");
                self.post(channel_id, HISTORY_UNAVAILABLE).await;
                return Outcome::HistoryUnavailable;
            }
        };
        self.conversations
            .observe(channel_id, inbound.message.created_at);

        let assembled = match self.services.assembler.assemble(
            &history,
            Some(&inbound.message),
            self.conversations.horizon(channel_id),
        ) {
            Ok(turns) => turns,
            Err(e) => {
                warn!(channel_id, error = %e, "Context assembly failed");
                return Outcome::Silent;
            }
        };

        let mut window = Vec::with_capacity(assembled.len() + 1);
        window.push(self.services.preamble(&self.settings.persona));
        window.extend_from_slice(&assembled);
        self.conversations.replace(channel_id, assembled);
        let window = trim(&window, self.token_ceiling);

        let verdict = match self
            .arbiter
            .decide(
                &self.services.invoker,
                &self.settings.decision_model,
                channel_id,
                &window,
            )
            .await
        {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(channel_id, error = %e, "Arbitration failed, staying silent");
                return Outcome::Silent;
            }
        };

        match verdict {
            Verdict::Affirmative => {}
            Verdict::Negative => return Outcome::Silent,
            Verdict::Unparseable(raw) => {
                if self.speak_unparseable && !raw.is_empty() {
                    self.post(channel_id, &raw).await;
                    return Outcome::Replied(raw);
                }
                return Outcome::Silent;
            }
        }

        if let Err(e) = self.channel.send_typing(channel_id).await {
            debug!(channel_id, error = %e, "Typing signal failed");
        }

        let reply = match self
            .services
            .invoker
            .complete(&self.settings.chat_model, window)
            .await
        {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                warn!(channel_id, error = %e, "Completion failed");
                self.post(channel_id, APOLOGY).await;
                return Outcome::Apologized;
            }
        };

        self.post(channel_id, &reply).await;
        match self
            .services
            .assembler
            .bot_turn(&self.services.bot_name, &reply, None)
        {
            Ok(turn) => self.conversations.push(channel_id, turn),
            Err(e) => warn!(channel_id, error = %e, "Could not record bot reply"),
        }
        Outcome::Replied(reply)
    }

    async fn post(&self, channel_id: &str, content: &str) {
        if let Err(e) = self.channel.send(channel_id, content).await {
            warn!(channel_id, error = %e, "Failed to post message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        BOT_ID, RecordingChannel, ScriptedProvider, StaticGifs, StaticHistory, raw,
    };
    use toaster_core::channel::RawMessage;
    use toaster_core::error::ProviderError;
    use toaster_core::message::{Role, Speaker};

    fn config() -> BotConfig {
        let mut config = BotConfig::default();
        config.platform.bot_user_id = Some(BOT_ID.into());
        config.models.decision_model = "dec".into();
        config.models.chat_model = "chat".into();
        config
    }

    struct Harness {
        bot: ToasterBot,
        channel: Arc<RecordingChannel>,
        history: Arc<StaticHistory>,
    }

    fn harness_with(config: BotConfig, provider: ScriptedProvider, history: StaticHistory) -> Harness {
        let channel = Arc::new(RecordingChannel::default());
        let history = Arc::new(history);
        let bot = ToasterBot::from_config(
            &config,
            Arc::new(provider),
            channel.clone(),
            history.clone(),
            Arc::new(StaticGifs::with_result(Ok(None))),
        )
        .unwrap();
        Harness {
            bot,
            channel,
            history,
        }
    }

    fn harness(provider: ScriptedProvider, history: StaticHistory) -> Harness {
        harness_with(config(), provider, history)
    }

    fn message(msg: RawMessage) -> ChannelEvent {
        ChannelEvent::Message(InboundMessage {
            channel_id: "c-1".into(),
            message: msg,
        })
    }

    #[test]
    fn missing_bot_identity_is_a_config_error() {
        let result = ToasterBot::from_config(
            &BotConfig::default(),
            Arc::new(ScriptedProvider::new(vec![])),
            Arc::new(RecordingChannel::default()),
            Arc::new(StaticHistory::new(vec![])),
            Arc::new(StaticGifs::with_result(Ok(None))),
        );
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn typing_and_self_messages_are_ignored() {
        let mut h = harness(ScriptedProvider::new(vec![]), StaticHistory::new(vec![]));

        let typing = ChannelEvent::Typing {
            channel_id: "c-1".into(),
            user: Speaker::new("u-1", "Alice"),
            typing: true,
        };
        assert_eq!(h.bot.handle_event(typing).await, Outcome::Ignored);

        let own = message(raw("m-1", BOT_ID, "Toaster", "hello", 1));
        assert_eq!(h.bot.handle_event(own).await, Outcome::Ignored);
        assert!(h.channel.sent().is_empty());
        assert_eq!(h.history.fetches(), 0);
    }

    #[tokio::test]
    async fn commands_are_dispatched_and_posted() {
        let mut h = harness(ScriptedProvider::new(vec![]), StaticHistory::new(vec![]));

        let outcome = h
            .bot
            .handle_event(message(raw("m-1", "u-1", "Alice", "$help", 1)))
            .await;
        let Outcome::Command(reply) = outcome else {
            panic!("expected a command outcome");
        };
        assert!(reply.contains("$clearcontext"));
        assert_eq!(h.channel.sent(), vec![("c-1".to_string(), reply)]);
        assert_eq!(h.history.fetches(), 0);
    }

    #[tokio::test]
    async fn unknown_command_gets_invalid_reply() {
        let mut h = harness(ScriptedProvider::new(vec![]), StaticHistory::new(vec![]));
        let outcome = h
            .bot
            .handle_event(message(raw("m-1", "u-1", "Alice", "$dance", 1)))
            .await;
        assert_eq!(outcome, Outcome::Command("*Not a valid command*".into()));
    }

    #[tokio::test]
    async fn history_failure_posts_notice_and_keeps_state() {
        let mut h = harness(ScriptedProvider::new(vec![]), StaticHistory::failing());
        let outcome = h
            .bot
            .handle_event(message(raw("m-1", "u-1", "Alice", "anyone here?", 5)))
            .await;
        assert_eq!(outcome, Outcome::HistoryUnavailable);
        assert_eq!(
            h.channel.sent(),
            vec![("c-1".to_string(), HISTORY_UNAVAILABLE.to_string())]
        );
        assert!(h.bot.conversations().turns("c-1").is_empty());
        assert!(h.bot.conversations().get("c-1").is_none());
    }

    #[tokio::test]
    async fn history_failure_does_not_move_last_seen() {
        let mut h = harness(ScriptedProvider::new(vec![]), StaticHistory::failing());
        h.bot
            .handle_event(message(raw("m-1", "u-1", "Alice", "$tokencheck", 3)))
            .await;
        let before = h.bot.conversations().get("c-1").cloned();
        assert_eq!(before.as_ref().and_then(|c| c.last_seen), Some(3));

        let outcome = h
            .bot
            .handle_event(message(raw("m-2", "u-1", "Alice", "anyone here?", 9)))
            .await;
        assert_eq!(outcome, Outcome::HistoryUnavailable);
        let after = h.bot.conversations().get("c-1");
        assert_eq!(after.and_then(|c| c.last_seen), Some(3));
        assert_eq!(after.map(|c| c.turns.len()), before.map(|c| c.turns.len()));
    }

    #[tokio::test]
    async fn sentinel_after_leading_space_is_conversation() {
        let provider = ScriptedProvider::new(vec![Ok("no".into())]);
        let inbound = raw("m-1", "u-1", "Alice", "  $help me out", 1);
        let history = StaticHistory::new(vec![inbound.clone()]);
        let mut h = harness(provider, history);

        let outcome = h.bot.handle_event(message(inbound)).await;
        assert_eq!(outcome, Outcome::Silent);
        assert_eq!(h.history.fetches(), 1);
        assert!(h.channel.sent().is_empty());
        let stored = h.bot.conversations().turns("c-1");
        assert_eq!(stored.len(), 1);
        assert!(stored[0].content.contains("$help me out"));
    }

    #[tokio::test]
    async fn trailing_whitespace_on_command_is_ignored() {
        let mut h = harness(ScriptedProvider::new(vec![]), StaticHistory::new(vec![]));
        let outcome = h
            .bot
            .handle_event(message(raw("m-1", "u-1", "Alice", "$help  \n", 1)))
            .await;
        let Outcome::Command(reply) = outcome else {
            panic!("expected a command outcome");
        };
        assert!(reply.contains("$clearcontext"));
    }

    #[tokio::test]
    async fn negative_verdict_stays_silent() {
        let provider = ScriptedProvider::new(vec![Ok("No.".into())]);
        let history = StaticHistory::new(vec![raw("m-1", "u-1", "Alice", "brb", 1)]);
        let mut h = harness(provider, history);

        let inbound = raw("m-1", "u-1", "Alice", "brb", 1);
        assert_eq!(h.bot.handle_event(message(inbound)).await, Outcome::Silent);
        assert!(h.channel.sent().is_empty());
        assert_eq!(h.channel.typing_count(), 0);
        assert_eq!(h.bot.conversations().turns("c-1").len(), 1);
    }

    #[tokio::test]
    async fn affirmative_verdict_replies_and_records_turn() {
        let provider = ScriptedProvider::new(vec![Ok("yes".into()), Ok(" Sure thing. ".into())]);
        let requests = provider.requests();
        let history = StaticHistory::new(vec![
            raw("m-2", "u-1", "Alice", "toaster, you there?", 2),
            raw("m-1", "u-2", "Bob", "hey all", 1),
        ]);
        let mut h = harness(provider, history);

        let inbound = raw("m-2", "u-1", "Alice", "toaster, you there?", 2);
        let outcome = h.bot.handle_event(message(inbound)).await;
        assert_eq!(outcome, Outcome::Replied("Sure thing.".into()));
        assert_eq!(h.channel.sent(), vec![("c-1".to_string(), "Sure thing.".to_string())]);
        assert_eq!(h.channel.typing_count(), 1);

        let requests = requests.lock().unwrap();
        assert_eq!(requests[0].model, "dec");
        assert_eq!(requests[0].turns.len(), 1);
        assert!(requests[0].turns[0].content.contains("hey all"));
        assert_eq!(requests[1].model, "chat");
        assert_eq!(requests[1].turns[0].role, Role::System);
        assert_eq!(requests[1].turns.len(), 3);

        let stored = h.bot.conversations().turns("c-1");
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[2].role, Role::Assistant);
        assert!(stored[2].content.contains("Sure thing."));
    }

    #[tokio::test]
    async fn inbound_missing_from_history_is_appended() {
        let provider = ScriptedProvider::new(vec![Ok("no".into())]);
        let history = StaticHistory::new(vec![raw("m-1", "u-2", "Bob", "hey all", 1)]);
        let mut h = harness(provider, history);

        let inbound = raw("m-2", "u-1", "Alice", "what's up", 2);
        h.bot.handle_event(message(inbound)).await;
        let stored = h.bot.conversations().turns("c-1");
        assert_eq!(stored.len(), 2);
        assert!(stored[1].content.contains("what's up"));
    }

    #[tokio::test]
    async fn arbitration_failure_is_silent() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::Timeout(60))]);
        let history = StaticHistory::new(vec![raw("m-1", "u-1", "Alice", "hi", 1)]);
        let mut h = harness(provider, history);

        let outcome = h
            .bot
            .handle_event(message(raw("m-1", "u-1", "Alice", "hi", 1)))
            .await;
        assert_eq!(outcome, Outcome::Silent);
        assert!(h.channel.sent().is_empty());
    }

    #[tokio::test]
    async fn completion_failure_apologizes() {
        let provider = ScriptedProvider::new(vec![
            Ok("yes".into()),
            Err(ProviderError::ApiError {
                status_code: 500,
                message: "boom".into(),
            }),
        ]);
        let history = StaticHistory::new(vec![raw("m-1", "u-1", "Alice", "toaster?", 1)]);
        let mut h = harness(provider, history);

        let outcome = h
            .bot
            .handle_event(message(raw("m-1", "u-1", "Alice", "toaster?", 1)))
            .await;
        assert_eq!(outcome, Outcome::Apologized);
        assert_eq!(h.channel.sent(), vec![("c-1".to_string(), APOLOGY.to_string())]);
        assert_eq!(h.bot.conversations().turns("c-1").len(), 1);
    }

    #[tokio::test]
    async fn unparseable_verdict_is_spoken_when_enabled() {
        let provider = ScriptedProvider::new(vec![Ok("  Maybe later  ".into())]);
        let history = StaticHistory::new(vec![raw("m-1", "u-1", "Alice", "hmm", 1)]);
        let mut h = harness(provider, history);

        let outcome = h
            .bot
            .handle_event(message(raw("m-1", "u-1", "Alice", "hmm", 1)))
            .await;
        assert_eq!(outcome, Outcome::Replied("Maybe later".into()));
        assert_eq!(h.channel.typing_count(), 0);
    }

    #[tokio::test]
    async fn unparseable_verdict_is_silent_when_disabled() {
        let mut config = config();
        config.behavior.speak_unparseable_verdicts = false;
        let provider = ScriptedProvider::new(vec![Ok("perhaps".into())]);
        let history = StaticHistory::new(vec![raw("m-1", "u-1", "Alice", "hmm", 1)]);
        let mut h = harness_with(config, provider, history);

        let outcome = h
            .bot
            .handle_event(message(raw("m-1", "u-1", "Alice", "hmm", 1)))
            .await;
        assert_eq!(outcome, Outcome::Silent);
        assert!(h.channel.sent().is_empty());
    }

    #[tokio::test]
    async fn clearcontext_hides_older_history() {
        let provider = ScriptedProvider::new(vec![Ok("no".into()), Ok("no".into())]);
        let history = StaticHistory::new(vec![raw("m-1", "u-1", "Alice", "old news", 1)]);
        let mut h = harness(provider, history);

        h.bot
            .handle_event(message(raw("m-1", "u-1", "Alice", "old news", 1)))
            .await;
        assert_eq!(h.bot.conversations().turns("c-1").len(), 1);

        let clear = raw("m-2", "u-1", "Alice", "$clearcontext", 2);
        h.history.push_newest(clear.clone());
        let outcome = h.bot.handle_event(message(clear)).await;
        assert_eq!(outcome, Outcome::Command("*Message context cleared*".into()));

        let fresh = raw("m-3", "u-2", "Bob", "fresh start", 3);
        h.history.push_newest(fresh.clone());
        h.bot.handle_event(message(fresh)).await;

        let stored = h.bot.conversations().turns("c-1");
        assert_eq!(stored.len(), 1);
        assert!(stored[0].content.contains("fresh start"));
    }

    #[tokio::test]
    async fn persona_switch_changes_preamble() {
        let provider = ScriptedProvider::new(vec![Ok("yes".into()), Ok("Howdy.".into())]);
        let requests = provider.requests();
        let history = StaticHistory::new(vec![raw("m-2", "u-1", "Alice", "toaster?", 2)]);
        let mut h = harness(provider, history);

        h.bot
            .handle_event(message(raw("m-1", "u-1", "Alice", "$persona cowboy", 1)))
            .await;
        assert_eq!(h.bot.settings().persona.name(), "cowboy");

        h.bot
            .handle_event(message(raw("m-2", "u-1", "Alice", "toaster?", 2)))
            .await;
        let requests = requests.lock().unwrap();
        assert!(requests[1].turns[0].content.contains("cowboy"));
    }

    #[tokio::test]
    async fn run_processes_events_until_closed() {
        let provider = ScriptedProvider::new(vec![]);
        let h = harness(provider, StaticHistory::new(vec![]));
        let channel = h.channel.clone();

        let (tx, rx) = mpsc::channel(8);
        tx.send(Ok(message(raw("m-1", "u-1", "Alice", "$roast", 1))))
            .await
            .unwrap();
        tx.send(Err(ChannelError::InvalidPayload("junk".into())))
            .await
            .unwrap();
        tx.send(Ok(message(raw("m-2", "u-1", "Alice", "$8ball", 2))))
            .await
            .unwrap();
        drop(tx);

        h.bot.run(rx).await;
        let sent = channel.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].1.starts_with("*Command failed: "));
        assert_eq!(sent[1].1, "*Ask a question after $8ball, genius*");
    }
}
