//! Scripted collaborators shared by the agent tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use toaster_core::channel::{Channel, ChannelEvent, HistorySource, RawMessage};
use toaster_core::error::{ChannelError, ProviderError};
use toaster_core::message::Speaker;
use toaster_core::provider::{ModelInfo, Provider, ProviderRequest, ProviderResponse};
use toaster_core::GifSearch;

/// A provider that answers from a queue of scripted results.
///
/// Panics if more completions are requested than were scripted.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
    models: Result<Vec<ModelInfo>, ProviderError>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
            models: Ok(Vec::new()),
            delay: None,
        }
    }

    pub fn with_models(mut self, ids: &[&str]) -> Self {
        self.models = Ok(ids
            .iter()
            .map(|id| ModelInfo { id: id.to_string() })
            .collect());
        self
    }

    pub fn with_models_error(mut self, err: ProviderError) -> Self {
        self.models = Err(err);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Handle to the requests seen so far.
    pub fn requests(&self) -> Arc<Mutex<Vec<ProviderRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let Some(next) = next else {
            panic!("ScriptedProvider: no more responses");
        };
        next.map(|content| ProviderResponse {
            content,
            usage: None,
            model,
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        self.models.clone()
    }
}

/// A history source serving a fixed newest-first batch.
pub struct StaticHistory {
    messages: Mutex<Vec<RawMessage>>,
    fail: bool,
    fetches: AtomicUsize,
}

impl StaticHistory {
    pub fn new(newest_first: Vec<RawMessage>) -> Self {
        Self {
            messages: Mutex::new(newest_first),
            fail: false,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    /// Add a message as the newest one.
    pub fn push_newest(&self, msg: RawMessage) {
        self.messages.lock().unwrap().insert(0, msg);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistorySource for StaticHistory {
    async fn fetch(
        &self,
        channel_id: &str,
        limit: usize,
        _before_id: Option<&str>,
    ) -> Result<Vec<RawMessage>, ChannelError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ChannelError::HistoryFetch {
                channel: channel_id.to_string(),
                reason: "status 502".into(),
            });
        }
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }
}

/// A channel that records what the bot posts.
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<(String, String)>>,
    typing: AtomicUsize,
}

impl RecordingChannel {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn typing_count(&self) -> usize {
        self.typing.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<ChannelEvent, ChannelError>>, ChannelError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn send(&self, channel_id: &str, content: &str) -> Result<(), ChannelError> {
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn send_typing(&self, _channel_id: &str) -> Result<(), ChannelError> {
        self.typing.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A GIF search with a canned answer.
pub struct StaticGifs {
    result: Result<Option<String>, ProviderError>,
    queries: Mutex<Vec<String>>,
}

impl StaticGifs {
    pub fn found(url: &str) -> Self {
        Self::with_result(Ok(Some(url.to_string())))
    }

    pub fn with_result(result: Result<Option<String>, ProviderError>) -> Self {
        Self {
            result,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl GifSearch for StaticGifs {
    async fn search(&self, query: &str) -> Result<Option<String>, ProviderError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.result.clone()
    }
}

pub const BOT_ID: &str = "bot-1";

/// Build a platform message.
pub fn raw(id: &str, author_id: &str, author_name: &str, text: &str, ts: i64) -> RawMessage {
    RawMessage {
        id: id.into(),
        author: Speaker::new(author_id, author_name),
        text: text.into(),
        created_at: ts,
        reactions: vec![],
    }
}

/// Services wired to scripted collaborators, with default behavior config.
pub fn services_with(
    provider: ScriptedProvider,
    history: Arc<StaticHistory>,
    gifs: Arc<StaticGifs>,
) -> crate::services::BotServices {
    use toaster_config::ContentFormat;

    crate::services::BotServices {
        invoker: crate::invoke::ModelInvoker::new(Arc::new(provider), Duration::from_secs(5)),
        history,
        gifs,
        assembler: crate::context::ContextAssembler::new(BOT_ID, '$', ContentFormat::Structured),
        history_limit: 20,
        bot_name: "Toaster".into(),
        sentinel: '$',
        custom_persona: None,
    }
}

pub fn default_settings() -> crate::commands::BotSettings {
    crate::commands::BotSettings {
        decision_model: "dec-model".into(),
        chat_model: "chat-model".into(),
        persona: crate::persona::Persona::Default,
    }
}

/// Run one handler directly against `settings` and `store`.
pub async fn run_handler(
    handler: &dyn crate::commands::CommandHandler,
    args: &str,
    settings: &mut crate::commands::BotSettings,
    store: &mut crate::context::ConversationStore,
    services: &crate::services::BotServices,
) -> Result<String, crate::commands::CommandError> {
    let registry = crate::commands::CommandRegistry::with_builtins()
        .expect("builtin commands register cleanly");
    let mut ctx = crate::commands::CommandContext {
        channel_id: "c-1",
        settings,
        conversations: store,
        services,
        catalog: registry.entries(),
    };
    handler.execute(&mut ctx, args).await
}
