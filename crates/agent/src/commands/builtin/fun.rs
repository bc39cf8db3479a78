//! Generators that ask the chat model for a one-off reply.

use async_trait::async_trait;
use toaster_core::message::Turn;
use tracing::{debug, warn};

use crate::commands::{CommandContext, CommandError, CommandHandler};

const VIBE_DIRECTIVE: &str = "\
You are {name}, analyzing the vibe of a chat. Be brutally honest, sarcastic, and use casual language.
Based on the recent messages, describe the chat's energy level and overall vibe in 1-2 sentences.
Use descriptive language that captures both the activity level and the emotional tone.
Be creative and don't hold back - if it's dead, say it's dead. If it's lit, hype it up.";

const ROAST_DIRECTIVE: &str = "\
You are {name}, generating a creative roast. Keep it:
- Playful and clever, not mean-spirited
- Original and specific
- One sentence only
- Funny but not overly offensive
- Using casual, modern language";

const EIGHT_BALL_DIRECTIVE: &str = "\
You are {name}, a snarky AI magic 8-ball. Given a question:
- Give a definitive yes/no/maybe response
- Add a sarcastic or witty comment
- Keep it to one sentence
- Be creative and unpredictable
- Use casual, modern language";

const GIF_DIRECTIVE: &str = r#"RESPOND WITH ONLY THE SEARCH TERM, NO OTHER TEXT.
You are finding a reaction GIF for the chat. Based on the messages, give a 2-4 word search term for a reaction GIF.
Focus on popular memes, reactions, or emotions. Examples: "deal with it", "mind blown", "facepalm", "thug life", etc.
DO NOT include phrases like "Search query:" or any other text. ONLY the search term."#;

fn directive(template: &str, bot_name: &str) -> Turn {
    Turn::system(template.replace("{name}", bot_name))
}

/// The last `n` dialogue turns of the channel, rebuilt from platform history
/// and honoring the channel's horizon. A fetch failure becomes the reply.
async fn recent_dialogue(ctx: &CommandContext<'_>, n: usize) -> Result<Vec<Turn>, String> {
    let services = ctx.services;
    let history = services
        .history
        .fetch(ctx.channel_id, services.history_limit, None)
        .await
        .map_err(|e| {
            warn!(channel_id = ctx.channel_id, error = %e, "History fetch failed");
            let reason = match e {
                toaster_core::ChannelError::HistoryFetch { reason, .. } => reason,
                other => other.to_string(),
            };
            format!("*Failed to fetch message history: {reason}*")
        })?;

    let turns = services
        .assembler
        .assemble(&history, None, ctx.conversations.horizon(ctx.channel_id))
        .map_err(|e| format!("*Failed to fetch message history: {e}*"))?;

    let skip = turns.len().saturating_sub(n);
    Ok(turns.into_iter().skip(skip).collect())
}

/// Strip quoting and casing from the model's search term.
fn clean_search_term(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_lowercase()
}

pub struct VibeCheck;

#[async_trait]
impl CommandHandler for VibeCheck {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _args: &str,
    ) -> Result<String, CommandError> {
        let recent = match recent_dialogue(ctx, 10).await {
            Ok(turns) => turns,
            Err(reply) => return Ok(reply),
        };
        if recent.is_empty() {
            return Ok("*Channel's dead AF, no vibe detected*".into());
        }

        let mut window = vec![directive(VIBE_DIRECTIVE, &ctx.services.bot_name)];
        window.extend(recent);
        let reply = ctx
            .services
            .invoker
            .complete(&ctx.settings.chat_model, window)
            .await?;
        Ok(format!("*{}*", reply.trim()))
    }
}

pub struct Roast;

#[async_trait]
impl CommandHandler for Roast {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        args: &str,
    ) -> Result<String, CommandError> {
        let mut window = vec![directive(ROAST_DIRECTIVE, &ctx.services.bot_name)];
        if !args.is_empty() {
            window.push(Turn::user(format!("Roast {args}")));
        }
        let reply = ctx
            .services
            .invoker
            .complete(&ctx.settings.chat_model, window)
            .await?;
        Ok(format!("*{}*", reply.trim()))
    }
}

pub struct EightBall;

#[async_trait]
impl CommandHandler for EightBall {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        args: &str,
    ) -> Result<String, CommandError> {
        if args.is_empty() {
            return Ok(format!(
                "*Ask a question after {}8ball, genius*",
                ctx.services.sentinel
            ));
        }

        let window = vec![
            directive(EIGHT_BALL_DIRECTIVE, &ctx.services.bot_name),
            Turn::user(args),
        ];
        let reply = ctx
            .services
            .invoker
            .complete(&ctx.settings.chat_model, window)
            .await?;
        Ok(format!("*{}*", reply.trim()))
    }
}

/// Asks the chat model for a search term, then the GIF collaborator for a hit.
pub struct Gif;

#[async_trait]
impl CommandHandler for Gif {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _args: &str,
    ) -> Result<String, CommandError> {
        let recent = match recent_dialogue(ctx, 5).await {
            Ok(turns) => turns,
            Err(reply) => return Ok(reply),
        };
        if recent.is_empty() {
            return Ok("*No chat context found to generate a GIF from*".into());
        }

        let mut window = vec![Turn::system(GIF_DIRECTIVE)];
        window.extend(recent);
        let raw = ctx
            .services
            .invoker
            .complete(&ctx.settings.chat_model, window)
            .await?;
        let term = clean_search_term(&raw);
        debug!(term = %term, "GIF search term");

        match ctx.services.gifs.search(&term).await {
            Ok(Some(url)) => Ok(format!("![{term}]({url})")),
            Ok(None) => Ok("*Couldn't find a dank enough GIF, my bad*".into()),
            Err(e) => {
                warn!(error = %e, "GIF search failed");
                Ok("*GIF search failed, but I'll keep it real - something's wrong with the GIF service*"
                    .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ConversationStore;
    use crate::test_helpers::{
        ScriptedProvider, StaticGifs, StaticHistory, default_settings, raw, run_handler, services_with,
    };
    use std::sync::Arc;
    use toaster_core::error::ProviderError;
    use toaster_core::message::Role;

    fn chatter(count: usize) -> Vec<toaster_core::RawMessage> {
        // newest first
        (0..count)
            .rev()
            .map(|i| raw(&format!("m{i}"), "u-1", "Alice", &format!("line {i}"), i as i64 + 1))
            .collect()
    }

    #[tokio::test]
    async fn vibecheck_uses_last_ten_turns() {
        let provider = ScriptedProvider::new(vec![Ok("  Chill vibes only.  ".into())]);
        let requests = provider.requests();
        let services = services_with(
            provider,
            Arc::new(StaticHistory::new(chatter(14))),
            Arc::new(StaticGifs::with_result(Ok(None))),
        );
        let mut settings = default_settings();
        let mut store = ConversationStore::new();

        let reply = run_handler(&VibeCheck, "", &mut settings, &mut store, &services)
            .await
            .unwrap();
        assert_eq!(reply, "*Chill vibes only.*");

        let requests = requests.lock().unwrap();
        assert_eq!(requests[0].model, "chat-model");
        let turns = &requests[0].turns;
        assert_eq!(turns.len(), 11);
        assert_eq!(turns[0].role, Role::System);
        assert!(turns[0].content.starts_with("You are Toaster, analyzing the vibe"));
        assert!(turns[1].content.contains("line 4"));
        assert!(turns[10].content.contains("line 13"));
    }

    #[tokio::test]
    async fn vibecheck_on_empty_channel() {
        let services = services_with(
            ScriptedProvider::new(vec![]),
            Arc::new(StaticHistory::new(vec![])),
            Arc::new(StaticGifs::with_result(Ok(None))),
        );
        let mut settings = default_settings();
        let mut store = ConversationStore::new();
        let reply = run_handler(&VibeCheck, "", &mut settings, &mut store, &services)
            .await
            .unwrap();
        assert_eq!(reply, "*Channel's dead AF, no vibe detected*");
    }

    #[tokio::test]
    async fn history_failure_is_reported() {
        let services = services_with(
            ScriptedProvider::new(vec![]),
            Arc::new(StaticHistory::failing()),
            Arc::new(StaticGifs::with_result(Ok(None))),
        );
        let mut settings = default_settings();
        let mut store = ConversationStore::new();
        let reply = run_handler(&VibeCheck, "", &mut settings, &mut store, &services)
            .await
            .unwrap();
        assert_eq!(reply, "*Failed to fetch message history: status 502*");
    }

    #[tokio::test]
    async fn model_failure_surfaces_as_command_error() {
        let services = services_with(
            ScriptedProvider::new(vec![Err(ProviderError::EmptyResponse)]),
            Arc::new(StaticHistory::new(vec![])),
            Arc::new(StaticGifs::with_result(Ok(None))),
        );
        let mut settings = default_settings();
        let mut store = ConversationStore::new();
        let err = run_handler(&Roast, "", &mut settings, &mut store, &services)
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Model(_)));
    }

    #[tokio::test]
    async fn roast_with_and_without_target() {
        let provider = ScriptedProvider::new(vec![Ok("Burn.".into()), Ok("Toast.".into())]);
        let requests = provider.requests();
        let services = services_with(
            provider,
            Arc::new(StaticHistory::new(vec![])),
            Arc::new(StaticGifs::with_result(Ok(None))),
        );
        let mut settings = default_settings();
        let mut store = ConversationStore::new();

        let reply = run_handler(&Roast, "", &mut settings, &mut store, &services)
            .await
            .unwrap();
        assert_eq!(reply, "*Burn.*");
        let reply = run_handler(&Roast, "Bob", &mut settings, &mut store, &services)
            .await
            .unwrap();
        assert_eq!(reply, "*Toast.*");

        let requests = requests.lock().unwrap();
        assert_eq!(requests[0].turns.len(), 1);
        assert_eq!(requests[1].turns.len(), 2);
        assert_eq!(requests[1].turns[1].content, "Roast Bob");
    }

    #[tokio::test]
    async fn eight_ball_needs_a_question() {
        let provider = ScriptedProvider::new(vec![Ok("Hell yes.".into())]);
        let requests = provider.requests();
        let services = services_with(
            provider,
            Arc::new(StaticHistory::new(vec![])),
            Arc::new(StaticGifs::with_result(Ok(None))),
        );
        let mut settings = default_settings();
        let mut store = ConversationStore::new();

        let reply = run_handler(&EightBall, "", &mut settings, &mut store, &services)
            .await
            .unwrap();
        assert_eq!(reply, "*Ask a question after $8ball, genius*");

        let reply = run_handler(&EightBall, "will it rain?", &mut settings, &mut store, &services)
            .await
            .unwrap();
        assert_eq!(reply, "*Hell yes.*");
        assert_eq!(requests.lock().unwrap()[0].turns[1].content, "will it rain?");
    }

    #[tokio::test]
    async fn gif_searches_cleaned_term() {
        let gifs = Arc::new(StaticGifs::found("https://media.example/facepalm.gif"));
        let provider = ScriptedProvider::new(vec![Ok("\"Mind Blown\"\n".into())]);
        let requests = provider.requests();
        let services = services_with(
            provider,
            Arc::new(StaticHistory::new(chatter(8))),
            Arc::clone(&gifs),
        );
        let mut settings = default_settings();
        let mut store = ConversationStore::new();

        let reply = run_handler(&Gif, "", &mut settings, &mut store, &services)
            .await
            .unwrap();
        assert_eq!(reply, "![mind blown](https://media.example/facepalm.gif)");
        assert_eq!(gifs.queries(), vec!["mind blown".to_string()]);
        assert_eq!(requests.lock().unwrap()[0].turns.len(), 6);
    }

    #[tokio::test]
    async fn gif_miss_and_failure() {
        let mut settings = default_settings();
        let mut store = ConversationStore::new();

        let services = services_with(
            ScriptedProvider::new(vec![Ok("facepalm".into())]),
            Arc::new(StaticHistory::new(chatter(2))),
            Arc::new(StaticGifs::with_result(Ok(None))),
        );
        let reply = run_handler(&Gif, "", &mut settings, &mut store, &services)
            .await
            .unwrap();
        assert_eq!(reply, "*Couldn't find a dank enough GIF, my bad*");

        let services = services_with(
            ScriptedProvider::new(vec![Ok("facepalm".into())]),
            Arc::new(StaticHistory::new(chatter(2))),
            Arc::new(StaticGifs::with_result(Err(ProviderError::Network("down".into())))),
        );
        let reply = run_handler(&Gif, "", &mut settings, &mut store, &services)
            .await
            .unwrap();
        assert!(reply.starts_with("*GIF search failed"));
    }

    #[tokio::test]
    async fn gif_respects_cleared_context() {
        let services = services_with(
            ScriptedProvider::new(vec![]),
            Arc::new(StaticHistory::new(chatter(3))),
            Arc::new(StaticGifs::with_result(Ok(None))),
        );
        let mut settings = default_settings();
        let mut store = ConversationStore::new();
        store.replace("c-1", vec![Turn::user("x").at(3)]);
        store.observe("c-1", 3);
        assert!(store.clear("c-1"));

        let reply = run_handler(&Gif, "", &mut settings, &mut store, &services)
            .await
            .unwrap();
        assert_eq!(reply, "*No chat context found to generate a GIF from*");
    }

    #[test]
    fn search_term_cleanup() {
        assert_eq!(clean_search_term("  'Deal With It' "), "deal with it");
        assert_eq!(clean_search_term("facepalm"), "facepalm");
    }
}
