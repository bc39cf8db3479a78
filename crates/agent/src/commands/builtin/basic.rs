//! Housekeeping commands: help, context control, personas.

use async_trait::async_trait;

use crate::commands::{CommandContext, CommandError, CommandHandler};
use crate::context::RoleBreakdown;
use crate::persona::{BUILTIN_PERSONAS, Persona};

pub const NO_CONTEXT: &str = "*No message context found for this channel*";

pub struct Help;

#[async_trait]
impl CommandHandler for Help {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _args: &str,
    ) -> Result<String, CommandError> {
        let sentinel = ctx.services.sentinel;
        let mut text = String::from("Available commands:\n\n");
        for entry in ctx.catalog {
            text.push_str(&format!("{sentinel}{}: {}\n", entry.name, entry.description));
        }
        Ok(format!("```\n{text}```"))
    }
}

pub struct ClearContext;

#[async_trait]
impl CommandHandler for ClearContext {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _args: &str,
    ) -> Result<String, CommandError> {
        if ctx.conversations.clear(ctx.channel_id) {
            Ok("*Message context cleared*".into())
        } else {
            Ok(NO_CONTEXT.into())
        }
    }
}

/// Token usage of the stored window, preamble included.
pub struct TokenCheck;

#[async_trait]
impl CommandHandler for TokenCheck {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _args: &str,
    ) -> Result<String, CommandError> {
        let turns = ctx.conversations.turns(ctx.channel_id);
        if turns.is_empty() {
            return Ok(NO_CONTEXT.into());
        }

        let mut window = vec![ctx.services.preamble(&ctx.settings.persona)];
        window.extend_from_slice(turns);
        let breakdown = RoleBreakdown::of(&window);

        let mut text = format!("Total tokens: {}\n\nBreakdown:\n", breakdown.total());
        for (role, tokens) in breakdown.entries() {
            text.push_str(&format!("- {role}: {tokens} tokens\n"));
        }
        Ok(format!("```\n{text}```"))
    }
}

/// `persona` lists personas; `persona <name>` switches.
pub struct PersonaSwitch;

#[async_trait]
impl CommandHandler for PersonaSwitch {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        args: &str,
    ) -> Result<String, CommandError> {
        let custom = ctx.services.custom_persona.as_deref();
        let requested = args.split_whitespace().next().unwrap_or("");

        if requested.is_empty() {
            let current = ctx.settings.persona.name();
            let mut names: Vec<&str> = BUILTIN_PERSONAS.to_vec();
            if custom.is_some() {
                names.push("custom");
            }
            let mut text = String::from("Available personas:\n\n");
            for name in names {
                text.push_str("- ");
                text.push_str(name);
                if name == current {
                    text.push_str(" (current)");
                }
                text.push('\n');
            }
            return Ok(format!("```\n{text}```"));
        }

        let persona = if requested.eq_ignore_ascii_case("custom") {
            custom.map(|traits| Persona::Custom(traits.to_string()))
        } else {
            Persona::named(requested)
        };

        match persona {
            Some(persona) => {
                let reply = format!("*Persona switched to: {}*", persona.name());
                ctx.settings.persona = persona;
                Ok(reply)
            }
            None => Ok(format!(
                "*Unknown persona '{requested}'. Use {}persona to see available personas.*",
                ctx.services.sentinel
            )),
        }
    }
}
