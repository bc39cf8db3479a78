//! Built-in commands.
//!
//! [`BUILTINS`] is the one place commands are composed; the registry is
//! filled from it in order, so this order is also the `help` order.

pub mod basic;
pub mod fun;
pub mod models;

use crate::commands::CommandHandler;
use crate::commands::registry::HandlerFactory;

pub const BUILTINS: &[(&str, &str, HandlerFactory)] = &[
    ("help", "List all available commands and their descriptions", help),
    ("clearcontext", "Clear the message history for the current channel", clear_context),
    ("tokencheck", "Calculate the number of tokens in the current chat context", token_check),
    ("persona", "Show personas or switch to one (usage: persona [name])", persona),
    ("modellist", "Show all available AI models", model_list),
    (
        "modelswitch",
        "Switch AI models (usage: modelswitch -d|-c|-a model_id[,model_id])",
        model_switch,
    ),
    ("vibecheck", "Analyze the current chat vibe with AI", vibe_check),
    ("roast", "Generate an AI-powered playful roast", roast),
    ("8ball", "Ask the AI magic 8-ball a question (usage: 8ball your question)", eight_ball),
    ("gif", "Generate a reaction GIF based on recent chat context", gif),
];

fn help() -> Box<dyn CommandHandler> {
    Box::new(basic::Help)
}

fn clear_context() -> Box<dyn CommandHandler> {
    Box::new(basic::ClearContext)
}

fn token_check() -> Box<dyn CommandHandler> {
    Box::new(basic::TokenCheck)
}

fn persona() -> Box<dyn CommandHandler> {
    Box::new(basic::PersonaSwitch)
}

fn model_list() -> Box<dyn CommandHandler> {
    Box::new(models::ModelList)
}

fn model_switch() -> Box<dyn CommandHandler> {
    Box::new(models::ModelSwitch)
}

fn vibe_check() -> Box<dyn CommandHandler> {
    Box::new(fun::VibeCheck)
}

fn roast() -> Box<dyn CommandHandler> {
    Box::new(fun::Roast)
}

fn eight_ball() -> Box<dyn CommandHandler> {
    Box::new(fun::EightBall)
}

fn gif() -> Box<dyn CommandHandler> {
    Box::new(fun::Gif)
}
