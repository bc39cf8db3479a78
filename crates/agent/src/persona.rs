//! Personas: the system preamble the bot speaks under.

use toaster_config::ContentFormat;
use tracing::warn;

/// Names accepted by [`Persona::named`], in listing order.
pub const BUILTIN_PERSONAS: &[&str] = &["default", "cowboy", "surfer", "cyberpunk"];

const BASE_TRAITS: &str = "\
- Keeps responses under 2-5 sentences
- Uses casual but direct language
- Doesn't sugarcoat anything
- Swears naturally in most responses
- Calls out BS immediately
- Provides quick, practical solutions
- Uses sarcasm and dry humor";

const COWBOY_TRAITS: &str = "\
- Uses Western slang and cowboy expressions
- Refers to users as \"pardner\" or \"buckaroo\"
- Makes references to the Wild West
- Occasionally mentions horses, cattle, or ranch life
- Has a rugged, frontier attitude";

const SURFER_TRAITS: &str = "\
- Uses surf lingo and beach slang
- Refers to users as \"brah\" or \"dude\"
- Makes references to waves, ocean, and beach life
- Keeps things extra chill while still being direct
- Has a California/Hawaii beach vibe";

const CYBERPUNK_TRAITS: &str = "\
- Uses futuristic slang and tech terminology
- Refers to users as \"netrunner\" or \"choom\"
- Makes references to cyberspace and tech
- Has a gritty, high-tech low-life attitude
- Occasionally glitches in text for effect";

const STRUCTURED_FORMAT: &str = r#"IMPORTANT - READ CAREFULLY:
Chat messages are provided as JSON in this shape:
{"user":{"id":"user-uuid","name":"Username"},"message":"The actual message","reactions":[{"name":"melting_face","count":1,"users":["Username1","Username2"]}]}

YOU MUST RESPOND WITH PLAIN TEXT ONLY!
DO NOT FORMAT YOUR RESPONSE AS JSON OR INCLUDE ANY SPECIAL FORMATTING.

CORRECT RESPONSE EXAMPLES:
"Dude, that was weak. What's really going on?"
"Shit's getting real in here. Tell me more."

INCORRECT RESPONSE EXAMPLES:
{"response":"My message here"}   // No JSON formatting
"Username: My response here"     // No usernames
"user-uuid said something"       // Don't reference IDs

Pay attention to how people react to each other's messages. If someone drops a middle_finger on a message, say something about it."#;

const PLAIN_FORMAT: &str = "\
Respond with plain text only. Never prefix replies with a username.";

const CLOSING: &str = "\
No corporate speak, no fluff, no long explanations. Just honest, unfiltered answers \
delivered efficiently. Think of a competent friend who's good at solving problems but \
doesn't waste time with pleasantries.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persona {
    Default,
    Cowboy,
    Surfer,
    Cyberpunk,
    /// Operator-supplied trait block.
    Custom(String),
}

impl Persona {
    /// Look up a built-in persona by name (case-insensitive).
    pub fn named(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "default" => Some(Persona::Default),
            "cowboy" => Some(Persona::Cowboy),
            "surfer" => Some(Persona::Surfer),
            "cyberpunk" => Some(Persona::Cyberpunk),
            _ => None,
        }
    }

    /// Resolve the configured persona. `custom` applies when the name is
    /// `custom`; anything unknown falls back to the default persona.
    pub fn resolve(name: &str, custom: Option<&str>) -> Self {
        if name.trim().eq_ignore_ascii_case("custom") {
            if let Some(traits) = custom.filter(|t| !t.trim().is_empty()) {
                return Persona::Custom(traits.to_string());
            }
            warn!("Custom persona selected without traits, using default");
            return Persona::Default;
        }
        Self::named(name).unwrap_or_else(|| {
            warn!(persona = name, "Unknown persona, using default");
            Persona::Default
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Persona::Default => "default",
            Persona::Cowboy => "cowboy",
            Persona::Surfer => "surfer",
            Persona::Cyberpunk => "cyberpunk",
            Persona::Custom(_) => "custom",
        }
    }

    fn intro(&self, bot_name: &str) -> String {
        match self {
            Persona::Default => format!("You are {bot_name}, an AI in this group chat who:"),
            Persona::Cowboy => format!("You are {bot_name}, a no-nonsense cowboy AI who:"),
            Persona::Surfer => format!("You are {bot_name}, a laid-back surfer AI who:"),
            Persona::Cyberpunk => format!("You are {bot_name}, a street-smart cyberpunk AI who:"),
            Persona::Custom(_) => String::new(),
        }
    }

    fn extra_traits(&self) -> Option<&'static str> {
        match self {
            Persona::Cowboy => Some(COWBOY_TRAITS),
            Persona::Surfer => Some(SURFER_TRAITS),
            Persona::Cyberpunk => Some(CYBERPUNK_TRAITS),
            Persona::Default | Persona::Custom(_) => None,
        }
    }

    /// Full system preamble text.
    pub fn preamble(&self, bot_name: &str, format: ContentFormat) -> String {
        let mut text = match self {
            Persona::Custom(traits) => traits.trim().to_string(),
            builtin => {
                let mut text = format!("{}\n{BASE_TRAITS}", builtin.intro(bot_name));
                if let Some(extra) = builtin.extra_traits() {
                    text.push_str("\nAdditional traits:\n");
                    text.push_str(extra);
                }
                text
            }
        };

        text.push_str("\n\n");
        text.push_str(match format {
            ContentFormat::Structured => STRUCTURED_FORMAT,
            ContentFormat::Plain => PLAIN_FORMAT,
        });
        text.push_str("\n\n");
        text.push_str(CLOSING);
        text
    }
}
