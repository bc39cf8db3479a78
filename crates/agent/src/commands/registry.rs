//! Command registry.
//!
//! Built once at startup from an explicit list; a name can be registered
//! only once.

use std::collections::HashMap;

use crate::commands::CommandHandler;
use crate::commands::builtin::BUILTINS;

/// Builds a fresh handler for one dispatch.
pub type HandlerFactory = fn() -> Box<dyn CommandHandler>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command '{0}' is already registered")]
    DuplicateCommand(String),

    #[error("invalid command name '{0}'")]
    InvalidName(String),
}

/// One registered command.
#[derive(Clone)]
pub struct CommandEntry {
    pub name: String,
    pub description: String,
    pub factory: HandlerFactory,
}

impl std::fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in command.
    pub fn with_builtins() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (name, description, factory) in BUILTINS {
            registry.register(*name, *description, *factory)?;
        }
        Ok(registry)
    }

    /// Register a command. Names are case-insensitive and must be unique.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        factory: HandlerFactory,
    ) -> Result<(), RegistryError> {
        let name = name.into().to_lowercase();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(RegistryError::InvalidName(name));
        }
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateCommand(name));
        }

        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(CommandEntry {
            name,
            description: description.into(),
            factory,
        });
        Ok(())
    }

    /// Look up a command by (already lower-cased) name.
    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
