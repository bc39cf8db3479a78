//! GIF search trait: the reaction-GIF collaborator used by the `gif` command.

use async_trait::async_trait;

use crate::error::ProviderError;

/// Looks up a reaction GIF for a short search term.
#[async_trait]
pub trait GifSearch: Send + Sync {
    /// Return a GIF URL for `query`, or `None` when nothing matched.
    async fn search(&self, query: &str) -> Result<Option<String>, ProviderError>;
}
