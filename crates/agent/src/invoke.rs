//! Model invocation adapter.
//!
//! Every model call in the bot goes through [`ModelInvoker`]. The provider
//! call runs on its own task so the event loop is never parked on a slow
//! backend, and it is bounded by a timeout. Whatever goes wrong comes back
//! as one [`ModelInvocationFailure`]; nothing is retried here.

use std::sync::Arc;
use std::time::Duration;

use toaster_core::error::{ModelInvocationFailure, ProviderError};
use toaster_core::message::Turn;
use toaster_core::provider::{ModelInfo, Provider, ProviderRequest};
use tracing::{debug, warn};

pub struct ModelInvoker {
    provider: Arc<dyn Provider>,
    timeout: Duration,
    temperature: f32,
}

impl ModelInvoker {
    pub fn new(provider: Arc<dyn Provider>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            temperature: 0.7,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run one completion and return the first choice's text.
    pub async fn complete(
        &self,
        model: &str,
        turns: Vec<Turn>,
    ) -> Result<String, ModelInvocationFailure> {
        let request = ProviderRequest::new(model, turns).with_temperature(self.temperature);
        let provider = Arc::clone(&self.provider);

        debug!(model, turns = request.turns.len(), "Invoking model");
        let outcome = self
            .bounded(async move { provider.complete(request).await })
            .await;

        match outcome {
            Ok(response) => Ok(response.content),
            Err(e) => {
                warn!(model, error = %e, "Model invocation failed");
                Err(ModelInvocationFailure::new(model, e))
            }
        }
    }

    /// List the models the backend can serve, under the same timeout.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        let provider = Arc::clone(&self.provider);
        self.bounded(async move { provider.list_models().await })
            .await
    }

    /// Spawn `fut`, wait at most `self.timeout`, and fold join and timeout
    /// failures into [`ProviderError`].
    async fn bounded<T, F>(&self, fut: F) -> Result<T, ProviderError>
    where
        T: Send + 'static,
        F: std::future::Future<Output = Result<T, ProviderError>> + Send + 'static,
    {
        let mut handle = tokio::spawn(fut);
        match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ProviderError::WorkerFailed(join_err.to_string())),
            Err(_) => {
                handle.abort();
                Err(ProviderError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}
