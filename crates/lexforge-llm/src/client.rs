//! LLM client contract
//!
//! Provider adapters (Google, OpenAI, Anthropic, ...) live outside this crate
//! and only need to implement [`LlmClient`].

use crate::completion::{GenerateRequest, GenerateResponse};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Uniform text generation contract
///
/// Adapters must return an error (wrapping the transport failure) instead of
/// a partially populated success response.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider id this client talks to
    fn name(&self) -> &str;

    /// Generate text for a conversation
    async fn generate_text(&self, request: GenerateRequest) -> Result<GenerateResponse>;
}

/// Provider id -> client lookup
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, Arc<dyn LlmClient>>,
}

impl ClientRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client under a provider id
    pub fn register(&mut self, provider: impl Into<String>, client: Arc<dyn LlmClient>) {
        let provider = provider.into();
        debug!(provider = %provider, client = client.name(), "Registering LLM client");
        self.clients.insert(provider, client);
    }

    /// Builder-style register
    #[must_use]
    pub fn with(mut self, provider: impl Into<String>, client: Arc<dyn LlmClient>) -> Self {
        self.register(provider, client);
        self
    }

    /// Client for a provider
    pub fn get(&self, provider: &str) -> Result<Arc<dyn LlmClient>> {
        self.clients
            .get(provider)
            .cloned()
            .ok_or_else(|| Error::NotConfigured(provider.to_string()))
    }

    /// Registered provider ids
    #[must_use]
    pub fn providers(&self) -> Vec<&str> {
        self.clients.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}
