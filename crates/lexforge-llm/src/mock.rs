//! Mock LLM client for testing
//!
//! Returns queued replies in order, then a default response. Every request is
//! recorded so tests can assert on prompts and models.

use crate::client::LlmClient;
use crate::completion::{GenerateRequest, GenerateResponse, TokenUsage};
use crate::error::{Error, Result};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A scripted reply
#[derive(Debug)]
pub enum MockReply {
    /// Successful response
    Response(GenerateResponse),
    /// Failure
    Failure(Error),
}

/// A mock LLM client that returns queued replies or a default one
pub struct MockClient {
    name: String,
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
    latency: Option<Duration>,
    default_usage: Option<TokenUsage>,
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new("mock")
    }
}

impl MockClient {
    /// Create a new mock client
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            latency: None,
            default_usage: None,
        }
    }

    /// Sleep this long before every reply
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Usage attached to the default response
    #[must_use]
    pub fn with_default_usage(mut self, usage: TokenUsage) -> Self {
        self.default_usage = Some(usage);
        self
    }

    /// Queue a text response
    pub fn push_text(&self, content: impl Into<String>) {
        self.push(MockReply::Response(GenerateResponse::text(content)));
    }

    /// Queue a failure
    pub fn push_error(&self, error: Error) {
        self.push(MockReply::Failure(error));
    }

    /// Queue any reply
    pub fn push(&self, reply: MockReply) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of calls received
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_text(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let model = request.model.clone();
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match reply {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Failure(error)) => Err(error),
            None => {
                let mut response = GenerateResponse::text("mock response");
                response.model = Some(model);
                response.usage = self.default_usage.clone();
                Ok(response)
            }
        }
    }
}
