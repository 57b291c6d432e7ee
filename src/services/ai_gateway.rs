//! Ordered LLM provider fallback with bounded exponential-backoff retry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Http(String),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider returned an empty answer")]
    Empty,
    #[error("no AI providers registered")]
    NoProviders,
    #[error("all AI providers failed: {}", describe_failures(.0))]
    AllFailed(Vec<ProviderFailure>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: String,
}

fn describe_failures(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.provider, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
pub trait AiProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct AiReply {
    pub text: String,
    pub provider: String,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Pause after a failed `attempt` (1-based): `2^attempt * base_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

pub struct AiGateway {
    providers: Vec<Arc<dyn AiProvider>>,
    retry: RetryPolicy,
}

impl AiGateway {
    pub fn new(providers: Vec<Arc<dyn AiProvider>>, retry: RetryPolicy) -> Self {
        Self { providers, retry }
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub async fn complete(&self, prompt: &str) -> Result<AiReply, AiError> {
        if self.providers.is_empty() {
            return Err(AiError::NoProviders);
        }

        let mut failures = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            match self.call_with_retry(provider.as_ref(), prompt).await {
                Ok(text) => {
                    return Ok(AiReply {
                        text,
                        provider: provider.name().to_string(),
                    });
                }
                Err(e) => {
                    tracing::error!("[ai] {} failed: {}, trying next provider", provider.name(), e);
                    failures.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Err(AiError::AllFailed(failures))
    }

    async fn call_with_retry(&self, provider: &dyn AiProvider, prompt: &str) -> Result<String, AiError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match provider.generate(prompt).await {
                Ok(text) => return Ok(text),
                // retrying cannot fix a missing key
                Err(e @ AiError::NotConfigured(_)) => return Err(e),
                Err(e) if attempt >= max_attempts => return Err(e),
                Err(e) => {
                    let delay = self.retry.delay_after(attempt);
                    tracing::warn!(
                        "[ai] {} attempt {} failed ({}), retrying in {}ms",
                        provider.name(),
                        attempt,
                        e,
                        delay.as_millis()
                    );
                    time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
