//! Push messaging
//!
//! The fan-out coordinator delivers through the [`Messenger`] trait. The
//! production implementation posts to an HTTP push function that fans out
//! to device tokens.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::MessagingConfig;
use crate::utils::errors::{LotteryError, Result};

/// Delivers one message to one entrant
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, entrant_id: &str, title: &str, body: &str, data: &HashMap<String, String>) -> Result<()>;
}

/// Resolves an entrant to their device push token
#[async_trait]
pub trait TokenDirectory: Send + Sync {
    async fn token_for(&self, entrant_id: &str) -> Result<Option<String>>;
}

#[derive(Default)]
pub struct InMemoryTokenDirectory {
    tokens: RwLock<HashMap<String, String>>,
}

impl InMemoryTokenDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, entrant_id: &str, token: &str) {
        self.tokens.write().await.insert(entrant_id.to_string(), token.to_string());
    }

    pub async fn remove(&self, entrant_id: &str) {
        self.tokens.write().await.remove(entrant_id);
    }
}

#[async_trait]
impl TokenDirectory for InMemoryTokenDirectory {
    async fn token_for(&self, entrant_id: &str) -> Result<Option<String>> {
        Ok(self.tokens.read().await.get(entrant_id).cloned())
    }
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    tokens: Vec<String>,
    title: &'a str,
    body: &'a str,
    data: &'a HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushResponse {
    #[serde(default)]
    success_count: u32,
    #[serde(default)]
    failure_count: u32,
}

/// Posts `{ tokens, title, body, data }` to the push function
pub struct HttpPushMessenger {
    client: reqwest::Client,
    endpoint: Url,
    tokens: Arc<dyn TokenDirectory>,
    limiter: DefaultDirectRateLimiter,
}

impl HttpPushMessenger {
    pub fn new(config: &MessagingConfig, tokens: Arc<dyn TokenDirectory>) -> Result<Self> {
        let endpoint = Url::parse(&config.function_url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        let per_second = NonZeroU32::new(config.rate_limit_per_second)
            .ok_or_else(|| LotteryError::Config("Rate limit must be greater than 0".to_string()))?;

        info!(endpoint = %endpoint, rate_limit = per_second.get(), "Push messenger initialized");
        Ok(Self {
            client,
            endpoint,
            tokens,
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }
}

#[async_trait]
impl Messenger for HttpPushMessenger {
    async fn send(&self, entrant_id: &str, title: &str, body: &str, data: &HashMap<String, String>) -> Result<()> {
        let token = self
            .tokens
            .token_for(entrant_id)
            .await?
            .ok_or_else(|| LotteryError::Messaging(format!("No push token for entrant {}", entrant_id)))?;

        self.limiter.until_ready().await;

        let request = PushRequest { tokens: vec![token], title, body, data };
        let response = self.client.post(self.endpoint.clone()).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LotteryError::Messaging(format!("Push function returned {}", status)));
        }

        let summary: PushResponse = response.json().await?;
        if summary.failure_count > 0 || summary.success_count == 0 {
            return Err(LotteryError::Messaging(format!(
                "Push function reported {} failed and {} delivered for entrant {}",
                summary.failure_count, summary.success_count, entrant_id
            )));
        }

        debug!(entrant_id, "Push delivered");
        Ok(())
    }
}

/// Logs messages instead of sending them; used when push delivery is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyMessenger;

#[async_trait]
impl Messenger for LogOnlyMessenger {
    async fn send(&self, entrant_id: &str, title: &str, body: &str, _data: &HashMap<String, String>) -> Result<()> {
        info!(entrant_id, title, body, "Push delivery disabled, message logged only");
        Ok(())
    }
}

/// A message captured by [`RecordingMessenger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub entrant_id: String,
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

/// Keeps every message in memory and fails for chosen entrants
#[derive(Default)]
pub struct RecordingMessenger {
    sent: RwLock<Vec<SentMessage>>,
    failing: RwLock<Vec<String>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_for(&self, entrant_id: &str) {
        self.failing.write().await.push(entrant_id.to_string());
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().await.clone()
    }

    pub async fn sent_to(&self, entrant_id: &str) -> usize {
        self.sent.read().await.iter().filter(|m| m.entrant_id == entrant_id).count()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, entrant_id: &str, title: &str, body: &str, data: &HashMap<String, String>) -> Result<()> {
        if self.failing.read().await.iter().any(|id| id == entrant_id) {
            warn!(entrant_id, "Simulated push failure");
            return Err(LotteryError::Messaging(format!("Simulated failure for {}", entrant_id)));
        }
        self.sent.write().await.push(SentMessage {
            entrant_id: entrant_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            data: data.clone(),
        });
        Ok(())
    }
}

/// Pick the messenger the configuration asks for
pub fn build_messenger(config: &MessagingConfig, tokens: Arc<dyn TokenDirectory>) -> Result<Arc<dyn Messenger>> {
    if config.enabled {
        Ok(Arc::new(HttpPushMessenger::new(config, tokens)?))
    } else {
        warn!("Push delivery disabled; notifications are logged only");
        Ok(Arc::new(LogOnlyMessenger))
    }
}
