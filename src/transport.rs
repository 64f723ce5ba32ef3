//! HTTP transport with status validation and linear retry backoff.
//!
//! Every attempt builds its own client with idle pooling disabled, so a retry
//! never reuses a connection from a failed attempt.

use crate::error::{IngestError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info, warn};

/// Single GET returning the response body.
///
/// Implementations fail with `IngestError::Http` once their own retry budget
/// is spent.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<String>;
}

/// Bounded attempt count with linear backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Delay unit; attempt `k` waits `backoff_base * k` before retrying
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff_base: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff_base,
        }
    }

    /// Delay after failed attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(600))
    }
}

/// HTTP transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    policy: RetryPolicy,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(policy: RetryPolicy, timeout: Duration) -> Self {
        Self { policy, timeout }
    }

    /// Build a transport from the pipeline configuration
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.retry, config.timeout)
    }

    /// One attempt on a fresh connection
    async fn attempt(&self, url: &str) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| IngestError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let response = client.get(url).send().await.map_err(transport_failure)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_failure)?;

        if !status.is_success() {
            return Err(IngestError::Http {
                status: i32::from(status.as_u16()),
                message: body,
            });
        }

        Ok(body)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), Duration::from_secs(30))
    }
}

/// Request URLs carry the API key, so they are stripped from the message
fn transport_failure(e: reqwest::Error) -> IngestError {
    IngestError::Http {
        status: -1,
        message: e.without_url().to_string(),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String> {
        let mut attempt = 1;

        loop {
            match self.attempt(url).await {
                Ok(body) => {
                    info!(attempt, bytes = body.len(), "HTTP 200");
                    return Ok(body);
                }
                Err(e) if attempt < self.policy.attempts => {
                    let wait = self.policy.delay_for(attempt);
                    warn!(
                        attempt,
                        attempts = self.policy.attempts,
                        status = ?e.http_status(),
                        wait_ms = wait.as_millis() as u64,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(attempt, status = ?e.http_status(), "Request failed, giving up");
                    return Err(e);
                }
            }
        }
    }
}


/// In-memory transport replaying canned responses, for pipeline tests
#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<String>>>,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.lock().expect("requests lock").clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, url: &str) -> Result<String> {
            self.requests
                .lock()
                .expect("requests lock")
                .push(url.to_string());
            self.responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .unwrap_or_else(|| {
                    Err(IngestError::Http {
                        status: 404,
                        message: "no scripted response left".to_string(),
                    })
                })
        }
    }
}
