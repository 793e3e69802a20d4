//! Retrying HTTP call wrapper
//!
//! One call = up to `max_attempts` request attempts. Only transient
//! conditions (connect failure, timeout, 5xx) are retried, with exponential
//! backoff capped at `max_delay`; a 4xx surfaces immediately. The per-call
//! timeout lives on the underlying reqwest client, independent of backoff.

use crate::client::ActivityTracker;
use crate::utils::config::SimConfig;
use crate::utils::errors::{Result, SimError};
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Decoded response payload
#[derive(Debug, Clone)]
pub enum Payload {
    /// Successful response with a JSON body
    Json(Value),
    /// Successful response with an empty body
    Empty,
}

impl Payload {
    /// Borrow the JSON body, if there was one
    pub fn json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Empty => None,
        }
    }

    /// Take the JSON body, defaulting to `Value::Null` for empty responses
    pub fn into_json(self) -> Value {
        match self {
            Payload::Json(value) => value,
            Payload::Empty => Value::Null,
        }
    }
}

/// Backoff schedule for transient failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempt cap including the first call
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt
    pub multiplier: f64,
    /// Upper bound on a single backoff sleep
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (1-based)
    fn backoff(&self, retry: u32) -> Duration {
        let factor = self.multiplier.powi(retry.saturating_sub(1) as i32);
        let delay = self.base_delay.mul_f64(factor);
        delay.min(self.max_delay)
    }
}

/// Authenticated, retrying HTTP client
///
/// Cloning is cheap; `for_actor` produces a clone bound to one actor's
/// [`ActivityTracker`] while sharing the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
    activity: Option<Arc<ActivityTracker>>,
}

impl ApiClient {
    /// Create a client for the given API base URL
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.into(),
            retry,
            activity: None,
        }
    }

    /// Create a client from simulator configuration
    pub fn from_config(config: &SimConfig) -> Self {
        let retry = RetryPolicy {
            max_attempts: config.request.max_attempts,
            base_delay: Duration::from_millis(config.request.base_delay_ms),
            multiplier: config.request.backoff_multiplier,
            max_delay: Duration::from_millis(config.request.max_delay_ms),
        };

        Self::new(
            config.api_url.clone(),
            Duration::from_secs(config.request.timeout_secs),
            retry,
        )
    }

    /// Bind this client to an actor's activity tracker
    ///
    /// Every subsequent request attempt, success or failure, touches the
    /// tracker so the monitor can report liveness.
    pub fn for_actor(&self, tracker: Arc<ActivityTracker>) -> Self {
        let mut bound = self.clone();
        bound.activity = Some(tracker);
        bound
    }

    /// Issue an API call, retrying transient failures
    ///
    /// The bearer `token` is applied when present. Returns the decoded
    /// payload, or the error from the final attempt.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Payload> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        let mut attempt = 0;
        loop {
            attempt += 1;
            if let Some(tracker) = &self.activity {
                tracker.touch();
            }

            match self.execute(&method, &url, body, token).await {
                Ok(payload) => return Ok(payload),
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    debug!(
                        "Transient failure on {} {} (attempt {}/{}): {}, retrying in {:?}",
                        method, path, attempt, self.retry.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!("{} {} failed after {} attempt(s): {}", method, path, attempt, e);
                    return Err(e);
                }
            }
        }
    }

    /// Single request attempt
    async fn execute(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Payload> {
        let mut request = self.http.request(method.clone(), url);

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SimError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SimError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(SimError::Protocol {
                status: status.as_u16(),
                detail: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        if bytes.is_empty() {
            return Ok(Payload::Empty);
        }

        serde_json::from_slice(&bytes)
            .map(Payload::Json)
            .map_err(|e| SimError::Decode(e.to_string()))
    }
}
