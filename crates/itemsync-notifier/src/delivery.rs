//! Change event delivery
//!
//! The sink seam and the HTTP implementation that POSTs signed events
//! to a configured endpoint. Non-2xx responses are logged and reported
//! as errors to the notifier, which swallows them; this core never
//! retries deliveries.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::error::{NotifierError, NotifierResult};
use crate::event::ChangeEvent;
use crate::signature::compute_signature;

/// Default HTTP timeout for deliveries.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "x-itemsync-signature";

/// Header carrying the signing timestamp.
pub const TIMESTAMP_HEADER: &str = "x-itemsync-timestamp";

/// Destination for emitted change events.
#[async_trait]
pub trait ChangeEventSink: Send + Sync {
    /// Deliver one event.
    async fn deliver(&self, event: &ChangeEvent) -> NotifierResult<()>;
}

/// Configuration for the HTTP sink.
#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    /// Endpoint URL events are POSTed to.
    pub endpoint_url: String,

    /// Shared secret for payload signing.
    pub signing_secret: String,

    /// Request timeout.
    pub timeout: Duration,
}

impl HttpSinkConfig {
    /// Create a config with the default timeout.
    pub fn new(endpoint_url: impl Into<String>, signing_secret: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            signing_secret: signing_secret.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// HTTP sink POSTing signed JSON payloads.
#[derive(Debug)]
pub struct HttpSink {
    client: reqwest::Client,
    config: HttpSinkConfig,
}

impl HttpSink {
    /// Create a new HTTP sink with a dedicated client.
    pub fn new(config: HttpSinkConfig) -> NotifierResult<Self> {
        if config.endpoint_url.is_empty() {
            return Err(NotifierError::InvalidConfiguration(
                "endpoint URL is empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent("itemsync-notifier/1.0")
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(NotifierError::Delivery)?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChangeEventSink for HttpSink {
    async fn deliver(&self, event: &ChangeEvent) -> NotifierResult<()> {
        let body = event.to_json_bytes()?;
        let timestamp = event.emitted_at.timestamp().to_string();
        let signature = compute_signature(&self.config.signing_secret, &timestamp, &body);

        debug!(
            target: "change_delivery",
            event_id = %event.event_id,
            endpoint = %self.config.endpoint_url,
            "delivering change event"
        );

        let response = self
            .client
            .post(&self.config.endpoint_url)
            .header("content-type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(TIMESTAMP_HEADER, timestamp)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(
                target: "change_delivery",
                event_id = %event.event_id,
                status = status.as_u16(),
                "change event delivered"
            );
            Ok(())
        } else {
            error!(
                target: "change_delivery",
                event_id = %event.event_id,
                status = status.as_u16(),
                "endpoint rejected change event"
            );
            Err(NotifierError::DeliveryRejected {
                status: status.as_u16(),
            })
        }
    }
}

/// In-memory sink capturing events for tests.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<ChangeEvent>>,
    fail_deliveries: std::sync::atomic::AtomicBool,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent delivery fail.
    pub fn fail_deliveries(&self, fail: bool) {
        self.fail_deliveries
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Events captured so far.
    pub async fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl ChangeEventSink for MemorySink {
    async fn deliver(&self, event: &ChangeEvent) -> NotifierResult<()> {
        if self
            .fail_deliveries
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(NotifierError::DeliveryRejected { status: 503 });
        }
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}
