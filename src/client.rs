//! The terminal client's side of the collaborator API, over HTTP.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::runtime::Handle;

use crate::actors::tracking_store::UsageStats;
use crate::errors::WizardError;
use crate::resolver::ContentSource;
use crate::routing::{Envelope, Message};
use crate::tracking::{UsageEvent, UsageSink};
use crate::wizard::WizardDocument;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, WizardError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Unwraps the `{success, data}` envelope, turning a failure envelope
    /// into a transport error with the server's message.
    async fn unwrap_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, WizardError> {
        let status = response.status();
        let body: serde_json::Value = response.json().await?;
        let success = body.get("success").and_then(|s| s.as_bool()).unwrap_or(false);
        if !success {
            let message = serde_json::from_value::<Envelope<Message>>(body)
                .map(|e| e.data.message)
                .unwrap_or_else(|_| format!("request failed with {}", status));
            return Err(WizardError::Transport(message));
        }
        let envelope: Envelope<T> = serde_json::from_value(body)
            .map_err(|e| WizardError::Transport(format!("unexpected response: {}", e)))?;
        Ok(envelope.data)
    }

    pub async fn fetch_wizard(&self) -> Result<WizardDocument, WizardError> {
        let response = self.http.get(self.url("/api/wizard")).send().await?;
        Self::unwrap_envelope(response).await
    }

    pub async fn fetch_stats(&self) -> Result<UsageStats, WizardError> {
        let response = self.http.get(self.url("/api/stats")).send().await?;
        Self::unwrap_envelope(response).await
    }

    /// Clears the server's usage rows and returns how many there were.
    pub async fn reset_stats(&self) -> Result<usize, WizardError> {
        let response = self.http.delete(self.url("/api/stats")).send().await?;
        let data: serde_json::Value = Self::unwrap_envelope(response).await?;
        Ok(data.get("cleared").and_then(|c| c.as_u64()).unwrap_or(0) as usize)
    }

    async fn post_usage(&self, event: &UsageEvent) -> Result<(), WizardError> {
        let response = self.http.post(self.url("/api/track")).form(event).send().await?;
        Self::unwrap_envelope::<serde_json::Value>(response).await.map(|_| ())
    }
}

#[async_trait]
impl ContentSource for ApiClient {
    async fn fetch_card(&self, content_id: u64) -> Result<String, WizardError> {
        let response = self
            .http
            .get(self.url(&format!("/api/cards/{}", content_id)))
            .send()
            .await?;
        Self::unwrap_envelope(response).await
    }
}

#[async_trait]
impl UsageSink for ApiClient {
    fn send(&self, event: UsageEvent) {
        let Ok(handle) = Handle::try_current() else {
            log::warn!("No async runtime; dropping {} tracking event.", event.status.as_str());
            return;
        };
        let client = self.clone();
        handle.spawn(async move {
            if let Err(e) = client.post_usage(&event).await {
                log::warn!("Could not deliver {} tracking event: {}", event.status.as_str(), e);
            }
        });
    }

    async fn send_beacon(&self, event: UsageEvent) -> Result<(), WizardError> {
        self.post_usage(&event).await
    }
}
