//! Webhook notification sink.
//!
//! Push transport only: the core fires an event per status change and does
//! not require an acknowledgement. Delivery failures are logged and
//! dropped; durable state, not the sink, is the source of truth.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;

#[cfg(test)]
use mockall::automock;

use crate::models::{NotificationError, WebhookNotification};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: WebhookNotification) -> Result<(), NotificationError>;
}

pub struct WebhookNotificationService {
    client: Client,
    /// No configured endpoint means events are dropped after a debug log.
    url: Option<String>,
}

impl WebhookNotificationService {
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }
}

#[async_trait]
impl NotificationSender for WebhookNotificationService {
    async fn send(&self, notification: WebhookNotification) -> Result<(), NotificationError> {
        let Some(url) = &self.url else {
            debug!(
                "no webhook endpoint configured, dropping notification {}",
                notification.id
            );
            return Ok(());
        };

        let response = self
            .client
            .post(url)
            .json(&notification)
            .send()
            .await
            .map_err(|e| NotificationError::DeliveryFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(
                "webhook endpoint rejected notification {}: {}",
                notification.id, status
            );
            return Err(NotificationError::DeliveryFailed(format!(
                "webhook endpoint returned {}",
                status
            )));
        }
        Ok(())
    }
}
