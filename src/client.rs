use async_trait::async_trait;
use reqwest::{Client, Method, Request};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::auth::{WebhookAuth, NONCE_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::error::NotificationError;
use crate::models::booking::Booking;
use crate::models::chat::ChatMessage;
use crate::ports::{CalendarNotifier, ChatNotifier};

pub const CALENDAR_EVENTS_PATH: &str = "/calendar-events";
pub const CHAT_MESSAGES_PATH: &str = "/chat-messages";

/// Delivers calendar events and chat lines to an HTTP webhook.
///
/// Every request carries a JSON body and the signing headers from
/// [`WebhookAuth`]. Any non-2xx answer counts as a failed delivery.
pub struct WebhookNotifierClient {
    client: Client,
    endpoint: String,
    secret: String,
}

impl WebhookNotifierClient {
    pub fn new(endpoint: &str, secret: &str, timeout: Duration) -> Result<Self, NotificationError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            secret: secret.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build a signed POST of `payload` to `path` below the endpoint.
    pub fn build_request<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Request, NotificationError> {
        let body = serde_json::to_string(payload)
            .map_err(|e| NotificationError::Unavailable(format!("Failed to encode payload: {}", e)))?;

        let timestamp = WebhookAuth::get_timestamp();
        let nonce = WebhookAuth::generate_nonce();
        let signature =
            WebhookAuth::generate_signature(&self.secret, "POST", path, timestamp, &nonce, &body);

        let request = self
            .client
            .request(Method::POST, format!("{}{}", self.endpoint, path))
            .header("Content-Type", "application/json")
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .header(NONCE_HEADER, nonce)
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .build()?;

        Ok(request)
    }

    async fn post<T: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<(), NotificationError> {
        let request = self.build_request(path, payload)?;
        debug!("Webhook URL: {}", request.url());

        let res = self.client.execute(request).await?;
        let status = res.status();
        info!("Webhook {} answered with status: {}", path, status);

        if status.is_success() {
            Ok(())
        } else {
            let body = res.text().await.unwrap_or_default();
            warn!("Webhook {} rejected delivery: {}", path, body);
            Err(NotificationError::Rejected(status.as_u16()))
        }
    }
}

#[async_trait]
impl CalendarNotifier for WebhookNotifierClient {
    async fn create_session_event(&self, booking: &Booking) -> Result<(), NotificationError> {
        info!("Sending calendar event for booking {}", booking.booking_id);
        self.post(CALENDAR_EVENTS_PATH, booking).await
    }
}

#[async_trait]
impl ChatNotifier for WebhookNotifierClient {
    async fn send_system_message(
        &self,
        chat_id: &str,
        sender_id: &str,
        text: &str,
    ) -> Result<(), NotificationError> {
        info!("Sending chat line to {}", chat_id);
        self.post(CHAT_MESSAGES_PATH, &ChatMessage::new(chat_id, sender_id, text))
            .await
    }
}
