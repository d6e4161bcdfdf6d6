use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::NotificationError;
use crate::models::booking::Booking;
use crate::models::chat::{ChatMessage, ChatReference};
use crate::ports::{CalendarNotifier, ChatNotifier};

/// Dispatches calendar and chat side effects without blocking the caller.
///
/// Every delivery runs on its own spawned task. Failures end up in the log
/// and never reach the operation that triggered them: a booking is created
/// once it is persisted, whatever happens to its notifications.
#[derive(Clone)]
pub struct Notifications {
    calendar: Arc<dyn CalendarNotifier>,
    chat: Arc<dyn ChatNotifier>,
}

impl Notifications {
    pub fn new(calendar: Arc<dyn CalendarNotifier>, chat: Arc<dyn ChatNotifier>) -> Self {
        Self { calendar, chat }
    }

    /// Calendar event plus a `calendar/{trainerId}` line in the pair's chat.
    pub fn session_booked(&self, booking: &Booking) -> JoinHandle<()> {
        let calendar = Arc::clone(&self.calendar);
        let chat = Arc::clone(&self.chat);
        let booking = booking.clone();

        tokio::spawn(async move {
            if let Err(e) = calendar.create_session_event(&booking).await {
                warn!(
                    "Failed to create calendar event for booking {}: {}",
                    booking.booking_id, e
                );
            }

            let message = ChatMessage::new(
                &booking.chat_id(),
                &booking.client_id,
                &ChatReference::Calendar(booking.trainer_id.clone()).encode(),
            );
            deliver(chat.as_ref(), &message).await;
        })
    }

    pub fn calendar_event(&self, booking: &Booking) -> JoinHandle<()> {
        let calendar = Arc::clone(&self.calendar);
        let booking = booking.clone();

        tokio::spawn(async move {
            if let Err(e) = calendar.create_session_event(&booking).await {
                warn!(
                    "Failed to create calendar event for booking {}: {}",
                    booking.booking_id, e
                );
            }
        })
    }

    pub fn chat_message(&self, message: ChatMessage) -> JoinHandle<()> {
        let chat = Arc::clone(&self.chat);
        tokio::spawn(async move { deliver(chat.as_ref(), &message).await })
    }
}

async fn deliver(chat: &dyn ChatNotifier, message: &ChatMessage) {
    match chat
        .send_system_message(&message.chat_id, &message.sender_id, &message.text)
        .await
    {
        Ok(()) => debug!("Delivered chat line to {}", message.chat_id),
        Err(e) => warn!("Failed to deliver chat line to {}: {}", message.chat_id, e),
    }
}

/// Notifier used when no delivery endpoint is configured; it only logs.
pub struct LoggingNotifier;

#[async_trait]
impl CalendarNotifier for LoggingNotifier {
    async fn create_session_event(&self, booking: &Booking) -> Result<(), NotificationError> {
        info!(
            "Calendar event for booking {} ({} to {})",
            booking.booking_id, booking.start_time_utc, booking.end_time_utc
        );
        Ok(())
    }
}

#[async_trait]
impl ChatNotifier for LoggingNotifier {
    async fn send_system_message(
        &self,
        chat_id: &str,
        sender_id: &str,
        text: &str,
    ) -> Result<(), NotificationError> {
        info!("Chat {} <- {}: {}", chat_id, sender_id, text);
        Ok(())
    }
}
