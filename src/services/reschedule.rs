use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{SchedulingError, SchedulingResult};
use crate::models::booking::{chat_id_for, Booking, BookingRequest, BookingStatus, Role};
use crate::models::chat::{ChatMessage, ChatReference};
use crate::models::reschedule::{RescheduleRequest, RescheduleStatus};
use crate::ports::RescheduleStore;
use crate::services::booking::BookingEngine;
use crate::services::time_conversion::{
    calculate_end_utc, format_for_display, to_utc, DisplayFormat,
};

/// Moves a session to a new time: the original booking is cancelled, a
/// replacement is booked as pending, and the counterparty accepts or
/// rejects it.
///
/// `pending -> accepted | rejected`; both outcomes are terminal. Checking
/// that only the counterparty of `requested_by` answers is left to the
/// caller.
pub struct RescheduleWorkflow {
    engine: Arc<BookingEngine>,
    store: Arc<dyn RescheduleStore>,
}

impl RescheduleWorkflow {
    pub fn new(engine: Arc<BookingEngine>, store: Arc<dyn RescheduleStore>) -> Self {
        Self { engine, store }
    }

    /// Request a new time for `original`.
    ///
    /// The steps are separate writes, not a transaction. When the original
    /// has been cancelled but the replacement cannot be stored, the result is
    /// `PartialWorkflowFailure` and the user has to book again.
    ///
    /// The original is cancelled unconditionally. One that is already
    /// cancelled, for example by an earlier reschedule, is logged and the
    /// request still goes ahead, so it can end up with several replacements.
    pub async fn create(
        &self,
        original: &Booking,
        new_local_date: NaiveDate,
        new_local_time: &str,
        reason: &str,
        requested_by: Role,
        timezone: Option<&str>,
    ) -> SchedulingResult<String> {
        let timezone = timezone.unwrap_or(&original.timezone).to_string();

        // Pure conversion first so bad input never touches the original
        let new_start = to_utc(new_local_date, new_local_time, &timezone)?;
        let new_end = calculate_end_utc(new_start, original.duration)?;

        if self.engine.mark_cancelled(&original.booking_id).await?.is_none() {
            warn!(
                "Rescheduling booking {} which was already cancelled",
                original.booking_id
            );
        }

        let replacement = BookingRequest {
            trainer_id: original.trainer_id.clone(),
            client_id: original.client_id.clone(),
            local_date: Some(new_local_date),
            local_start_time: Some(new_local_time.to_string()),
            start_time_utc: Some(new_start),
            end_time_utc: Some(new_end),
            timezone: timezone.clone(),
            duration: original.duration,
            session_type: original.session_type,
            status: Some(BookingStatus::Pending),
            location: original.location.clone(),
        };

        let new_booking_id = match self.engine.book_session(replacement).await {
            Ok(id) => id,
            Err(e) => {
                error!(
                    "Original booking {} cancelled but replacement failed: {}",
                    original.booking_id, e
                );
                return Err(SchedulingError::PartialWorkflowFailure {
                    original_booking_id: original.booking_id.clone(),
                    source: Box::new(e),
                });
            }
        };

        let now = Utc::now();
        let request = RescheduleRequest {
            id: format!(
                "{}_{}",
                original.booking_id,
                self.engine.next_timestamp_millis(now)
            ),
            original_booking_id: original.booking_id.clone(),
            new_booking_id: new_booking_id.clone(),
            trainer_id: original.trainer_id.clone(),
            client_id: original.client_id.clone(),
            original_start_time_utc: original.start_time_utc,
            new_start_time_utc: new_start,
            timezone,
            reason: reason.to_string(),
            requested_by,
            status: RescheduleStatus::Pending,
            created_at: now,
        };

        if let Err(e) = self.store.put(&request).await {
            error!(
                "Failed to store reschedule request for booking {}: {}",
                original.booking_id, e
            );
            // Do not leave an orphaned pending replacement behind
            if let Err(cancel_err) = self.engine.mark_cancelled(&new_booking_id).await {
                warn!(
                    "Could not cancel orphaned replacement booking {}: {}",
                    new_booking_id, cancel_err
                );
            }
            return Err(SchedulingError::PartialWorkflowFailure {
                original_booking_id: original.booking_id.clone(),
                source: Box::new(e),
            });
        }

        info!(
            "Reschedule {} requested by {}: booking {} -> {} ({})",
            request.id, requested_by, original.booking_id, new_booking_id, new_start
        );

        self.engine.notifications().chat_message(ChatMessage::new(
            &original.chat_id(),
            request.requester_id(),
            &ChatReference::Reschedule(request.id.clone()).encode(),
        ));

        Ok(request.id)
    }

    pub async fn get(&self, id: &str) -> SchedulingResult<RescheduleRequest> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| SchedulingError::RescheduleNotFound(id.to_string()))
    }

    // Load a request that must still be pending for `action`
    async fn pending(&self, id: &str, action: &'static str) -> SchedulingResult<RescheduleRequest> {
        let request = self.get(id).await?;
        if request.status != RescheduleStatus::Pending {
            warn!(
                "Refusing to {} reschedule {}: already {}",
                action, id, request.status
            );
            return Err(SchedulingError::InvalidState {
                entity: "Reschedule request",
                id: id.to_string(),
                status: request.status.to_string(),
                action,
            });
        }
        Ok(request)
    }

    /// Confirm the replacement booking. Fails with `InvalidState` unless the
    /// request is still pending, so a second call is an error.
    pub async fn accept(&self, id: &str) -> SchedulingResult<()> {
        let request = self.pending(id, "accept").await?;

        let booking = self.engine.confirm_booking(&request.new_booking_id).await?;
        self.store
            .update_status(id, RescheduleStatus::Accepted)
            .await?;
        info!(
            "Reschedule {} accepted, booking {} confirmed",
            id, request.new_booking_id
        );

        let notifications = self.engine.notifications();
        notifications.calendar_event(&booking);
        notifications.chat_message(ChatMessage::new(
            &booking.chat_id(),
            request.responder_id(),
            &format!("Reschedule accepted: {}", describe_start(&request)),
        ));

        Ok(())
    }

    /// Cancel the replacement booking. Fails with `InvalidState` unless the
    /// request is still pending.
    pub async fn reject(&self, id: &str) -> SchedulingResult<()> {
        let request = self.pending(id, "reject").await?;

        self.engine.mark_cancelled(&request.new_booking_id).await?;
        self.store
            .update_status(id, RescheduleStatus::Rejected)
            .await?;
        info!(
            "Reschedule {} rejected, booking {} cancelled",
            id, request.new_booking_id
        );

        self.engine.notifications().chat_message(ChatMessage::new(
            &chat_id_for(&request.trainer_id, &request.client_id),
            request.responder_id(),
            &format!("Reschedule declined: {}", describe_start(&request)),
        ));

        Ok(())
    }
}

fn describe_start(request: &RescheduleRequest) -> String {
    let date = format_for_display(request.new_start_time_utc, &request.timezone, DisplayFormat::Date);
    let time = format_for_display(request.new_start_time_utc, &request.timezone, DisplayFormat::Time);
    match (date, time) {
        (Ok(date), Ok(time)) => format!("{} at {}", date, time),
        _ => request.new_start_time_utc.to_rfc3339(),
    }
}
