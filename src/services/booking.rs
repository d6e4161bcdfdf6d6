use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::{SchedulingError, SchedulingResult};
use crate::models::booking::{Booking, BookingRequest, BookingStatus, Role, SessionType};
use crate::models::chat::ChatMessage;
use crate::ports::BookingStore;
use crate::services::notifications::Notifications;
use crate::services::time_conversion::{
    calculate_end_utc, format_for_display, parse_timezone, to_utc, DisplayFormat,
};

/// Sender id used for chat lines the scheduler posts on its own behalf.
pub const SYSTEM_SENDER_ID: &str = "system";

const UPCOMING_WINDOW_DAYS: i64 = 7;

/// Creates, cancels and queries bookings.
///
/// A booking exists once the store has accepted it. Calendar and chat side
/// effects are dispatched afterwards on detached tasks and cannot undo it.
pub struct BookingEngine {
    store: Arc<dyn BookingStore>,
    notifications: Notifications,
    last_issued_millis: AtomicI64,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn BookingStore>, notifications: Notifications) -> Self {
        Self {
            store,
            notifications,
            last_issued_millis: AtomicI64::new(0),
        }
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// Epoch milliseconds for a new id, strictly increasing within this
    /// process so ids built from the same parties never collide.
    pub(crate) fn next_timestamp_millis(&self, now: DateTime<Utc>) -> i64 {
        let candidate = now.timestamp_millis();
        let mut last = self.last_issued_millis.load(Ordering::Relaxed);
        loop {
            let next = candidate.max(last + 1);
            match self.last_issued_millis.compare_exchange_weak(
                last,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    pub async fn book_session(&self, request: BookingRequest) -> SchedulingResult<String> {
        validate_request(&request)?;
        let (start_time_utc, end_time_utc) = resolve_timing(&request)?;

        let now = Utc::now();
        let booking_id = format!(
            "{}_{}_{}",
            request.trainer_id,
            request.client_id,
            self.next_timestamp_millis(now)
        );

        let booking = Booking {
            booking_id: booking_id.clone(),
            trainer_id: request.trainer_id,
            client_id: request.client_id,
            start_time_utc,
            end_time_utc,
            timezone: request.timezone,
            duration: request.duration,
            status: request.status.unwrap_or(BookingStatus::Confirmed),
            session_type: request.session_type,
            location: request.location,
            created_at: now,
        };

        if let Err(e) = self.store.put(&booking).await {
            error!("Failed to store booking {}: {}", booking_id, e);
            return Err(e);
        }

        info!(
            "Booked session {} for trainer {} and client {} at {} ({})",
            booking_id, booking.trainer_id, booking.client_id, start_time_utc, booking.status
        );

        // Detached: the outcome is only logged
        self.notifications.session_booked(&booking);

        Ok(booking_id)
    }

    pub async fn get_booking(&self, booking_id: &str) -> SchedulingResult<Booking> {
        self.store
            .get(booking_id)
            .await?
            .ok_or_else(|| SchedulingError::BookingNotFound(booking_id.to_string()))
    }

    /// Set a booking to cancelled. Cancelling an already cancelled booking
    /// succeeds without doing anything.
    pub async fn cancel_booking(&self, booking_id: &str) -> SchedulingResult<()> {
        if let Some(booking) = self.mark_cancelled(booking_id).await? {
            let text = cancellation_text(&booking);
            self.notifications
                .chat_message(ChatMessage::new(&booking.chat_id(), SYSTEM_SENDER_ID, &text));
        }
        Ok(())
    }

    // Returns the booking as it was when a transition happened, None on a no-op
    pub(crate) async fn mark_cancelled(&self, booking_id: &str) -> SchedulingResult<Option<Booking>> {
        let booking = self.get_booking(booking_id).await?;

        if booking.status == BookingStatus::Cancelled {
            debug!("Booking {} already cancelled, nothing to do", booking_id);
            return Ok(None);
        }

        self.store
            .update_status(booking_id, BookingStatus::Cancelled)
            .await?;
        info!("Cancelled booking {} (was {})", booking_id, booking.status);

        Ok(Some(booking))
    }

    /// Move a pending booking to confirmed. Already confirmed is a no-op.
    pub async fn confirm_booking(&self, booking_id: &str) -> SchedulingResult<Booking> {
        let mut booking = self.get_booking(booking_id).await?;

        match booking.status {
            BookingStatus::Confirmed => return Ok(booking),
            BookingStatus::Pending => {}
            status => {
                return Err(SchedulingError::InvalidState {
                    entity: "Booking",
                    id: booking_id.to_string(),
                    status: status.to_string(),
                    action: "confirm",
                })
            }
        }

        self.store
            .update_status(booking_id, BookingStatus::Confirmed)
            .await?;
        booking.status = BookingStatus::Confirmed;
        info!("Confirmed booking {}", booking_id);

        Ok(booking)
    }

    /// Mark a confirmed session as held. Already completed is a no-op.
    pub async fn complete_booking(&self, booking_id: &str) -> SchedulingResult<()> {
        let booking = self.get_booking(booking_id).await?;

        match booking.status {
            BookingStatus::Completed => Ok(()),
            BookingStatus::Confirmed => {
                self.store
                    .update_status(booking_id, BookingStatus::Completed)
                    .await?;
                info!("Completed booking {}", booking_id);
                Ok(())
            }
            status => Err(SchedulingError::InvalidState {
                entity: "Booking",
                id: booking_id.to_string(),
                status: status.to_string(),
                action: "complete",
            }),
        }
    }

    /// All non-cancelled bookings of a user, earliest first.
    pub async fn get_user_bookings(&self, user_id: &str, role: Role) -> SchedulingResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .store
            .query_by_user(user_id, role)
            .await?
            .into_iter()
            .filter(Booking::is_active)
            .collect();
        bookings.sort_by_key(|booking| booking.start_time_utc);

        debug!(
            "Found {} active bookings for {} {}",
            bookings.len(),
            role,
            user_id
        );
        Ok(bookings)
    }

    pub async fn get_upcoming_week_sessions(
        &self,
        user_id: &str,
        role: Role,
    ) -> SchedulingResult<Vec<Booking>> {
        self.get_upcoming_week_sessions_at(user_id, role, Utc::now())
            .await
    }

    /// Non-cancelled bookings starting within `[now, now + 7 days]`.
    pub async fn get_upcoming_week_sessions_at(
        &self,
        user_id: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> SchedulingResult<Vec<Booking>> {
        let horizon = now + Duration::days(UPCOMING_WINDOW_DAYS);
        Ok(self
            .get_user_bookings(user_id, role)
            .await?
            .into_iter()
            .filter(|booking| booking.start_time_utc >= now && booking.start_time_utc <= horizon)
            .collect())
    }
}

fn validate_request(request: &BookingRequest) -> SchedulingResult<()> {
    if request.trainer_id.trim().is_empty() || request.client_id.trim().is_empty() {
        return Err(SchedulingError::Validation(
            "trainerId and clientId are required".to_string(),
        ));
    }

    if request.duration <= 0 {
        return Err(SchedulingError::Validation(format!(
            "duration must be positive, got {}",
            request.duration
        )));
    }

    parse_timezone(&request.timezone)?;

    if request.session_type == SessionType::InPerson
        && request
            .location
            .as_deref()
            .map_or(true, |location| location.trim().is_empty())
    {
        return Err(SchedulingError::Validation(
            "in-person sessions require a location".to_string(),
        ));
    }

    if matches!(
        request.status,
        Some(BookingStatus::Cancelled) | Some(BookingStatus::Completed)
    ) {
        return Err(SchedulingError::Validation(
            "new bookings must be pending or confirmed".to_string(),
        ));
    }

    Ok(())
}

// Precomputed UTC instants win over local date/time
fn resolve_timing(request: &BookingRequest) -> SchedulingResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = match (
        request.start_time_utc,
        request.local_date,
        request.local_start_time.as_deref(),
    ) {
        (Some(start), _, _) => start,
        (None, Some(date), Some(time)) => to_utc(date, time, &request.timezone)?,
        _ => {
            return Err(SchedulingError::Validation(
                "either startTimeUtc or localDate with localStartTime is required".to_string(),
            ))
        }
    };

    let end = match request.end_time_utc {
        Some(end) => end,
        None => calculate_end_utc(start, request.duration)?,
    };

    if end <= start {
        return Err(SchedulingError::Validation(
            "session must end after it starts".to_string(),
        ));
    }

    Ok((start, end))
}

fn cancellation_text(booking: &Booking) -> String {
    let when = format_for_display(booking.start_time_utc, &booking.timezone, DisplayFormat::Date)
        .and_then(|date| {
            format_for_display(booking.start_time_utc, &booking.timezone, DisplayFormat::Time)
                .map(|time| format!("{} at {}", date, time))
        })
        .unwrap_or_else(|_| booking.start_time_utc.to_rfc3339());

    format!("Session on {} has been cancelled", when)
}
