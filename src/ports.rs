//! Ports to the collaborators the scheduling core depends on.
//!
//! Storage and notification delivery live outside the core. Adapters for
//! these traits are in `services::memory`, `services::database`,
//! `services::availability_store` and `client`.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{NotificationError, SchedulingResult};
use crate::models::availability::{find_day, DayAvailability, TrainerAvailability, Weekday};
use crate::models::booking::{Booking, BookingStatus, Role};
use crate::models::reschedule::{RescheduleRequest, RescheduleStatus};

/// Read access to trainers' recurring weekly schedules.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// The trainer's whole week as read from a single storage location.
    async fn get_week_availability(
        &self,
        trainer_id: &str,
    ) -> SchedulingResult<Option<TrainerAvailability>>;

    async fn get_day_availability(
        &self,
        trainer_id: &str,
        weekday: Weekday,
    ) -> SchedulingResult<Option<DayAvailability>> {
        Ok(self
            .get_week_availability(trainer_id)
            .await?
            .and_then(|week| find_day(&week.availability, weekday).cloned()))
    }

    /// IANA zone the trainer's wall-clock windows are expressed in, if known.
    async fn trainer_timezone(&self, trainer_id: &str) -> SchedulingResult<Option<String>> {
        Ok(self
            .get_week_availability(trainer_id)
            .await?
            .and_then(|week| week.timezone))
    }
}

/// One persisted location of trainer availability documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    fn name(&self) -> &str;

    async fn load_week(&self, trainer_id: &str) -> SchedulingResult<Option<TrainerAvailability>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn get(&self, booking_id: &str) -> SchedulingResult<Option<Booking>>;

    async fn put(&self, booking: &Booking) -> SchedulingResult<()>;

    /// Fails with `BookingNotFound` when no booking has this id.
    async fn update_status(&self, booking_id: &str, status: BookingStatus) -> SchedulingResult<()>;

    /// Bookings of `trainer_id`, in any status, whose start could fall on
    /// `date` in some timezone: everything starting inside
    /// `time_conversion::date_window_utc(date)`. Callers narrow the result
    /// to the zone they care about.
    async fn query_by_trainer_and_date(
        &self,
        trainer_id: &str,
        date: NaiveDate,
    ) -> SchedulingResult<Vec<Booking>>;

    /// Bookings where `user_id` is the trainer or the client, per `role`.
    async fn query_by_user(&self, user_id: &str, role: Role) -> SchedulingResult<Vec<Booking>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RescheduleStore: Send + Sync {
    async fn get(&self, id: &str) -> SchedulingResult<Option<RescheduleRequest>>;

    async fn put(&self, request: &RescheduleRequest) -> SchedulingResult<()>;

    /// Fails with `RescheduleNotFound` when no request has this id.
    async fn update_status(&self, id: &str, status: RescheduleStatus) -> SchedulingResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarNotifier: Send + Sync {
    async fn create_session_event(&self, booking: &Booking) -> Result<(), NotificationError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    async fn send_system_message(
        &self,
        chat_id: &str,
        sender_id: &str,
        text: &str,
    ) -> Result<(), NotificationError>;
}
