use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

use crate::models::availability::{DayAvailability, TimeWindow, TrainerAvailability, Weekday};
use crate::models::booking::{Booking, BookingStatus, SessionType};
use crate::ports::{AvailabilitySource, BookingStore, RescheduleStore};
use crate::services::availability_store::LayeredAvailabilityStore;
use crate::services::booking::BookingEngine;
use crate::services::memory::{
    InMemoryAvailabilitySource, InMemoryBookingStore, InMemoryRescheduleStore, RecordingNotifier,
};
use crate::services::notifications::Notifications;
use crate::services::reschedule::RescheduleWorkflow;
use crate::services::slot_resolver::SlotAvailabilityResolver;

pub const TRAINER_ID: &str = "trainer1";
pub const CLIENT_ID: &str = "client1";
pub const LOS_ANGELES: &str = "America/Los_Angeles";

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// One weekday with the given windows, switched on.
pub fn open_day(day: Weekday, windows: &[(&str, &str)]) -> DayAvailability {
    DayAvailability {
        day,
        available: true,
        time_windows: windows
            .iter()
            .map(|(start, end)| TimeWindow::new(start, end))
            .collect(),
    }
}

pub fn week(timezone: &str, days: Vec<DayAvailability>) -> TrainerAvailability {
    TrainerAvailability {
        timezone: Some(timezone.to_string()),
        availability: days,
    }
}

/// A stored-looking booking, independent of any engine.
pub fn sample_booking(booking_id: &str, start: DateTime<Utc>, status: BookingStatus) -> Booking {
    Booking {
        booking_id: booking_id.to_string(),
        trainer_id: TRAINER_ID.to_string(),
        client_id: CLIENT_ID.to_string(),
        start_time_utc: start,
        end_time_utc: start + chrono::Duration::minutes(60),
        timezone: LOS_ANGELES.to_string(),
        duration: 60,
        status,
        session_type: SessionType::Online,
        location: None,
        created_at: Utc::now(),
    }
}

/// Let detached notification tasks run on the current-thread test runtime.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// The full scheduling core wired to in-memory adapters.
pub struct Harness {
    pub bookings: Arc<InMemoryBookingStore>,
    pub reschedules: Arc<InMemoryRescheduleStore>,
    pub current: Arc<InMemoryAvailabilitySource>,
    pub legacy: Arc<InMemoryAvailabilitySource>,
    pub notifier: Arc<RecordingNotifier>,
    pub engine: Arc<BookingEngine>,
    pub resolver: SlotAvailabilityResolver,
    pub workflow: RescheduleWorkflow,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_notifier(Arc::new(RecordingNotifier::new()))
    }

    pub fn with_notifier(notifier: Arc<RecordingNotifier>) -> Self {
        let bookings = Arc::new(InMemoryBookingStore::new());
        let reschedules = Arc::new(InMemoryRescheduleStore::new());
        Self::assemble(bookings.clone(), bookings, reschedules.clone(), reschedules, notifier)
    }

    /// Harness whose engine and workflow write through the given stores,
    /// e.g. mocks that fail on demand.
    pub fn with_stores(
        booking_store: Arc<dyn BookingStore>,
        reschedule_store: Arc<dyn RescheduleStore>,
    ) -> Self {
        Self::assemble(
            Arc::new(InMemoryBookingStore::new()),
            booking_store,
            Arc::new(InMemoryRescheduleStore::new()),
            reschedule_store,
            Arc::new(RecordingNotifier::new()),
        )
    }

    fn assemble(
        bookings: Arc<InMemoryBookingStore>,
        booking_store: Arc<dyn BookingStore>,
        reschedules: Arc<InMemoryRescheduleStore>,
        reschedule_store: Arc<dyn RescheduleStore>,
        notifier: Arc<RecordingNotifier>,
    ) -> Self {
        let current = Arc::new(InMemoryAvailabilitySource::new("trainerAvailability"));
        let legacy = Arc::new(InMemoryAvailabilitySource::new("trainers"));

        let current_source: Arc<dyn AvailabilitySource> = current.clone();
        let legacy_source: Arc<dyn AvailabilitySource> = legacy.clone();
        let availability = Arc::new(LayeredAvailabilityStore::new(current_source, legacy_source));

        let notifications = Notifications::new(notifier.clone(), notifier.clone());
        let engine = Arc::new(BookingEngine::new(booking_store.clone(), notifications));
        let resolver = SlotAvailabilityResolver::new(availability, booking_store);
        let workflow = RescheduleWorkflow::new(Arc::clone(&engine), reschedule_store);

        Self {
            bookings,
            reschedules,
            current,
            legacy,
            notifier,
            engine,
            resolver,
            workflow,
        }
    }
}
