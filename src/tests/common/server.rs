use axum_test::{TestServer, TestServerConfig};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

use crate::handlers::api::AppState;
use crate::ports::{AvailabilitySource, BookingStore};
use crate::routes::create_router;
use crate::services::availability_store::LayeredAvailabilityStore;
use crate::services::booking::BookingEngine;
use crate::services::database::{create_database_stores, CsvBookingStore, CsvRescheduleStore};
use crate::services::memory::{InMemoryAvailabilitySource, RecordingNotifier};
use crate::services::notifications::Notifications;
use crate::services::reschedule::RescheduleWorkflow;
use crate::services::slot_resolver::SlotAvailabilityResolver;

/// The router over CSV stores in a temporary directory, served on the
/// mock transport.
pub struct TestEnvironment {
    pub server: TestServer,
    pub bookings: Arc<CsvBookingStore>,
    pub reschedules: Arc<CsvRescheduleStore>,
    pub availability: Arc<InMemoryAvailabilitySource>,
    pub notifier: Arc<RecordingNotifier>,
    // Keeps the data directory alive for the duration of the test
    _data_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let data_dir = tempdir().unwrap();
        let (bookings, reschedules) = create_database_stores(data_dir.path()).unwrap();
        Self::build(data_dir, bookings.clone(), bookings, reschedules)
    }

    /// Same wiring, but the engine and resolver use `booking_store`.
    pub fn with_booking_store(booking_store: Arc<dyn BookingStore>) -> Self {
        let data_dir = tempdir().unwrap();
        let (bookings, reschedules) = create_database_stores(data_dir.path()).unwrap();
        Self::build(data_dir, booking_store, bookings, reschedules)
    }

    fn build(
        data_dir: TempDir,
        booking_store: Arc<dyn BookingStore>,
        bookings: Arc<CsvBookingStore>,
        reschedules: Arc<CsvRescheduleStore>,
    ) -> Self {
        let availability = Arc::new(InMemoryAvailabilitySource::new("trainerAvailability"));
        let current: Arc<dyn AvailabilitySource> = availability.clone();
        let legacy: Arc<dyn AvailabilitySource> =
            Arc::new(InMemoryAvailabilitySource::new("trainers"));

        let notifier = Arc::new(RecordingNotifier::new());
        let engine = Arc::new(BookingEngine::new(
            booking_store.clone(),
            Notifications::new(notifier.clone(), notifier.clone()),
        ));

        let app_state = Arc::new(AppState {
            resolver: SlotAvailabilityResolver::new(
                Arc::new(LayeredAvailabilityStore::new(current, legacy)),
                booking_store,
            ),
            workflow: RescheduleWorkflow::new(Arc::clone(&engine), reschedules.clone()),
            engine,
        });

        let config = TestServerConfig::builder().mock_transport().build();
        let server = TestServer::new_with_config(create_router(app_state), config).unwrap();

        Self {
            server,
            bookings,
            reschedules,
            availability,
            notifier,
            _data_dir: data_dir,
        }
    }
}
