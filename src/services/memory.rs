use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::{NotificationError, SchedulingError, SchedulingResult};
use crate::models::availability::TrainerAvailability;
use crate::models::booking::{Booking, BookingStatus, Role};
use crate::models::chat::ChatMessage;
use crate::models::reschedule::{RescheduleRequest, RescheduleStatus};
use crate::ports::{
    AvailabilitySource, BookingStore, CalendarNotifier, ChatNotifier, RescheduleStore,
};
use crate::services::time_conversion::date_window_utc;

fn lock<T>(mutex: &Mutex<T>) -> SchedulingResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| SchedulingError::StoreUnavailable(format!("Failed to acquire mutex: {}", e)))
}

/// Booking store held in process memory.
#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: Mutex<HashMap<String, Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bookings.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn get(&self, booking_id: &str) -> SchedulingResult<Option<Booking>> {
        Ok(lock(&self.bookings)?.get(booking_id).cloned())
    }

    async fn put(&self, booking: &Booking) -> SchedulingResult<()> {
        lock(&self.bookings)?.insert(booking.booking_id.clone(), booking.clone());
        debug!("Stored booking {} in memory", booking.booking_id);
        Ok(())
    }

    async fn update_status(&self, booking_id: &str, status: BookingStatus) -> SchedulingResult<()> {
        let mut bookings = lock(&self.bookings)?;
        let booking = bookings
            .get_mut(booking_id)
            .ok_or_else(|| SchedulingError::BookingNotFound(booking_id.to_string()))?;
        booking.status = status;
        Ok(())
    }

    async fn query_by_trainer_and_date(
        &self,
        trainer_id: &str,
        date: NaiveDate,
    ) -> SchedulingResult<Vec<Booking>> {
        let (from, to) = date_window_utc(date);
        Ok(lock(&self.bookings)?
            .values()
            .filter(|b| {
                b.trainer_id == trainer_id && b.start_time_utc >= from && b.start_time_utc < to
            })
            .cloned()
            .collect())
    }

    async fn query_by_user(&self, user_id: &str, role: Role) -> SchedulingResult<Vec<Booking>> {
        Ok(lock(&self.bookings)?
            .values()
            .filter(|b| b.party_id(role) == user_id)
            .cloned()
            .collect())
    }
}

/// Reschedule request store held in process memory.
#[derive(Default)]
pub struct InMemoryRescheduleStore {
    requests: Mutex<HashMap<String, RescheduleRequest>>,
}

impl InMemoryRescheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RescheduleStore for InMemoryRescheduleStore {
    async fn get(&self, id: &str) -> SchedulingResult<Option<RescheduleRequest>> {
        Ok(lock(&self.requests)?.get(id).cloned())
    }

    async fn put(&self, request: &RescheduleRequest) -> SchedulingResult<()> {
        lock(&self.requests)?.insert(request.id.clone(), request.clone());
        Ok(())
    }

    async fn update_status(&self, id: &str, status: RescheduleStatus) -> SchedulingResult<()> {
        let mut requests = lock(&self.requests)?;
        let request = requests
            .get_mut(id)
            .ok_or_else(|| SchedulingError::RescheduleNotFound(id.to_string()))?;
        request.status = status;
        Ok(())
    }
}

/// Availability documents for one storage location, held in memory.
pub struct InMemoryAvailabilitySource {
    name: String,
    trainers: Mutex<HashMap<String, TrainerAvailability>>,
}

impl InMemoryAvailabilitySource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            trainers: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_documents(name: &str, documents: HashMap<String, TrainerAvailability>) -> Self {
        info!(
            "Loaded availability for {} trainers into source '{}'",
            documents.len(),
            name
        );
        Self {
            name: name.to_string(),
            trainers: Mutex::new(documents),
        }
    }

    pub fn insert(&self, trainer_id: &str, availability: TrainerAvailability) {
        if let Ok(mut trainers) = self.trainers.lock() {
            trainers.insert(trainer_id.to_string(), availability);
        }
    }
}

#[async_trait]
impl AvailabilitySource for InMemoryAvailabilitySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load_week(&self, trainer_id: &str) -> SchedulingResult<Option<TrainerAvailability>> {
        Ok(lock(&self.trainers)?.get(trainer_id).cloned())
    }
}

/// Notifier that keeps every calendar event and chat line it is asked to
/// deliver. With `failing()` every delivery errors after being recorded.
#[derive(Default)]
pub struct RecordingNotifier {
    calendar_events: Mutex<Vec<String>>,
    messages: Mutex<Vec<ChatMessage>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Booking ids calendar events were requested for.
    pub fn calendar_events(&self) -> Vec<String> {
        self.calendar_events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    fn outcome(&self) -> Result<(), NotificationError> {
        if self.fail {
            Err(NotificationError::Unavailable(
                "recording notifier configured to fail".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CalendarNotifier for RecordingNotifier {
    async fn create_session_event(&self, booking: &Booking) -> Result<(), NotificationError> {
        if let Ok(mut events) = self.calendar_events.lock() {
            events.push(booking.booking_id.clone());
        }
        self.outcome()
    }
}

#[async_trait]
impl ChatNotifier for RecordingNotifier {
    async fn send_system_message(
        &self,
        chat_id: &str,
        sender_id: &str,
        text: &str,
    ) -> Result<(), NotificationError> {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(ChatMessage::new(chat_id, sender_id, text));
        }
        self.outcome()
    }
}
