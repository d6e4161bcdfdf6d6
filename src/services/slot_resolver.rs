use chrono::{Datelike, NaiveDate};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::SchedulingResult;
use crate::models::availability::{find_day, TimeSlot, Weekday};
use crate::models::booking::Booking;
use crate::ports::{AvailabilityStore, BookingStore};
use crate::services::availability::generate_slots;
use crate::services::time_conversion::{format_for_display, local_date, DisplayFormat};

/// Computes a trainer's bookable slots for a date, flagging the taken ones.
///
/// This is a read-only query. The free/booked answer is advisory: two
/// clients reading the same free slot can both go on to book it, as nothing
/// here reserves anything.
pub struct SlotAvailabilityResolver {
    availability: Arc<dyn AvailabilityStore>,
    bookings: Arc<dyn BookingStore>,
}

impl SlotAvailabilityResolver {
    pub fn new(availability: Arc<dyn AvailabilityStore>, bookings: Arc<dyn BookingStore>) -> Self {
        Self {
            availability,
            bookings,
        }
    }

    pub async fn resolve(&self, trainer_id: &str, date: NaiveDate) -> SchedulingResult<Vec<TimeSlot>> {
        let weekday = Weekday::from(date.weekday());

        // One read so the day and its timezone come from the same location
        let week = match self
            .availability
            .get_week_availability(trainer_id)
            .await?
        {
            Some(week) => week,
            None => {
                debug!("Trainer {} has no availability on record", trainer_id);
                return Ok(Vec::new());
            }
        };

        let day = match find_day(&week.availability, weekday) {
            Some(day) if day.available => day,
            Some(_) => {
                debug!("Trainer {} is not available on {}", trainer_id, weekday);
                return Ok(Vec::new());
            }
            None => {
                debug!("Trainer {} has no availability for {}", trainer_id, weekday);
                return Ok(Vec::new());
            }
        };

        let mut slots = generate_slots(day)?;
        if slots.is_empty() {
            return Ok(slots);
        }

        let trainer_timezone = week.timezone.as_deref();
        let active: Vec<Booking> = self
            .bookings
            .query_by_trainer_and_date(trainer_id, date)
            .await?
            .into_iter()
            .filter(Booking::is_active)
            .collect();

        let taken: HashSet<String> = active
            .iter()
            .filter_map(|booking| {
                let timezone = trainer_timezone.unwrap_or(&booking.timezone);
                booked_slot_time(booking, timezone, date)
            })
            .collect();

        for slot in &mut slots {
            slot.booked = taken.contains(&slot.time);
        }

        info!(
            "Resolved {} slots for trainer {} on {} ({} booked)",
            slots.len(),
            trainer_id,
            date,
            slots.iter().filter(|slot| slot.booked).count()
        );

        Ok(slots)
    }

    /// Resolve several trainers for the same date concurrently.
    ///
    /// Each trainer gets its own result so one bad schedule does not hide
    /// the others.
    pub async fn resolve_many(
        &self,
        trainer_ids: &[String],
        date: NaiveDate,
    ) -> Vec<(String, SchedulingResult<Vec<TimeSlot>>)> {
        let lookups = trainer_ids.iter().map(|trainer_id| async move {
            (trainer_id.clone(), self.resolve(trainer_id, date).await)
        });
        join_all(lookups).await
    }
}

// Wall-clock start of a booking in `timezone`, if it lands on `date` there
fn booked_slot_time(booking: &Booking, timezone: &str, date: NaiveDate) -> Option<String> {
    match local_date(booking.start_time_utc, timezone) {
        Ok(day) if day == date => {}
        Ok(_) => return None,
        Err(e) => {
            warn!(
                "Skipping booking {} with unusable timezone: {}",
                booking.booking_id, e
            );
            return None;
        }
    }

    format_for_display(booking.start_time_utc, timezone, DisplayFormat::Time).ok()
}
