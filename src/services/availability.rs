use tracing::{debug, warn};

use crate::error::{SchedulingError, SchedulingResult};
use crate::models::availability::{DayAvailability, TimeSlot, TimeWindow};
use crate::services::time_conversion::{format_wall_clock, parse_wall_clock};

/// Fixed length of a bookable slot, in minutes.
pub const SLOT_MINUTES: u32 = 30;

// Parse a window's bounds into minutes past midnight
pub fn parse_window(window: &TimeWindow) -> SchedulingResult<(u32, u32)> {
    let start = parse_wall_clock(&window.start_time)?;
    let end = parse_wall_clock(&window.end_time)?;
    Ok((start, end))
}

impl DayAvailability {
    /// Check that every window parses, starts before it ends, and that no two
    /// windows overlap. Windows that merely touch ("9-12", "12-5") are fine.
    pub fn validate(&self) -> SchedulingResult<()> {
        let mut ranges = self
            .time_windows
            .iter()
            .map(|window| {
                let (start, end) = parse_window(window)?;
                if start >= end {
                    return Err(SchedulingError::InvalidAvailability(format!(
                        "{} window {}-{} does not start before it ends",
                        self.day, window.start_time, window.end_time
                    )));
                }
                Ok((start, end))
            })
            .collect::<SchedulingResult<Vec<_>>>()?;

        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            let (_, previous_end) = pair[0];
            let (next_start, _) = pair[1];
            if next_start < previous_end {
                return Err(SchedulingError::InvalidAvailability(format!(
                    "{} has overlapping windows starting at {} and {}",
                    self.day,
                    format_wall_clock(pair[0].0),
                    format_wall_clock(next_start)
                )));
            }
        }

        Ok(())
    }
}

// Step through one window at the slot cadence, both bounds inclusive
fn window_slot_starts(start: u32, end: u32) -> Vec<u32> {
    let mut starts: Vec<u32> = (start..=end).step_by(SLOT_MINUTES as usize).collect();

    // A span that is not a whole number of slots still offers its end time
    if (end - start) % SLOT_MINUTES != 0 {
        starts.push(end);
    }

    starts
}

/// Generate the bookable slots for one weekday.
///
/// Returns an empty list when the day is switched off or has no windows,
/// regardless of window content. Otherwise every window is validated and
/// expanded into 30-minute slot starts, both bounds inclusive, in
/// chronological order. A malformed window time fails with
/// `InvalidTimeFormat` instead of quietly producing no slots.
pub fn generate_slots(day: &DayAvailability) -> SchedulingResult<Vec<TimeSlot>> {
    if !day.available || day.time_windows.is_empty() {
        debug!("No slots for {}: available={}", day.day, day.available);
        return Ok(Vec::new());
    }

    if let Err(e) = day.validate() {
        warn!("Rejecting availability for {}: {}", day.day, e);
        return Err(e);
    }

    let mut ranges = day
        .time_windows
        .iter()
        .map(parse_window)
        .collect::<SchedulingResult<Vec<_>>>()?;
    ranges.sort_unstable();

    // Touching windows share a boundary slot; keep it once
    let mut starts: Vec<u32> = ranges
        .into_iter()
        .flat_map(|(start, end)| window_slot_starts(start, end))
        .collect();
    starts.dedup();

    let slots: Vec<TimeSlot> = starts
        .into_iter()
        .map(|minute| TimeSlot {
            time: format_wall_clock(minute),
            available: day.available,
            booked: false,
        })
        .collect();

    debug!(
        "Generated {} slots for {} across {} windows",
        slots.len(),
        day.day,
        day.time_windows.len()
    );

    Ok(slots)
}
