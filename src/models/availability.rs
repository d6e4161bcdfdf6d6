use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// Day of the week as stored in trainer availability documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Sun,
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ];

    pub fn full_name(&self) -> &'static str {
        match self {
            Weekday::Sun => "Sunday",
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
        }
    }

    pub fn short_name(&self) -> &'static str {
        &self.full_name()[..3]
    }

    /// Parse a day name the way older and newer app versions wrote it.
    ///
    /// Matching is case-insensitive and accepts either the full name
    /// ("Monday") or the 3-letter form ("Mon"). Surrounding whitespace is
    /// ignored.
    pub fn parse_name(name: &str) -> Option<Weekday> {
        let name = name.trim();
        Weekday::ALL.into_iter().find(|day| {
            name.eq_ignore_ascii_case(day.full_name()) || name.eq_ignore_ascii_case(day.short_name())
        })
    }

    pub fn matches_name(&self, name: &str) -> bool {
        Weekday::parse_name(name) == Some(*self)
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Sun => Weekday::Sun,
            chrono::Weekday::Mon => Weekday::Mon,
            chrono::Weekday::Tue => Weekday::Tue,
            chrono::Weekday::Wed => Weekday::Wed,
            chrono::Weekday::Thu => Weekday::Thu,
            chrono::Weekday::Fri => Weekday::Fri,
            chrono::Weekday::Sat => Weekday::Sat,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

impl Serialize for Weekday {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.full_name())
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Weekday::parse_name(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown weekday '{}'", raw)))
    }
}

// A contiguous local time range within which a trainer accepts sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start_time: String,
    pub end_time: String,
}

impl TimeWindow {
    pub fn new(start_time: &str, end_time: &str) -> Self {
        Self {
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
        }
    }
}

// One weekday of a trainer's recurring schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub day: Weekday,
    pub available: bool,
    #[serde(default)]
    pub time_windows: Vec<TimeWindow>,
}

// Structure to represent a bookable slot start; computed, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub time: String,
    pub available: bool,
    pub booked: bool,
}

/// Find the entry for `weekday` in a trainer's week.
pub fn find_day(days: &[DayAvailability], weekday: Weekday) -> Option<&DayAvailability> {
    days.iter().find(|day| day.day == weekday)
}

// A trainer's persisted weekly schedule as read from one storage location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerAvailability {
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub availability: Vec<DayAvailability>,
}
