use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionType {
    Online,
    InPerson,
}

// Which side of a booking a user is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Trainer,
    Client,
}

impl Role {
    pub fn counterparty(&self) -> Role {
        match self {
            Role::Trainer => Role::Client,
            Role::Client => Role::Trainer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Trainer => "trainer",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Persisted booking record; UTC instants are the only authoritative time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub booking_id: String,
    pub trainer_id: String,
    pub client_id: String,
    pub start_time_utc: DateTime<Utc>,
    pub end_time_utc: DateTime<Utc>,
    pub timezone: String,
    pub duration: i64,
    pub status: BookingStatus,
    pub session_type: SessionType,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }

    pub fn party_id(&self, role: Role) -> &str {
        match role {
            Role::Trainer => &self.trainer_id,
            Role::Client => &self.client_id,
        }
    }

    /// Chat conversation shared by the trainer and client of this booking.
    pub fn chat_id(&self) -> String {
        chat_id_for(&self.trainer_id, &self.client_id)
    }
}

pub fn chat_id_for(trainer_id: &str, client_id: &str) -> String {
    format!("{}_{}", trainer_id, client_id)
}

/// Input for creating a booking.
///
/// Timing is given either as a local date and wall-clock start time in
/// `timezone`, or as a precomputed UTC start (and optional end). When both
/// are present the precomputed instants win.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub trainer_id: String,
    pub client_id: String,
    pub local_date: Option<NaiveDate>,
    pub local_start_time: Option<String>,
    pub start_time_utc: Option<DateTime<Utc>>,
    pub end_time_utc: Option<DateTime<Utc>>,
    pub timezone: String,
    pub duration: i64,
    pub session_type: SessionType,
    pub status: Option<BookingStatus>,
    pub location: Option<String>,
}

impl BookingRequest {
    /// Request for a session starting at a local wall-clock time.
    pub fn local(
        trainer_id: &str,
        client_id: &str,
        local_date: NaiveDate,
        local_start_time: &str,
        timezone: &str,
        duration: i64,
    ) -> Self {
        Self {
            trainer_id: trainer_id.to_string(),
            client_id: client_id.to_string(),
            local_date: Some(local_date),
            local_start_time: Some(local_start_time.to_string()),
            start_time_utc: None,
            end_time_utc: None,
            timezone: timezone.to_string(),
            duration,
            session_type: SessionType::Online,
            status: None,
            location: None,
        }
    }

    pub fn in_person(mut self, location: &str) -> Self {
        self.session_type = SessionType::InPerson;
        self.location = Some(location.to_string());
        self
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = Some(status);
        self
    }
}
