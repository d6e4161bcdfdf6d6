use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::booking::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RescheduleStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RescheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RescheduleStatus::Pending => "pending",
            RescheduleStatus::Accepted => "accepted",
            RescheduleStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RescheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Links a cancelled original booking to its pending replacement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub id: String,
    pub original_booking_id: String,
    pub new_booking_id: String,
    pub trainer_id: String,
    pub client_id: String,
    pub original_start_time_utc: DateTime<Utc>,
    pub new_start_time_utc: DateTime<Utc>,
    pub timezone: String,
    pub reason: String,
    pub requested_by: Role,
    pub status: RescheduleStatus,
    pub created_at: DateTime<Utc>,
}

impl RescheduleRequest {
    /// Id of the party that requested the move.
    pub fn requester_id(&self) -> &str {
        match self.requested_by {
            Role::Trainer => &self.trainer_id,
            Role::Client => &self.client_id,
        }
    }

    /// Id of the party expected to accept or reject.
    pub fn responder_id(&self) -> &str {
        match self.requested_by {
            Role::Trainer => &self.client_id,
            Role::Client => &self.trainer_id,
        }
    }
}

// Body of a reschedule creation call
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRescheduleRequest {
    pub booking_id: String,
    pub new_local_date: NaiveDate,
    pub new_local_time: String,
    #[serde(default)]
    pub reason: String,
    pub requested_by: Role,
    pub timezone: Option<String>,
}
