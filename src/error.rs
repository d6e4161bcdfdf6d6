//! Error types for the scheduling core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("Invalid time format: '{0}'")]
    InvalidTimeFormat(String),

    #[error("Unknown timezone: '{0}'")]
    InvalidTimezone(String),

    #[error("Invalid availability: {0}")]
    InvalidAvailability(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} {id} is {status}, cannot {action}")]
    InvalidState {
        entity: &'static str,
        id: String,
        status: String,
        action: &'static str,
    },

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Reschedule request not found: {0}")]
    RescheduleNotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The original booking was cancelled but no usable replacement exists.
    /// The caller should ask the user to book again rather than retry.
    #[error("Reschedule of booking {original_booking_id} left it cancelled without a replacement: {source}")]
    PartialWorkflowFailure {
        original_booking_id: String,
        #[source]
        source: Box<SchedulingError>,
    },
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// Failure delivering a calendar or chat side effect. Only ever logged.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Notification endpoint rejected request with status {0}")]
    Rejected(u16),

    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),
}

/// Invalid or missing service configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("Invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}
