//! Trainer Session Scheduler
//!
//! This library schedules one-to-one sessions between trainers and clients.
//! Trainers publish a recurring weekly availability in their own timezone;
//! clients see it as discrete 30-minute slots, book them, and either party
//! can cancel or propose a new time.
//!
//! # Modules
//!
//! - `services`: time conversion, slot generation, booking and rescheduling
//! - `ports`: traits for storage and notification delivery
//! - `client`: webhook delivery of calendar events and chat lines
//! - `auth`: HMAC-SHA256 request signing for the webhook
//! - `handlers` / `routes`: the axum HTTP surface
//!
//! # Time handling
//!
//! Every instant is stored in UTC together with the IANA zone it was booked
//! in. Wall-clock strings are converted using the offset in force on the
//! specific date, so sessions on either side of a DST change keep their
//! local time.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod ports;
pub mod routes;
pub mod services;


#[cfg(test)]
mod tests;

// Re-export the main API types for ease of use
pub use auth::WebhookAuth;
pub use client::WebhookNotifierClient;
pub use config::Config;
pub use error::{ConfigError, NotificationError, SchedulingError, SchedulingResult};
pub use handlers::api::AppState;
pub use routes::create_router;
