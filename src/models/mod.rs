pub mod availability;
pub mod booking;
pub mod chat;
pub mod common;
pub mod reschedule;
