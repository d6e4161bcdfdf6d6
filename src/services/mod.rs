pub mod availability;
pub mod availability_store;
pub mod booking;
pub mod database;
pub mod memory;
pub mod notifications;
pub mod reschedule;
pub mod slot_resolver;
pub mod time_conversion;
