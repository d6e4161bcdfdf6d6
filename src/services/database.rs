use async_trait::async_trait;
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use crate::error::{SchedulingError, SchedulingResult};
use crate::models::booking::{Booking, BookingStatus, Role};
use crate::models::reschedule::{RescheduleRequest, RescheduleStatus};
use crate::ports::{BookingStore, RescheduleStore};
use crate::services::time_conversion::date_window_utc;

pub const BOOKINGS_FILE: &str = "bookings.csv";
pub const RESCHEDULES_FILE: &str = "reschedules.csv";

fn store_error(context: &str, e: impl std::fmt::Display) -> SchedulingError {
    error!("{}: {}", context, e);
    SchedulingError::StoreUnavailable(format!("{}: {}", context, e))
}

/// A CSV file holding one record type, rewritten in full on every change.
///
/// Records are never deleted, only updated in place, so the file doubles as
/// the history of every booking.
struct CsvTable<T> {
    path: PathBuf,
    file_mutex: Mutex<()>,
    _record: std::marker::PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> CsvTable<T> {
    fn open(path: &Path) -> SchedulingResult<Self> {
        if !path.exists() {
            info!("Creating new database file at {}", path.display());
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .map_err(|e| store_error("Failed to create data directory", e))?;
            }
            File::create(path).map_err(|e| store_error("Failed to create database file", e))?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            file_mutex: Mutex::new(()),
            _record: std::marker::PhantomData,
        })
    }

    fn read_all_unlocked(&self) -> SchedulingResult<Vec<T>> {
        let file = File::open(&self.path)
            .map_err(|e| store_error("Failed to open database file", e))?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        reader
            .deserialize()
            .map(|record| record.map_err(|e| store_error("Failed to read record", e)))
            .collect()
    }

    fn write_all_unlocked(&self, records: &[T]) -> SchedulingResult<()> {
        let file = File::create(&self.path)
            .map_err(|e| store_error("Failed to open database file for writing", e))?;
        let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

        for record in records {
            writer
                .serialize(record)
                .map_err(|e| store_error("Failed to write record", e))?;
        }

        writer
            .flush()
            .map_err(|e| store_error("Failed to flush writer", e))
    }

    fn read_all(&self) -> SchedulingResult<Vec<T>> {
        let _lock = self
            .file_mutex
            .lock()
            .map_err(|e| store_error("Failed to acquire mutex", e))?;
        self.read_all_unlocked()
    }

    // Read, change and write back under one lock
    fn modify<R>(&self, change: impl FnOnce(&mut Vec<T>) -> SchedulingResult<R>) -> SchedulingResult<R> {
        let _lock = self
            .file_mutex
            .lock()
            .map_err(|e| store_error("Failed to acquire mutex", e))?;

        let mut records = self.read_all_unlocked()?;
        let result = change(&mut records)?;
        self.write_all_unlocked(&records)?;
        Ok(result)
    }
}

/// Booking store persisted to `bookings.csv`.
pub struct CsvBookingStore {
    table: CsvTable<Booking>,
}

impl CsvBookingStore {
    pub fn new(path: &Path) -> SchedulingResult<Self> {
        Ok(Self {
            table: CsvTable::open(path)?,
        })
    }

    pub fn all(&self) -> SchedulingResult<Vec<Booking>> {
        self.table.read_all()
    }
}

#[async_trait]
impl BookingStore for CsvBookingStore {
    async fn get(&self, booking_id: &str) -> SchedulingResult<Option<Booking>> {
        Ok(self
            .table
            .read_all()?
            .into_iter()
            .find(|b| b.booking_id == booking_id))
    }

    async fn put(&self, booking: &Booking) -> SchedulingResult<()> {
        self.table.modify(|records| {
            match records.iter_mut().find(|b| b.booking_id == booking.booking_id) {
                Some(existing) => *existing = booking.clone(),
                None => records.push(booking.clone()),
            }
            Ok(())
        })?;
        debug!("Wrote booking {} to {}", booking.booking_id, self.table.path.display());
        Ok(())
    }

    async fn update_status(&self, booking_id: &str, status: BookingStatus) -> SchedulingResult<()> {
        self.table.modify(|records| {
            let booking = records
                .iter_mut()
                .find(|b| b.booking_id == booking_id)
                .ok_or_else(|| SchedulingError::BookingNotFound(booking_id.to_string()))?;
            booking.status = status;
            Ok(())
        })?;
        info!("Marked booking {} as {}", booking_id, status);
        Ok(())
    }

    async fn query_by_trainer_and_date(
        &self,
        trainer_id: &str,
        date: NaiveDate,
    ) -> SchedulingResult<Vec<Booking>> {
        let (from, to) = date_window_utc(date);
        Ok(self
            .table
            .read_all()?
            .into_iter()
            .filter(|b| {
                b.trainer_id == trainer_id && b.start_time_utc >= from && b.start_time_utc < to
            })
            .collect())
    }

    async fn query_by_user(&self, user_id: &str, role: Role) -> SchedulingResult<Vec<Booking>> {
        Ok(self
            .table
            .read_all()?
            .into_iter()
            .filter(|b| b.party_id(role) == user_id)
            .collect())
    }
}

/// Reschedule request store persisted to `reschedules.csv`.
pub struct CsvRescheduleStore {
    table: CsvTable<RescheduleRequest>,
}

impl CsvRescheduleStore {
    pub fn new(path: &Path) -> SchedulingResult<Self> {
        Ok(Self {
            table: CsvTable::open(path)?,
        })
    }
}

#[async_trait]
impl RescheduleStore for CsvRescheduleStore {
    async fn get(&self, id: &str) -> SchedulingResult<Option<RescheduleRequest>> {
        Ok(self.table.read_all()?.into_iter().find(|r| r.id == id))
    }

    async fn put(&self, request: &RescheduleRequest) -> SchedulingResult<()> {
        self.table.modify(|records| {
            match records.iter_mut().find(|r| r.id == request.id) {
                Some(existing) => *existing = request.clone(),
                None => records.push(request.clone()),
            }
            Ok(())
        })
    }

    async fn update_status(&self, id: &str, status: RescheduleStatus) -> SchedulingResult<()> {
        self.table.modify(|records| {
            let request = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| SchedulingError::RescheduleNotFound(id.to_string()))?;
            request.status = status;
            Ok(())
        })?;
        info!("Marked reschedule {} as {}", id, status);
        Ok(())
    }
}

/// Open both CSV-backed stores inside `data_dir`.
pub fn create_database_stores(
    data_dir: &Path,
) -> SchedulingResult<(Arc<CsvBookingStore>, Arc<CsvRescheduleStore>)> {
    let bookings = CsvBookingStore::new(&data_dir.join(BOOKINGS_FILE))?;
    let reschedules = CsvRescheduleStore::new(&data_dir.join(RESCHEDULES_FILE))?;
    info!("Database stores initialized in {}", data_dir.display());
    Ok((Arc::new(bookings), Arc::new(reschedules)))
}
