use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{SchedulingError, SchedulingResult};
use crate::models::availability::TrainerAvailability;
use crate::ports::{AvailabilitySource, AvailabilityStore};
use crate::services::memory::InMemoryAvailabilitySource;

/// Availability store reading from an ordered list of storage locations.
///
/// Trainer schedules have lived in two places over the app's history: on the
/// trainer profile (legacy) and in a dedicated availability collection
/// (current). Sources are consulted in order and the first one holding a
/// non-empty week wins outright; data from different sources is never merged.
pub struct LayeredAvailabilityStore {
    sources: Vec<Arc<dyn AvailabilitySource>>,
}

impl LayeredAvailabilityStore {
    pub fn new(current: Arc<dyn AvailabilitySource>, legacy: Arc<dyn AvailabilitySource>) -> Self {
        Self {
            sources: vec![current, legacy],
        }
    }

    pub fn with_sources(sources: Vec<Arc<dyn AvailabilitySource>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl AvailabilityStore for LayeredAvailabilityStore {
    async fn get_week_availability(
        &self,
        trainer_id: &str,
    ) -> SchedulingResult<Option<TrainerAvailability>> {
        for source in &self.sources {
            match source.load_week(trainer_id).await? {
                Some(week) if !week.availability.is_empty() => {
                    debug!(
                        "Using availability for trainer {} from source '{}'",
                        trainer_id,
                        source.name()
                    );
                    return Ok(Some(week));
                }
                _ => {
                    debug!(
                        "No availability for trainer {} in source '{}'",
                        trainer_id,
                        source.name()
                    );
                }
            }
        }

        Ok(None)
    }
}

/// Load an availability source from a JSON document mapping trainer ids to
/// `{ "timezone": ..., "availability": [...] }`.
///
/// A missing file yields an empty source so a deployment without legacy data
/// still starts.
pub fn load_availability_file(name: &str, path: &Path) -> SchedulingResult<InMemoryAvailabilitySource> {
    if !path.exists() {
        info!(
            "Availability file {} for source '{}' not found, starting empty",
            path.display(),
            name
        );
        return Ok(InMemoryAvailabilitySource::new(name));
    }

    let raw = fs::read_to_string(path).map_err(|e| {
        SchedulingError::StoreUnavailable(format!(
            "Failed to read availability file {}: {}",
            path.display(),
            e
        ))
    })?;

    let documents: HashMap<String, TrainerAvailability> =
        serde_json::from_str(&raw).map_err(|e| {
            SchedulingError::InvalidAvailability(format!(
                "Failed to parse availability file {}: {}",
                path.display(),
                e
            ))
        })?;

    Ok(InMemoryAvailabilitySource::from_documents(name, documents))
}
