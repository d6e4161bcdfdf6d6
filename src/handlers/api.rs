use axum::{
    extract::{Json as ExtractJson, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::SchedulingError;
use crate::models::availability::TimeSlot;
use crate::models::booking::{Booking, BookingRequest};
use crate::models::common::{CreatedResponse, RoleQueryParams, SlotQueryParams};
use crate::models::reschedule::{CreateRescheduleRequest, RescheduleRequest};
use crate::services::booking::BookingEngine;
use crate::services::reschedule::RescheduleWorkflow;
use crate::services::slot_resolver::SlotAvailabilityResolver;

// AppState struct containing shared resources
pub struct AppState {
    pub resolver: SlotAvailabilityResolver,
    pub engine: Arc<BookingEngine>,
    pub workflow: RescheduleWorkflow,
}

// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rebook_required: bool,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub fn error_response(err: SchedulingError) -> ApiError {
    let status = match &err {
        SchedulingError::InvalidTimeFormat(_)
        | SchedulingError::InvalidTimezone(_)
        | SchedulingError::InvalidAvailability(_)
        | SchedulingError::Validation(_) => StatusCode::BAD_REQUEST,
        SchedulingError::BookingNotFound(_) | SchedulingError::RescheduleNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        SchedulingError::InvalidState { .. } => StatusCode::CONFLICT,
        SchedulingError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        SchedulingError::PartialWorkflowFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }

    (
        status,
        Json(ErrorBody {
            rebook_required: matches!(err, SchedulingError::PartialWorkflowFailure { .. }),
            error: err.to_string(),
        }),
    )
}

// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

// Bookable slots of a trainer for one date
pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    Path(trainer_id): Path<String>,
    Query(params): Query<SlotQueryParams>,
) -> Result<Json<Vec<TimeSlot>>, ApiError> {
    info!(
        "Received request for slots of trainer {} on {}",
        trainer_id, params.date
    );

    let slots = state
        .resolver
        .resolve(&trainer_id, params.date)
        .await
        .map_err(error_response)?;

    info!("Returning {} slots for trainer {}", slots.len(), trainer_id);
    Ok(Json(slots))
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    ExtractJson(request): ExtractJson<BookingRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    info!(
        "Received booking request for trainer {} and client {}",
        request.trainer_id, request.client_id
    );

    let id = state
        .engine
        .book_session(request)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    state
        .engine
        .get_booking(&booking_id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    info!("Received request to cancel booking: {}", booking_id);

    state
        .engine
        .cancel_booking(&booking_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::OK)
}

pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    info!("Received request to complete booking: {}", booking_id);

    state
        .engine
        .complete_booking(&booking_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::OK)
}

pub async fn list_user_bookings(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<RoleQueryParams>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    state
        .engine
        .get_user_bookings(&user_id, params.role)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn list_upcoming_sessions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<RoleQueryParams>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    state
        .engine
        .get_upcoming_week_sessions(&user_id, params.role)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn create_reschedule(
    State(state): State<Arc<AppState>>,
    ExtractJson(request): ExtractJson<CreateRescheduleRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    info!(
        "Received reschedule request for booking {} by {}",
        request.booking_id, request.requested_by
    );

    let original = state
        .engine
        .get_booking(&request.booking_id)
        .await
        .map_err(error_response)?;

    let id = state
        .workflow
        .create(
            &original,
            request.new_local_date,
            &request.new_local_time,
            &request.reason,
            request.requested_by,
            request.timezone.as_deref(),
        )
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn get_reschedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RescheduleRequest>, ApiError> {
    state
        .workflow
        .get(&id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn accept_reschedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    info!("Received request to accept reschedule: {}", id);

    state.workflow.accept(&id).await.map_err(error_response)?;
    Ok(StatusCode::OK)
}

pub async fn reject_reschedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    info!("Received request to reject reschedule: {}", id);

    state.workflow.reject(&id).await.map_err(error_response)?;
    Ok(StatusCode::OK)
}
