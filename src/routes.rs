use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers::api::{
    accept_reschedule, cancel_booking, complete_booking, create_booking, create_reschedule,
    get_booking, get_reschedule, health_check, list_slots, list_upcoming_sessions,
    list_user_bookings, reject_reschedule, AppState,
};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let health_route = Router::new().route("/health", get(health_check));

    let booking_routes = Router::new()
        .route("/trainers/:trainer_id/slots", get(list_slots))
        .route("/bookings", post(create_booking))
        .route("/bookings/:booking_id", get(get_booking))
        .route("/bookings/:booking_id/cancel", post(cancel_booking))
        .route("/bookings/:booking_id/complete", post(complete_booking))
        .route("/users/:user_id/bookings", get(list_user_bookings))
        .route("/users/:user_id/bookings/upcoming", get(list_upcoming_sessions));

    let reschedule_routes = Router::new()
        .route("/reschedules", post(create_reschedule))
        .route("/reschedules/:id", get(get_reschedule))
        .route("/reschedules/:id/accept", post(accept_reschedule))
        .route("/reschedules/:id/reject", post(reject_reschedule));

    Router::new()
        .merge(health_route)
        .merge(booking_routes)
        .merge(reschedule_routes)
        .with_state(app_state)
}
