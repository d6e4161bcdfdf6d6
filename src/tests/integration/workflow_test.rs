use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::SchedulingError;
use crate::models::availability::{TimeSlot, Weekday};
use crate::models::booking::BookingStatus;
use crate::models::common::CreatedResponse;
use crate::ports::{MockBookingStore, RescheduleStore};
use crate::tests::common::fixtures::{
    open_day, sample_booking, settle, week, CLIENT_ID, LOS_ANGELES, TRAINER_ID,
};
use crate::tests::common::server::TestEnvironment;

/// End-to-end workflow tests
#[cfg(test)]
mod workflow_tests {
    use super::*;

    // Books Tuesday 2025-06-10 3:00 PM in Los Angeles
    async fn book_original(env: &TestEnvironment) -> String {
        let response = env
            .server
            .post("/bookings")
            .json(&json!({
                "trainerId": TRAINER_ID,
                "clientId": CLIENT_ID,
                "localDate": "2025-06-10",
                "localStartTime": "3:00 PM",
                "timezone": LOS_ANGELES,
                "duration": 60,
                "sessionType": "online"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<CreatedResponse>().id
    }

    async fn request_reschedule(env: &TestEnvironment, booking_id: &str, requested_by: &str) -> String {
        let response = env
            .server
            .post("/reschedules")
            .json(&json!({
                "bookingId": booking_id,
                "newLocalDate": "2025-06-12",
                "newLocalTime": "4:00 PM",
                "reason": "Work trip",
                "requestedBy": requested_by
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<CreatedResponse>().id
    }

    #[tokio::test]
    async fn test_full_reschedule_workflow() {
        let env = TestEnvironment::new();
        env.availability.insert(
            TRAINER_ID,
            week(LOS_ANGELES, vec![open_day(Weekday::Thu, &[("3:00 PM", "5:00 PM")])]),
        );

        let original_id = book_original(&env).await;
        let request_id = request_reschedule(&env, &original_id, "client").await;

        let request: Value = env.server.get(&format!("/reschedules/{}", request_id)).await.json();
        assert_eq!(request["status"], "pending");
        assert_eq!(request["originalBookingId"], original_id.as_str());
        assert_eq!(request["newStartTimeUtc"], "2025-06-12T23:00:00Z");
        assert_eq!(request["requestedBy"], "client");
        let new_booking_id = request["newBookingId"].as_str().unwrap().to_string();

        let original: Value = env.server.get(&format!("/bookings/{}", original_id)).await.json();
        assert_eq!(original["status"], "cancelled");
        let replacement: Value = env.server.get(&format!("/bookings/{}", new_booking_id)).await.json();
        assert_eq!(replacement["status"], "pending");

        // The pending replacement already holds its slot
        let slots: Vec<TimeSlot> = env
            .server
            .get("/trainers/trainer1/slots?date=2025-06-12")
            .await
            .json();
        let booked: Vec<_> = slots.iter().filter(|s| s.booked).map(|s| s.time.as_str()).collect();
        assert_eq!(booked, vec!["4:00 PM"]);

        env.server
            .post(&format!("/reschedules/{}/accept", request_id))
            .await
            .assert_status_ok();

        let replacement: Value = env.server.get(&format!("/bookings/{}", new_booking_id)).await.json();
        assert_eq!(replacement["status"], "confirmed");
        let request: Value = env.server.get(&format!("/reschedules/{}", request_id)).await.json();
        assert_eq!(request["status"], "accepted");

        // Answering twice is a conflict
        let response = env.server.post(&format!("/reschedules/{}/accept", request_id)).await;
        assert_eq!(response.status_code(), StatusCode::CONFLICT);
        let response = env.server.post(&format!("/reschedules/{}/reject", request_id)).await;
        assert_eq!(response.status_code(), StatusCode::CONFLICT);

        let stored = env.reschedules.get(&request_id).await.unwrap().unwrap();
        assert_eq!(stored.reason, "Work trip");

        settle().await;
        let texts: Vec<String> = env.notifier.messages().into_iter().map(|m| m.text).collect();
        assert!(texts.contains(&format!("reschedule/{}", request_id)));
        assert!(texts.contains(&"Reschedule accepted: Thu, Jun 12, 2025 at 4:00 PM".to_string()));
    }

    #[tokio::test]
    async fn test_rejected_reschedule() {
        let env = TestEnvironment::new();
        let original_id = book_original(&env).await;
        let request_id = request_reschedule(&env, &original_id, "trainer").await;

        env.server
            .post(&format!("/reschedules/{}/reject", request_id))
            .await
            .assert_status_ok();

        let request: Value = env.server.get(&format!("/reschedules/{}", request_id)).await.json();
        assert_eq!(request["status"], "rejected");
        let new_booking_id = request["newBookingId"].as_str().unwrap();

        let statuses: Vec<BookingStatus> = env
            .bookings
            .all()
            .unwrap()
            .into_iter()
            .filter(|b| b.booking_id == original_id || b.booking_id == new_booking_id)
            .map(|b| b.status)
            .collect();
        assert_eq!(statuses, vec![BookingStatus::Cancelled, BookingStatus::Cancelled]);

        // Nothing left for the client
        let active: Vec<Value> = env.server.get("/users/client1/bookings").await.json();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn test_reschedule_input_errors() {
        let env = TestEnvironment::new();

        let response = env
            .server
            .post("/reschedules")
            .json(&json!({
                "bookingId": "missing",
                "newLocalDate": "2025-06-12",
                "newLocalTime": "4:00 PM",
                "requestedBy": "client"
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

        let original_id = book_original(&env).await;
        let response = env
            .server
            .post("/reschedules")
            .json(&json!({
                "bookingId": original_id,
                "newLocalDate": "2025-06-12",
                "newLocalTime": "four",
                "requestedBy": "client"
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        // The original survives a rejected request
        let original: Value = env.server.get(&format!("/bookings/{}", original_id)).await.json();
        assert_eq!(original["status"], "confirmed");

        let response = env.server.post("/reschedules/missing/accept").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_partial_failure_asks_for_rebooking() {
        let start = Utc.with_ymd_and_hms(2025, 6, 10, 22, 0, 0).unwrap();
        let original = sample_booking("orig", start, BookingStatus::Confirmed);

        let mut store = MockBookingStore::new();
        store
            .expect_get()
            .returning(move |_| Ok(Some(original.clone())));
        store
            .expect_update_status()
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_put()
            .returning(|_| Err(SchedulingError::StoreUnavailable("disk full".to_string())));

        let env = TestEnvironment::with_booking_store(Arc::new(store));

        let response = env
            .server
            .post("/reschedules")
            .json(&json!({
                "bookingId": "orig",
                "newLocalDate": "2025-06-12",
                "newLocalTime": "4:00 PM",
                "requestedBy": "client"
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["rebookRequired"], true);
        assert!(body["error"].as_str().unwrap().contains("orig"));
    }
}
