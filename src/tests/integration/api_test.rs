use axum::http::StatusCode;
use chrono::{Duration, SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::models::availability::{TimeSlot, Weekday};
use crate::models::booking::Booking;
use crate::models::common::CreatedResponse;
use crate::tests::common::fixtures::{open_day, settle, week, CLIENT_ID, LOS_ANGELES, TRAINER_ID};
use crate::tests::common::server::TestEnvironment;

/// API integration tests
#[cfg(test)]
mod api_tests {
    use super::*;

    fn booking_body(date: &str, time: &str) -> Value {
        json!({
            "trainerId": TRAINER_ID,
            "clientId": CLIENT_ID,
            "localDate": date,
            "localStartTime": time,
            "timezone": LOS_ANGELES,
            "duration": 30,
            "sessionType": "online"
        })
    }

    async fn create_booking(env: &TestEnvironment, body: &Value) -> String {
        let response = env.server.post("/bookings").json(body).await;
        response.assert_status(StatusCode::CREATED);
        response.json::<CreatedResponse>().id
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let env = TestEnvironment::new();

        let response = env.server.get("/health").await;
        assert_eq!(response.status_code().as_u16(), 200);
        assert_eq!(response.text(), "OK");
    }

    #[tokio::test]
    async fn test_slots_reflect_bookings() {
        let env = TestEnvironment::new();
        env.availability.insert(
            TRAINER_ID,
            week(LOS_ANGELES, vec![open_day(Weekday::Mon, &[("9:00 AM", "10:00 AM")])]),
        );

        let response = env.server.get("/trainers/trainer1/slots?date=2025-06-09").await;
        response.assert_status_ok();
        let slots: Vec<TimeSlot> = response.json();
        assert_eq!(slots.len(), 3);
        assert!(slots.iter().all(|slot| !slot.booked));

        create_booking(&env, &booking_body("2025-06-09", "9:30 AM")).await;

        let slots: Vec<TimeSlot> = env
            .server
            .get("/trainers/trainer1/slots?date=2025-06-09")
            .await
            .json();
        let booked: Vec<_> = slots.iter().filter(|s| s.booked).map(|s| s.time.as_str()).collect();
        assert_eq!(booked, vec!["9:30 AM"]);

        // JSON field names stay camelCase on the wire
        let raw: Value = env
            .server
            .get("/trainers/trainer1/slots?date=2025-06-09")
            .await
            .json();
        assert_eq!(raw[0], json!({"time": "9:00 AM", "available": true, "booked": false}));
    }

    #[tokio::test]
    async fn test_slots_require_a_valid_date() {
        let env = TestEnvironment::new();
        let response = env.server.get("/trainers/trainer1/slots?date=June").await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_booking_lifecycle() {
        let env = TestEnvironment::new();
        let id = create_booking(&env, &booking_body("2025-06-12", "4:00 PM")).await;

        let booking: Booking = env.server.get(&format!("/bookings/{}", id)).await.json();
        assert_eq!(booking.start_time_utc.to_rfc3339_opts(SecondsFormat::Secs, true), "2025-06-12T23:00:00Z");
        assert_eq!(booking.duration, 30);

        let raw: Value = env.server.get(&format!("/bookings/{}", id)).await.json();
        assert_eq!(raw["status"], "confirmed");
        assert_eq!(raw["sessionType"], "online");

        env.server
            .post(&format!("/bookings/{}/complete", id))
            .await
            .assert_status_ok();
        let raw: Value = env.server.get(&format!("/bookings/{}", id)).await.json();
        assert_eq!(raw["status"], "completed");

        // Persisted through the CSV store
        let stored = env.bookings.all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].booking_id, id);

        settle().await;
        assert_eq!(env.notifier.calendar_events(), vec![id]);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent_over_http() {
        let env = TestEnvironment::new();
        let id = create_booking(&env, &booking_body("2025-06-12", "4:00 PM")).await;

        env.server.post(&format!("/bookings/{}/cancel", id)).await.assert_status_ok();
        env.server.post(&format!("/bookings/{}/cancel", id)).await.assert_status_ok();

        let raw: Value = env.server.get(&format!("/bookings/{}", id)).await.json();
        assert_eq!(raw["status"], "cancelled");

        // Cancelled sessions cannot be completed
        let response = env.server.post(&format!("/bookings/{}/complete", id)).await;
        assert_eq!(response.status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_booking_errors() {
        let env = TestEnvironment::new();

        let response = env
            .server
            .post("/bookings")
            .json(&booking_body("2025-06-12", "16h00"))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("16h00"));

        let mut body = booking_body("2025-06-12", "4:00 PM");
        body["timezone"] = json!("Nowhere/Land");
        let response = env.server.post("/bookings").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let mut body = booking_body("2025-06-12", "4:00 PM");
        body["sessionType"] = json!("in-person");
        let response = env.server.post("/bookings").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let mut body = booking_body("2025-06-12", "4:00 PM");
        body["duration"] = json!(1_000_000_000_000i64);
        let response = env.server.post("/bookings").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let response = env.server.get("/bookings/missing").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

        let response = env.server.post("/bookings/missing/cancel").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

        assert!(env.bookings.all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_booking_listings() {
        let env = TestEnvironment::new();

        let tomorrow = Utc::now() + Duration::days(1);
        let next_month = Utc::now() + Duration::days(30);
        let soon = json!({
            "trainerId": TRAINER_ID,
            "clientId": CLIENT_ID,
            "startTimeUtc": tomorrow.to_rfc3339(),
            "timezone": LOS_ANGELES,
            "duration": 60,
            "sessionType": "online"
        });
        let mut later = soon.clone();
        later["startTimeUtc"] = json!(next_month.to_rfc3339());

        let soon_id = create_booking(&env, &soon).await;
        let later_id = create_booking(&env, &later).await;

        let all: Vec<Booking> = env
            .server
            .get("/users/client1/bookings")
            .add_query_param("role", "client")
            .await
            .json();
        let ids: Vec<_> = all.iter().map(|b| b.booking_id.clone()).collect();
        assert_eq!(ids, vec![soon_id.clone(), later_id]);

        let upcoming: Vec<Booking> = env
            .server
            .get("/users/trainer1/bookings/upcoming")
            .add_query_param("role", "trainer")
            .await
            .json();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].booking_id, soon_id);

        // Role defaults to client
        let as_client: Vec<Booking> = env.server.get("/users/trainer1/bookings").await.json();
        assert!(as_client.is_empty());
    }
}
