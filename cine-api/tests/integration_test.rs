use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::Duration;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use cine_api::{app, AppState};
use cine_booking::{BookingOrchestrator, SessionRegistry};
use cine_catalog::concessions::ConcessionCatalog;
use cine_core::payment::MockPaymentAdapter;
use cine_store::{BusinessRules, MemoryBookingStore, MemoryCatalogStore, MemoryInventoryStore};

fn test_state() -> AppState {
    let catalog = Arc::new(MemoryCatalogStore::with_fixtures());
    let inventory = Arc::new(
        MemoryInventoryStore::from_showtimes(&catalog.showtimes())
            .expect("inventory seeding failed"),
    );
    let bookings = Arc::new(MemoryBookingStore::new());

    let orchestrator = Arc::new(BookingOrchestrator::new(
        catalog.clone(),
        inventory.clone(),
        bookings,
        Arc::new(MockPaymentAdapter),
        Duration::minutes(15),
        Duration::minutes(30),
    ));

    AppState {
        registry: Arc::new(SessionRegistry::new()),
        orchestrator,
        catalog,
        inventory,
        concessions: Arc::new(ConcessionCatalog::standard()),
        business_rules: BusinessRules::default(),
    }
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request build failed"),
        None => builder.body(Body::empty()).expect("request build failed"),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body read failed");
    serde_json::from_slice(&bytes).expect("invalid json body")
}

async fn start_session(state: &AppState, user: &str, showtime: &str) -> String {
    let response = app(state.clone())
        .oneshot(request(
            "POST",
            "/v1/sessions",
            Some(user),
            Some(json!({
                "movie_id": 1022789,
                "cinema_id": "c3",
                "showtime_id": showtime,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_full_booking_flow() {
    let state = test_state();
    let session_id = start_session(&state, "u1", "st8").await;

    // Select two standard seats
    let response = app(state.clone())
        .oneshot(request(
            "PUT",
            &format!("/v1/sessions/{}/selection", session_id),
            Some("u1"),
            Some(json!({ "seats": ["A1", "A2"] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total_amount"], 150_000);
    assert_eq!(body["state"], "SELECTING_TICKETS");

    // Add a combo
    let response = app(state.clone())
        .oneshot(request(
            "POST",
            &format!("/v1/sessions/{}/concessions", session_id),
            Some("u1"),
            Some(json!({ "items": [{ "concession_id": "combo1", "quantity": 1 }] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total_amount"], 239_000);

    // Choose a payment method
    let response = app(state.clone())
        .oneshot(request(
            "POST",
            &format!("/v1/sessions/{}/payment", session_id),
            Some("u1"),
            Some(json!({ "method": "visa" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["state"], "AWAITING_PAYMENT");
    assert_eq!(body["payment_method"], "visa");

    // Confirm
    let response = app(state.clone())
        .oneshot(request(
            "POST",
            &format!("/v1/sessions/{}/confirm", session_id),
            Some("u1"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    let code = body["booking_code"].as_str().unwrap().to_string();
    assert!(code.starts_with("BK"));
    assert_eq!(body["total_amount"], 239_000);
    assert_eq!(body["status"], "active");
    assert_eq!(body["payment_status"], "completed");

    // The seats are now occupied in the seat view
    let response = app(state.clone())
        .oneshot(request("GET", "/v1/showtimes/st8/seats", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let occupied: Vec<&str> = body["seats"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["occupied"].as_bool().unwrap())
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(occupied, vec!["A1", "A2"]);

    // The booking is retrievable by its owner
    let response = app(state.clone())
        .oneshot(request(
            "GET",
            &format!("/v1/bookings/{}", code),
            Some("u1"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // ...but not by anyone else
    let response = app(state.clone())
        .oneshot(request(
            "GET",
            &format!("/v1/bookings/{}", code),
            Some("intruder"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_contested_seat_conflict() {
    let state = test_state();

    let first = start_session(&state, "u1", "st8").await;
    let second = start_session(&state, "u2", "st8").await;

    for (session_id, user, method) in [(&first, "u1", "visa"), (&second, "u2", "mastercard")] {
        let response = app(state.clone())
            .oneshot(request(
                "PUT",
                &format!("/v1/sessions/{}/selection", session_id),
                Some(user),
                Some(json!({ "seats": ["B1"] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(state.clone())
            .oneshot(request(
                "POST",
                &format!("/v1/sessions/{}/payment", session_id),
                Some(user),
                Some(json!({ "method": method })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app(state.clone())
        .oneshot(request(
            "POST",
            &format!("/v1/sessions/{}/confirm", first),
            Some("u1"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // The second session loses the race and stays re-selectable
    let response = app(state.clone())
        .oneshot(request(
            "POST",
            &format!("/v1/sessions/{}/confirm", second),
            Some("u2"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app(state.clone())
        .oneshot(request(
            "GET",
            &format!("/v1/sessions/{}", second),
            Some("u2"),
            None,
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["state"], "AWAITING_PAYMENT");
}

#[tokio::test]
async fn test_input_errors() {
    let state = test_state();
    let session_id = start_session(&state, "u1", "st8").await;

    // Seat outside the layout
    let response = app(state.clone())
        .oneshot(request(
            "PUT",
            &format!("/v1/sessions/{}/selection", session_id),
            Some("u1"),
            Some(json!({ "seats": ["Z99"] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown concession
    let response = app(state.clone())
        .oneshot(request(
            "PUT",
            &format!("/v1/sessions/{}/selection", session_id),
            Some("u1"),
            Some(json!({ "seats": ["A1"] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(state.clone())
        .oneshot(request(
            "POST",
            &format!("/v1/sessions/{}/concessions", session_id),
            Some("u1"),
            Some(json!({ "items": [{ "concession_id": "caviar", "quantity": 1 }] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unsupported payment method
    let response = app(state.clone())
        .oneshot(request(
            "POST",
            &format!("/v1/sessions/{}/payment", session_id),
            Some("u1"),
            Some(json!({ "method": "bitcoin" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A stranger cannot touch the session at all
    let response = app(state.clone())
        .oneshot(request(
            "PUT",
            &format!("/v1/sessions/{}/selection", session_id),
            Some("intruder"),
            Some(json!({ "seats": ["A2"] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Confirm without a chosen method
    let response = app(state.clone())
        .oneshot(request(
            "POST",
            &format!("/v1/sessions/{}/confirm", session_id),
            Some("u1"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_ids_are_404() {
    let state = test_state();

    let response = app(state.clone())
        .oneshot(request(
            "POST",
            "/v1/sessions",
            Some("u1"),
            Some(json!({
                "movie_id": 1022789,
                "cinema_id": "c3",
                "showtime_id": "st404",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app(state.clone())
        .oneshot(request("GET", "/v1/showtimes/st404/seats", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app(state.clone())
        .oneshot(request(
            "GET",
            &format!("/v1/sessions/{}", uuid::Uuid::new_v4()),
            Some("u1"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_user_header_rejected() {
    let state = test_state();

    let response = app(state.clone())
        .oneshot(request(
            "POST",
            "/v1/sessions",
            None,
            Some(json!({
                "movie_id": 1022789,
                "cinema_id": "c3",
                "showtime_id": "st8",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_concession_catalog_listing() {
    let state = test_state();

    let response = app(state.clone())
        .oneshot(request("GET", "/v1/concessions", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["combo1", "combo2", "hotdog", "nachos"]);
}

#[tokio::test]
async fn test_cancel_session() {
    let state = test_state();
    let session_id = start_session(&state, "u1", "st8").await;

    let response = app(state.clone())
        .oneshot(request(
            "DELETE",
            &format!("/v1/sessions/{}", session_id),
            Some("u1"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["state"], "CANCELLED");
}
