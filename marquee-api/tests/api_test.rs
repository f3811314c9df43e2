use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use marquee_api::{app, sessions::sweep_idle_sessions, AppState};
use marquee_store::{Config, MemoryStore};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_state() -> AppState {
    let config: Config = serde_json::from_value(json!({
        "server": { "port": 0 },
        "auth": {
            "jwt_secret": "test-secret",
            "jwt_expiration_seconds": 3600,
            "admin_api_key": "admin-key"
        },
        "booking": { "payment_delay_ms": 0 }
    }))
    .unwrap();

    AppState::from_config(&config, Arc::new(MemoryStore::new()))
}

fn test_app() -> Router {
    app(test_state())
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn guest_token(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/v1/auth/guest", None, None).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn admin_token(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/auth/admin",
        None,
        Some(json!({ "api_key": "admin-key" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn open_session(app: &Router, token: &str, showtime_id: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/sessions",
        Some(token),
        Some(json!({ "showtime_id": showtime_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn select(app: &Router, token: &str, session: &str, seat: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        &format!("/v1/sessions/{}/seats", session),
        Some(token),
        Some(json!({ "seat_id": seat })),
    )
    .await
}

fn payment(card: &str) -> Value {
    json!({
        "card_number": card,
        "expiry_date": "12/99",
        "cvv": "123",
        "cardholder_name": "Ana Gomez",
        "email": "ana@example.com",
        "phone": "3001234567",
        "method": "credit"
    })
}

fn seat_status(map: &Value, seat_id: &str) -> String {
    map["rows"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|row| row.as_array().unwrap())
        .find(|seat| seat["id"] == seat_id)
        .map(|seat| seat["status"].as_str().unwrap().to_string())
        .unwrap()
}

#[tokio::test]
async fn test_catalog_listing_and_filters() {
    let app = test_app();

    let (status, movies) = send(&app, Method::GET, "/v1/movies", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(movies.as_array().unwrap().len(), 4);

    let (_, action) = send(&app, Method::GET, "/v1/movies?genre=Action", None, None).await;
    assert_eq!(action.as_array().unwrap().len(), 2);

    let (_, dune) = send(&app, Method::GET, "/v1/movies?search=dune", None, None).await;
    assert_eq!(dune[0]["id"], "movie3");

    let (status, _) = send(&app, Method::GET, "/v1/movies/missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, showtimes) = send(&app, Method::GET, "/v1/movies/movie1/showtimes", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(showtimes.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_seat_map_reflects_seeded_occupancy() {
    let app = test_app();

    let (status, map) = send(&app, Method::GET, "/v1/showtimes/S2/seats", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(map["total_seats"], 100);
    assert_eq!(map["available_seats"], 96);
    assert_eq!(seat_status(&map, "B5"), "occupied");
    assert_eq!(seat_status(&map, "C5"), "available");

    let (status, _) = send(&app, Method::GET, "/v1/showtimes/S9/seats", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sessions_require_customer_token() {
    let app = test_app();

    let (status, _) = send(&app, Method::POST, "/v1/sessions", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, "/v1/sessions", Some("not-a-jwt"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sessions_are_private_to_their_owner() {
    let app = test_app();
    let alice = guest_token(&app).await;
    let bob = guest_token(&app).await;
    let session = open_session(&app, &alice, "S1").await;

    let (status, _) = send(&app, Method::GET, &format!("/v1/sessions/{}", session), Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_booking_flow_end_to_end() {
    let app = test_app();
    let token = guest_token(&app).await;
    let session = open_session(&app, &token, "S1").await;

    // Rows A and B are vip seats; they still cost the showtime price
    let (status, _) = select(&app, &token, &session, "A1").await;
    assert_eq!(status, StatusCode::OK);
    let (status, view) = select(&app, &token, &session, "A2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["total"], 30000);

    let (status, committed) = send(
        &app,
        Method::POST,
        &format!("/v1/sessions/{}/commit", session),
        Some(&token),
        Some(payment("4111 1111 1111 1111")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let transaction_id = committed["transaction_id"].as_str().unwrap().to_string();
    assert_eq!(committed["ticket"]["reservation"]["total_price"], 30000);
    assert_eq!(committed["ticket"]["payment"]["amount"], 30000);
    assert_eq!(committed["ticket"]["reservation"]["seat_ids"], json!(["A1", "A2"]));

    // Confirmation page works without the session or a token
    let (status, ticket) = send(&app, Method::GET, &format!("/v1/tickets/{}", transaction_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ticket["reservation"]["status"], "confirmed");

    let (_, map) = send(&app, Method::GET, "/v1/showtimes/S1/seats", None, None).await;
    assert_eq!(seat_status(&map, "A1"), "occupied");

    // Another session cannot pick a sold seat
    let other = open_session(&app, &token, "S1").await;
    let (status, _) = select(&app, &token, &other, "A1").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, reservations) = send(&app, Method::GET, "/v1/reservations", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let reservation_id = reservations[0]["id"].as_str().unwrap().to_string();

    let cancel_uri = format!("/v1/reservations/{}/cancel", reservation_id);
    let (status, cancelled) = send(&app, Method::POST, &cancel_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (_, map) = send(&app, Method::GET, "/v1/showtimes/S1/seats", None, None).await;
    assert_eq!(seat_status(&map, "A1"), "available");

    let (status, _) = send(&app, Method::POST, &cancel_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_sessions_can_be_closed() {
    let app = test_app();
    let alice = guest_token(&app).await;
    let bob = guest_token(&app).await;
    let session = open_session(&app, &alice, "S1").await;
    let uri = format!("/v1/sessions/{}", session);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_idle_sessions_are_swept() {
    let state = test_state();
    let app = app(state.clone());
    let token = guest_token(&app).await;
    let session = open_session(&app, &token, "S1").await;

    // Nothing is older than an hour ago
    assert_eq!(sweep_idle_sessions(&state, Utc::now() - Duration::hours(1)).await, 0);
    let (status, _) = send(&app, Method::GET, &format!("/v1/sessions/{}", session), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(sweep_idle_sessions(&state, Utc::now() + Duration::seconds(1)).await, 1);
    assert!(state.sessions.read().await.is_empty());
    let (status, _) = send(&app, Method::GET, &format!("/v1/sessions/{}", session), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_commit_errors() {
    let app = test_app();
    let token = guest_token(&app).await;
    let session = open_session(&app, &token, "S1").await;
    let commit_uri = format!("/v1/sessions/{}/commit", session);

    let (status, _) = send(&app, Method::POST, &commit_uri, Some(&token), Some(payment("4111111111111111"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    select(&app, &token, &session, "D4").await;

    let mut invalid = payment("4111");
    invalid["email"] = json!("nope");
    let (status, body) = send(&app, Method::POST, &commit_uri, Some(&token), Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, Method::POST, &commit_uri, Some(&token), Some(payment("4000000000000002"))).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body["error"].is_string());

    // Selection survives a failed commit
    let (_, view) = send(&app, Method::GET, &format!("/v1/sessions/{}", session), Some(&token), None).await;
    assert_eq!(view["seats"].as_array().unwrap().len(), 1);
    assert_eq!(view["state"], "failed");
}

#[tokio::test]
async fn test_selection_rules_over_http() {
    let app = test_app();
    let token = guest_token(&app).await;
    let session = open_session(&app, &token, "S2").await;

    let (status, _) = select(&app, &token, &session, "B5").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = select(&app, &token, &session, "Z99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = select(&app, &token, &session, "??").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for n in 1..=8 {
        let (status, _) = select(&app, &token, &session, &format!("D{}", n)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = select(&app, &token, &session, "D9").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, view) = send(
        &app,
        Method::DELETE,
        &format!("/v1/sessions/{}/seats/D1", session),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["seats"].as_array().unwrap().len(), 7);

    // Switching showtime drops the selection
    let (_, view) = send(
        &app,
        Method::PUT,
        &format!("/v1/sessions/{}/showtime", session),
        Some(&token),
        Some(json!({ "showtime_id": "S3" })),
    )
    .await;
    assert_eq!(view["showtime_id"], "S3");
    assert_eq!(view["seats"].as_array().unwrap().len(), 0);
    assert_eq!(view["total"], 0);
}

#[tokio::test]
async fn test_account_registration_and_login() {
    let app = test_app();
    let registration = json!({
        "username": "ana",
        "email": "ana@example.com",
        "password": "popcorn123",
        "first_name": "Ana"
    });

    let (status, registered) = send(&app, Method::POST, "/v1/auth/register", None, Some(registration.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(registered["user"]["username"], "ana");
    assert!(registered["user"].get("password_hash").is_none());
    let user_id = registered["user_id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::POST, "/v1/auth/register", None, Some(registration)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({ "username": "bo", "email": "bo@example.com", "password": "popcorn123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({ "username": "ana", "password": "wrong-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, logged_in) = send(
        &app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({ "username": "ana", "password": "popcorn123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logged_in["user_id"], user_id.as_str());
    let token = logged_in["token"].as_str().unwrap().to_string();

    // Account tokens book like any customer and see their reservations
    let session = open_session(&app, &token, "S1").await;
    select(&app, &token, &session, "E5").await;
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/v1/sessions/{}/commit", session),
        Some(&token),
        Some(payment("4111111111111111")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, profile) = send(&app, Method::GET, "/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["user"]["email"], "ana@example.com");
    assert_eq!(profile["reservations"].as_array().unwrap().len(), 1);

    let guest = guest_token(&app).await;
    let (status, _) = send(&app, Method::GET, "/v1/users/me", Some(&guest), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_routes_require_admin_token() {
    let app = test_app();

    let (status, _) = send(&app, Method::GET, "/v1/admin/stats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let guest = guest_token(&app).await;
    let (status, _) = send(&app, Method::GET, "/v1/admin/stats", Some(&guest), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/auth/admin",
        None,
        Some(json!({ "api_key": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_catalog_management() {
    let app = test_app();
    let token = admin_token(&app).await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/v1/admin/movies",
        Some(&token),
        Some(json!({
            "title": "Coco",
            "description": "A boy in the Land of the Dead",
            "poster_image": "/posters/coco.jpg",
            "genre": "Animation",
            "duration": 105,
            "rating": "PG",
            "release_date": "2017-11-22",
            "director": "Lee Unkrich"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let movie_id = created["id"].as_str().unwrap().to_string();

    let (status, created) = send(
        &app,
        Method::POST,
        "/v1/admin/showtimes",
        Some(&token),
        Some(json!({
            "movie_id": movie_id,
            "date": "2030-01-15",
            "time": "20:00:00",
            "hall_id": "hall2"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let showtime_id = created["id"].as_str().unwrap().to_string();

    let (_, showtime) = send(&app, Method::GET, &format!("/v1/showtimes/{}", showtime_id), None, None).await;
    assert_eq!(showtime["price"], 30000);
    assert_eq!(showtime["available_seats"], 100);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/admin/showtimes",
        Some(&token),
        Some(json!({
            "movie_id": "missing",
            "date": "2030-01-15",
            "time": "20:00:00",
            "hall_id": "hall2"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, stats) = send(&app, Method::GET, "/v1/admin/stats", Some(&token), None).await;
    assert_eq!(stats["total_movies"], 5);
    assert_eq!(stats["total_showtimes"], 5);
    assert_eq!(stats["total_revenue"], 0);

    let (status, _) = send(&app, Method::DELETE, &format!("/v1/admin/showtimes/{}", showtime_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &format!("/v1/admin/showtimes/{}", showtime_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_ticket_is_not_found() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/v1/tickets/TXN-missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_seat_stream_is_event_stream() {
    let app = test_app();
    let request = Request::builder()
        .uri("/v1/showtimes/S1/stream")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );
}
