//! End-to-end tests of the REST API over a real socket, backed by the
//! in-memory store.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};

use devevent_gateway::api;
use devevent_gateway::app_state::AppState;
use devevent_gateway::config::GatewayConfig;
use devevent_gateway::persistence::{ConnectionManager, MemoryConnector};

async fn spawn_server() -> SocketAddr {
    let Ok(config) = GatewayConfig::from_lookup(|_| None) else {
        panic!("default config should load");
    };
    let connections = Arc::new(ConnectionManager::new(
        Some("memory://http-tests".to_string()),
        Arc::new(MemoryConnector::new()),
    ));
    let app = api::build_router().with_state(AppState::new(connections, &config));

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

fn event_body(title: &str) -> Value {
    json!({
        "title": title,
        "description": "A day of talks and workshops.",
        "overview": "Talks and workshops",
        "image": "https://cdn.example.com/devevent/cover.png",
        "venue": "Main Hall",
        "location": "Berlin, Germany",
        "date": "2025-3-5",
        "time": "11:05 PM",
        "mode": "in-person",
        "audience": "Developers",
        "agenda": ["Keynote", " "],
        "organizer": "Rust Berlin",
        "tags": ["rust", "systems"]
    })
}

async fn send(request: reqwest::RequestBuilder) -> (StatusCode, Value) {
    let Ok(response) = request.send().await else {
        panic!("request failed");
    };
    let status = response.status();
    let Ok(body) = response.json::<Value>().await else {
        panic!("response was not JSON");
    };
    (status, body)
}

#[tokio::test]
async fn health_reports_ok() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();
    let (status, body) = send(client.get(format!("http://{addr}/health"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn create_then_fetch_event_by_slug() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let (status, created) = send(
        client
            .post(format!("http://{addr}/api/v1/events"))
            .json(&event_body("Dev Conf!!")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "dev-conf");
    assert_eq!(created["date"], "2025-03-05");
    assert_eq!(created["time"], "23:05");
    assert_eq!(created["agenda"], json!(["Keynote"]));

    let (status, second) = send(
        client
            .post(format!("http://{addr}/api/v1/events"))
            .json(&event_body("Dev Conf??")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["slug"], "dev-conf-2");

    let (status, fetched) =
        send(client.get(format!("http://{addr}/api/v1/events/DEV-CONF"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], created["id"]);

    let (status, listed) = send(client.get(format!("http://{addr}/api/v1/events"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["count"], 2);
}

#[tokio::test]
async fn validation_errors_name_the_field() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let mut body = event_body("Broken");
    body["venue"] = json!("   ");
    let (status, error) = send(
        client
            .post(format!("http://{addr}/api/v1/events"))
            .json(&body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["kind"], "validation_failed");
    assert_eq!(error["error"]["details"], "venue");
}

#[tokio::test]
async fn malformed_and_unknown_slugs() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let (status, error) = send(client.get(format!("http://{addr}/api/v1/events/bad--slug"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["kind"], "invalid_slug");

    let (status, error) = send(client.get(format!("http://{addr}/api/v1/events/no-such-event"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"]["kind"], "not_found");

    let (status, similar) =
        send(client.get(format!("http://{addr}/api/v1/events/no-such-event/similar"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(similar["count"], 0);
}

#[tokio::test]
async fn patch_keeps_slug_unless_title_changes() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let (_, created) = send(
        client
            .post(format!("http://{addr}/api/v1/events"))
            .json(&event_body("Re-slug Me")),
    )
    .await;
    let Some(id) = created["id"].as_str() else {
        panic!("created event has no id");
    };

    let (status, updated) = send(
        client
            .patch(format!("http://{addr}/api/v1/events/{id}"))
            .json(&json!({ "venue": "Annex" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["slug"], "re-slug-me");
    assert_eq!(updated["venue"], "Annex");

    let (status, renamed) = send(
        client
            .patch(format!("http://{addr}/api/v1/events/{id}"))
            .json(&json!({ "title": "Renamed Event" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["slug"], "renamed-event");
}

#[tokio::test]
async fn bookings_round_trip() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let (_, event) = send(
        client
            .post(format!("http://{addr}/api/v1/events"))
            .json(&event_body("Booked Out")),
    )
    .await;

    let (status, booking) = send(
        client
            .post(format!("http://{addr}/api/v1/bookings"))
            .json(&json!({ "event_id": event["id"], "email": "  Ada@Example.com " })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["email"], "ada@example.com");

    let (status, listing) =
        send(client.get(format!("http://{addr}/api/v1/events/booked-out/bookings"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["bookings"][0]["id"], booking["id"]);
}

#[tokio::test]
async fn booking_rejections() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let (status, error) = send(
        client
            .post(format!("http://{addr}/api/v1/bookings"))
            .json(&json!({ "event_id": "0b7e6f5c-2d7a-4c1e-9a51-3f2f3c1d9e10", "email": "a@b.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"]["kind"], "event_not_found");

    let (status, error) = send(
        client
            .post(format!("http://{addr}/api/v1/bookings"))
            .json(&json!({ "event_id": "not-a-uuid", "email": "a@b.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["details"], "event_id");

    let (status, error) = send(
        client
            .post(format!("http://{addr}/api/v1/bookings"))
            .json(&json!({ "event_id": "0b7e6f5c-2d7a-4c1e-9a51-3f2f3c1d9e10", "email": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["kind"], "invalid_email");
}
