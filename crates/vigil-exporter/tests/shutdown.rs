#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Barrier};
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tower::ServiceExt;

use secrecy::SecretString;
use vigil_core::{Registry, RundownState, ValueSource, VigilError};
use vigil_exporter::{Controller, ExporterConfig, HealthCallback};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn ephemeral() -> ExporterConfig {
    let mut cfg = ExporterConfig::new();
    cfg.server.address = "127.0.0.1".into();
    cfg.server.port = 0;
    cfg
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn destroy_waits_for_in_flight_scrape() {
    let entered = Arc::new(Barrier::new(2));
    let proceed = Arc::new(Barrier::new(2));

    let mut c = Controller::builder(ExporterConfig::new())
        .registry(Registry::bare())
        .health(HealthCallback::new(|| "ok".to_string()))
        .attach_external()
        .build()
        .unwrap();
    {
        let entered = Arc::clone(&entered);
        let proceed = Arc::clone(&proceed);
        c.create_gauge("slow", "", ValueSource::new(move || {
            entered.wait();
            proceed.wait();
            1.0
        }))
        .unwrap();
    }
    let app = c.router();
    let rundown = Arc::clone(c.rundown());

    let scrape = tokio::spawn(app.clone().oneshot(get("/metrics")));
    tokio::task::spawn_blocking({
        let entered = Arc::clone(&entered);
        move || entered.wait()
    })
    .await
    .unwrap();
    assert_eq!(rundown.in_flight(), 1);

    let destroy = tokio::spawn(c.destroy());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!destroy.is_finished(), "destroy returned while a scrape was in flight");
    assert_eq!(rundown.state(), RundownState::Draining);

    let refused = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(refused.status(), StatusCode::SERVICE_UNAVAILABLE);

    tokio::task::spawn_blocking(move || proceed.wait()).await.unwrap();

    let resp = scrape.await.unwrap().unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("slow 1"));

    tokio::time::timeout(Duration::from_secs(2), destroy)
        .await
        .expect("destroy must finish once the scrape released")
        .unwrap();
    assert_eq!(rundown.state(), RundownState::Drained);
}

#[tokio::test]
async fn start_serves_over_tcp_and_destroy_stops_it() {
    let mut c = Controller::builder(ephemeral())
        .registry(Registry::bare())
        .health(HealthCallback::new(|| "ok".to_string()))
        .build()
        .unwrap();
    c.create_gauge("temp", "", ValueSource::new(|| 42.0)).unwrap();

    let addr = c.start().await.unwrap();
    assert_eq!(c.local_addr(), Some(addr));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    assert!(raw.starts_with("HTTP/1.1 200"), "response: {raw}");
    assert!(raw.contains("temp 42"));

    tokio::time::timeout(Duration::from_secs(2), c.destroy())
        .await
        .expect("destroy must not hang");
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn start_rejects_misuse() {
    let mut external = Controller::builder(ephemeral())
        .registry(Registry::bare())
        .health(HealthCallback::new(String::new))
        .attach_external()
        .build()
        .unwrap();
    assert!(matches!(external.start().await, Err(VigilError::Config(_))));

    let mut owned = Controller::builder(ephemeral())
        .registry(Registry::bare())
        .health(HealthCallback::new(String::new))
        .build()
        .unwrap();
    owned.start().await.unwrap();
    assert!(matches!(owned.start().await, Err(VigilError::Config(_))));
    owned.destroy().await;
}

#[tokio::test]
async fn registry_freezes_once_serving() {
    let mut c = Controller::builder(ExporterConfig::new())
        .registry(Registry::bare())
        .health(HealthCallback::new(String::new))
        .attach_external()
        .build()
        .unwrap();
    c.create_gauge("early", "", ValueSource::new(|| 1.0)).unwrap();

    let app = c.router();
    let err = c
        .create_gauge("late", "", ValueSource::new(|| 2.0))
        .unwrap_err();
    assert!(matches!(err, VigilError::Config(_)));
    assert!(!c.registry().contains("late"));

    drop(app);
    c.create_gauge("after_drop", "", ValueSource::new(|| 3.0)).unwrap();
}

#[tokio::test]
async fn destroy_revokes_the_token_behind_a_host_router() {
    let mut cfg = ExporterConfig::new();
    cfg.access.token = Some(SecretString::from("S3cret".to_string()));
    let c = Controller::builder(cfg)
        .registry(Registry::bare())
        .health(HealthCallback::new(|| "ok".to_string()))
        .attach_external()
        .build()
        .unwrap();
    let guard = Arc::clone(c.access());
    let app = c.router();
    assert!(guard.check(Some("S3cret"), None));

    c.destroy().await;

    assert!(guard.is_revoked());
    assert!(!guard.check(Some("S3cret"), None));
    let req = Request::builder()
        .uri("/metrics")
        .header("x-access-token", "S3cret")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn build_requires_a_health_callback() {
    let err = Controller::builder(ExporterConfig::new())
        .build()
        .err()
        .expect("missing health callback must fail");
    assert!(matches!(err, VigilError::Config(_)));
}
