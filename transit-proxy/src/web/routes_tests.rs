//! End-to-end tests: the proxy router in front of a fake HERE API.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::cache::{CacheConfig, ResponseCache};
use crate::here::{Board, HereClient, HereConfig, Place};
use crate::supplemental::ExtraBoards;
use crate::web::{AppState, create_router};

/// Request counters for the fake upstream.
#[derive(Clone, Default)]
struct Upstream {
    station_hits: Arc<AtomicUsize>,
    departure_hits: Arc<AtomicUsize>,
}

impl Upstream {
    fn station_hits(&self) -> usize {
        self.station_hits.load(Ordering::SeqCst)
    }

    fn departure_hits(&self) -> usize {
        self.departure_hits.load(Ordering::SeqCst)
    }
}

/// Echoes the received query parameters back.
async fn fake_stations(
    State(upstream): State<Upstream>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    upstream.station_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "stations": [{"place": {"name": "Alexanderplatz", "type": "station"}}],
        "received": params,
    }))
}

/// Two boards for any id, except `BROKEN` which fails with a JSON body.
async fn fake_departures(
    State(upstream): State<Upstream>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    upstream.departure_hits.fetch_add(1, Ordering::SeqCst);
    match params.get("ids").map(String::as_str) {
        Some("BROKEN") => (
            StatusCode::BAD_REQUEST,
            Json(json!({"title": "Invalid station id", "status": 400})),
        )
            .into_response(),
        Some(id) => Json(json!({
            "boards": [
                {
                    "place": {"name": "A", "id": id},
                    "departures": [{"time": "d1"}]
                },
                {
                    "place": {"name": "B"},
                    "departures": [{"time": "b1"}]
                }
            ]
        }))
        .into_response(),
        None => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

struct TestProxy {
    base: String,
    upstream: Upstream,
}

impl TestProxy {
    async fn start(extra_boards: ExtraBoards) -> Self {
        let upstream = Upstream::default();
        let upstream_router = Router::new()
            .route("/stations", get(fake_stations))
            .route("/departures", get(fake_departures))
            .with_state(upstream.clone());
        let upstream_addr = serve(upstream_router).await;

        let base = Self::start_proxy(&format!("http://{upstream_addr}"), extra_boards).await;
        Self { base, upstream }
    }

    async fn start_proxy(upstream_url: &str, extra_boards: ExtraBoards) -> String {
        let here = HereClient::new(
            HereConfig::new("test-key")
                .with_base_url(upstream_url)
                .with_timeout(5),
        )
        .unwrap();
        let cache = ResponseCache::new(&CacheConfig::default());
        let addr = serve(create_router(AppState::new(here, cache, extra_boards))).await;
        format!("http://{addr}")
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        get_json(&format!("{}{}", self.base, path)).await
    }
}

async fn get_json(url: &str) -> (StatusCode, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    (status, response.json().await.unwrap())
}

fn board(name: &str, departures: Vec<Value>) -> Board {
    Board {
        place: Place {
            name: Some(name.to_string()),
            ..Place::default()
        },
        departures,
        ..Board::default()
    }
}

#[tokio::test]
async fn root_and_health() {
    let proxy = TestProxy::start(ExtraBoards::empty()).await;

    let root = reqwest::get(format!("{}/", proxy.base)).await.unwrap();
    assert_eq!(root.status().as_u16(), 200);
    assert_eq!(root.text().await.unwrap(), "OK");

    let (status, body) = proxy.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn stations_without_latitude_is_rejected_before_upstream() {
    let proxy = TestProxy::start(ExtraBoards::empty()).await;

    let (status, body) = proxy.get("/api/stations?longitude=13.405").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(body.get("details").is_none());
    assert_eq!(proxy.upstream.station_hits(), 0);
}

#[tokio::test]
async fn stations_with_empty_longitude_is_rejected() {
    let proxy = TestProxy::start(ExtraBoards::empty()).await;

    let (status, _) = proxy.get("/api/stations?latitude=52.52&longitude=").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(proxy.upstream.station_hits(), 0);
}

#[tokio::test]
async fn stations_with_malformed_values_is_rejected() {
    let proxy = TestProxy::start(ExtraBoards::empty()).await;

    let (status, _) = proxy.get("/api/stations?latitude=abc&longitude=13.4").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = proxy
        .get("/api/stations?latitude=52.5&longitude=13.4&radius=-5")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(proxy.upstream.station_hits(), 0);
}

#[tokio::test]
async fn stations_forwards_query_parameters() {
    let proxy = TestProxy::start(ExtraBoards::empty()).await;

    let (status, body) = proxy
        .get("/api/stations?latitude=52.52&longitude=13.405")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stations"][0]["place"]["name"], "Alexanderplatz");
    assert_eq!(body["received"]["in"], "52.52,13.405");
    assert_eq!(body["received"]["radius"], "1000");
    assert_eq!(body["received"]["return"], "transport");
    assert_eq!(body["received"]["apiKey"], "test-key");
}

#[tokio::test]
async fn nearby_station_queries_share_a_cache_entry() {
    let proxy = TestProxy::start(ExtraBoards::empty()).await;

    let (_, first) = proxy
        .get("/api/stations?latitude=52.5200&longitude=13.4050")
        .await;
    let (status, second) = proxy
        .get("/api/stations?latitude=52.5203&longitude=13.4048")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(proxy.upstream.station_hits(), 1);

    let (_, _) = proxy
        .get("/api/stations?latitude=52.5200&longitude=13.4050&radius=500")
        .await;
    assert_eq!(proxy.upstream.station_hits(), 2);
}

#[tokio::test]
async fn departures_without_station_id_is_rejected_before_upstream() {
    let proxy = TestProxy::start(ExtraBoards::empty()).await;

    let (status, body) = proxy.get("/api/departures").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(proxy.upstream.departure_hits(), 0);
}

#[tokio::test]
async fn departures_station_id_is_used_verbatim() {
    let proxy = TestProxy::start(ExtraBoards::empty()).await;

    let (status, body) = proxy.get("/api/departures?stationId=%20S1%20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["boards"][0]["place"]["id"], " S1 ");

    // The padded id has its own cache entry
    let (_, body) = proxy.get("/api/departures?stationId=S1").await;
    assert_eq!(body["boards"][0]["place"]["id"], "S1");
    assert_eq!(proxy.upstream.departure_hits(), 2);
}

#[tokio::test]
async fn departures_merge_supplemental_boards() {
    let extra = ExtraBoards::new(vec![
        board("A", vec![json!({"time": "d2"})]),
        board("Elsewhere", vec![json!({"time": "x"})]),
    ]);
    let proxy = TestProxy::start(extra).await;

    let (status, body) = proxy.get("/api/departures?stationId=S1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["boards"][0]["place"], json!({"name": "A", "id": "S1"}));
    assert_eq!(
        body["boards"][0]["departures"],
        json!([{"time": "d1"}, {"time": "d2"}])
    );
    assert_eq!(body["boards"][1]["departures"], json!([{"time": "b1"}]));
}

#[tokio::test]
async fn departures_are_cached_after_merging() {
    let extra = ExtraBoards::new(vec![board("A", vec![json!({"time": "d2"})])]);
    let proxy = TestProxy::start(extra).await;

    let (_, first) = proxy.get("/api/departures?stationId=S1").await;
    let (_, second) = proxy.get("/api/departures?stationId=S1").await;

    assert_eq!(first, second);
    assert_eq!(second["boards"][0]["departures"].as_array().unwrap().len(), 2);
    assert_eq!(proxy.upstream.departure_hits(), 1);

    let (_, _) = proxy.get("/api/departures?stationId=S2").await;
    assert_eq!(proxy.upstream.departure_hits(), 2);
}

#[tokio::test]
async fn departures_upstream_failure_reports_details() {
    let proxy = TestProxy::start(ExtraBoards::empty()).await;

    let (status, body) = proxy.get("/api/departures?stationId=BROKEN").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    assert_eq!(
        body["details"],
        json!({"title": "Invalid station id", "status": 400})
    );

    // Failures are not cached
    let _ = proxy.get("/api/departures?stationId=BROKEN").await;
    assert_eq!(proxy.upstream.departure_hits(), 2);
}

#[tokio::test]
async fn unreachable_upstream_reports_transport_error() {
    // Bind then drop to get a port nothing listens on
    let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let closed_addr = closed.local_addr().unwrap();
    drop(closed);

    let base = TestProxy::start_proxy(&format!("http://{closed_addr}"), ExtraBoards::empty()).await;

    let (status, body) = get_json(&format!("{base}/api/departures?stationId=S1")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    assert!(body["details"].as_str().is_some_and(|d| !d.is_empty()));
    assert!(!body.to_string().contains("test-key"));

    let (status, body) =
        get_json(&format!("{base}/api/stations?latitude=1.0&longitude=2.0")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["details"].is_string());
    assert!(!body.to_string().contains("test-key"));
}

#[tokio::test]
async fn concurrent_misses_all_succeed() {
    let proxy = TestProxy::start(ExtraBoards::empty()).await;

    let requests = (0..5).map(|_| proxy.get("/api/departures?stationId=S1"));
    let results = futures::future::join_all(requests).await;

    for (status, body) in &results {
        assert_eq!(*status, StatusCode::OK);
        assert_eq!(body["boards"][0]["place"]["id"], "S1");
    }
    let hits = proxy.upstream.departure_hits();
    assert!((1..=5).contains(&hits));
}

#[tokio::test]
async fn responses_allow_any_origin() {
    let proxy = TestProxy::start(ExtraBoards::empty()).await;

    let response = reqwest::Client::new()
        .get(format!("{}/health", proxy.base))
        .header("Origin", "http://example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
