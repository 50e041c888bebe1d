//! Integration tests for paging through Carvoyant collections.
//!
//! A `wiremock` server replays recorded trip pages; the client must follow the
//! `next` and `previous` actions embedded in each page.

use carvoyant_api::{ApiResponse, CarvoyantClient, PageQuery, Trip, TripQuery, Vehicle};
use carvoyant_core::{CarvoyantConfig, Error, SortOrder};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load a JSON fixture from disk.
fn load_fixture(name: &str) -> Value {
    let fixture_path = fixtures_dir().join(name);
    let raw = fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture at {}: {}",
            fixture_path.display(),
            e
        )
    });
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("Invalid JSON in {name}: {e}"))
}

fn basic_client(server: &MockServer) -> CarvoyantClient {
    let config =
        CarvoyantConfig::new_basic("key", "secret").with_api_url(format!("{}/api", server.uri()));
    CarvoyantClient::from_config(&config).unwrap()
}

async fn mount_trip_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/vehicle/C201200001/trip"))
        .and(query_param_is_missing("searchOffset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(load_fixture("trip_page_1.json")))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/vehicle/C201200001/trip"))
        .and(query_param("searchOffset", "0"))
        .and(query_param("searchLimit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(load_fixture("trip_page_1.json")))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/vehicle/C201200001/trip"))
        .and(query_param("searchOffset", "2"))
        .and(query_param("searchLimit", "2"))
        .and(query_param("includeData", "true"))
        .and(query_param("sortOrder", "desc"))
        .and(query_param("startTime", "20130627T090000+0000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(load_fixture("trip_page_2.json")))
        .mount(server)
        .await;
}

fn first_page_query() -> TripQuery {
    let start = Utc.with_ymd_and_hms(2013, 6, 27, 9, 0, 0).unwrap();
    TripQuery::new()
        .with_page(PageQuery::new().with_limit(2).with_sort_order(SortOrder::Desc))
        .include_data(true)
        .with_start_time(&start)
}

#[tokio::test]
async fn test_walk_trip_pages_forward_and_back() {
    let server = MockServer::start().await;
    mount_trip_pages(&server).await;
    let client = basic_client(&server);

    let first = client
        .vehicle_trips("C201200001", first_page_query())
        .await
        .unwrap();
    let trips: Vec<Trip> = first.payload("trip").unwrap();
    assert_eq!(trips.len(), 2);
    assert_eq!(trips[0].data.len(), 1);
    assert_eq!(trips[0].data[0].key.as_deref(), Some("GEN_SPEED"));
    assert!(first.has_action("next"));
    assert!(!first.has_action("previous"));

    let second = client.next_page(&first).await.unwrap();
    let trips: Vec<Trip> = second.payload("trip").unwrap();
    assert_eq!(trips[0].id, Some(json!(3099)));
    assert_eq!(second.request.path, "/api/vehicle/C201200001/trip");

    let err = client.next_page(&second).await.unwrap_err();
    assert_eq!(err, Error::ActionNotFound("next".to_string()));

    let back = client.prev_page(&second).await.unwrap();
    assert_eq!(back.body, first.body);
}

#[tokio::test]
async fn test_trip_timestamps_keep_their_offset() {
    let server = MockServer::start().await;
    mount_trip_pages(&server).await;
    let client = basic_client(&server);

    let first = client
        .vehicle_trips("C201200001", first_page_query())
        .await
        .unwrap();
    let trips: Vec<Trip> = first.payload("trip").unwrap();

    let started = trips[1].started_at().unwrap().unwrap();
    assert_eq!(started.offset().local_minus_utc(), -6 * 3600);
    assert_eq!(
        started.with_timezone(&Utc),
        Utc.with_ymd_and_hms(2013, 6, 26, 23, 10, 2).unwrap()
    );
}

#[tokio::test]
async fn test_action_parameters_from_fixture() {
    let server = MockServer::start().await;
    mount_trip_pages(&server).await;
    let client = basic_client(&server);

    let first = client
        .vehicle_trips("C201200001", first_page_query())
        .await
        .unwrap();
    let params = client.action_parameters(&first, "next").unwrap();
    let keys: Vec<&str> = params.iter().map(|(key, _)| key).collect();
    assert_eq!(
        keys,
        vec!["includeData", "sortOrder", "startTime", "searchOffset", "searchLimit"]
    );
}

#[tokio::test]
async fn test_dispatch_action_delivers_next_page() {
    let server = MockServer::start().await;
    mount_trip_pages(&server).await;
    let client = basic_client(&server);

    let first = client
        .vehicle_trips("C201200001", first_page_query())
        .await
        .unwrap();

    let (sender, receiver) = tokio::sync::oneshot::channel();
    client
        .dispatch_action(
            &first,
            "next",
            Some(Box::new(move |outcome: carvoyant_api::Result<ApiResponse>| {
                let _ = sender.send(outcome);
            })),
        )
        .unwrap()
        .await
        .unwrap();

    let second = receiver.await.unwrap().unwrap();
    assert_eq!(second.body, load_fixture("trip_page_2.json"));
}

#[tokio::test]
async fn test_bearer_pagination_keeps_versioned_prefix() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/api/vehicle/12/trip/"))
        .and(query_param_is_missing("searchOffset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trip": [],
            "actions": [{
                "name": "next",
                "uri": "https://api.carvoyant.com/v1/api/vehicle/12/trip/?searchOffset=10&searchLimit=10"
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/api/vehicle/12/trip/"))
        .and(query_param("searchOffset", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "trip": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let config =
        CarvoyantConfig::new_bearer("token").with_api_url(format!("{}/v1/api", server.uri()));
    let client = CarvoyantClient::from_config(&config).unwrap();

    let first = client.vehicle_trips("12", TripQuery::new()).await.unwrap();
    let second = client.next_page(&first).await.unwrap();
    assert_eq!(second.request.path, "/v1/api/vehicle/12/trip/");
}

#[tokio::test]
async fn test_vehicle_list_models() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/vehicle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(load_fixture("vehicle_list.json")))
        .mount(&server)
        .await;

    let response = basic_client(&server).vehicles().await.unwrap();
    let vehicles: Vec<Vehicle> = response.payload("vehicle").unwrap();

    assert_eq!(vehicles.len(), 2);
    assert_eq!(vehicles[0].device_id.as_deref(), Some("C201200001"));
    assert_eq!(vehicles[0].extra.get("make"), Some(&json!("Ford")));
    assert!(vehicles[1].last_waypoint.is_none());
    assert!(response.actions().is_empty());
}
