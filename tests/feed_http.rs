/// HTTP-level tests for the GeoNames feed client and the geocoder
///
/// These tests run the real clients against a local `httptest` server, so
/// they cover URL construction, status handling and body parsing together
/// without touching the network.
///
/// The live-service checks at the bottom are #[ignore]d. Run them with:
///   GEONAMES_USERNAME=<account> cargo test --test feed_http -- --ignored

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use httptest::matchers::{contains, request, url_decoded};
use httptest::responders::status_code;
use httptest::{Expectation, Server, all_of};

use quakemon_service::analysis::top_ten::{TopEarthquakeFinder, WideningPolicy};
use quakemon_service::ingest::geocoder::{AddressResolver, GoogleGeocoder};
use quakemon_service::ingest::geonames::{GeoNamesClient, QuakeFeed};
use quakemon_service::model::{BoundingBox, FeedQuery, QuakeError};
use quakemon_service::query::BoundedQuakeQuery;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn feed_for(server: &Server) -> GeoNamesClient {
    GeoNamesClient::new(
        &format!("http://{}", server.addr()),
        "tester",
        Duration::from_secs(5),
    )
    .expect("client should build")
}

fn geocoder_for(server: &Server) -> GoogleGeocoder {
    GoogleGeocoder::new(
        &format!("http://{}/geocode/json", server.addr()),
        "test-key",
        Duration::from_secs(5),
    )
    .expect("client should build")
}

/// A fixed "now": 2024-05-01 13:00:00 UTC.
fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
}

/// An `earthquakesJSON` body with `count` events in April 2024, newest first.
fn recent_body(prefix: &str, count: usize) -> String {
    let records: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"datetime":"2024-04-{:02} 06:00:00","depth":10.0,"lng":140.0,"src":"us","eqid":"{}{}","magnitude":{},"lat":35.0}}"#,
                28 - i,
                prefix,
                i,
                5.5 + (i as f64) * 0.1
            )
        })
        .collect();
    format!(r#"{{"earthquakes":[{}]}}"#, records.join(","))
}

// ---------------------------------------------------------------------------
// Bounding-box queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_box_query_sends_edges_and_row_cap() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/earthquakesJSON"),
            request::query(url_decoded(contains(("north", "61.5")))),
            request::query(url_decoded(contains(("south", "60.9")))),
            request::query(url_decoded(contains(("east", "-149.2")))),
            request::query(url_decoded(contains(("west", "-150.4")))),
            request::query(url_decoded(contains(("maxRows", "25")))),
            request::query(url_decoded(contains(("username", "tester")))),
        ])
        .respond_with(
            status_code(200)
                .insert_header("Content-Type", "application/json")
                .body(recent_body("ak", 3)),
        ),
    );

    let feed = feed_for(&server);
    let query = BoundedQuakeQuery::new(&feed, 25);
    let anchorage = BoundingBox::new(61.5, 60.9, -149.2, -150.4).unwrap();

    let quakes = query.query_box(&anchorage).await.expect("query should succeed");

    assert_eq!(quakes.len(), 3);
    assert_eq!(quakes[0].eqid, "ak0");
}

#[tokio::test]
async fn test_non_200_is_http_error() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/earthquakesJSON"))
            .respond_with(status_code(503)),
    );

    let feed = feed_for(&server);
    let err = feed
        .fetch_earthquakes(&FeedQuery::in_box(BoundingBox::WORLD, 25))
        .await
        .unwrap_err();

    assert_eq!(err, QuakeError::HttpError(503));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_in_band_status_is_service_error() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/earthquakesJSON")).respond_with(
            status_code(200).body(r#"{"status":{"message":"invalid username","value":10}}"#),
        ),
    );

    let feed = feed_for(&server);
    let err = feed
        .fetch_earthquakes(&FeedQuery::in_box(BoundingBox::WORLD, 25))
        .await
        .unwrap_err();

    assert!(matches!(err, QuakeError::ServiceError { code: 10, .. }));
}

#[tokio::test]
async fn test_html_body_is_malformed_response() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/earthquakesJSON"))
            .respond_with(status_code(200).body("<html><body>maintenance</body></html>")),
    );

    let feed = feed_for(&server);
    let err = feed
        .fetch_earthquakes(&FeedQuery::in_box(BoundingBox::WORLD, 25))
        .await
        .unwrap_err();

    assert!(matches!(err, QuakeError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    // Port 1 is reserved and nothing listens there
    let feed = GeoNamesClient::new("http://127.0.0.1:1", "tester", Duration::from_secs(2)).unwrap();
    let err = feed
        .fetch_earthquakes(&FeedQuery::in_box(BoundingBox::WORLD, 25))
        .await
        .unwrap_err();

    assert!(matches!(err, QuakeError::Transport(_)), "got {:?}", err);
}

// ---------------------------------------------------------------------------
// Widening search over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_widening_search_requests_lower_floor_after_short_batch() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/earthquakesJSON"),
            request::query(url_decoded(contains(("minMagnitude", "6")))),
            request::query(url_decoded(contains(("date", "2024-05-01")))),
            request::query(url_decoded(contains(("maxRows", "300")))),
            request::query(url_decoded(contains(("north", "90")))),
            request::query(url_decoded(contains(("west", "-180")))),
        ])
        .respond_with(status_code(200).body(recent_body("a", 7))),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/earthquakesJSON"),
            request::query(url_decoded(contains(("minMagnitude", "5.5")))),
        ])
        .respond_with(status_code(200).body(recent_body("b", 12))),
    );

    let feed = feed_for(&server);
    let finder = TopEarthquakeFinder::new(&feed, WideningPolicy::default());

    let result = finder
        .find_top_ten_at(6.0, fixed_now())
        .await
        .expect("second floor should converge");

    assert_eq!(result.floors_tried, vec![6.0, 5.5]);
    assert_eq!(result.earthquakes.len(), 10);
    // magnitudes rise with index, so the strongest is the last record
    assert_eq!(result.earthquakes[0].eqid, "b11");
    assert_eq!(result.earthquakes[9].eqid, "b2");
}

// ---------------------------------------------------------------------------
// Geocoding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_geocoder_sends_address_and_key() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/geocode/json"),
            request::query(url_decoded(contains(("address", "Anchorage, AK")))),
            request::query(url_decoded(contains(("key", "test-key")))),
        ])
        .respond_with(status_code(200).body(
            r#"{"results":[{"geometry":{"viewport":{
                "northeast":{"lat":61.4837,"lng":-149.2210},
                "southwest":{"lat":60.9716,"lng":-150.4206}}}}],
               "status":"OK"}"#,
        )),
    );

    let geocoder = geocoder_for(&server);
    let bbox = geocoder.resolve("Anchorage, AK").await.expect("should resolve");

    assert_eq!(bbox, BoundingBox::new(61.4837, 60.9716, -149.2210, -150.4206).unwrap());
}

#[tokio::test]
async fn test_geocoder_zero_results_is_address_not_found() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/geocode/json"))
            .respond_with(status_code(200).body(r#"{"results":[],"status":"ZERO_RESULTS"}"#)),
    );

    let geocoder = geocoder_for(&server);
    let err = geocoder.resolve("zzqqxx").await.unwrap_err();

    assert_eq!(err, QuakeError::AddressNotFound("zzqqxx".to_string()));
    assert!(!err.is_transport());
}

#[tokio::test]
async fn test_geocoder_server_error_is_transport() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/geocode/json"))
            .respond_with(status_code(500)),
    );

    let geocoder = geocoder_for(&server);
    let err = geocoder.resolve("Tokyo").await.unwrap_err();

    assert!(err.is_transport());
}

// ---------------------------------------------------------------------------
// Live service checks
// ---------------------------------------------------------------------------

#[tokio::test]
#[ignore] // Don't run in CI - depends on external API
async fn live_geonames_returns_recent_strong_earthquakes() {
    dotenv::dotenv().ok();
    let username = std::env::var("GEONAMES_USERNAME").expect("GEONAMES_USERNAME must be set");
    let feed = GeoNamesClient::new(
        quakemon_service::ingest::geonames::GEONAMES_BASE_URL,
        &username,
        Duration::from_secs(30),
    )
    .unwrap();

    let query = FeedQuery::recent_global(Utc::now().date_naive(), 6.0, 50);
    let quakes = feed.fetch_earthquakes(&query).await.expect("live feed should answer");

    println!("✓ GeoNames returned {} event(s) at M6+", quakes.len());
    assert!(!quakes.is_empty());
    for pair in quakes.windows(2) {
        assert!(pair[0].occurred_at >= pair[1].occurred_at, "dated query should be newest first");
    }
}
