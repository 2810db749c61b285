//! Reverse geocoding against a mock Nominatim.

use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use workkar_api_client::{GeocoderConfig, NominatimGeocoder};
use workkar_core::rate_limit::RateLimitConfig;
use workkar_discovery::{describe_location, LocationOrigin, ReverseGeocoder};
use workkar_geo::Coordinate;

const CHARMINAR: Coordinate = Coordinate::new(17.3616, 78.4747);

fn geocoder(server: &MockServer) -> NominatimGeocoder {
    let config = GeocoderConfig::default()
        .with_base_url(server.uri())
        .with_rate_limit(RateLimitConfig::per_second(50));
    NominatimGeocoder::with_config(config).unwrap()
}

#[tokio::test]
async fn resolves_display_name_and_city() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("format", "json"))
        .and(query_param("lat", "17.3616"))
        .and(query_param("lon", "78.4747"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "display_name": "Charminar, Hyderabad, Telangana, India",
            "address": {"town": "Old City", "city": "Hyderabad"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let place = geocoder(&server).reverse(CHARMINAR).await.unwrap();

    assert_eq!(place.display_name, "Charminar, Hyderabad, Telangana, India");
    assert_eq!(place.city.as_deref(), Some("Hyderabad"));
}

#[tokio::test]
async fn sends_configured_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(header("user-agent", "workkar-tests/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "display_name": "Somewhere",
            "address": {"hamlet": "Tiny"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = GeocoderConfig::default()
        .with_base_url(server.uri())
        .with_rate_limit(RateLimitConfig::per_second(50));
    config.user_agent = "workkar-tests/1.0".into();

    let place = NominatimGeocoder::with_config(config)
        .unwrap()
        .reverse(CHARMINAR)
        .await
        .unwrap();
    assert_eq!(place.city.as_deref(), Some("Tiny"));
}

#[tokio::test]
async fn provider_error_falls_back_to_coordinate_label() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "Unable to geocode"})))
        .mount(&server)
        .await;

    let geocoder = geocoder(&server);
    assert!(geocoder.reverse(CHARMINAR).await.is_err());

    let label = describe_location(Some(&geocoder), CHARMINAR, LocationOrigin::Picked).await;
    assert!(!label.geocoded);
    assert_eq!(label.address, "Selected Location (17.3616, 78.4747)");
}

#[tokio::test]
async fn http_failure_falls_back_to_coordinate_label() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let geocoder = geocoder(&server);
    let label = describe_location(Some(&geocoder), CHARMINAR, LocationOrigin::Current).await;

    assert_eq!(label.address, "Current Location (17.3616, 78.4747)");
    assert_eq!(label.city, None);
}

#[tokio::test]
async fn requests_are_spaced_by_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"display_name": "X"})))
        .expect(2)
        .mount(&server)
        .await;

    let config = GeocoderConfig::default()
        .with_base_url(server.uri())
        .with_rate_limit(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_millis(300),
            burst: 0,
        });
    let geocoder = NominatimGeocoder::with_config(config).unwrap();

    let start = Instant::now();
    geocoder.reverse(CHARMINAR).await.unwrap();
    geocoder.reverse(CHARMINAR).await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(250));
}
