//! Integration tests for the refresh workflow against a mock weather API.

use std::sync::Arc;

use citycast_core::{
    Config, Coordinates, FailurePolicy, FileSlot, FixedLocator, LocationError, LookupError,
    MemorySlot, ProviderId, RefreshMode, RefreshWorkflow, SavedCities, TemperatureUnit,
    UnavailableLocator, WeatherProvider, lookup_here,
    provider::{provider_from_config, weatherapi::WeatherApiProvider},
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Minimal weatherapi.com forecast body for `name`.
fn forecast_body(name: &str, temp_c: f64) -> serde_json::Value {
    serde_json::json!({
        "location": { "name": name, "country": "Somewhere" },
        "current": {
            "temp_c": temp_c,
            "temp_f": temp_c * 9.0 / 5.0 + 32.0,
            "humidity": 70,
            "wind_kph": 11.2,
            "condition": { "text": "Overcast", "icon": "//cdn.weatherapi.com/122.png" }
        },
        "forecast": { "forecastday": [
            { "date": "2026-10-19", "day": {
                "maxtemp_c": temp_c + 3.0, "maxtemp_f": (temp_c + 3.0) * 9.0 / 5.0 + 32.0,
                "mintemp_c": temp_c - 3.0, "mintemp_f": (temp_c - 3.0) * 9.0 / 5.0 + 32.0,
                "avghumidity": 72, "maxwind_kph": 19.1,
                "condition": { "text": "Patchy rain", "icon": "//cdn.weatherapi.com/176.png" }
            }}
        ]}
    })
}

async fn mount_city(server: &MockServer, query: &str, canonical: &str) {
    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .and(query_param("q", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(canonical, 12.0)))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, query: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .and(query_param("q", query))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
            "error": { "code": 1006, "message": "No matching location found." }
        })))
        .mount(server)
        .await;
}

fn provider(server: &MockServer) -> Arc<dyn WeatherProvider> {
    Arc::new(WeatherApiProvider::new("TEST_KEY".into()).with_base_url(server.uri()))
}

#[tokio::test]
async fn refresh_drops_failed_city_and_keeps_order() {
    let server = MockServer::start().await;
    mount_city(&server, "London", "London").await;
    mount_status(&server, "Paris", 400).await;

    let saved = SavedCities::new(MemorySlot::with_value(r#"["London","Paris"]"#));
    let wf = RefreshWorkflow::new(provider(&server), saved);

    let outcome = wf.refresh_saved().await;

    assert_eq!(outcome.snapshots.len(), 1);
    assert_eq!(outcome.snapshots[0].city, "London");
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn concurrent_refresh_reports_failures_when_asked() {
    let server = MockServer::start().await;
    mount_city(&server, "Tokyo", "Tokyo").await;
    mount_city(&server, "Lima", "Lima").await;
    mount_status(&server, "Nowhere", 400).await;

    let saved = SavedCities::new(MemorySlot::with_value(r#"["Tokyo","Nowhere","Lima"]"#));
    let wf = RefreshWorkflow::new(provider(&server), saved)
        .with_mode(RefreshMode::Concurrent)
        .with_policy(FailurePolicy::Report);

    let outcome = wf.refresh_saved().await;

    let cities: Vec<_> = outcome.snapshots.iter().map(|s| s.city.as_str()).collect();
    assert_eq!(cities, vec!["Tokyo", "Lima"]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].city, "Nowhere");
    assert!(matches!(outcome.failures[0].error, LookupError::NotFound { .. }));
}

#[tokio::test]
async fn search_saves_canonical_name_then_remove_empties_list() {
    let server = MockServer::start().await;
    mount_city(&server, "berlin", "Berlin").await;

    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("saved_cities.json");
    let mut wf = RefreshWorkflow::new(provider(&server), SavedCities::new(FileSlot::new(&file)));

    let snapshot = wf.lookup_and_save("berlin").await.expect("lookup");
    assert_eq!(snapshot.city, "Berlin");
    assert_eq!(snapshot.forecast.len(), 1);

    wf.lookup_and_save("berlin").await.expect("lookup");
    assert_eq!(std::fs::read_to_string(&file).expect("saved file"), r#"["Berlin"]"#);

    wf.remove("Berlin").expect("remove");
    assert!(wf.saved_cities().is_empty());
}

#[tokio::test]
async fn status_codes_map_to_typed_causes() {
    let server = MockServer::start().await;
    mount_status(&server, "Atlantis", 400).await;
    mount_status(&server, "Locked", 401).await;
    mount_status(&server, "Banned", 403).await;
    mount_status(&server, "Broken", 503).await;

    let wf = RefreshWorkflow::new(provider(&server), SavedCities::new(MemorySlot::new()));

    assert!(matches!(wf.lookup("Atlantis").await, Err(LookupError::NotFound { .. })));
    assert!(matches!(wf.lookup("Locked").await, Err(LookupError::Unauthorized)));
    assert!(matches!(wf.lookup("Banned").await, Err(LookupError::Forbidden)));
    assert!(matches!(wf.lookup("Broken").await, Err(LookupError::Api { status: 503, .. })));
}

#[tokio::test]
async fn unreachable_host_is_a_network_failure() {
    // Bind and release an ephemeral port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let provider = Arc::new(
        WeatherApiProvider::new("TEST_KEY".into()).with_base_url(format!("http://{addr}")),
    );
    let mut wf = RefreshWorkflow::new(provider, SavedCities::new(MemorySlot::new()));

    let err = wf.lookup_and_save("London").await.unwrap_err();
    assert!(matches!(err, LookupError::Network(_)), "unexpected error: {err:?}");
    assert!(wf.saved_cities().is_empty());
}

#[tokio::test]
async fn sends_days_and_key_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .and(query_param("key", "TEST_KEY"))
        .and(query_param("q", "Oslo"))
        .and(query_param("days", "7"))
        .and(query_param("aqi", "no"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body("Oslo", 2.0)))
        .expect(1)
        .mount(&server)
        .await;

    let wf = RefreshWorkflow::new(provider(&server), SavedCities::new(MemorySlot::new()))
        .with_days(7);

    let snapshot = wf.lookup("Oslo").await.expect("lookup");
    assert_eq!(snapshot.city, "Oslo");
}

#[tokio::test]
async fn here_uses_coordinates_when_position_is_known() {
    let server = MockServer::start().await;
    mount_city(&server, "51.5,-0.12", "London").await;

    let wf = RefreshWorkflow::new(provider(&server), SavedCities::new(MemorySlot::new()));
    let locator = FixedLocator(Coordinates { latitude: 51.5, longitude: -0.12 });

    let here = lookup_here(&wf, &locator, "London").await.expect("here");
    assert_eq!(here.snapshot.city, "London");
    assert!(here.notice.is_none());
    assert!(wf.saved_cities().is_empty());
}

#[tokio::test]
async fn here_falls_back_to_default_city() {
    let server = MockServer::start().await;
    mount_city(&server, "London", "London").await;

    let wf = RefreshWorkflow::new(provider(&server), SavedCities::new(MemorySlot::new()));
    let locator = UnavailableLocator(LocationError::PositionUnavailable);

    let here = lookup_here(&wf, &locator, "London").await.expect("here");
    assert_eq!(here.snapshot.city, "London");
    assert_eq!(
        here.notice.as_deref(),
        Some("Location information unavailable. Loading weather for London as fallback.")
    );
}

#[tokio::test]
async fn here_reports_location_error_when_fallback_fails() {
    let server = MockServer::start().await;
    mount_status(&server, "London", 500).await;

    let wf = RefreshWorkflow::new(provider(&server), SavedCities::new(MemorySlot::new()));
    let locator = UnavailableLocator(LocationError::PermissionDenied);

    let err = lookup_here(&wf, &locator, "London").await.unwrap_err();
    assert!(matches!(err, LookupError::GeolocationUnavailable(LocationError::PermissionDenied)));
}

#[tokio::test]
async fn openweather_requests_units_and_builds_both_scales() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Chicago"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Chicago",
            "sys": { "country": "US" },
            "main": { "temp": 50.0, "temp_min": 45.0, "temp_max": 55.0, "humidity": 60 },
            "weather": [{ "description": "clear sky", "icon": "01d" }],
            "wind": { "speed": 10.0 }
        })))
        .mount(&server)
        .await;

    // 2026-10-19T12:00:00Z and 2026-10-20T12:00:00Z
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("q", "Chicago"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "city": { "timezone": 0 },
            "list": [
                { "dt": 1792411200_i64,
                  "main": { "temp": 60.0, "temp_min": 41.0, "temp_max": 68.0, "humidity": 50 },
                  "weather": [{ "description": "few clouds", "icon": "02d" }],
                  "wind": { "speed": 5.0 } },
                { "dt": 1792497600_i64,
                  "main": { "temp": 55.0, "temp_min": 50.0, "temp_max": 59.0, "humidity": 80 },
                  "weather": [{ "description": "rain", "icon": "10d" }],
                  "wind": { "speed": 12.0 } }
            ]
        })))
        .mount(&server)
        .await;

    let mut cfg = Config::default();
    cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OW_KEY".into());
    if let Some(p) = cfg.providers.get_mut("openweather") {
        p.base_url = Some(server.uri());
    }

    let provider = provider_from_config(ProviderId::OpenWeather, &cfg, TemperatureUnit::Fahrenheit)
        .expect("provider");
    let mut wf = RefreshWorkflow::new(provider, SavedCities::new(MemorySlot::new()));

    let snapshot = wf.lookup_and_save("Chicago").await.expect("lookup");

    assert_eq!(snapshot.provider, "openweather");
    assert_eq!(snapshot.current.temperature.fahrenheit, 50.0);
    assert!((snapshot.current.temperature.celsius - 10.0).abs() < 1e-9);
    assert_eq!(snapshot.forecast.len(), 2);
    assert_eq!(snapshot.forecast[0].max.fahrenheit, 68.0);
    assert!((snapshot.forecast[0].min.celsius - 5.0).abs() < 1e-9);
    assert_eq!(snapshot.forecast[1].condition.text, "rain");
    assert_eq!(wf.saved_cities(), vec!["Chicago"]);
}

#[tokio::test]
async fn missing_key_is_a_configuration_error() {
    let cfg = Config::default();
    let err = provider_from_config(ProviderId::WeatherApi, &cfg, TemperatureUnit::Celsius)
        .unwrap_err();
    assert!(matches!(err, LookupError::ConfigurationMissing { provider: ProviderId::WeatherApi }));
}
