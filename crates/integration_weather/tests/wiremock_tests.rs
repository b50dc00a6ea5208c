//! Integration tests for the weather client using wiremock
//!
//! These tests verify the client's behavior against a mock HTTP server,
//! covering success paths, status classification and query construction.

use integration_weather::{OpenMeteoClient, WeatherClient, WeatherConfig, WeatherError};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

/// Sample Open-Meteo API response for Helsinki
fn sample_weather_response() -> serde_json::Value {
    serde_json::json!({
        "latitude": 60.17,
        "longitude": 24.94,
        "generationtime_ms": 0.101,
        "utc_offset_seconds": 7200,
        "timezone": "Europe/Helsinki",
        "timezone_abbreviation": "EET",
        "elevation": 12.0,
        "current": {
            "time": "2024-01-15T12:00",
            "temperature_2m": -6.5,
            "relative_humidity_2m": 88,
            "apparent_temperature": -11.0,
            "weather_code": 71,
            "wind_speed_10m": 14.4,
            "wind_direction_10m": 190,
            "wind_gusts_10m": 28.0,
            "precipitation": 0.2,
            "cloud_cover": 100,
            "surface_pressure": 1004.5
        },
        "hourly": {
            "time": [
                "2024-01-15T00:00", "2024-01-15T01:00", "2024-01-15T02:00",
                "2024-01-15T03:00", "2024-01-15T04:00", "2024-01-15T05:00"
            ],
            "temperature_2m": [-5.0, -5.5, -6.0, -6.5, -7.0, -7.5],
            "relative_humidity_2m": [85, 86, 87, 88, 89, 90],
            "weather_code": [3, 3, 71, 71, 73, 0],
            "precipitation": [0.0, 0.0, 0.1, 0.2, 0.4, 0.0],
            "wind_speed_10m": [10.0, 11.0, 12.0, 13.0, 14.0, 15.0],
            "wind_direction_10m": [180, 185, 190, 195, 200, 205],
            "surface_pressure": [1006.0, 1005.5, 1005.0, 1004.5, 1004.0, 1003.5]
        }
    })
}

/// Create a test client configured to use the mock server
fn create_test_client(mock_server: &MockServer) -> OpenMeteoClient {
    let config = WeatherConfig {
        base_url: mock_server.uri(),
        timeout_secs: 5,
        ..Default::default()
    };
    #[allow(clippy::expect_used)]
    OpenMeteoClient::new(config).expect("Failed to create client")
}

/// Setup a mock for the /forecast endpoint with the given response
async fn setup_forecast_mock(mock_server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(response)
        .mount(mock_server)
        .await;
}

// ============================================================================
// Success scenarios
// ============================================================================

#[tokio::test]
async fn test_get_current_weather_success() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(sample_weather_response()),
    )
    .await;

    let client = create_test_client(&mock_server);
    let result = client.get_current(60.17, 24.94).await;

    assert!(result.is_ok(), "Expected success, got: {result:?}");
    let weather = result.unwrap();
    assert!((weather.temperature + 6.5).abs() < 0.1);
    assert_eq!(weather.humidity, 88);
    // 12:00 local at UTC+2
    assert_eq!(weather.time.format("%H:%M").to_string(), "10:00");
}

#[tokio::test]
async fn test_get_forecast_every_hour() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(sample_weather_response()),
    )
    .await;

    let client = create_test_client(&mock_server);
    let forecast = client.get_forecast(60.17, 24.94, 1).await.unwrap();

    assert_eq!(forecast.time_step_hours, 1);
    assert_eq!(forecast.entries.len(), 6);
    assert_eq!(forecast.timezone, "Europe/Helsinki");
}

#[tokio::test]
async fn test_get_forecast_with_step() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(sample_weather_response()),
    )
    .await;

    let client = create_test_client(&mock_server);
    let forecast = client.get_forecast(60.17, 24.94, 2).await.unwrap();

    assert_eq!(forecast.time_step_hours, 2);
    let temps: Vec<f32> = forecast.entries.iter().map(|e| e.temperature).collect();
    assert_eq!(temps, vec![-5.0, -6.0, -7.0]);
}

#[tokio::test]
async fn test_health_check_success() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(sample_weather_response()),
    )
    .await;

    let client = create_test_client(&mock_server);
    assert!(client.is_healthy().await, "Expected health check to succeed");
}

// ============================================================================
// Error handling scenarios
// ============================================================================

#[tokio::test]
async fn test_server_error_returns_service_unavailable() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(503).set_body_string("Service Unavailable"),
    )
    .await;

    let client = create_test_client(&mock_server);
    let result = client.get_forecast(60.17, 24.94, 1).await;

    assert!(
        matches!(result, Err(WeatherError::ServiceUnavailable(_))),
        "Expected ServiceUnavailable, got: {result:?}"
    );
    assert!(result.unwrap_err().is_server_error());
}

#[tokio::test]
async fn test_bad_request_returns_request_failed() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": true,
            "reason": "Parameter 'hourly' is invalid"
        })),
    )
    .await;

    let client = create_test_client(&mock_server);
    let result = client.get_current(60.17, 24.94).await;

    assert!(
        matches!(result, Err(WeatherError::RequestFailed(_))),
        "Expected RequestFailed, got: {result:?}"
    );
    assert!(result.unwrap_err().is_client_error());
}

#[tokio::test]
async fn test_rate_limit_error() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(429).set_body_string("Rate limit exceeded"),
    )
    .await;

    let client = create_test_client(&mock_server);
    let result = client.get_current(60.17, 24.94).await;

    assert!(
        matches!(result, Err(WeatherError::RateLimitExceeded)),
        "Expected RateLimitExceeded, got: {result:?}"
    );
}

#[tokio::test]
async fn test_invalid_json_response() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_string("not valid json"),
    )
    .await;

    let client = create_test_client(&mock_server);
    let result = client.get_current(60.17, 24.94).await;

    assert!(
        matches!(result, Err(WeatherError::ParseError(_))),
        "Expected ParseError, got: {result:?}"
    );
}

#[tokio::test]
async fn test_missing_hourly_block_is_parse_error() {
    let mock_server = MockServer::start().await;
    let mut body = sample_weather_response();
    body.as_object_mut().unwrap().remove("hourly");
    setup_forecast_mock(&mock_server, ResponseTemplate::new(200).set_body_json(body)).await;

    let client = create_test_client(&mock_server);
    let result = client.get_forecast(60.17, 24.94, 1).await;

    assert!(
        matches!(result, Err(WeatherError::ParseError(_))),
        "Expected ParseError, got: {result:?}"
    );
}

#[tokio::test]
async fn test_health_check_fails_on_server_error() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(500).set_body_string("Internal Server Error"),
    )
    .await;

    let client = create_test_client(&mock_server);
    assert!(!client.is_healthy().await, "Expected health check to fail");
}

#[tokio::test]
async fn test_invalid_coordinates_rejected_before_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_weather_response()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client.get_forecast(91.0, 24.94, 1).await;

    assert!(
        matches!(result, Err(WeatherError::InvalidCoordinates)),
        "Expected InvalidCoordinates, got: {result:?}"
    );
}

// ============================================================================
// Query parameter verification
// ============================================================================

#[tokio::test]
async fn test_current_request_query_params() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("latitude", "60.17"))
        .and(query_param("longitude", "24.94"))
        .and(query_param("timezone", "auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_weather_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client.get_current(60.17, 24.94).await;

    assert!(result.is_ok(), "Expected success, got: {result:?}");
}

#[tokio::test]
async fn test_forecast_days_parameter() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("forecast_days", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_weather_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = WeatherConfig {
        base_url: mock_server.uri(),
        timeout_secs: 5,
        forecast_days: 3,
    };
    let client = OpenMeteoClient::new(config).unwrap();
    let result = client.get_forecast(60.17, 24.94, 1).await;

    assert!(result.is_ok(), "Expected success, got: {result:?}");
}
