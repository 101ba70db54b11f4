//! Integration tests for OpenMeteoClient using wiremock.

use serde_json::json;
use weather_dashboard_core::{ForecastRequest, OpenMeteoClient, WeatherError, WeatherService};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenMeteoClient {
    OpenMeteoClient::builder()
        .forecast_url(format!("{}/v1/forecast", server.uri()))
        .geocoding_url(format!("{}/v1/search", server.uri()))
        .build()
        .unwrap()
}

fn paris_result() -> serde_json::Value {
    json!({
        "results": [{
            "id": 2988507,
            "name": "Paris",
            "latitude": 48.8566,
            "longitude": 2.3522,
            "country": "France",
            "country_code": "FR",
            "timezone": "Europe/Paris"
        }],
        "generationtime_ms": 0.7
    })
}

fn forecast_body(hours: usize, days: usize) -> serde_json::Value {
    let hour_times: Vec<String> =
        (0..hours).map(|h| format!("2024-06-{:02}T{:02}:00", 1 + h / 24, h % 24)).collect();
    let day_times: Vec<String> = (1..=days).map(|d| format!("2024-06-{d:02}")).collect();
    json!({
        "latitude": 48.86,
        "longitude": 2.3399997,
        "timezone": "Europe/Paris",
        "timezone_abbreviation": "CEST",
        "elevation": 43.0,
        "current_weather": {
            "temperature": 22.3,
            "windspeed": 7.9,
            "winddirection": 243,
            "weathercode": 0,
            "time": "2024-06-01T15:00"
        },
        "hourly": {
            "time": hour_times,
            "temperature_2m": vec![18.5; hours],
            "relativehumidity_2m": vec![60; hours],
            "precipitation_probability": vec![0; hours],
            "precipitation": vec![0.0; hours],
            "weathercode": vec![0; hours],
            "windspeed_10m": vec![8.1; hours],
            "winddirection_10m": vec![240; hours]
        },
        "daily": {
            "time": day_times,
            "weathercode": vec![2; days],
            "temperature_2m_max": vec![24.0; days],
            "temperature_2m_min": vec![13.0; days],
            "precipitation_sum": vec![0.0; days],
            "precipitation_probability_max": vec![5; days]
        }
    })
}

#[tokio::test]
async fn geocode_maps_top_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "Paris"))
        .and(query_param("count", "1"))
        .and(query_param("language", "en"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paris_result()))
        .expect(1)
        .mount(&server)
        .await;

    let location = client_for(&server).geocode("Paris").await.unwrap();

    assert_eq!(location.name, "Paris");
    assert_eq!(location.latitude, 48.8566);
    assert_eq!(location.longitude, 2.3522);
    assert_eq!(location.country, "France");
    assert_eq!(location.timezone, "Europe/Paris");
}

#[tokio::test]
async fn geocode_without_results_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "generationtime_ms": 0.3 })))
        .mount(&server)
        .await;

    let err = client_for(&server).geocode("Atlantis").await.unwrap_err();

    assert!(matches!(err, WeatherError::NotFound(ref name) if name == "Atlantis"));
    assert_eq!(err.to_string(), "Location \"Atlantis\" not found");
}

#[tokio::test]
async fn geocode_server_error_is_service_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = client_for(&server).geocode("Paris").await.unwrap_err();

    assert!(matches!(err, WeatherError::Service(_)));
    let msg = err.to_string();
    assert!(msg.contains("status 500"), "{msg}");
    assert!(msg.contains("upstream exploded"), "{msg}");
}

#[tokio::test]
async fn geocode_missing_country_and_timezone_get_defaults() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "name": "Null Island", "latitude": 0.0, "longitude": 0.0 }]
        })))
        .mount(&server)
        .await;

    let location = client_for(&server).geocode("Null Island").await.unwrap();

    assert_eq!(location.country, "");
    assert_eq!(location.timezone, "auto");
}

#[tokio::test]
async fn unreachable_host_is_service_error() {
    // Bind then release a port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = OpenMeteoClient::builder()
        .geocoding_url(format!("http://{addr}/v1/search"))
        .build()
        .unwrap();

    let err = client.geocode("Paris").await.unwrap_err();

    assert!(matches!(err, WeatherError::Service(_)));
    assert!(err.to_string().contains("Failed to send request to Open-Meteo geocoding API"));
}

#[tokio::test]
async fn reverse_geocode_without_results_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("latitude", "10.5"))
        .and(query_param("longitude", "-20.25"))
        .and(query_param("count", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let location = client_for(&server).reverse_geocode(10.5, -20.25).await.unwrap();

    assert_eq!(location.name, "Current Location");
    assert_eq!(location.country, "");
    assert_eq!(location.timezone, "auto");
    assert_eq!((location.latitude, location.longitude), (10.5, -20.25));
}

#[tokio::test]
async fn reverse_geocode_keeps_requested_coordinates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paris_result()))
        .mount(&server)
        .await;

    let location = client_for(&server).reverse_geocode(48.85, 2.35).await.unwrap();

    assert_eq!(location.name, "Paris");
    assert_eq!(location.timezone, "Europe/Paris");
    assert_eq!((location.latitude, location.longitude), (48.85, 2.35));
}

#[tokio::test]
async fn reverse_geocode_server_error_is_service_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client_for(&server).reverse_geocode(1.0, 2.0).await.unwrap_err();
    assert!(matches!(err, WeatherError::Service(_)));
}

#[tokio::test]
async fn forecast_for_paris_has_co_indexed_series() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "48.8566"))
        .and(query_param("longitude", "2.3522"))
        .and(query_param("timezone", "Europe/Paris"))
        .and(query_param("current_weather", "true"))
        .and(query_param(
            "hourly",
            "temperature_2m,relativehumidity_2m,precipitation_probability,precipitation,\
             weathercode,windspeed_10m,winddirection_10m",
        ))
        .and(query_param(
            "daily",
            "weathercode,temperature_2m_max,temperature_2m_min,precipitation_sum,\
             precipitation_probability_max",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(168, 7)))
        .expect(1)
        .mount(&server)
        .await;

    let request = ForecastRequest {
        timezone: Some("Europe/Paris".into()),
        ..ForecastRequest::new(48.8566, 2.3522)
    };
    let snapshot = client_for(&server).fetch_forecast(&request).await.unwrap();

    let hourly = &snapshot.hourly;
    assert_eq!(hourly.len(), 168);
    for len in [
        hourly.temperature().len(),
        hourly.relative_humidity().len(),
        hourly.precipitation_probability().len(),
        hourly.precipitation().len(),
        hourly.weather_code().len(),
        hourly.wind_speed().len(),
        hourly.wind_direction().len(),
    ] {
        assert_eq!(len, 168);
    }

    let daily = &snapshot.daily;
    assert_eq!(daily.len(), 7);
    for len in [
        daily.weather_code().len(),
        daily.temperature_max().len(),
        daily.temperature_min().len(),
        daily.precipitation_sum().len(),
        daily.precipitation_probability_max().len(),
    ] {
        assert_eq!(len, 7);
    }

    assert_eq!(snapshot.current.temperature, 22.3);
    assert_eq!(snapshot.current.wind_direction, 243.0);
    assert_eq!(snapshot.current.descriptor().label, "Clear sky");
    assert_eq!(snapshot.timezone_abbreviation, "CEST");
}

#[tokio::test]
async fn forecast_forwards_optional_day_counts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("timezone", "auto"))
        .and(query_param("past_days", "2"))
        .and(query_param("forecast_days", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(120, 5)))
        .expect(1)
        .mount(&server)
        .await;

    let request = ForecastRequest::new(1.0, 2.0).with_days(Some(2), Some(3));
    let snapshot = client_for(&server).fetch_forecast(&request).await.unwrap();

    assert_eq!(snapshot.daily.len(), 5);
}

#[tokio::test]
async fn forecast_bad_request_propagates_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": true,
            "reason": "Latitude must be in range of -90 to 90°. Given: 123.0."
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_forecast(&ForecastRequest::new(123.0, 0.0))
        .await
        .unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("Open-Meteo forecast request failed with status 400"), "{msg}");
    assert!(msg.contains("Latitude must be in range"), "{msg}");
}

#[tokio::test]
async fn forecast_with_ragged_series_is_rejected() {
    let server = MockServer::start().await;

    let mut body = forecast_body(24, 7);
    body["hourly"]["temperature_2m"] = json!([1.0, 2.0]);

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_forecast(&ForecastRequest::new(48.8566, 2.3522))
        .await
        .unwrap_err();

    let msg = err.to_string();
    assert!(matches!(err, WeatherError::Service(_)));
    assert!(msg.contains("Failed to parse Open-Meteo forecast JSON"), "{msg}");
    assert!(msg.contains("temperature_2m"), "{msg}");
}
