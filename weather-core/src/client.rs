use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::{
    error::WeatherFailure,
    model::{Coordinates, NO_DESCRIPTION, WeatherSnapshot},
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = concat!("geoweather/", env!("CARGO_PKG_VERSION"));

/// Client for the OpenWeather "current weather" endpoint.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug, Clone)]
pub struct WeatherClientBuilder {
    api_key: String,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

impl WeatherClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Upper bound on the whole request, connect through body read.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<WeatherClient, WeatherFailure> {
        let http = Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()?;

        Ok(WeatherClient { api_key: self.api_key, base_url: self.base_url, http })
    }
}

impl WeatherClient {
    pub fn builder(api_key: impl Into<String>) -> WeatherClientBuilder {
        WeatherClientBuilder {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// One GET for the current conditions at `coords`. No retry.
    pub async fn fetch(&self, coords: Coordinates) -> Result<WeatherSnapshot, WeatherFailure> {
        tracing::debug!(
            lat = coords.latitude,
            lon = coords.longitude,
            url = %self.base_url,
            "requesting current weather"
        );

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        // a connection dropped mid-body surfaces here as a network failure
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherFailure::Network(format!(
                "request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        tracing::trace!(body = %truncate_body(&body), "weather response received");

        let snapshot = parse_snapshot(&body)?;
        tracing::debug!(location = %snapshot.location_name, "parsed weather snapshot");

        Ok(snapshot)
    }
}

/// Parse a response body into a snapshot. Keys are matched case-insensitively.
pub fn parse_snapshot(body: &str) -> Result<WeatherSnapshot, WeatherFailure> {
    if body.trim().is_empty() {
        return Err(WeatherFailure::EmptyBody);
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| WeatherFailure::Parse(e.to_string()))?;
    let parsed: OwCurrentResponse = serde_json::from_value(lowercase_keys(value))
        .map_err(|e| WeatherFailure::Parse(e.to_string()))?;

    let description = parsed
        .weather
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|w| w.description)
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    Ok(WeatherSnapshot {
        location_name: parsed.name.unwrap_or_default(),
        country: parsed.sys.and_then(|s| s.country),
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        humidity_pct: parsed.main.humidity,
        description,
        wind_speed_ms: parsed.wind.and_then(|w| w.speed).unwrap_or(0.0),
    })
}

fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_lowercase(), lowercase_keys(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: i32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: Option<String>,
    main: OwMain,
    weather: Option<Vec<OwWeather>>,
    wind: Option<OwWind>,
    sys: Option<OwSys>,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SF_BODY: &str = r#"{"name":"San Francisco","main":{"temp":18.3,"feels_like":17.9,"humidity":72},"weather":[{"description":"overcast clouds"}],"wind":{"speed":3.1},"sys":{"country":"US"}}"#;

    fn client_for(server: &MockServer) -> WeatherClient {
        WeatherClient::builder("test_key")
            .base_url(format!("{}/data/2.5/weather", server.uri()))
            .build()
            .unwrap()
    }

    #[test]
    fn parses_full_response() {
        let snap = parse_snapshot(SF_BODY).unwrap();
        assert_eq!(snap.location_name, "San Francisco");
        assert_eq!(snap.country.as_deref(), Some("US"));
        assert_eq!(snap.temperature_c, 18.3);
        assert_eq!(snap.feels_like_c, 17.9);
        assert_eq!(snap.humidity_pct, 72);
        assert_eq!(snap.description, "overcast clouds");
        assert_eq!(snap.wind_speed_ms, 3.1);
    }

    #[test]
    fn keys_match_case_insensitively() {
        let body = r#"{"Name":"Oslo","MAIN":{"Temp":-3.5,"Feels_Like":-8.0,"Humidity":80},
            "Sys":{"Country":"NO"}}"#;
        let snap = parse_snapshot(body).unwrap();
        assert_eq!(snap.location_name, "Oslo");
        assert_eq!(snap.temperature_c, -3.5);
        assert_eq!(snap.country.as_deref(), Some("NO"));
    }

    #[test]
    fn missing_optionals_take_defaults() {
        let body =
            r#"{"main":{"temp":1.0,"feels_like":0.5,"humidity":50},"cod":200,"extra":{"x":1}}"#;
        let snap = parse_snapshot(body).unwrap();
        assert_eq!(snap.location_name, "");
        assert_eq!(snap.country, None);
        assert_eq!(snap.description, NO_DESCRIPTION);
        assert_eq!(snap.wind_speed_ms, 0.0);
    }

    #[test]
    fn empty_weather_list_uses_placeholder() {
        let body = r#"{"name":"X","main":{"temp":1.0,"feels_like":0.5,"humidity":50},
            "weather":[],"wind":null}"#;
        let snap = parse_snapshot(body).unwrap();
        assert_eq!(snap.description, NO_DESCRIPTION);
        assert_eq!(snap.wind_speed_ms, 0.0);
    }

    #[test]
    fn null_or_missing_description_uses_placeholder() {
        let body = r#"{"name":"X","main":{"temp":1.0,"feels_like":0.5,"humidity":50},
            "weather":[{"description":null}]}"#;
        assert_eq!(parse_snapshot(body).unwrap().description, NO_DESCRIPTION);

        let body = r#"{"name":"X","main":{"temp":1.0,"feels_like":0.5,"humidity":50},
            "weather":[{"main":"Clouds"}]}"#;
        assert_eq!(parse_snapshot(body).unwrap().description, NO_DESCRIPTION);
    }

    #[test]
    fn empty_or_whitespace_body_is_not_a_parse_error() {
        assert_eq!(parse_snapshot(""), Err(WeatherFailure::EmptyBody));
        assert_eq!(parse_snapshot("  \n\t "), Err(WeatherFailure::EmptyBody));
    }

    #[test]
    fn invalid_json_or_shape_is_parse_error() {
        assert!(matches!(parse_snapshot("<html>"), Err(WeatherFailure::Parse(_))));
        assert!(matches!(parse_snapshot(r#"{"name":"X"}"#), Err(WeatherFailure::Parse(_))));
        assert!(matches!(parse_snapshot("[1,2,3]"), Err(WeatherFailure::Parse(_))));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
    }

    #[test]
    fn default_timeout_is_thirty_seconds() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn fetch_sends_expected_query_and_user_agent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "37.77"))
            .and(query_param("lon", "-122.42"))
            .and(query_param("appid", "test_key"))
            .and(query_param("units", "metric"))
            .and(header("User-Agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(SF_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let snap = client_for(&server).fetch(Coordinates::new(37.77, -122.42)).await.unwrap();
        assert_eq!(snap.location_name, "San Francisco");
    }

    #[tokio::test]
    async fn fetch_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("   "))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch(Coordinates::new(1.0, 2.0)).await.unwrap_err();
        assert_eq!(err, WeatherFailure::EmptyBody);
    }

    #[tokio::test]
    async fn fetch_error_status_is_network_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"{"cod":401,"message":"Invalid API key"}"#),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).fetch(Coordinates::new(1.0, 2.0)).await.unwrap_err();
        match err {
            WeatherFailure::Network(detail) => {
                assert!(detail.contains("401"));
                assert!(detail.contains("Invalid API key"));
            }
            other => panic!("expected network failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_refused_connection_is_network_failure() {
        let client = WeatherClient::builder("k")
            .base_url("http://127.0.0.1:1/data/2.5/weather")
            .build()
            .unwrap();

        let err = client.fetch(Coordinates::new(1.0, 2.0)).await.unwrap_err();
        assert!(matches!(err, WeatherFailure::Network(_)), "got {err:?}");
        assert_eq!(err.user_message(), "Network error. Check internet connection.");
    }

    #[tokio::test]
    async fn fetch_connection_dropped_mid_body_is_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                      Content-Length: 500\r\n\r\n{\"name\":\"San",
                )
                .await
                .unwrap();
            // socket dropped here, well short of Content-Length
        });

        let client = WeatherClient::builder("k")
            .base_url(format!("http://{addr}/data/2.5/weather"))
            .build()
            .unwrap();

        let err = client.fetch(Coordinates::new(1.0, 2.0)).await.unwrap_err();
        assert!(matches!(err, WeatherFailure::Network(_)), "got {err:?}");
        assert_eq!(err.user_message(), "Network error. Check internet connection.");
    }

    #[tokio::test]
    async fn fetch_times_out_at_configured_bound() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(SF_BODY)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = WeatherClient::builder("k")
            .base_url(server.uri())
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();

        let started = Instant::now();
        let err = client.fetch(Coordinates::new(1.0, 2.0)).await.unwrap_err();
        assert_eq!(err, WeatherFailure::Timeout);
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
