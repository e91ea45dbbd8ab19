use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use nearcity_geo::Coordinates;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::nearcity::config::{GeocoderConfig, API_KEY_ENV};

/// Resolves city names to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Looks up `name`. Returns `None` if the city could not be resolved.
    async fn locate(&self, name: &str) -> Result<Option<Coordinates>>;
}

/// A [Geocoder] backed by the api-ninjas geocoding api.
pub struct HttpGeocoder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Deserialize)]
struct GeocodingResult {
    latitude: f64,
    longitude: f64,
}

impl HttpGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            anyhow!("no geocoder api key configured, set geocoder.apiKey or {}", API_KEY_ENV)
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("build http client")?;

        let endpoint = format!("{}/v1/geocoding", config.url.trim_end_matches('/'));

        Ok(Self { client, endpoint, api_key })
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    #[instrument(skip(self))]
    async fn locate(&self, name: &str) -> Result<Option<Coordinates>> {
        let resp = self.client
            .get(&self.endpoint)
            .query(&[("city", name)])
            .header("X-Api-Key", self.api_key.as_str())
            .send()
            .await
            .with_context(|| format!("request coordinates of {:?}", name))?;

        if !resp.status().is_success() {
            debug!("Geocoding api responded with status {}", resp.status());
            return Ok(None);
        }

        let results: Vec<GeocodingResult> = resp
            .json()
            .await
            .with_context(|| format!("decode coordinates of {:?}", name))?;

        let Some(first) = results.into_iter().next() else {
            debug!("Geocoding api found no match");
            return Ok(None);
        };

        Ok(Some(Coordinates::new(first.latitude, first.longitude)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::num::NonZeroU64;

    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    async fn handle_geocoding(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
        if headers.get("X-Api-Key").and_then(|v| v.to_str().ok()) != Some("test-key") {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": "Invalid API Key."}))).into_response();
        }

        match query.get("city").map(String::as_str) {
            Some("Berlin") => Json(json!([
                {"name": "Berlin", "latitude": 52.5170365, "longitude": 13.3888599, "country": "DE"},
                {"name": "Berlin", "latitude": 44.4686, "longitude": -71.1851, "country": "US", "state": "New Hampshire"},
            ])).into_response(),

            Some("São Paulo & Co") => Json(json!([
                {"name": "São Paulo", "latitude": -23.5506507, "longitude": -46.6333824},
            ])).into_response(),

            Some("Broken") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            Some("Garbage") => "not json".into_response(),

            _ => Json(json!([])).into_response(),
        }
    }

    /// Serves a fake geocoding api on a random local port.
    async fn start_server() -> String {
        let app = Router::new().route("/v1/geocoding", get(handle_geocoding));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn config(url: String, api_key: &str) -> GeocoderConfig {
        GeocoderConfig {
            url,
            api_key: Some(api_key.to_owned()),
            timeout_in_seconds: NonZeroU64::new(5).unwrap(),
        }
    }

    #[tokio::test]
    async fn locate_takes_first_result() {
        let geocoder = HttpGeocoder::new(&config(start_server().await, "test-key")).unwrap();

        let coordinates = geocoder.locate("Berlin").await.unwrap();
        assert_eq!(coordinates, Some(Coordinates::new(52.5170365, 13.3888599)));
    }

    #[tokio::test]
    async fn locate_encodes_city_name() {
        let geocoder = HttpGeocoder::new(&config(start_server().await, "test-key")).unwrap();

        let coordinates = geocoder.locate("São Paulo & Co").await.unwrap();
        assert_eq!(coordinates, Some(Coordinates::new(-23.5506507, -46.6333824)));
    }

    #[tokio::test]
    async fn locate_unknown_city_is_none() {
        let geocoder = HttpGeocoder::new(&config(start_server().await, "test-key")).unwrap();
        assert_eq!(geocoder.locate("Atlantis").await.unwrap(), None);
    }

    #[tokio::test]
    async fn locate_error_status_is_none() {
        let geocoder = HttpGeocoder::new(&config(start_server().await, "test-key")).unwrap();
        assert_eq!(geocoder.locate("Broken").await.unwrap(), None);

        let geocoder = HttpGeocoder::new(&config(start_server().await, "wrong-key")).unwrap();
        assert_eq!(geocoder.locate("Berlin").await.unwrap(), None);
    }

    #[tokio::test]
    async fn locate_undecodable_body_fails() {
        let geocoder = HttpGeocoder::new(&config(start_server().await, "test-key")).unwrap();
        assert!(geocoder.locate("Garbage").await.is_err());
    }

    #[tokio::test]
    async fn locate_unreachable_service_fails() {
        // bind and drop a listener to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let geocoder = HttpGeocoder::new(&config(format!("http://{addr}"), "test-key")).unwrap();
        assert!(geocoder.locate("Berlin").await.is_err());
    }

    #[test]
    fn new_requires_api_key() {
        let mut config = config("http://localhost".to_owned(), "unused");
        config.api_key = None;

        assert!(HttpGeocoder::new(&config).is_err());
    }
}
