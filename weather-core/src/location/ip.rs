//! Approximate position from the public IP address.
//! Uses ip-api.com - free, no API key required.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::LocationFailure,
    model::{Coordinates, LocationRequest},
};

use super::LocationProvider;

const IP_API_URL: &str = "http://ip-api.com/json/";

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IpLocationProvider {
    endpoint: String,
    http: Client,
}

impl IpLocationProvider {
    pub fn new(user_agent: &str) -> Result<Self, LocationFailure> {
        Self::with_endpoint(IP_API_URL, user_agent)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        user_agent: &str,
    ) -> Result<Self, LocationFailure> {
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| LocationFailure::Other(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { endpoint: endpoint.into(), http })
    }
}

#[async_trait]
impl LocationProvider for IpLocationProvider {
    async fn locate(
        &self,
        request: &LocationRequest,
    ) -> Result<Option<Coordinates>, LocationFailure> {
        tracing::debug!(accuracy = ?request.accuracy, "resolving location from IP address");

        let response = self
            .http
            .get(&self.endpoint)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| LocationFailure::Other(format!("IP lookup request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(LocationFailure::Other(format!(
                "IP lookup returned status {}",
                response.status()
            )));
        }

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| LocationFailure::Other(format!("IP lookup parse error: {e}")))?;

        if body.status != "success" {
            return Err(LocationFailure::Other(
                body.message.unwrap_or_else(|| "IP lookup failed".to_string()),
            ));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => {
                tracing::info!(city = ?body.city, "located by IP address");
                Ok(Some(Coordinates::new(lat, lon)))
            }
            _ => Ok(None),
        }
    }
}
