//! HTTP EHR Gateway
//!
//! Client for a remote scheduling API exposing the same routes the server's
//! `/api` mock backend serves.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::EhrGateway;
use crate::error::{Result, SchedulingError};
use crate::model::{
    AppointmentCreated, Availability, Clinician, CreateAppointmentRequest, Location, Patient,
    PatientCreated,
};

/// Remote EHR configuration
#[derive(Clone, Debug)]
pub struct HttpEhrConfig {
    /// API root, e.g. `http://localhost:3000/api`
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpEhrConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".into(),
            timeout_secs: 30,
        }
    }
}

impl HttpEhrConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// `None` unless `EHR_BASE_URL` is set
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("EHR_BASE_URL").ok()?;
        let timeout_secs = std::env::var("EHR_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(30);

        Some(Self {
            base_url,
            timeout_secs,
        })
    }
}

/// EHR gateway over HTTP
pub struct HttpEhrGateway {
    client: Client,
    base_url: Url,
}

impl HttpEhrGateway {
    pub fn new(config: HttpEhrConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            SchedulingError::InvalidRequest(format!("EHR base URL {}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SchedulingError::InvalidRequest(format!(
                "EHR base URL {} cannot carry a path",
                config.base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    /// Base URL with `segments` appended; each segment is percent-encoded on
    /// its own, so ids can never introduce extra path components
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(SchedulingError::InvalidRequest(format!(
                "invalid path segment {bad:?}"
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SchedulingError::InvalidRequest("EHR base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(url = %url, "EHR GET");
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T> {
        tracing::debug!(url = %url, "EHR POST");
        let response = self.client.post(url).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %body, "EHR API request failed");
            return Err(SchedulingError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl EhrGateway for HttpEhrGateway {
    async fn list_locations(&self) -> Result<Vec<Location>> {
        self.get_json(self.endpoint(&["locations"])?).await
    }

    async fn list_clinicians(&self) -> Result<Vec<Clinician>> {
        self.get_json(self.endpoint(&["clinicians"])?).await
    }

    async fn list_clinicians_by_location(&self, location_id: &str) -> Result<Vec<Clinician>> {
        self.get_json(self.endpoint(&["clinicians", "location", location_id])?)
            .await
    }

    async fn get_availability(&self, clinician_id: &str, date: &str) -> Result<Availability> {
        let mut url = self.endpoint(&["availability", clinician_id, date])?;
        url.query_pairs_mut().append_pair("includeUnavailable", "true");
        self.get_json(url).await
    }

    async fn create_patient(&self, patient: Patient) -> Result<PatientCreated> {
        self.post_json(self.endpoint(&["patients"])?, &patient).await
    }

    async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<AppointmentCreated> {
        self.post_json(self.endpoint(&["appointments"])?, &request)
            .await
    }

    fn name(&self) -> &str {
        "HttpEhrGateway"
    }
}
