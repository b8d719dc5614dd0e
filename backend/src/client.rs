use crate::error::ClientError;
use crate::models::WayQuality;

pub const WAY_QUALITIES_PATH: &str = "/openskatemap/api/way-qualities";

const SERVICE: &str = "OpenSkateMap";

/// HTTP client for the way qualities API.
#[derive(Debug, Clone)]
pub struct WayQualitiesClient {
    http: reqwest::Client,
    endpoint: String,
}

impl WayQualitiesClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), WAY_QUALITIES_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Latest stored rating for each id that has one.
    pub async fn fetch_way_qualities(
        &self,
        way_ids: &[i64],
    ) -> Result<Vec<WayQuality>, ClientError> {
        if way_ids.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .http
            .post(&self.endpoint)
            .json(way_ids)
            .send()
            .await
            .map_err(|e| ClientError::from_request(SERVICE, e))?;

        ClientError::check(SERVICE, response)?
            .json()
            .await
            .map_err(|e| ClientError::from_request(SERVICE, e))
    }

    pub async fn store_way_qualities(&self, entries: &[WayQuality]) -> Result<(), ClientError> {
        let response = self
            .http
            .put(&self.endpoint)
            .json(entries)
            .send()
            .await
            .map_err(|e| ClientError::from_request(SERVICE, e))?;

        ClientError::check(SERVICE, response)?;
        tracing::debug!("stored {} way qualities via {}", entries.len(), self.endpoint);
        Ok(())
    }
}
