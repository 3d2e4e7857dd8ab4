// HTTP series provider - fetches the published feeds from a feed server
use async_trait::async_trait;
use reqwest::StatusCode;

use crate::application::provider::{FetchError, SeriesProvider};
use crate::domain::commit::CommitId;
use crate::domain::series::{CommitRecord, CommitSummary};

#[derive(Debug, Clone)]
pub struct HttpSeriesProvider {
    base_url: String,
}

impl HttpSeriesProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn summary_url(&self) -> String {
        format!("{}/summary.json", self.base_url)
    }

    fn record_url(&self, key: &CommitId) -> String {
        format!(
            "{}/{}.json",
            self.base_url,
            urlencoding::encode(key.as_str())
        )
    }

    async fn get_json(&self, url: &str) -> Result<bytes::Bytes, FetchError> {
        let client = reqwest::Client::new();
        let response = client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|error| FetchError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        response
            .bytes()
            .await
            .map_err(|error| FetchError::Transport(error.to_string()))
    }
}

#[async_trait]
impl SeriesProvider for HttpSeriesProvider {
    async fn fetch_summary(&self) -> Result<Vec<CommitSummary>, FetchError> {
        let url = self.summary_url();
        let bytes = self.get_json(&url).await?;
        serde_json::from_slice(&bytes).map_err(|error| FetchError::Payload(error.to_string()))
    }

    async fn fetch_series(&self, key: &CommitId) -> Result<CommitRecord, FetchError> {
        let url = self.record_url(key);
        let bytes = match self.get_json(&url).await {
            Err(FetchError::Upstream { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                return Err(FetchError::NotFound(key.clone()));
            }
            other => other?,
        };
        let record: CommitRecord = serde_json::from_slice(&bytes)
            .map_err(|error| FetchError::Payload(error.to_string()))?;
        if record.summary.hash != *key {
            return Err(FetchError::Payload(format!(
                "record for {} carries hash {}",
                key, record.summary.hash
            )));
        }
        Ok(record)
    }
}
