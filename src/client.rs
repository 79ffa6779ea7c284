//! Prediction API client.
//!
//! The dashboard talks to two backend endpoints: `POST /predict` (file upload,
//! returns a fresh analysis) and `GET /analysis/{id}` (persisted record).

use crate::config::Config;
use crate::errors::{ScopeError, ScopeResult};
use crate::models::PersistedAnalysis;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Backend operations the presenter and upload flow depend on.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Fetch a persisted analysis by identifier.
    async fn fetch_analysis(&self, id: &str) -> ScopeResult<PersistedAnalysis>;

    /// Submit binary content for analysis and return the raw JSON result.
    async fn predict(&self, filename: &str, data: Vec<u8>) -> ScopeResult<Value>;
}

/// HTTP implementation backed by `reqwest`.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> ScopeResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(response: reqwest::Response) -> ScopeResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ScopeError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn fetch_analysis(&self, id: &str) -> ScopeResult<PersistedAnalysis> {
        let url = format!("{}/analysis/{}", self.base_url, id);
        log::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ScopeError::NotFound(id.to_string()));
        }

        let response = Self::check(response).await?;
        Ok(response.json::<PersistedAnalysis>().await?)
    }

    async fn predict(&self, filename: &str, data: Vec<u8>) -> ScopeResult<Value> {
        let url = format!("{}/predict", self.base_url);
        log::debug!("POST {} ({} bytes)", url, data.len());

        let part = Part::bytes(data).file_name(filename.to_string());
        let form = Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json::<Value>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = Config {
            api_url: "http://analysis.local:5000/".to_string(),
            ..Config::default()
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(backend.base_url(), "http://analysis.local:5000");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let config = Config {
            api_url: "http://127.0.0.1:1".to_string(),
            request_timeout: std::time::Duration::from_secs(2),
            ..Config::default()
        };
        let backend = HttpBackend::new(&config).unwrap();
        let err = backend.fetch_analysis("abc").await.unwrap_err();
        assert!(err.is_transport());
    }
}
