use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::config_service::{self, Config};
use crate::models::{AskRequest, AskResponse};

#[derive(Debug, Error)]
pub enum AskError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Backend error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("Invalid backend URL '{0}'")]
    InvalidBaseUrl(String),
}

/// Anything that can answer a question. The chat session talks to this seam.
#[async_trait]
pub trait AskBackend: Send + Sync {
    async fn ask(&self, question: &str) -> Result<AskResponse, AskError>;
}

/// HTTP client for the question-answering backend
pub struct AskClient {
    client: Client,
    endpoint: String,
}

impl AskClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AskError> {
        let base = Url::parse(base_url).map_err(|_| AskError::InvalidBaseUrl(base_url.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(AskError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/ask", base_url.trim_end_matches('/')),
        })
    }

    /// Create a client from the app's configuration
    pub fn from_config(config: &Config) -> Result<Self, AskError> {
        Self::new(
            &config_service::effective_backend_url(config),
            config_service::request_timeout(config),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AskBackend for AskClient {
    async fn ask(&self, question: &str) -> Result<AskResponse, AskError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AskRequest { question })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AskError::Status { status, body });
        }

        Ok(response.json::<AskResponse>().await?)
    }
}
