//! Client for the external roster-generation service.
//!
//! The optimizer is an opaque sibling capability: this client forwards a
//! constraints payload and hands back whatever summary the service
//! returns, without validating the roster itself.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use tracing::{debug, info};
use uuid::Uuid;

/// Generation request forwarded to the optimizer service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week: Option<String>,
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default)]
    pub constraints: Value,
}

/// One submitted generation job, tracked in memory for later retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationJob {
    pub id: String,
    pub requested_at: DateTime<Utc>,
    pub request: GenerateRequest,
    pub summary: Value,
}

impl GenerationJob {
    pub fn new(request: GenerateRequest, summary: Value) -> Self {
        Self {
            id: format!("job_{}", Uuid::new_v4().simple()),
            requested_at: Utc::now(),
            request,
            summary,
        }
    }
}

/// HTTP client for the roster optimizer endpoint.
#[derive(Clone)]
pub struct RosterServiceClient {
    client: Client,
    endpoint: String,
}

impl RosterServiceClient {
    /// Create a client, reading the endpoint from ROSTER_SERVICE_URL.
    pub fn from_env() -> Result<Self> {
        let endpoint = env::var("ROSTER_SERVICE_URL")
            .context("ROSTER_SERVICE_URL environment variable not set")?;

        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }

    /// Submit a generation request and return the service's JSON summary.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<Value> {
        debug!("submitting roster generation request to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .context("Failed to reach roster generation service")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Roster service error ({}): {}", status, text));
        }

        let summary: Value = response
            .json()
            .await
            .context("Failed to parse roster service response")?;

        info!("roster generation request accepted by service");
        Ok(summary)
    }
}
