//! Remote case id generator
//!
//! The generator service is authoritative for the id it returns. We only
//! check that a usable `project_id` came back.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::case_id::IntakeForm;
use super::error::{IdentityError, IdentityResult};

/// Wire body for the generate call. Missing optional fields go out as `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateIdRequest {
    pub last_name: String,
    pub first_name: String,
    pub poi_id: String,
    pub bsb: String,
    pub account: String,
    /// `YYYY-MM-DD`
    pub reference_date: String,
}

impl GenerateIdRequest {
    pub fn from_form(form: &IntakeForm, reference_date: NaiveDate) -> Self {
        let or_empty = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            last_name: form.last_name.clone(),
            first_name: or_empty(&form.first_name),
            poi_id: or_empty(&form.poi_id),
            bsb: or_empty(&form.bsb),
            account: or_empty(&form.account),
            reference_date: reference_date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Generator response. Only `project_id` is required downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectMetadata {
    pub project_id: Option<String>,
    pub year: Option<i32>,
    pub week: Option<u32>,
    pub sequence: Option<u32>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateIdRequest) -> IdentityResult<ProjectMetadata>;
}

/// `POST <url>` with a JSON body.
#[derive(Debug, Clone)]
pub struct HttpIdGenerator {
    url: String,
    client: reqwest::Client,
}

impl HttpIdGenerator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> IdentityResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                IdentityError::allocation(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl IdGenerator for HttpIdGenerator {
    async fn generate(&self, request: &GenerateIdRequest) -> IdentityResult<ProjectMetadata> {
        debug!(url = %self.url, reference_date = %request.reference_date, "Requesting case id");

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| IdentityError::allocation(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::allocation(format!(
                "generator returned HTTP {}",
                status.as_u16()
            )));
        }

        response
            .json::<ProjectMetadata>()
            .await
            .map_err(|e| IdentityError::allocation(format!("undecodable response: {}", e)))
    }
}
