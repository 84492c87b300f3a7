//! Prediction service contract and concrete implementations.
//!
//! One endpoint per health domain, synchronous request/response:
//!   POST {base_url}/predict/{domain}
//! Request body is a flat JSON map of field name → number or short code
//! string. The response carries at minimum a `risk_score` in [0, 100] and
//! may add a `risk_level` label and a `model_source` marker (absence of the
//! marker means a deterministic answer was served upstream).
//!
//! The engine issues at most one call per domain per aggregation run; retry
//! is a caller-level concern.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use earlyguard_common::config::PredictionConfig;
use earlyguard_common::Domain;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("API error [{status}]: {message}")]
    Api { status: u16, message: String },
    #[error("no prediction available for domain {0}")]
    NotConfigured(Domain),
}

// ── Request / Response ────────────────────────────────────────────────────────

/// One outbound field value: numeric, or a short categorical code string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Number(f64),
    Code(String),
}

impl PayloadValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PayloadValue::Number(v) => Some(*v),
            PayloadValue::Code(_) => None,
        }
    }

    pub fn code(v: impl Into<String>) -> Self {
        PayloadValue::Code(v.into())
    }
}

/// Flat field map sent to a domain's prediction endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionRequest {
    pub fields: BTreeMap<String, PayloadValue>,
}

impl PredictionRequest {
    pub fn get(&self, field: &str) -> Option<&PayloadValue> {
        self.fields.get(field)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionResponse {
    /// Risk score in [0, 100].
    pub risk_score: f64,
    #[serde(default)]
    pub risk_level: Option<String>,
    /// Present iff a live model produced the answer.
    #[serde(default)]
    pub model_source: Option<String>,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn predict(
        &self,
        domain: Domain,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, ServiceError>;
}

// ── Helper: error-aware response decoding ─────────────────────────────────────

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, ServiceError> {
    let status = resp.status().as_u16();
    let body: serde_json::Value = resp.json().await?;
    if status >= 400 {
        let msg = body["error"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .unwrap_or("unknown API error")
            .to_string();
        return Err(ServiceError::Api { status, message: msg });
    }
    Ok(body)
}

// ── HTTP implementation ───────────────────────────────────────────────────────

/// Reqwest-backed client for the real prediction services.
pub struct HttpPredictionService {
    pub base_url: String,
    client: reqwest::Client,
}

/// Service status as reported by the health endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    /// Per-domain model availability.
    #[serde(default)]
    pub models: BTreeMap<String, bool>,
}

impl HttpPredictionService {
    pub fn new(config: &PredictionConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// GET {base_url}/health — lets the presentation layer show a live
    /// status indicator before the user commits to an assessment.
    pub async fn health_check(&self) -> Result<ServiceHealth, ServiceError> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let json = check_response_status(resp).await?;
        Ok(serde_json::from_value(json)?)
    }
}

#[async_trait]
impl PredictionService for HttpPredictionService {
    async fn predict(
        &self,
        domain: Domain,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, ServiceError> {
        let url = format!("{}/predict/{}", self.base_url, domain);
        let resp = self.client.post(&url).json(request).send().await?;
        let json = check_response_status(resp).await?;
        Ok(serde_json::from_value(json)?)
    }
}

// ── Mock Implementation for Testing ───────────────────────────────────────────

/// Mock service with scripted per-domain behaviour for unit tests.
#[derive(Default)]
pub struct MockPredictionService {
    scores: BTreeMap<Domain, f64>,
    live: std::collections::BTreeSet<Domain>,
    failing: std::collections::BTreeSet<Domain>,
}

impl MockPredictionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `domain` with a score but no `model_source` marker.
    pub fn with_score(mut self, domain: Domain, score: f64) -> Self {
        self.scores.insert(domain, score);
        self
    }

    /// Respond to `domain` with a score carrying a `model_source` marker.
    pub fn with_live_score(mut self, domain: Domain, score: f64) -> Self {
        self.scores.insert(domain, score);
        self.live.insert(domain);
        self
    }

    /// Fail every call for `domain` with a 503.
    pub fn with_failure(mut self, domain: Domain) -> Self {
        self.failing.insert(domain);
        self
    }
}

#[async_trait]
impl PredictionService for MockPredictionService {
    async fn predict(
        &self,
        domain: Domain,
        _request: &PredictionRequest,
    ) -> Result<PredictionResponse, ServiceError> {
        if self.failing.contains(&domain) {
            return Err(ServiceError::Api {
                status: 503,
                message: format!("{domain} model not initialized"),
            });
        }
        match self.scores.get(&domain) {
            Some(&score) => Ok(PredictionResponse {
                risk_score: score,
                risk_level: None,
                model_source: self
                    .live
                    .contains(&domain)
                    .then(|| "mock-ml".to_string()),
            }),
            None => Err(ServiceError::NotConfigured(domain)),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
