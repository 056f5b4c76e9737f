//! HTTP client for the model router (§4.6).

use super::wire::{ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse};
use crate::config::ModelCatalog;
use crate::error::{AriaError, Result};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct ModelRouterClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    catalog: ModelCatalog,
    timeout: Duration,
}

impl ModelRouterClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, catalog: ModelCatalog) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AriaError::Internal {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            catalog,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Issue `POST /v1/chat/completions`. Refuses to issue the request at
    /// all — no HTTP call is made — when the model's catalog entry has
    /// `tool_calling=false` and the request carries tools (§4.6
    /// "Incompatible model guard").
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let entry = self.catalog.entry(&request.model)?;
        if request.wants_tools() && !entry.tool_calling {
            return Err(AriaError::IncompatibleModel {
                model: request.model.clone(),
            });
        }

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        self.decode_or_map_status(response).await
    }

    /// Issue `POST /v1/embeddings` for semantic memory writes and queries.
    pub async fn embeddings(&self, model: &str, input: Vec<String>) -> Result<EmbeddingsResponse> {
        self.catalog.entry(model)?;
        let request = EmbeddingsRequest {
            model: model.to_string(),
            input,
        };
        let response = self
            .http
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        self.decode_or_map_status(response).await
    }

    /// 429 -> `RateLimited`, 5xx -> `Retryable`, 4xx (except 429) ->
    /// non-retryable `ProviderError` (§4.6).
    async fn decode_or_map_status<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|e| AriaError::Internal {
                message: format!("failed to decode router response: {e}"),
            });
        }

        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 429 {
            return Err(AriaError::RateLimited {
                skill: "model_router".to_string(),
                retry_after: Duration::from_secs(5),
            });
        }
        if status.is_server_error() {
            return Err(AriaError::ProviderError {
                status: status.as_u16(),
                message: body,
            });
        }
        Err(AriaError::ProviderError {
            status: status.as_u16(),
            message: body,
        })
    }

    /// Estimated cost ceiling check before issuing a call — surfaced as
    /// `BudgetExceeded` by the cognition pipeline, not this client, since
    /// the client has no notion of the day's spend; this only validates
    /// the model exists and returns its per-token rates.
    pub fn cost_estimate(&self, model: &str, tokens_in: u64, tokens_out: u64) -> Result<f64> {
        self.catalog.estimate_cost(model, tokens_in, tokens_out)
    }
}

fn map_transport_error(err: reqwest::Error) -> AriaError {
    if err.is_timeout() {
        return AriaError::Timeout {
            duration: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
    }
    if err.is_connect() {
        return AriaError::ConnectionFailed {
            message: err.to_string(),
        };
    }
    AriaError::Retryable {
        message: err.to_string(),
    }
}
