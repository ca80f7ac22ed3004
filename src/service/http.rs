//! HTTP client for the agent service REST API.

use super::{
    parse_reply, AgentService, CreateAgentRequest, MemoryBlock, ModelInfo, Passage,
};
use crate::config::ServiceConfig;
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, instrument};

pub struct HttpAgentService {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAgentService {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(ApiError::ProviderNotConfigured(
                "service.base_url is empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ProviderError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, ApiError> {
        Self::new(
            config.base_url.clone(),
            config.resolved_api_key(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::ProviderError(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body.trim()
        )))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(builder).await?;
        response.json::<T>().await.map_err(|e| {
            ApiError::ProviderError(format!("Failed to decode service response: {}", e))
        })
    }
}

#[async_trait]
impl AgentService for HttpAgentService {
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn send_message(&self, agent_id: &str, text: &str) -> Result<String, ApiError> {
        let body = json!({
            "messages": [{"role": "user", "content": text}]
        });
        let payload: Value = self
            .send_json(
                self.request(Method::POST, &format!("/v1/agents/{}/messages", agent_id))
                    .json(&body),
            )
            .await?;
        let reply = parse_reply(&payload);
        debug!(agent_id, reply_chars = reply.chars().count(), "Agent replied");
        Ok(reply)
    }

    async fn create_agent(&self, request: &CreateAgentRequest) -> Result<String, ApiError> {
        let body = json!({
            "name": request.name,
            "model": request.model,
            "memory_blocks": [
                {"label": "persona", "value": request.persona},
                {"label": "human", "value": ""}
            ]
        });
        let created: Value = self
            .send_json(self.request(Method::POST, "/v1/agents").json(&body))
            .await?;
        created
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::ProviderError("Created agent has no id".to_string()))
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, &format!("/v1/agents/{}", agent_id)))
            .await?;
        Ok(())
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ApiError> {
        self.send_json(self.request(Method::GET, "/v1/models")).await
    }

    async fn list_blocks(&self, agent_id: &str) -> Result<Vec<MemoryBlock>, ApiError> {
        self.send_json(self.request(
            Method::GET,
            &format!("/v1/agents/{}/core-memory/blocks", agent_id),
        ))
        .await
    }

    async fn update_block(
        &self,
        agent_id: &str,
        label: &str,
        value: &str,
    ) -> Result<MemoryBlock, ApiError> {
        self.send_json(
            self.request(
                Method::PATCH,
                &format!("/v1/agents/{}/core-memory/blocks/{}", agent_id, label),
            )
            .json(&json!({ "value": value })),
        )
        .await
    }

    async fn insert_passage(
        &self,
        archive_id: &str,
        text: &str,
        metadata: &Map<String, Value>,
    ) -> Result<Passage, ApiError> {
        let value: Value = self
            .send_json(
                self.request(Method::POST, &format!("/v1/archives/{}/passages", archive_id))
                    .json(&json!({ "text": text, "metadata": metadata })),
            )
            .await?;
        // Some deployments answer with a one-element list.
        let passage = match value {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };
        Ok(serde_json::from_value(passage)?)
    }

    async fn list_passages(&self, archive_id: &str) -> Result<Vec<Passage>, ApiError> {
        self.send_json(self.request(
            Method::GET,
            &format!("/v1/archives/{}/passages", archive_id),
        ))
        .await
    }

    async fn delete_passage(&self, archive_id: &str, passage_id: &str) -> Result<(), ApiError> {
        self.send(self.request(
            Method::DELETE,
            &format!("/v1/archives/{}/passages/{}", archive_id, passage_id),
        ))
        .await?;
        Ok(())
    }
}
