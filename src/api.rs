use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub relevance_score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<Source>,
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub sources: Vec<Source>,
    pub query_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummarizeRequest {
    pub query: String,
    pub language: String,
    pub query_id: String,
    pub source_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarizeResponse {
    pub answer: String,
    pub query_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Clone)]
pub struct SearchApiClient {
    client: Client,
    base_url: String,
}

impl SearchApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One-shot endpoint: answer and sources in a single response.
    /// Kept for backends without the split search/summarize routes.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat", self.base_url);

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Search failed: {}", response.status()));
        }

        Ok(response.json().await?)
    }

    /// Fast endpoint: sources only.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let url = format!("{}/search", self.base_url);

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Search failed: {}", response.status()));
        }

        Ok(response.json().await?)
    }

    /// Slow endpoint: AI answer generated over the sources of a prior search.
    pub async fn summarize(&self, request: &SummarizeRequest) -> Result<SummarizeResponse> {
        let url = format!("{}/summarize", self.base_url);

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Summarize failed: {}", response.status()));
        }

        Ok(response.json().await?)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Health check failed"));
        }

        Ok(response.json().await?)
    }
}
