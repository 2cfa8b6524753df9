//! Client for the external retrieval API that owns document ingestion,
//! embeddings and vector search.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeHit {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub source_file: Option<String>,
    #[serde(default)]
    pub page_number: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeStats {
    pub total_documents: i64,
    pub collection_name: String,
    pub embedding_model: String,
}

#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<KnowledgeHit>>;
    async fn stats(&self) -> anyhow::Result<KnowledgeStats>;
}

pub struct RagApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl RagApiClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<KnowledgeHit>,
}

#[async_trait]
impl KnowledgeBase for RagApiClient {
    async fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<KnowledgeHit>> {
        let resp: SearchResponse = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&json!({ "query": query, "top_k": top_k }))
            .send()
            .await
            .context("failed to call retrieval API")?
            .error_for_status()
            .context("retrieval API returned error")?
            .json()
            .await
            .context("failed to parse retrieval response")?;
        Ok(resp.results)
    }

    async fn stats(&self) -> anyhow::Result<KnowledgeStats> {
        self.client
            .get(format!("{}/stats", self.base_url))
            .send()
            .await
            .context("failed to call retrieval API")?
            .error_for_status()
            .context("retrieval API returned error")?
            .json()
            .await
            .context("failed to parse retrieval stats")
    }
}

/// Renders hits as a context block for the LLM prompt.
pub fn format_context(hits: &[KnowledgeHit]) -> String {
    hits.iter()
        .map(|hit| {
            let source = hit.source_file.as_deref().unwrap_or("Unknown");
            let page = match &hit.page_number {
                Some(serde_json::Value::Null) | None => String::new(),
                Some(serde_json::Value::String(s)) if s.is_empty() => String::new(),
                Some(serde_json::Value::String(s)) => format!(" (Page {s})"),
                Some(other) => format!(" (Page {other})"),
            };
            format!("[Source: {source}{page}]\n{}", hit.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_context() {
        let hits = vec![
            KnowledgeHit {
                content: "Check-in is at 2pm.".to_string(),
                source_file: Some("policies.pdf".to_string()),
                page_number: Some(json!(3)),
            },
            KnowledgeHit {
                content: "Parking is free.".to_string(),
                source_file: None,
                page_number: None,
            },
        ];
        let ctx = format_context(&hits);
        assert_eq!(
            ctx,
            "[Source: policies.pdf (Page 3)]\nCheck-in is at 2pm.\n\n---\n\n[Source: Unknown]\nParking is free."
        );
    }

    #[test]
    fn test_format_context_empty() {
        assert_eq!(format_context(&[]), "");
    }
}
