//! Vector store client
//!
//! Semantic search over pre-embedded profile summaries. The HTTP client
//! speaks a Chroma-style collection query API; the trait keeps an embedded
//! backend swappable without touching the coordinator.

use crate::error::VectorStoreError;
use crate::types::{HitMetadata, VectorHit};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// The vector seam the coordinator depends on
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Ranked semantic search by natural-language string.
    async fn semantic_search(&self, query: &str, limit: usize)
        -> Result<Vec<VectorHit>, VectorStoreError>;

    /// Supplementary search keyed to a parameter name. Same mechanism as
    /// `semantic_search`; the distinction is the caller's intent.
    async fn search_by_parameter(
        &self,
        parameter: &str,
        limit: usize,
    ) -> Result<Vec<VectorHit>, VectorStoreError> {
        self.semantic_search(parameter, limit).await
    }

    /// Supplementary search keyed to a region name.
    async fn search_by_region(
        &self,
        region: &str,
        limit: usize,
    ) -> Result<Vec<VectorHit>, VectorStoreError> {
        self.semantic_search(region, limit).await
    }

    /// Number of documents in the collection; health requires > 0.
    async fn document_count(&self) -> Result<u64, VectorStoreError>;
}

/// HTTP client for a Chroma-style vector store
#[derive(Clone)]
pub struct HttpVectorStore {
    http: reqwest::Client,
    base_url: String,
    collection: String,
}

impl HttpVectorStore {
    pub fn new(
        base_url: &str,
        collection: &str,
        timeout: Duration,
    ) -> Result<Self, VectorStoreError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: collection.to_string(),
        })
    }
}

#[async_trait]
impl VectorStore for HttpVectorStore {
    async fn semantic_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<VectorHit>, VectorStoreError> {
        let body = serde_json::json!({
            "query_texts": [query],
            "n_results": limit,
            "include": ["documents", "metadatas", "distances"],
        });

        let resp = self
            .http
            .post(format!(
                "{}/api/v1/collections/{}/query",
                self.base_url, self.collection
            ))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(VectorStoreError::ServerStatus(resp.status()));
        }

        let data: Value = resp.json().await?;
        parse_query_response(&data)
    }

    async fn document_count(&self) -> Result<u64, VectorStoreError> {
        let resp = self
            .http
            .get(format!(
                "{}/api/v1/collections/{}/count",
                self.base_url, self.collection
            ))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(VectorStoreError::ServerStatus(resp.status()));
        }

        let data: Value = resp.json().await?;
        data.as_u64()
            .ok_or_else(|| VectorStoreError::Malformed("count is not a number".to_string()))
    }
}

/// Parse the nested-list query response (one inner list per query text).
fn parse_query_response(data: &Value) -> Result<Vec<VectorHit>, VectorStoreError> {
    let first_list = |key: &str| -> Option<&Vec<Value>> {
        data.get(key)?.as_array()?.first()?.as_array()
    };

    let ids = first_list("ids")
        .ok_or_else(|| VectorStoreError::Malformed("missing ids".to_string()))?;
    let documents = first_list("documents");
    let metadatas = first_list("metadatas");
    let distances = first_list("distances");

    let mut hits = Vec::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        let id = id
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| id.to_string());
        let document = documents
            .and_then(|d| d.get(i))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let metadata = metadatas
            .and_then(|m| m.get(i))
            .map(parse_metadata)
            .unwrap_or_default();
        let distance = distances
            .and_then(|d| d.get(i))
            .and_then(Value::as_f64)
            .unwrap_or(f64::MAX);
        hits.push(VectorHit {
            id,
            document,
            metadata,
            distance,
        });
    }
    Ok(hits)
}

/// Metadata values arrive as strings or numbers depending on the ingester
/// version; accept both.
fn parse_metadata(value: &Value) -> HitMetadata {
    let text = |key: &str| -> Option<String> {
        match value.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    };
    let number = |key: &str| -> Option<f64> {
        match value.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    };

    HitMetadata {
        float_id: text("float_id"),
        profile_id: text("profile_id"),
        latitude: number("latitude"),
        longitude: number("longitude"),
        date: text("date"),
        geographic_note: None,
    }
}
