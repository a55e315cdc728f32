//! Pinecone-backed vector store over the REST API.
//!
//! The control plane is used once at startup to find (or create) the index
//! and learn its data-plane host; everything else talks to that host.

use super::{IndexStats, SearchResult, VectorRecord, VectorStore};
use crate::chunking::ChunkMetadata;
use crate::config::VectorStoreSettings;
use crate::error::{PaddockError, Result};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

const API_VERSION: &str = "2024-07";
const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Metadata key holding the chunk text.
const TEXT_KEY: &str = "text";

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: String,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    namespaces: HashMap<String, NamespaceStats>,
    dimension: Option<u32>,
    index_fullness: Option<f64>,
    #[serde(default)]
    total_vector_count: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceStats {
    #[serde(default)]
    vector_count: u64,
}

/// Vector store backed by a serverless Pinecone index.
pub struct PineconeVectorStore {
    client: reqwest::Client,
    api_key: String,
    host: String,
    namespace: String,
    batch_size: usize,
}

impl PineconeVectorStore {
    /// Resolve the configured index, creating it when missing, and wait until it is ready.
    pub async fn connect(settings: &VectorStoreSettings, dimension: u32) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PaddockError::Config("PINECONE_API_KEY is not set".to_string()))?;

        let client = reqwest::Client::new();
        let control = settings.control_plane_url.trim_end_matches('/');
        let index_url = format!("{}/indexes/{}", control, settings.index_name);

        let response = client
            .get(&index_url)
            .header("Api-Key", &api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!(
                "Creating index {} (dimension {}, {} {})",
                settings.index_name,
                dimension,
                settings.cloud,
                settings.environment
            );
            let body = json!({
                "name": settings.index_name,
                "dimension": dimension,
                "metric": settings.metric,
                "spec": {
                    "serverless": {
                        "cloud": settings.cloud,
                        "region": settings.environment,
                    }
                }
            });
            let created = client
                .post(format!("{}/indexes", control))
                .header("Api-Key", &api_key)
                .header("X-Pinecone-API-Version", API_VERSION)
                .json(&body)
                .send()
                .await?;
            check(created, "create index").await?;
        } else {
            check(response, "describe index").await?;
        }

        let description = wait_until_ready(
            &client,
            &index_url,
            &api_key,
            Duration::from_secs(settings.ready_timeout_seconds),
        )
        .await?;

        tracing::info!("Connected to index {} at {}", settings.index_name, description.host);
        Self::with_host(
            &description.host,
            &api_key,
            &settings.namespace,
            settings.upsert_batch_size,
        )
    }

    /// Talk to a known data-plane host directly.
    pub fn with_host(host: &str, api_key: &str, namespace: &str, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(PaddockError::Config("upsert_batch_size must be greater than 0".to_string()));
        }
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", host.trim_end_matches('/'))
        };

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            host,
            namespace: namespace.to_string(),
            batch_size,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    async fn post(&self, path: &str, body: &Value, context: &str) -> Result<Response> {
        let response = self
            .client
            .post(format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await?;
        check(response, context).await
    }
}

async fn wait_until_ready(
    client: &reqwest::Client,
    index_url: &str,
    api_key: &str,
    timeout: Duration,
) -> Result<IndexDescription> {
    let started = Instant::now();
    loop {
        let response = client
            .get(index_url)
            .header("Api-Key", api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await?;
        let description: IndexDescription = check(response, "describe index").await?.json().await?;

        if description.status.ready {
            return Ok(description);
        }
        if started.elapsed() >= timeout {
            return Err(PaddockError::VectorStore(format!(
                "Index not ready after {}s (state: {})",
                timeout.as_secs(),
                description.status.state
            )));
        }
        tracing::debug!("Index state {}, waiting", description.status.state);
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
}

async fn check(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PaddockError::VectorStore(format!("{} failed ({}): {}", context, status, body)))
}

fn record_metadata(record: &VectorRecord) -> Result<Map<String, Value>> {
    let mut metadata = match serde_json::to_value(&record.metadata)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    // Pinecone rejects null metadata values
    metadata.retain(|_, v| !v.is_null());
    metadata.insert(TEXT_KEY.to_string(), Value::String(record.content.clone()));
    Ok(metadata)
}

fn into_search_result(m: QueryMatch) -> SearchResult {
    let mut map = m.metadata.unwrap_or_default();
    let content = match map.remove(TEXT_KEY) {
        Some(Value::String(text)) => text,
        _ => String::new(),
    };
    let metadata = serde_json::from_value::<ChunkMetadata>(Value::Object(map)).unwrap_or_else(|e| {
        tracing::warn!(id = %m.id, "Unreadable metadata: {}", e);
        ChunkMetadata::default()
    });

    SearchResult {
        id: m.id,
        content,
        metadata,
        score: m.score,
    }
}

#[async_trait]
impl VectorStore for PineconeVectorStore {
    async fn upsert_batch(&self, records: &[VectorRecord]) -> Result<usize> {
        let mut written = 0;

        for batch in records.chunks(self.batch_size) {
            let vectors = batch
                .iter()
                .map(|record| {
                    Ok(UpsertVector {
                        id: &record.id,
                        values: &record.embedding,
                        metadata: record_metadata(record)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let body = json!({ "vectors": vectors, "namespace": self.namespace });
            let response: UpsertResponse = self.post("/vectors/upsert", &body, "upsert").await?.json().await?;
            written += response.upserted_count;
            tracing::debug!("Upserted batch of {}", batch.len());
        }

        Ok(written)
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let body = json!({
            "vector": query_embedding,
            "topK": limit,
            "includeMetadata": true,
            "namespace": self.namespace,
        });
        let response: QueryResponse = self.post("/query", &body, "query").await?.json().await?;
        Ok(response.matches.into_iter().map(into_search_result).collect())
    }

    async fn stats(&self) -> Result<IndexStats> {
        let response: StatsResponse = self
            .post("/describe_index_stats", &json!({}), "describe index stats")
            .await?
            .json()
            .await?;

        Ok(IndexStats {
            dimension: response.dimension,
            total_vector_count: response.total_vector_count,
            index_fullness: response.index_fullness,
            namespaces: response
                .namespaces
                .into_iter()
                .map(|(name, ns)| (name, ns.vector_count))
                .collect::<BTreeMap<_, _>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(id: &str, text: &str) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            embedding: vec![0.1, 0.2, 0.3],
            content: text.to_string(),
            metadata: ChunkMetadata {
                source: "Sample Data".to_string(),
                title: "Max Verstappen Profile".to_string(),
                doc_type: "driver_profile".to_string(),
                language: "en".to_string(),
                ..Default::default()
            },
        }
    }

    fn settings(server: &MockServer) -> VectorStoreSettings {
        VectorStoreSettings {
            api_key: Some("pc-key".to_string()),
            control_plane_url: server.uri(),
            ready_timeout_seconds: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_connect_creates_missing_index() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/f1-multilingual-kb"))
            .respond_with(ResponseTemplate::new(404))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/indexes"))
            .and(header("Api-Key", "pc-key"))
            .and(body_partial_json(json!({
                "name": "f1-multilingual-kb",
                "dimension": 384,
                "metric": "cosine",
                "spec": {"serverless": {"cloud": "aws", "region": "us-east-1"}}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/indexes/f1-multilingual-kb"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "f1-multilingual-kb",
                "host": "f1-multilingual-kb-abc.svc.pinecone.io",
                "status": {"ready": true, "state": "Ready"}
            })))
            .mount(&server)
            .await;

        let store = PineconeVectorStore::connect(&settings(&server), 384).await.unwrap();
        assert_eq!(store.host(), "https://f1-multilingual-kb-abc.svc.pinecone.io");
    }

    #[tokio::test]
    async fn test_connect_times_out_when_not_ready() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/f1-multilingual-kb"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "host": "h",
                "status": {"ready": false, "state": "Initializing"}
            })))
            .mount(&server)
            .await;

        let err = PineconeVectorStore::connect(&settings(&server), 384).await.err().unwrap();
        assert!(err.to_string().contains("Initializing"));
    }

    #[tokio::test]
    async fn test_connect_requires_api_key() {
        let result = PineconeVectorStore::connect(&VectorStoreSettings::default(), 384).await;
        assert!(matches!(result, Err(PaddockError::Config(_))));
    }

    #[tokio::test]
    async fn test_upsert_sends_batches_with_text_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .and(header("X-Pinecone-API-Version", API_VERSION))
            .and(body_partial_json(json!({
                "vectors": [{"id": "f1_sample_1", "metadata": {"text": "Max Verstappen is Dutch.", "type": "driver_profile"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"upsertedCount": 1})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"upsertedCount": 2})))
            .mount(&server)
            .await;

        let store = PineconeVectorStore::with_host(&server.uri(), "pc-key", "", 2).unwrap();
        let written = store
            .upsert_batch(&[
                record("f1_sample_2", "The 2025 season has 24 races."),
                record("f1_sample_3", "Lewis Hamilton has seven titles."),
                record("f1_sample_1", "Max Verstappen is Dutch."),
            ])
            .await
            .unwrap();
        assert_eq!(written, 3);
    }

    #[tokio::test]
    async fn test_search_reads_text_and_float_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_partial_json(json!({"topK": 2, "includeMetadata": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [
                    {
                        "id": "f1_sample_1",
                        "score": 0.82,
                        "metadata": {
                            "text": "Max Verstappen is a Dutch Formula 1 racing driver.",
                            "title": "Max Verstappen Profile",
                            "source": "Sample Data",
                            "type": "driver_profile",
                            "chunk_index": 0.0,
                            "total_chunks": 1.0
                        }
                    },
                    {"id": "bare", "score": 0.1}
                ]
            })))
            .mount(&server)
            .await;

        let store = PineconeVectorStore::with_host(&server.uri(), "pc-key", "", 100).unwrap();
        let results = store.search(&[0.1, 0.2, 0.3], 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].metadata.title, "Max Verstappen Profile");
        assert_eq!(results[0].metadata.total_chunks, 1);
        assert!(results[0].content.starts_with("Max Verstappen"));
        assert_eq!(results[1].content, "");

        let filtered = store.search_with_threshold(&[0.1, 0.2, 0.3], 2, 0.3).await.unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[tokio::test]
    async fn test_stats() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/describe_index_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "namespaces": {"": {"vectorCount": 42}},
                "dimension": 384,
                "indexFullness": 0.0,
                "totalVectorCount": 42
            })))
            .mount(&server)
            .await;

        let store = PineconeVectorStore::with_host(&server.uri(), "pc-key", "", 100).unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_vector_count, 42);
        assert_eq!(stats.dimension, Some(384));
        assert_eq!(stats.namespaces.get(""), Some(&42));
    }

    #[tokio::test]
    async fn test_error_status_surfaces_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API Key"))
            .mount(&server)
            .await;

        let store = PineconeVectorStore::with_host(&server.uri(), "bad", "", 100).unwrap();
        let err = store.search(&[0.1], 1).await.unwrap_err();
        assert!(err.to_string().contains("Invalid API Key"));
    }
}
