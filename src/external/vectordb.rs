use anyhow::Result;
use async_trait::async_trait;
use qdrant_client::{
    config::QdrantConfig,
    qdrant::{
        point_id::PointIdOptions, value::Kind, vectors_config::Config, CreateCollection, Distance,
        PointId, PointStruct, SearchPoints, UpsertPoints, Value, VectorParams, VectorsConfig,
        WithPayloadSelector, WriteOrdering,
    },
    Qdrant,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;
use uuid::Uuid;

use crate::external::error::ExternalError;

/// Similarity-index contract. Entries are keyed by the string ids of
/// the chunk graph; the index never sees chunk text.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Prepare the backing collection for a fresh document.
    async fn init(&self) -> Result<()>;

    /// Register `(entry_id, embedding)` points.
    async fn upsert(&self, points: Vec<(String, Vec<f32>)>) -> Result<()>;

    /// Top-`limit` entry ids by similarity, best first.
    async fn search(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<(String, f32)>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDBConfig {
    pub collection_name: String,
    pub host: String,
    pub port: u16,
    pub vector_size: usize,
}

impl VectorDBConfig {
    /// Get the full URL for the Qdrant service
    pub fn get_url(&self) -> Result<String> {
        let url = if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}", self.host.trim_end_matches('/'), self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        };

        Url::parse(&url).map_err(|e| ExternalError::ConfigError(format!("Invalid URL: {}", e)))?;

        Ok(url)
    }
}

impl Default for VectorDBConfig {
    fn default() -> Self {
        Self {
            collection_name: "manuscript".to_string(),
            host: "localhost".to_string(),
            port: 6334,
            vector_size: 768,
        }
    }
}

/// Qdrant-backed similarity index. Entry ids travel in the point
/// payload because Qdrant point ids cannot hold arbitrary strings.
pub struct VectorDB {
    client: Qdrant,
    config: VectorDBConfig,
}

impl VectorDB {
    pub fn new(config: VectorDBConfig) -> Result<Self> {
        let url = config.get_url()?;
        let qdrant_config = QdrantConfig::from_url(&url);
        let client = Qdrant::new(qdrant_config)
            .map_err(|e| ExternalError::ConnectionError(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl VectorIndex for VectorDB {
    async fn init(&self) -> Result<()> {
        // Each document gets a fresh collection; a leftover one from a
        // previous run is dropped first.
        let _ = self
            .client
            .delete_collection(self.config.collection_name.clone())
            .await;

        let vectors_config = VectorsConfig {
            config: Some(Config::Params(VectorParams {
                size: self.config.vector_size as u64,
                distance: Distance::Cosine.into(),
                ..Default::default()
            })),
        };

        let create_collection = CreateCollection {
            collection_name: self.config.collection_name.clone(),
            vectors_config: Some(vectors_config),
            ..Default::default()
        };

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| ExternalError::VectorIndexError(e.to_string()))?;

        Ok(())
    }

    async fn upsert(&self, points: Vec<(String, Vec<f32>)>) -> Result<()> {
        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|(entry_id, vector)| {
                let payload: HashMap<String, Value> =
                    [("entry_id".to_string(), Value::from(entry_id))].into();

                PointStruct {
                    id: Some(PointId {
                        point_id_options: Some(PointIdOptions::Uuid(Uuid::new_v4().to_string())),
                    }),
                    payload,
                    vectors: Some(vector.into()),
                }
            })
            .collect();

        let upsert_points = UpsertPoints {
            collection_name: self.config.collection_name.clone(),
            points,
            ordering: Some(WriteOrdering::default()),
            ..Default::default()
        };

        self.client
            .upsert_points(upsert_points)
            .await
            .map_err(|e| ExternalError::VectorIndexError(e.to_string()))?;

        Ok(())
    }

    async fn search(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<(String, f32)>> {
        let search_request = SearchPoints {
            collection_name: self.config.collection_name.clone(),
            vector,
            limit,
            with_payload: Some(WithPayloadSelector::from(true)),
            ..Default::default()
        };

        let results = self
            .client
            .search_points(search_request)
            .await
            .map_err(|e| ExternalError::VectorIndexError(e.to_string()))?;

        Ok(results
            .result
            .into_iter()
            .filter_map(|r| {
                let entry_id = r.payload.get("entry_id")?;
                match &entry_id.kind {
                    Some(Kind::StringValue(id)) => Some((id.clone(), r.score)),
                    _ => None,
                }
            })
            .collect())
    }
}
