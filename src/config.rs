use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

use crate::external::{EmbeddingConfig, LLMConfig, VectorDBConfig};
use crate::subchunk::SubChunkerConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Similarity-search fan-out before parent resolution.
    pub top_k: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 40 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub llm: LLMConfig,
    pub vector_db: VectorDBConfig,
    pub retrieval: RetrievalConfig,
    pub sub_chunker: SubChunkerConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let embedding = EmbeddingConfig {
            model: env::var("OLLAMA_EMBEDDING_MODEL")
                .unwrap_or_else(|_| "nomic-embed-text".to_string()),
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .unwrap_or_else(|_| "11434".to_string())
                .parse()
                .unwrap_or(11434),
        };

        let llm = LLMConfig {
            model: env::var("OLLAMA_LLM_MODEL").unwrap_or_else(|_| "mistral".to_string()),
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .unwrap_or_else(|_| "11434".to_string())
                .parse()
                .unwrap_or(11434),
            temperature: env::var("OLLAMA_TEMPERATURE")
                .unwrap_or_else(|_| "0.0".to_string())
                .parse()
                .unwrap_or(0.0),
        };

        let vector_db = VectorDBConfig {
            collection_name: env::var("QDRANT_COLLECTION")
                .unwrap_or_else(|_| "manuscript".to_string()),
            host: env::var("QDRANT_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("QDRANT_PORT")
                .unwrap_or_else(|_| "6334".to_string())
                .parse()
                .unwrap_or(6334),
            vector_size: env::var("QDRANT_VECTOR_SIZE")
                .unwrap_or_else(|_| "768".to_string())
                .parse()
                .unwrap_or(768),
        };

        let retrieval = RetrievalConfig {
            top_k: env::var("RETRIEVAL_TOP_K")
                .unwrap_or_else(|_| "40".to_string())
                .parse()
                .unwrap_or(40),
        };

        let sub_chunker = SubChunkerConfig {
            buffer_size: env::var("SUBCHUNK_BUFFER_SIZE")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            breakpoint_percentile: env::var("SUBCHUNK_BREAKPOINT_PERCENTILE")
                .unwrap_or_else(|_| "95".to_string())
                .parse()
                .unwrap_or(95.0),
        };

        Ok(Self {
            embedding,
            llm,
            vector_db,
            retrieval,
            sub_chunker,
        })
    }
}
