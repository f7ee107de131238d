pub mod embedding;
pub mod error;
pub mod llm;
pub mod vectordb;

pub use embedding::{Embedder, EmbeddingConfig, EmbeddingEngine};
pub use error::ExternalError;
pub use llm::{LLMConfig, OllamaSynthesizer, Synthesizer};
pub use vectordb::{VectorDB, VectorDBConfig, VectorIndex};
