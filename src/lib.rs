pub mod config;
pub mod document;
pub mod external;
pub mod graph;
pub mod pipeline;
pub mod progress;
pub mod questions;
pub mod retriever;
pub mod subchunk;

pub use config::Config;
pub use external::{
    Embedder, EmbeddingEngine, ExternalError, OllamaSynthesizer, Synthesizer, VectorDB,
    VectorIndex,
};
pub use graph::{error::GraphError, Chunk, ChunkEdge, ChunkGraph, IndexEntry, SubChunk};
pub use pipeline::{Answer, ComplianceReport, CompliancePipeline, PipelineError};
pub use progress::{ProgressSender, ProgressUpdate};
pub use retriever::{RecursiveRetriever, SafeReranker};
pub use subchunk::SemanticSubChunker;
