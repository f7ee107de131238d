pub mod chunk_graph;
pub mod edge;
pub mod error;
pub mod node;

pub use chunk_graph::ChunkGraph;
pub use edge::{ChunkEdge, RelationType};
pub use error::GraphError;
pub use node::{Chunk, IndexEntry, SubChunk};
