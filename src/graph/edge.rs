use serde::{Deserialize, Serialize};

/// Type of relationship between entries in the chunk graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RelationType {
    /// Sequential relationship between adjacent top-level chunks.
    Precedes,
    /// Hierarchical relationship from a chunk to one of its sub-chunks.
    Contains,
}

/// An edge in the chunk graph, keyed by entry ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkEdge {
    pub from: String,
    pub to: String,
    pub relation_type: RelationType,
}

impl ChunkEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, relation_type: RelationType) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            relation_type,
        }
    }
}
