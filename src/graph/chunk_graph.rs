use petgraph::{
    graph::{DiGraph, NodeIndex},
    Direction,
};
use std::collections::HashMap;

use crate::graph::{
    edge::{ChunkEdge, RelationType},
    error::GraphError,
    node::{Chunk, IndexEntry, SubChunk},
};

/// The hierarchical chunk graph for one document: an arena of index
/// entries keyed by id, with typed edges for sequence (chunk → chunk)
/// and containment (chunk → sub-chunk).
#[derive(Debug)]
pub struct ChunkGraph {
    graph: DiGraph<IndexEntry, ChunkEdge>,
    /// Mapping from entry id to node index for quick lookups.
    node_map: HashMap<String, NodeIndex>,
    /// Top-level chunk ids in document order.
    order: Vec<String>,
}

impl ChunkGraph {
    /// Build the graph from top-level chunks in document order, linking
    /// next/previous between adjacent chunks. Duplicate ids are
    /// rejected rather than silently overwritten.
    pub fn from_chunks(mut chunks: Vec<Chunk>) -> Result<Self, GraphError> {
        for i in 0..chunks.len() {
            if i + 1 < chunks.len() {
                chunks[i].next = Some(chunks[i + 1].id.clone());
            }
            if i > 0 {
                chunks[i].previous = Some(chunks[i - 1].id.clone());
            }
        }

        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        let mut order = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let id = chunk.id.clone();
            if node_map.contains_key(&id) {
                return Err(GraphError::DuplicateId(id));
            }
            let idx = graph.add_node(IndexEntry::Chunk(chunk));
            node_map.insert(id.clone(), idx);
            order.push(id);
        }

        for pair in order.windows(2) {
            let from = node_map[&pair[0]];
            let to = node_map[&pair[1]];
            graph.add_edge(
                from,
                to,
                ChunkEdge::new(pair[0].clone(), pair[1].clone(), RelationType::Precedes),
            );
        }

        Ok(Self {
            graph,
            node_map,
            order,
        })
    }

    /// Register a sub-chunk under its parent chunk with a containment
    /// edge. The parent must already exist.
    pub fn add_sub_chunk(&mut self, sub: SubChunk) -> Result<(), GraphError> {
        let parent_idx = *self
            .node_map
            .get(&sub.parent_id)
            .ok_or_else(|| GraphError::ParentNotFound(sub.parent_id.clone()))?;
        if self.node_map.contains_key(&sub.id) {
            return Err(GraphError::DuplicateId(sub.id));
        }

        let id = sub.id.clone();
        let parent_id = sub.parent_id.clone();
        let idx = self.graph.add_node(IndexEntry::SubChunk(sub));
        self.node_map.insert(id.clone(), idx);
        self.graph.add_edge(
            parent_idx,
            idx,
            ChunkEdge::new(parent_id, id, RelationType::Contains),
        );
        Ok(())
    }

    /// Get any entry (chunk or sub-chunk) by id.
    pub fn get(&self, id: &str) -> Option<&IndexEntry> {
        self.node_map.get(id).map(|idx| &self.graph[*idx])
    }

    /// Get a top-level chunk by id.
    pub fn chunk(&self, id: &str) -> Option<&Chunk> {
        match self.get(id) {
            Some(IndexEntry::Chunk(c)) => Some(c),
            _ => None,
        }
    }

    /// Top-level chunks in document order.
    pub fn chunks(&self) -> Vec<&Chunk> {
        self.order
            .iter()
            .filter_map(|id| self.chunk(id))
            .collect()
    }

    /// Top-level chunk ids in document order.
    pub fn chunk_ids(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Every registered entry, chunks and sub-chunks alike.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Resolve an entry to its parent chunk via the containment edge.
    /// A top-level chunk resolves to itself.
    pub fn parent_chunk(&self, id: &str) -> Result<&Chunk, GraphError> {
        let idx = *self
            .node_map
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        if let IndexEntry::Chunk(c) = &self.graph[idx] {
            return Ok(c);
        }
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .find_map(|parent| {
                let edge = self.graph.find_edge(parent, idx)?;
                if self.graph[edge].relation_type == RelationType::Contains {
                    match &self.graph[parent] {
                        IndexEntry::Chunk(c) => Some(c),
                        IndexEntry::SubChunk(_) => None,
                    }
                } else {
                    None
                }
            })
            .ok_or_else(|| GraphError::ParentNotFound(id.to_string()))
    }

    /// Sub-chunks registered under a chunk.
    pub fn sub_chunks(&self, id: &str) -> Result<Vec<&SubChunk>, GraphError> {
        let idx = *self
            .node_map
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        Ok(self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .filter_map(|child| {
                let edge = self.graph.find_edge(idx, child)?;
                if self.graph[edge].relation_type == RelationType::Contains {
                    match &self.graph[child] {
                        IndexEntry::SubChunk(s) => Some(s),
                        IndexEntry::Chunk(_) => None,
                    }
                } else {
                    None
                }
            })
            .collect())
    }

    /// A manuscript with no section identifiable as "Limitations" is a
    /// desk-reject candidate under the ACL rolling review call.
    pub fn desk_reject_candidate(&self) -> bool {
        !self.order.iter().any(|id| id.contains("Limitation"))
    }

    /// Composite id joining the first two chunks (conventionally the
    /// abstract and the introduction), used by question A3.
    pub fn combined_lead_id(&self) -> Option<String> {
        if self.order.len() >= 2 {
            Some(format!("{}/{}", self.order[0], self.order[1]))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_chunks() -> Vec<Chunk> {
        vec![
            Chunk::new("abstract", "A", 0),
            Chunk::new("1 Intro", "X", 1),
            Chunk::new("2 Limitations", "Y", 2),
        ]
    }

    #[test]
    fn test_adjacency_mirror_consistent() {
        let graph = ChunkGraph::from_chunks(three_chunks()).unwrap();
        let chunks = graph.chunks();
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].next.as_deref(), Some(pair[1].id.as_str()));
            assert_eq!(pair[1].previous.as_deref(), Some(pair[0].id.as_str()));
        }
        assert!(chunks[0].previous.is_none());
        assert!(chunks[2].next.is_none());
    }

    #[test]
    fn test_duplicate_chunk_id_rejected() {
        let chunks = vec![Chunk::new("Intro", "a", 0), Chunk::new("Intro", "b", 1)];
        match ChunkGraph::from_chunks(chunks) {
            Err(GraphError::DuplicateId(id)) => assert_eq!(id, "Intro"),
            other => panic!("expected DuplicateId, got {other:?}"),
        }
    }

    #[test]
    fn test_sub_chunk_requires_existing_parent() {
        let mut graph = ChunkGraph::from_chunks(three_chunks()).unwrap();
        let orphan = SubChunk::new("missing", 0, "text");
        assert!(matches!(
            graph.add_sub_chunk(orphan),
            Err(GraphError::ParentNotFound(_))
        ));
    }

    #[test]
    fn test_parent_chunk_resolution() {
        let mut graph = ChunkGraph::from_chunks(three_chunks()).unwrap();
        graph
            .add_sub_chunk(SubChunk::new("1 Intro", 0, "first half"))
            .unwrap();
        let parent = graph.parent_chunk("1 Intro#0").unwrap();
        assert_eq!(parent.id, "1 Intro");
        // A chunk resolves to itself.
        assert_eq!(graph.parent_chunk("abstract").unwrap().id, "abstract");
    }

    #[test]
    fn test_entries_include_chunks_and_sub_chunks() {
        let mut graph = ChunkGraph::from_chunks(three_chunks()).unwrap();
        graph
            .add_sub_chunk(SubChunk::new("abstract", 0, "A"))
            .unwrap();
        assert_eq!(graph.entries().count(), 4);
        assert_eq!(graph.sub_chunks("abstract").unwrap().len(), 1);
    }

    #[test]
    fn test_desk_reject_flag() {
        let graph = ChunkGraph::from_chunks(three_chunks()).unwrap();
        assert!(!graph.desk_reject_candidate());

        let graph = ChunkGraph::from_chunks(vec![
            Chunk::new("abstract", "A", 0),
            Chunk::new("1 Intro", "X", 1),
        ])
        .unwrap();
        assert!(graph.desk_reject_candidate());
    }

    #[test]
    fn test_combined_lead_id() {
        let graph = ChunkGraph::from_chunks(three_chunks()).unwrap();
        assert_eq!(graph.combined_lead_id().as_deref(), Some("abstract/1 Intro"));

        let graph = ChunkGraph::from_chunks(vec![Chunk::new("abstract", "A", 0)]).unwrap();
        assert!(graph.combined_lead_id().is_none());
    }
}
