use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::external::{Embedder, Synthesizer, VectorIndex};
use crate::graph::{ChunkGraph, IndexEntry};

/// Two-level retrieval over the chunk graph: search at sub-chunk
/// granularity, answer with parent-chunk context. Exactly one parent
/// hop, no further fan-out.
pub struct RecursiveRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    top_k: u64,
    reranker: Option<SafeReranker>,
}

impl RecursiveRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, top_k: u64) -> Self {
        Self {
            embedder,
            index,
            top_k,
            reranker: None,
        }
    }

    pub fn with_reranker(mut self, reranker: SafeReranker) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Full chunk texts for the query, best-ranked first, deduplicated
    /// after parent resolution.
    pub async fn retrieve(&self, graph: &ChunkGraph, query: &str) -> Result<Vec<String>> {
        let query_vec = self.embedder.embed(query).await?;
        let hits = self.index.search(query_vec, self.top_k).await?;
        debug!(hits = hits.len(), "similarity search");

        let mut seen = HashSet::new();
        let mut contexts = Vec::new();
        for (id, _score) in hits {
            // The index may return ids the graph no longer holds; skip
            // rather than fail the document.
            let Some(entry) = graph.get(&id) else {
                warn!(id = %id, "stale index entry");
                continue;
            };
            let chunk = match entry {
                IndexEntry::Chunk(c) => c,
                IndexEntry::SubChunk(_) => graph.parent_chunk(&id)?,
            };
            if seen.insert(chunk.id.clone()) {
                contexts.push(chunk.text.clone());
            }
        }

        match &self.reranker {
            Some(reranker) => Ok(reranker.rerank(query, contexts).await),
            None => Ok(contexts),
        }
    }
}

/// Language-model reranking with an explicit fallback policy: any
/// failure — transport or unparseable output — returns the original
/// candidate order unchanged, never an error.
pub struct SafeReranker {
    synthesizer: Arc<dyn Synthesizer>,
    top_n: usize,
}

impl SafeReranker {
    pub fn new(synthesizer: Arc<dyn Synthesizer>, top_n: usize) -> Self {
        Self { synthesizer, top_n }
    }

    pub async fn rerank(&self, query: &str, candidates: Vec<String>) -> Vec<String> {
        if candidates.len() <= 1 {
            return candidates;
        }
        match self.try_rerank(query, &candidates).await {
            Ok(order) => order
                .into_iter()
                .filter_map(|i| candidates.get(i).cloned())
                .take(self.top_n)
                .collect(),
            Err(e) => {
                warn!(error = %e, "rerank failed, keeping original order");
                candidates
            }
        }
    }

    async fn try_rerank(&self, query: &str, candidates: &[String]) -> Result<Vec<usize>> {
        let listing: String = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| format!("[{i}] {c}\n"))
            .collect();
        let prompt = format!(
            "Rank the following passages by relevance to the question. \
             Respond with a JSON array of passage indices, most relevant first.\n\
             Question: {query}\nPassages:\n{listing}"
        );
        let raw = self.synthesizer.synthesize(&prompt, &[]).await?;
        let order: Vec<usize> = serde_json::from_str(raw.trim())?;
        anyhow::ensure!(!order.is_empty(), "empty rerank order");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Chunk, SubChunk};
    use anyhow::anyhow;
    use async_trait::async_trait;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
    }

    /// Returns a scripted hit list regardless of the query vector.
    struct ScriptedIndex {
        hits: Vec<(String, f32)>,
    }

    #[async_trait]
    impl VectorIndex for ScriptedIndex {
        async fn init(&self) -> Result<()> {
            Ok(())
        }
        async fn upsert(&self, _points: Vec<(String, Vec<f32>)>) -> Result<()> {
            Ok(())
        }
        async fn search(&self, _vector: Vec<f32>, limit: u64) -> Result<Vec<(String, f32)>> {
            Ok(self.hits.iter().take(limit as usize).cloned().collect())
        }
    }

    struct FailingSynthesizer;

    #[async_trait]
    impl Synthesizer for FailingSynthesizer {
        async fn synthesize(&self, _prompt: &str, _context: &[String]) -> Result<String> {
            Err(anyhow!("model unavailable"))
        }
        fn model_id(&self) -> &str {
            "failing"
        }
    }

    struct ReversingSynthesizer;

    #[async_trait]
    impl Synthesizer for ReversingSynthesizer {
        async fn synthesize(&self, _prompt: &str, _context: &[String]) -> Result<String> {
            Ok("[1, 0]".to_string())
        }
        fn model_id(&self) -> &str {
            "reversing"
        }
    }

    fn sample_graph() -> ChunkGraph {
        let mut graph = ChunkGraph::from_chunks(vec![
            Chunk::new("abstract", "abstract text", 0),
            Chunk::new("1 Intro", "intro text", 1),
        ])
        .unwrap();
        graph
            .add_sub_chunk(SubChunk::new("1 Intro", 0, "intro sentence"))
            .unwrap();
        graph
    }

    #[tokio::test]
    async fn test_sub_chunk_hits_resolve_to_parent_text() {
        let graph = sample_graph();
        let index = ScriptedIndex {
            hits: vec![("1 Intro#0".to_string(), 0.9)],
        };
        let retriever =
            RecursiveRetriever::new(Arc::new(FixedEmbedder), Arc::new(index), 40);
        let contexts = retriever.retrieve(&graph, "q").await.unwrap();
        assert_eq!(contexts, vec!["intro text".to_string()]);
    }

    #[tokio::test]
    async fn test_parent_and_sub_chunk_hits_deduplicate() {
        let graph = sample_graph();
        let index = ScriptedIndex {
            hits: vec![
                ("1 Intro#0".to_string(), 0.9),
                ("1 Intro".to_string(), 0.8),
                ("abstract".to_string(), 0.7),
            ],
        };
        let retriever =
            RecursiveRetriever::new(Arc::new(FixedEmbedder), Arc::new(index), 40);
        let contexts = retriever.retrieve(&graph, "q").await.unwrap();
        assert_eq!(
            contexts,
            vec!["intro text".to_string(), "abstract text".to_string()]
        );
    }

    #[tokio::test]
    async fn test_stale_hits_skipped() {
        let graph = sample_graph();
        let index = ScriptedIndex {
            hits: vec![
                ("gone".to_string(), 0.99),
                ("abstract".to_string(), 0.5),
            ],
        };
        let retriever =
            RecursiveRetriever::new(Arc::new(FixedEmbedder), Arc::new(index), 40);
        let contexts = retriever.retrieve(&graph, "q").await.unwrap();
        assert_eq!(contexts, vec!["abstract text".to_string()]);
    }

    #[tokio::test]
    async fn test_rerank_failure_keeps_original_order() {
        let reranker = SafeReranker::new(Arc::new(FailingSynthesizer), 2);
        let candidates = vec!["a".to_string(), "b".to_string()];
        let out = reranker.rerank("q", candidates.clone()).await;
        assert_eq!(out, candidates);
    }

    #[tokio::test]
    async fn test_rerank_applies_model_order() {
        let reranker = SafeReranker::new(Arc::new(ReversingSynthesizer), 2);
        let out = reranker
            .rerank("q", vec!["a".to_string(), "b".to_string()])
            .await;
        assert_eq!(out, vec!["b".to_string(), "a".to_string()]);
    }
}
