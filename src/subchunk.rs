use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::external::Embedder;
use crate::graph::{Chunk, SubChunk};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubChunkerConfig {
    /// Neighboring sentences folded into each span's embedding input.
    pub buffer_size: usize,
    /// Cosine-distance percentile above which a breakpoint is placed.
    pub breakpoint_percentile: f64,
}

impl Default for SubChunkerConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1,
            breakpoint_percentile: 95.0,
        }
    }
}

/// Splits a chunk into semantically-delimited sub-chunks: embed each
/// sentence span, then break wherever the cosine distance between
/// consecutive spans exceeds the configured percentile of all
/// distances in the chunk.
pub struct SemanticSubChunker {
    embedder: Arc<dyn Embedder>,
    config: SubChunkerConfig,
}

impl SemanticSubChunker {
    pub fn new(embedder: Arc<dyn Embedder>, config: SubChunkerConfig) -> Self {
        Self { embedder, config }
    }

    /// Sub-chunks for one parent chunk, tagged with its id. A chunk too
    /// small to split yields none.
    pub async fn split(&self, chunk: &Chunk) -> Result<Vec<SubChunk>> {
        let sentences = sentence_spans(&chunk.text);
        if sentences.len() < 2 {
            return Ok(Vec::new());
        }

        let mut embeddings = Vec::with_capacity(sentences.len());
        for i in 0..sentences.len() {
            let window = buffered_window(&sentences, i, self.config.buffer_size);
            embeddings.push(self.embedder.embed(&window).await?);
        }

        let distances: Vec<f64> = embeddings
            .windows(2)
            .map(|pair| cosine_distance(&pair[0], &pair[1]))
            .collect();
        let threshold = percentile(&distances, self.config.breakpoint_percentile);

        let mut groups: Vec<Vec<&str>> = vec![vec![sentences[0]]];
        for (i, distance) in distances.iter().enumerate() {
            if *distance > threshold {
                groups.push(Vec::new());
            }
            if let Some(group) = groups.last_mut() {
                group.push(sentences[i + 1]);
            }
        }

        debug!(
            chunk = %chunk.id,
            sentences = sentences.len(),
            sub_chunks = groups.len(),
            "semantic split"
        );

        Ok(groups
            .into_iter()
            .enumerate()
            .map(|(i, group)| SubChunk::new(&chunk.id, i, group.join(" ")))
            .collect())
    }
}

/// Sentence-boundary spans: text split after `.`, `!` or `?` followed
/// by whitespace, empty spans discarded.
fn sentence_spans(text: &str) -> Vec<&str> {
    let re = Regex::new(r"[.!?](\s+|$)").unwrap();
    let mut spans = Vec::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        let span = text[last..m.end()].trim();
        if !span.is_empty() {
            spans.push(span);
        }
        last = m.end();
    }
    let tail = text[last..].trim();
    if !tail.is_empty() {
        spans.push(tail);
    }
    spans
}

fn buffered_window(sentences: &[&str], i: usize, buffer: usize) -> String {
    let start = i.saturating_sub(buffer);
    let end = (i + buffer + 1).min(sentences.len());
    sentences[start..end].join(" ")
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

/// Linear-interpolation percentile over an unsorted sample.
fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = rank - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Embeds sentences onto fixed axes so split points are
    /// predictable: sentences mentioning "cats" and "dogs" land on
    /// orthogonal vectors.
    struct TopicEmbedder;

    #[async_trait]
    impl Embedder for TopicEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let cats = text.matches("cats").count() as f32;
            let dogs = text.matches("dogs").count() as f32;
            Ok(vec![cats + 0.01, dogs + 0.01])
        }
    }

    fn chunker() -> SemanticSubChunker {
        SemanticSubChunker::new(
            Arc::new(TopicEmbedder),
            SubChunkerConfig {
                buffer_size: 0,
                breakpoint_percentile: 95.0,
            },
        )
    }

    #[test]
    fn test_sentence_spans() {
        let spans = sentence_spans("First one. Second one! Third one? tail");
        assert_eq!(spans, vec!["First one.", "Second one!", "Third one?", "tail"]);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = vec![0.0, 1.0, 2.0, 3.0];
        assert!((percentile(&values, 50.0) - 1.5).abs() < 1e-9);
        assert!((percentile(&values, 100.0) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_distance_bounds() {
        assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]) < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_split_breaks_at_topic_shift() {
        let chunk = Chunk::new(
            "1 Intro",
            "cats purr. cats sleep. cats eat. dogs bark. dogs run.",
            1,
        );
        let subs = chunker().split(&chunk).await.unwrap();
        assert_eq!(subs.len(), 2);
        assert!(subs[0].text.contains("cats purr"));
        assert!(subs[1].text.contains("dogs bark"));
        assert!(subs.iter().all(|s| s.parent_id == "1 Intro"));
        assert_eq!(subs[0].id, "1 Intro#0");
        assert_eq!(subs[1].id, "1 Intro#1");
    }

    #[tokio::test]
    async fn test_single_sentence_chunk_yields_nothing() {
        let chunk = Chunk::new("abstract", "Only one sentence here.", 0);
        let subs = chunker().split(&chunk).await.unwrap();
        assert!(subs.is_empty());
    }
}
