use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::document::{self, splitter, SectionNumberer};
use crate::external::{Embedder, Synthesizer, VectorIndex};
use crate::graph::{ChunkGraph, GraphError};
use crate::progress::ProgressSender;
use crate::questions::{self, IssueFlag, Question};
use crate::retriever::RecursiveRetriever;
use crate::subchunk::{SemanticSubChunker, SubChunkerConfig};

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The model's output did not honor the response-format contract.
    /// Fatal: remaining questions are not attempted.
    #[error("Response contract violation for question {key}: {source}")]
    ResponseContract {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// One answered question with its bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    #[serde(skip)]
    pub question_key: String,
    pub answer: String,
    #[serde(rename = "section name")]
    pub section_name: String,
    pub justification: String,
    pub prompt: String,
    pub llm: String,
}

/// The sole output contract owed to the caller: one answer per
/// question, plus rule-derived issue flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub title: String,
    pub answers: BTreeMap<String, Answer>,
    pub issues: BTreeMap<String, IssueFlag>,
}

/// Drives one manuscript through the whole pipeline: normalize, number,
/// split, sub-chunk, index, then answer the question battery. Strictly
/// sequential; any external failure aborts the document with no partial
/// result.
pub struct CompliancePipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    synthesizer: Arc<dyn Synthesizer>,
    sub_chunker: SemanticSubChunker,
    top_k: u64,
    progress: ProgressSender,
}

impl CompliancePipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        synthesizer: Arc<dyn Synthesizer>,
        sub_chunker_config: SubChunkerConfig,
        top_k: u64,
        progress: ProgressSender,
    ) -> Self {
        let sub_chunker = SemanticSubChunker::new(Arc::clone(&embedder), sub_chunker_config);
        Self {
            embedder,
            index,
            synthesizer,
            sub_chunker,
            top_k,
            progress,
        }
    }

    pub async fn check(&self, raw: &str) -> Result<ComplianceReport> {
        self.progress.send("Parsing manuscript");
        let doc = document::normalize(raw);
        let body = SectionNumberer::new().number_sections(&doc.body);

        self.progress.send("Performing semantic chunking");
        let chunks = splitter::build_chunks(&body);
        let mut graph = ChunkGraph::from_chunks(chunks).map_err(PipelineError::Graph)?;
        info!(chunks = graph.chunk_ids().len(), title = %doc.title, "chunk graph built");

        self.progress.send("Performing embeddings");
        let parents: Vec<_> = graph.chunks().into_iter().cloned().collect();
        for chunk in &parents {
            for sub in self.sub_chunker.split(chunk).await? {
                graph.add_sub_chunk(sub).map_err(PipelineError::Graph)?;
            }
        }

        self.index.init().await?;
        let mut points = Vec::new();
        for entry in graph.entries() {
            points.push((entry.id().to_string(), self.embedder.embed(entry.text()).await?));
        }
        self.index.upsert(points).await?;

        let retriever = RecursiveRetriever::new(
            Arc::clone(&self.embedder),
            Arc::clone(&self.index),
            self.top_k,
        );

        let section_names = graph.chunk_ids();
        let combined = graph.combined_lead_id();
        let desk_reject = graph.desk_reject_candidate();

        let mut answers = BTreeMap::new();
        for question in questions::catalogue() {
            self.progress
                .send(format!("Running inference for {}", question.key));
            let answer = self
                .answer_question(question, &graph, &retriever, &section_names, combined.as_deref())
                .await?;
            answers.insert(question.key.to_string(), answer);
        }

        self.progress.send("Inference complete");
        Ok(ComplianceReport {
            title: doc.title,
            answers,
            issues: questions::issue_flags(desk_reject),
        })
    }

    async fn answer_question(
        &self,
        question: &Question,
        graph: &ChunkGraph,
        retriever: &RecursiveRetriever,
        section_names: &[String],
        combined: Option<&str>,
    ) -> Result<Answer> {
        let prompt = question.build_prompt(section_names, combined);
        let context = retriever.retrieve(graph, &prompt).await?;
        let raw = self.synthesizer.synthesize(&prompt, &context).await?;
        let answer = parse_answer(
            question.key,
            &raw,
            prompt,
            self.synthesizer.model_id().to_string(),
        )?;
        Ok(answer)
    }
}

/// Parse the model output against the response-format contract. LaTeX
/// backslashes in the payload are escaped first so section names like
/// `\section{...}` quoted inside a justification do not break the JSON.
fn parse_answer(
    key: &str,
    raw: &str,
    prompt: String,
    llm: String,
) -> Result<Answer, PipelineError> {
    #[derive(Deserialize)]
    struct RawAnswer {
        answer: String,
        #[serde(rename = "section name")]
        section_name: String,
        justification: String,
    }

    let cleaned = strip_code_fence(raw).replace('\\', "\\\\");
    let parsed: RawAnswer =
        serde_json::from_str(&cleaned).map_err(|source| PipelineError::ResponseContract {
            key: key.to_string(),
            source,
        })?;

    Ok(Answer {
        question_key: key.to_string(),
        answer: parsed.answer,
        section_name: parsed.section_name,
        justification: parsed.justification,
        prompt,
        llm,
    })
}

/// Some models wrap JSON in a markdown code fence despite the format
/// constraint.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|inner| inner.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer_happy_path() {
        let raw = r#"{"answer": "YES", "section name": "2 Limitations", "justification": "stated"}"#;
        let answer = parse_answer("A1", raw, "p".into(), "m".into()).unwrap();
        assert_eq!(answer.question_key, "A1");
        assert_eq!(answer.answer, "YES");
        assert_eq!(answer.section_name, "2 Limitations");
        assert_eq!(answer.llm, "m");
    }

    #[test]
    fn test_parse_answer_tolerates_latex_backslashes() {
        let raw = r#"{"answer": "YES", "section name": "abstract", "justification": "see \section{1 Intro}"}"#;
        let answer = parse_answer("A3", raw, "p".into(), "m".into()).unwrap();
        assert!(answer.justification.contains("\\section"));
    }

    #[test]
    fn test_parse_answer_strips_code_fence() {
        let raw = "```json\n{\"answer\": \"NO\", \"section name\": \"None\", \"justification\": \"absent\"}\n```";
        let answer = parse_answer("B1", raw, "p".into(), "m".into()).unwrap();
        assert_eq!(answer.answer, "NO");
        assert_eq!(answer.section_name, "None");
    }

    #[test]
    fn test_parse_answer_contract_violation() {
        let err = parse_answer("C1", "not json at all", "p".into(), "m".into()).unwrap_err();
        match err {
            PipelineError::ResponseContract { key, .. } => assert_eq!(key, "C1"),
            other => panic!("expected ResponseContract, got {other:?}"),
        }
    }

    #[test]
    fn test_answer_serializes_to_output_contract() {
        let answer = Answer {
            question_key: "A1".into(),
            answer: "YES".into(),
            section_name: "2 Limitations".into(),
            justification: "j".into(),
            prompt: "p".into(),
            llm: "m".into(),
        };
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["section name"], "2 Limitations");
        assert!(json.get("question_key").is_none());
    }
}
