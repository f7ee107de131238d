use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use manuscript_precheck::external::{Embedder, Synthesizer, VectorIndex};
use manuscript_precheck::pipeline::{CompliancePipeline, PipelineError};
use manuscript_precheck::progress;
use manuscript_precheck::questions::DESK_REJECT_MESSAGE;
use manuscript_precheck::subchunk::SubChunkerConfig;

const MANUSCRIPT: &str = r"\title{A Study of Feline Vocalization}
\begin{document}
% reviewer setup notes
\begin{abstract}
We study cats. Cats purr often. Results generalize poorly.
\end{abstract}
\section{Introduction}
cats purr. cats sleep. dogs bark. dogs run.
\section{Limitations}
Only cats were studied. Sample size was small.
\section*{Acknowledgements}
Thanks to the cats.
\end{document}
";

const NO_LIMITATIONS: &str = r"\title{No Caveats Here}
\begin{abstract}
We study cats. Cats purr.
\end{abstract}
\section{Introduction}
cats purr. dogs bark.
";

/// Deterministic embedding from byte histograms; close enough for the
/// pipeline to exercise real cosine math.
struct HashEmbedder;

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; 8];
        for b in text.bytes() {
            v[(b % 8) as usize] += 1.0;
        }
        Ok(v)
    }
}

#[derive(Default)]
struct InMemoryIndex {
    points: Mutex<Vec<(String, Vec<f32>)>>,
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn init(&self) -> Result<()> {
        self.points.lock().unwrap().clear();
        Ok(())
    }

    async fn upsert(&self, points: Vec<(String, Vec<f32>)>) -> Result<()> {
        self.points.lock().unwrap().extend(points);
        Ok(())
    }

    async fn search(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<(String, f32)>> {
        let mut scored: Vec<(String, f32)> = self
            .points
            .lock()
            .unwrap()
            .iter()
            .map(|(id, v)| (id.clone(), cosine(&vector, v)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        scored.truncate(limit as usize);
        Ok(scored)
    }
}

/// Always returns a contract-conforming answer.
struct YesSynthesizer;

#[async_trait]
impl Synthesizer for YesSynthesizer {
    async fn synthesize(&self, _prompt: &str, _context: &[String]) -> Result<String> {
        Ok(r#"{"answer": "YES", "section name": "abstract", "justification": "stated"}"#
            .to_string())
    }
    fn model_id(&self) -> &str {
        "scripted"
    }
}

/// Conforms until `fail_at`, then emits garbage.
struct FlakySynthesizer {
    calls: AtomicUsize,
    fail_at: usize,
}

#[async_trait]
impl Synthesizer for FlakySynthesizer {
    async fn synthesize(&self, _prompt: &str, _context: &[String]) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.fail_at {
            Ok("I cannot answer that in JSON form.".to_string())
        } else {
            Ok(r#"{"answer": "NO", "section name": "None", "justification": "absent"}"#
                .to_string())
        }
    }
    fn model_id(&self) -> &str {
        "flaky"
    }
}

fn pipeline(synthesizer: Arc<dyn Synthesizer>) -> CompliancePipeline {
    CompliancePipeline::new(
        Arc::new(HashEmbedder),
        Arc::new(InMemoryIndex::default()),
        synthesizer,
        SubChunkerConfig::default(),
        40,
        progress::ProgressSender::disabled(),
    )
}

#[tokio::test]
async fn test_full_report_for_compliant_manuscript() {
    let report = pipeline(Arc::new(YesSynthesizer))
        .check(MANUSCRIPT)
        .await
        .unwrap();

    assert_eq!(report.title, "A Study of Feline Vocalization");
    assert_eq!(report.answers.len(), 18);

    let keys: Vec<&str> = report.answers.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "A1", "A2", "A3", "B1", "B2", "B3", "B4", "B5", "B6", "C1", "C2", "C3", "C4",
            "D1", "D2", "D3", "D4", "D5"
        ]
    );

    let a1 = &report.answers["A1"];
    assert_eq!(a1.answer, "YES");
    assert_eq!(a1.section_name, "abstract");
    assert_eq!(a1.llm, "scripted");
    assert!(a1.prompt.contains("Did you describe the limitations of your work?"));
    assert!(a1.prompt.contains("'2 Limitations'"));

    // Acknowledgements never reach the prompt's section enumeration.
    assert!(!a1.prompt.contains("Acknowledgements"));

    // A3 is restricted to the abstract/introduction composite.
    assert!(report.answers["A3"]
        .prompt
        .contains("'abstract/1 Introduction'"));

    assert_eq!(report.issues.len(), 18);
    assert!(report.issues.values().all(|flag| !flag.triggered));
}

#[tokio::test]
async fn test_missing_limitations_flags_desk_reject() {
    let report = pipeline(Arc::new(YesSynthesizer))
        .check(NO_LIMITATIONS)
        .await
        .unwrap();

    assert!(report.issues["A1"].triggered);
    assert_eq!(report.issues["A1"].message, DESK_REJECT_MESSAGE);
    assert!(report.issues.values().filter(|f| f.triggered).count() == 1);
}

#[tokio::test]
async fn test_contract_violation_aborts_remaining_questions() {
    let synthesizer = Arc::new(FlakySynthesizer {
        calls: AtomicUsize::new(0),
        fail_at: 1,
    });
    let err = pipeline(synthesizer.clone())
        .check(MANUSCRIPT)
        .await
        .unwrap_err();

    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::ResponseContract { key, .. }) => assert_eq!(key, "A2"),
        other => panic!("expected ResponseContract, got {other:?}"),
    }
    // A2 failed on the second call and nothing ran after it.
    assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_progress_messages_cover_the_run() {
    let (sender, mut rx) = progress::channel();
    let pipeline = CompliancePipeline::new(
        Arc::new(HashEmbedder),
        Arc::new(InMemoryIndex::default()),
        Arc::new(YesSynthesizer),
        SubChunkerConfig::default(),
        40,
        sender,
    );
    pipeline.check(MANUSCRIPT).await.unwrap();

    let messages: Vec<String> = progress::drain(&mut rx)
        .into_iter()
        .map(|u| u.message)
        .collect();

    assert_eq!(messages.first().map(String::as_str), Some("Parsing manuscript"));
    assert_eq!(messages.last().map(String::as_str), Some("Inference complete"));
    assert!(messages.contains(&"Performing semantic chunking".to_string()));
    assert!(messages.contains(&"Performing embeddings".to_string()));
    for key in ["A1", "B6", "D5"] {
        assert!(messages.contains(&format!("Running inference for {key}")));
    }

    let a1 = messages
        .iter()
        .position(|m| m == "Running inference for A1")
        .unwrap();
    let d5 = messages
        .iter()
        .position(|m| m == "Running inference for D5")
        .unwrap();
    assert!(a1 < d5);
}
