use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use manuscript_precheck::config::Config;
use manuscript_precheck::external::{EmbeddingEngine, OllamaSynthesizer, VectorDB};
use manuscript_precheck::pipeline::CompliancePipeline;
use manuscript_precheck::progress;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// LaTeX manuscript to check
    manuscript: PathBuf,

    /// Where to write the JSON report (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Ollama host, overrides OLLAMA_HOST
    #[arg(long)]
    ollama_host: Option<String>,

    /// Qdrant host, overrides QDRANT_HOST
    #[arg(long)]
    qdrant_host: Option<String>,

    /// Retrieval fan-out, overrides RETRIEVAL_TOP_K
    #[arg(long)]
    top_k: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "manuscript_precheck=info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(host) = args.ollama_host {
        config.embedding.host = host.clone();
        config.llm.host = host;
    }
    if let Some(host) = args.qdrant_host {
        config.vector_db.host = host;
    }
    if let Some(top_k) = args.top_k {
        config.retrieval.top_k = top_k;
    }

    let raw = std::fs::read_to_string(&args.manuscript)
        .with_context(|| format!("reading {}", args.manuscript.display()))?;

    let embedder = Arc::new(EmbeddingEngine::new(config.embedding.clone())?);
    let index = Arc::new(VectorDB::new(config.vector_db.clone())?);
    let synthesizer = Arc::new(OllamaSynthesizer::new(config.llm.clone())?);

    let (sender, mut rx) = progress::channel();
    info!(job_id = %sender.job_id(), "starting compliance check");
    let printer = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            println!("[{}] {}", update.job_id, update.message);
        }
    });

    let pipeline = CompliancePipeline::new(
        embedder,
        index,
        synthesizer,
        config.sub_chunker.clone(),
        config.retrieval.top_k,
        sender,
    );
    let report = pipeline.check(&raw).await?;
    // Dropping the pipeline drops the sender, which lets the printer
    // task drain and exit.
    drop(pipeline);
    printer.await?;

    let json = serde_json::to_string_pretty(&report)?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
