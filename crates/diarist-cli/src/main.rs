//! diarist - batch speaker diarization from precomputed embeddings
//!
//! Takes a JSON parameter file plus optional `key=value` overrides, runs
//! the clustering pipeline over every recording in the embedding store, and
//! prints where the concatenated RTTM output landed.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use diarist_pipeline::{diarize_batch, group_by_recording, read_embeddings, PipelineParams};

#[derive(Parser, Debug)]
#[command(name = "diarist", about = "Speaker diarization over precomputed embeddings")]
struct Args {
    /// JSON parameter file
    #[arg(long)]
    params: PathBuf,

    /// Top-level parameter overrides, e.g. neighbors=20 seed=7
    #[arg(value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let params = PipelineParams::load_with_overrides(&args.params, &args.overrides)
        .with_context(|| format!("loading parameters from {}", args.params.display()))?;

    let segments = read_embeddings(&params.embeddings_file)
        .with_context(|| format!("reading embeddings from {}", params.embeddings_file.display()))?;
    let jobs = group_by_recording(segments);
    info!("Found {} recordings in the embedding store", jobs.len());

    let summary = diarize_batch(jobs, &params).await?;

    println!(
        "Diarized {} recordings ({} failed) in {:.1}s",
        summary.completed.len(),
        summary.failed.len(),
        (summary.finished_at - summary.started_at).num_milliseconds() as f64 / 1000.0,
    );
    for failure in &summary.failed {
        println!("  failed {}: {}", failure.recording_id, failure.error);
    }
    println!("System RTTM: {}", summary.output_rttm.display());

    if !summary.failed.is_empty() && summary.completed.is_empty() {
        anyhow::bail!("all recordings failed");
    }
    Ok(())
}
