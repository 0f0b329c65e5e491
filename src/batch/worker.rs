use anyhow::Context;
use serde::Deserialize;
use spanmerge::{ConsolidationStats, PriorityConfig, Violation, consolidate_with_stats};
use std::sync::Arc;
use tracing::{debug, info};

/// Accepted shapes of an input file
#[derive(Deserialize)]
#[serde(untagged)]
enum InputDocument {
    List(Vec<Violation>),
    Wrapped { violations: Vec<Violation> },
}

impl InputDocument {
    fn into_violations(self) -> Vec<Violation> {
        match self {
            Self::List(violations) | Self::Wrapped { violations } => violations,
        }
    }
}

/// Consolidated violations of one input document
#[derive(Debug)]
pub struct DocumentResult {
    pub worker_id: String,
    pub source: String,
    pub violations: Vec<Violation>,
    pub stats: ConsolidationStats,
    pub elapsed_secs: f64,
}

pub fn parse_document(content: &str) -> serde_json::Result<Vec<Violation>> {
    serde_json::from_str::<InputDocument>(content).map(InputDocument::into_violations)
}

/// Read one violation file and consolidate it on the blocking pool
pub async fn worker(
    worker_id: String,
    source: String,
    config: Arc<PriorityConfig>,
) -> anyhow::Result<DocumentResult> {
    let start = std::time::Instant::now();
    debug!("[Worker {}] Reading {}", worker_id, source);

    let content = tokio::fs::read_to_string(&source)
        .await
        .with_context(|| format!("failed to read {}", source))?;
    let violations =
        parse_document(&content).with_context(|| format!("invalid violation file {}", source))?;
    info!(
        "[Worker {}] Consolidating {} violations from {}",
        worker_id,
        violations.len(),
        source
    );

    let (violations, stats) =
        tokio::task::spawn_blocking(move || consolidate_with_stats(violations, Some(&*config)))
            .await
            .context("consolidation task panicked")?;

    let elapsed = start.elapsed().as_secs_f64();
    info!(
        "[Worker {}] Done with {}: {} -> {} violations ({:.2}s)",
        worker_id, source, stats.input, stats.output, elapsed
    );

    Ok(DocumentResult {
        worker_id,
        source,
        violations,
        stats,
        elapsed_secs: elapsed,
    })
}
