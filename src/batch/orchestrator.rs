use super::{render, worker};
use futures::future::join_all;
use spanmerge::PriorityConfig;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info};

const EXIT_FAILURE: i32 = 1;

/// Consolidate every input document and write or print the results
///
/// Documents are processed by a worker pool; unreadable inputs are reported
/// after the remaining documents have been written, and make the process
/// exit with a failure status.
pub async fn orchestrate_and_run(
    inputs: &[String],
    config: PriorityConfig,
    max_parallel_workers: Option<usize>,
    output: Option<&str>,
) {
    let total = inputs.len();
    let results = consolidate_documents(inputs, Arc::new(config), max_parallel_workers).await;

    let mut documents = Vec::with_capacity(results.len());
    let mut failed = 0;
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(document) => {
                debug!("[Worker {}] Task completed successfully", i);
                documents.push(document);
            }
            Err(e) => {
                error!("[Worker {}] Task failed: {:#}", i, e);
                failed += 1;
            }
        }
    }

    let folded: usize = documents.iter().map(|d| d.stats.consolidated).sum();
    let groups: usize = documents.iter().map(|d| d.stats.groups).sum();
    info!(
        "Consolidation complete: {} documents succeeded, {} failed ({} violations folded into {} records)",
        total - failed,
        failed,
        folded,
        groups
    );

    if let Some(output_path) = output {
        write_output(output_path, &documents);
    } else {
        print_violations(&documents);
    }

    if failed > 0 {
        error!("{} document(s) could not be consolidated", failed);
        std::process::exit(EXIT_FAILURE);
    }
}

/// Run one worker per input, results in input order
pub async fn consolidate_documents(
    inputs: &[String],
    config: Arc<PriorityConfig>,
    max_parallel_workers: Option<usize>,
) -> Vec<anyhow::Result<worker::DocumentResult>> {
    debug!("Creating worker futures for {} documents", inputs.len());
    let futures: Vec<_> = inputs
        .iter()
        .enumerate()
        .map(|(i, source)| worker::worker(i.to_string(), source.clone(), config.clone()))
        .collect();

    if let Some(max) = max_parallel_workers {
        info!("Running workers with max parallelism: {}", max);
    } else {
        info!("Running workers with unlimited parallelism");
    }
    run_pool(futures, max_parallel_workers).await
}

/// Await all futures, at most `max_workers` at a time when set
///
/// Outputs keep the order of `futures`.
async fn run_pool<F: Future>(futures: Vec<F>, max_workers: Option<usize>) -> Vec<F::Output> {
    let Some(max_workers) = max_workers else {
        // No limit - run all workers in parallel
        return join_all(futures).await;
    };

    use futures::stream::{FuturesUnordered, StreamExt};
    let mut stream = FuturesUnordered::new();
    let mut results = Vec::with_capacity(futures.len());
    let mut futures_iter = futures
        .into_iter()
        .enumerate()
        .map(|(i, fut)| async move { (i, fut.await) });

    // Fill initial pool, keeping at least one worker
    for _ in 0..max_workers.max(1) {
        match futures_iter.next() {
            Some(fut) => stream.push(fut),
            None => break,
        }
    }

    // As workers complete, spawn new ones to maintain pool size
    while let Some(result) = stream.next().await {
        results.push(result);
        if let Some(fut) = futures_iter.next() {
            stream.push(fut);
        }
    }

    results.sort_by_key(|(i, _)| *i);
    results.into_iter().map(|(_, output)| output).collect()
}

fn print_violations(documents: &[worker::DocumentResult]) {
    for line in render::format_violations(documents).lines() {
        info!("{}", line);
    }
}

fn write_output(path: &str, documents: &[worker::DocumentResult]) {
    let content = if path.ends_with(".json") {
        let report = render::Report::new(documents, chrono::Utc::now());
        match serde_json::to_string_pretty(&report) {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                std::process::exit(EXIT_FAILURE);
            }
        }
    } else if path.ends_with(".md") {
        render::format_violations(documents)
    } else {
        error!("Output file must end with .md or .json");
        std::process::exit(EXIT_FAILURE);
    };

    if let Err(e) = std::fs::write(path, content) {
        error!("Failed to write output file: {}", e);
        std::process::exit(EXIT_FAILURE);
    }

    info!("Results written to {}", path);
}
