use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use multicam::core::engine::sim::SimEngine;
use multicam::core::engine::Engine;
use multicam::{GraphBuilder, PipelineConfig, PipelineRuntime};

/// Build the pipeline from `config_file` and block until it terminates.
///
/// The pipeline runs on the built-in simulation engine; a hardware
/// engine drops in through the same [`Engine`] trait. Ctrl-C requests
/// an orderly shutdown through the main loop. With `dry_run` the graph
/// is built and validated but never played.
pub fn run(config_file: &Path, uri_overrides: Vec<String>, dry_run: bool) -> Result<()> {
    let mut config = PipelineConfig::from_file(config_file)
        .with_context(|| format!("failed to load config {}", config_file.display()))?;
    if !uri_overrides.is_empty() {
        config.stream_uris = uri_overrides;
    }

    let engine: Arc<dyn Engine> = SimEngine::new();
    let graph = GraphBuilder::new(engine, config)?.build()?;
    tracing::info!(
        streams = graph.num_streams(),
        sinks = graph.sinks().len(),
        "pipeline graph built"
    );
    if dry_run {
        println!(
            "graph ok: {} stream(s), {} sink(s)",
            graph.num_streams(),
            graph.sinks().len()
        );
        return Ok(());
    }

    let mut runtime = PipelineRuntime::new(graph);

    let loop_handle = runtime.main_loop();
    ctrlc::set_handler(move || {
        tracing::info!("interrupt received, shutting down");
        loop_handle.quit();
    })
    .context("failed to install interrupt handler")?;

    runtime.run()?;
    if let Some(started) = runtime.started_at() {
        tracing::info!(elapsed = ?started.elapsed(), "pipeline finished");
    }
    Ok(())
}
