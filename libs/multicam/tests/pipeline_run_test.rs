//! End-to-end pipeline run tests.
//!
//! Exercises the full public surface together: config, graph build,
//! stream binding, lifecycle and event dispatch against the simulation
//! engine. The run loop blocks the test thread, so bus messages arrive
//! from spawned threads the way an engine would deliver them.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use multicam::core::builder::GRAPH_NAME;
use multicam::core::engine::sim::SimEngine;
use multicam::core::engine::{EngineGraph, EngineState, PadCaps, MEMORY_NVMM};
use multicam::{GraphBuilder, PipelineConfig, PipelineRuntime, PipelineState};

fn config(n: usize) -> PipelineConfig {
    PipelineConfig {
        stream_uris: (0..n).map(|i| format!("rtsp://cam{i}/stream")).collect(),
        width: 1280,
        height: 720,
        model_config: PathBuf::from("models/peoplenet.txt"),
        inference_interval: 1,
        record: false,
        record_dir: None,
        display: true,
    }
}

fn runtime(engine: &Arc<SimEngine>, n: usize) -> PipelineRuntime {
    let graph = GraphBuilder::new(engine.clone(), config(n))
        .unwrap()
        .build()
        .unwrap();
    PipelineRuntime::new(graph)
}

#[test]
fn test_run_plays_until_end_of_stream() {
    let engine = SimEngine::new();
    let mut runtime = runtime(&engine, 2);

    // Decoder outputs appear while the pipeline is already constructed.
    for i in 0..2 {
        engine
            .element(&format!("source-{i}"))
            .unwrap()
            .emit_pad_added(PadCaps::new("video/x-raw").with_feature(MEMORY_NVMM));
    }

    let graph = engine.graph(GRAPH_NAME).unwrap();
    let poster = {
        let graph = graph.clone();
        thread::spawn(move || {
            // Wait until the runtime reports PLAYING, then end the streams.
            while graph.state(Duration::from_millis(10)) != EngineState::Playing {
                thread::sleep(Duration::from_millis(5));
            }
            graph.post(multicam::core::engine::BusMessage::Eos);
        })
    };

    runtime.run().unwrap();
    poster.join().unwrap();

    assert_eq!(runtime.state(), PipelineState::Stopped);
    assert_eq!(
        graph.state(Duration::from_millis(10)),
        EngineState::Null,
        "engine resources released"
    );
}

#[test]
fn test_run_exits_on_engine_error() {
    let engine = SimEngine::new();
    let mut runtime = runtime(&engine, 1);

    let graph = engine.graph(GRAPH_NAME).unwrap();
    let poster = {
        let graph = graph.clone();
        thread::spawn(move || {
            while graph.state(Duration::from_millis(10)) != EngineState::Playing {
                thread::sleep(Duration::from_millis(5));
            }
            graph.post_error("source-0", "could not read from resource", None);
        })
    };

    // An engine error terminates the run the same way end-of-stream does.
    runtime.run().unwrap();
    poster.join().unwrap();
    assert_eq!(runtime.state(), PipelineState::Stopped);
}

#[test]
fn test_unbound_source_does_not_block_startup() {
    let engine = SimEngine::new();
    let mut runtime = runtime(&engine, 2);

    // Only one of two sources ever produces a usable output.
    engine
        .element("source-0")
        .unwrap()
        .emit_pad_added(PadCaps::new("video/x-raw").with_feature(MEMORY_NVMM));

    runtime.start().unwrap();
    assert!(runtime.running());
    assert_eq!(engine.links_into("mux").len(), 1);
    runtime.stop().unwrap();
}

#[test]
fn test_external_quit_stops_the_pipeline() {
    let engine = SimEngine::new();
    let mut runtime = runtime(&engine, 1);

    // An interrupt handler would do exactly this from another thread.
    let main_loop = runtime.main_loop();
    let quitter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        main_loop.quit();
    });

    runtime.run().unwrap();
    quitter.join().unwrap();
    assert_eq!(runtime.state(), PipelineState::Stopped);
}
