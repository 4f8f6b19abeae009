//! multicam: multi-stream video inference pipeline orchestration
//!
//! This crate builds and drives a fixed-shape processing graph over an
//! engine abstraction: N live sources feed a batching muxer, a shared
//! inference stage, a tiler and an on-screen-display stage, and the
//! result fans out through per-sink isolation queues to display,
//! recording, or discard sinks. The engines that actually decode,
//! infer, and render are external collaborators reached through the
//! [`core::Engine`] trait; this crate owns wiring and lifecycle only.

pub mod core;
pub mod models;

// Re-export the orchestration surface
pub use core::{
    Engine, EventDispatcher, Graph, GraphBuilder, MainLoop, PipelineConfig, PipelineError,
    PipelineRuntime, PipelineState, Result, SinkKind,
};
pub use models::ModelBundle;
