//! Pipeline runtime: owns the built graph and the blocking run loop.

mod lifecycle;
mod state;

pub use state::PipelineState;

use std::time::Instant;

use super::error::Result;
use super::events::EventDispatcher;
use super::graph::Graph;
use super::mainloop::MainLoop;

/// Wraps an immutable [`Graph`] and drives its lifecycle. Data flow is
/// owned entirely by the engine once the graph plays; the runtime issues
/// only control calls and one long blocking wait on the main loop.
pub struct PipelineRuntime {
    graph: Graph,
    main_loop: MainLoop,
    state: PipelineState,
    started_at: Option<Instant>,
}

impl PipelineRuntime {
    /// Wrap a built graph and register event dispatch on its bus.
    pub fn new(graph: Graph) -> Self {
        let main_loop = MainLoop::new();
        EventDispatcher::attach(graph.engine_graph(), main_loop.clone());
        Self {
            graph,
            main_loop,
            state: PipelineState::Created,
            started_at: None,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Handle for requesting run-loop termination from another thread
    /// (signal handlers, tests).
    pub fn main_loop(&self) -> MainLoop {
        self.main_loop.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// When the pipeline was last observed reaching PLAYING.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Start if necessary, block until termination is requested (error,
    /// end-of-stream, or an external `quit`), then stop.
    pub fn run(&mut self) -> Result<()> {
        if self.state != PipelineState::Playing {
            self.start()?;
        }
        tracing::info!("pipeline running");
        self.main_loop.run();
        self.stop()
    }
}
