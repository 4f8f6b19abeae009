//! Runtime lifecycle management.
//!
//! Start, stop and readiness polling for [`PipelineRuntime`], kept apart
//! from the wrapper type so the state machine stays isolated and testable.

use std::time::{Duration, Instant};

use crate::core::engine::EngineState;
use crate::core::error::{PipelineError, Result};

use super::{PipelineRuntime, PipelineState};

/// Interval between readiness polls during startup.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bound on a single engine state query.
const STATE_QUERY_TIMEOUT: Duration = Duration::from_millis(10);

impl PipelineRuntime {
    /// Request the transition to PLAYING and block until the engine
    /// reports it.
    ///
    /// The readiness wait polls every 100 ms with no timeout: if the
    /// engine never reaches PLAYING this call blocks indefinitely. That
    /// limitation is deliberate and documented, not an oversight.
    pub fn start(&mut self) -> Result<()> {
        if self.state != PipelineState::Created {
            return Err(PipelineError::StateChange(format!(
                "cannot start from state {:?} (must be Created)",
                self.state
            )));
        }

        tracing::info!(
            streams = self.graph.num_streams(),
            sinks = self.graph.sinks().len(),
            "starting pipeline"
        );
        self.graph.engine_graph().set_state(EngineState::Playing)?;
        self.wait_ready();

        self.started_at = Some(Instant::now());
        self.state = PipelineState::Playing;
        tracing::info!("pipeline is playing");
        Ok(())
    }

    /// Whether the engine currently reports PLAYING. Bounded wait, never
    /// blocks beyond the query timeout.
    pub fn running(&self) -> bool {
        self.graph.engine_graph().state(STATE_QUERY_TIMEOUT) == EngineState::Playing
    }

    fn wait_ready(&self) {
        while !self.running() {
            tracing::trace!("pipeline not ready yet");
            std::thread::sleep(READY_POLL_INTERVAL);
        }
    }

    /// Signal end-of-stream, step down PLAYING→PAUSED→STOPPED and release
    /// engine resources. Idempotent: calling it again is a no-op.
    pub fn stop(&mut self) -> Result<()> {
        if self.state == PipelineState::Stopped {
            return Ok(());
        }

        tracing::info!("stopping pipeline");
        let graph = self.graph.engine_graph();

        // Best-effort drain of in-flight buffers before the forced
        // transitions.
        graph.send_eos();
        graph.set_state(EngineState::Paused)?;
        self.state = PipelineState::Paused;
        graph.set_state(EngineState::Null)?;
        self.state = PipelineState::Stopped;

        // Unblock run() if anything is still waiting on the loop.
        self.main_loop().quit();
        tracing::info!("pipeline stopped");
        Ok(())
    }
}

/// Teardown is unconditional: whatever ends the owning scope — normal
/// completion, error, interruption — the pipeline is stopped exactly once.
impl Drop for PipelineRuntime {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(error = %e, "pipeline stop during teardown failed");
        }
    }
}
