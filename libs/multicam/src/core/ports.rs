//! Deferred output ports.
//!
//! A source's output pad does not exist until the engine has opened the
//! container and discovered the stream format. `DeferredPad` is the
//! promise for that pad: downstream wiring records its peer up front and
//! the discovery callback resolves the promise exactly once, completing
//! the link whenever the two sides meet.

use parking_lot::Mutex;
use std::sync::Arc;

use super::engine::PadRef;
use super::error::{PipelineError, Result};

/// Result of a bind attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// This call resolved the pad.
    Bound,
    /// The pad was already resolved; the new target is ignored.
    AlreadyBound,
}

#[derive(Default)]
struct DeferredState {
    /// Discovered upstream src pad, set at most once.
    target: Option<PadRef>,
    /// Downstream sink pad recorded by the graph builder.
    peer: Option<PadRef>,
}

/// Placeholder output port resolved asynchronously by format discovery.
pub struct DeferredPad {
    name: String,
    state: Mutex<DeferredState>,
}

impl DeferredPad {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            state: Mutex::new(DeferredState::default()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record the downstream sink pad this output should feed. If the
    /// target is already resolved the engine-level link happens now,
    /// otherwise it happens when [`DeferredPad::bind`] resolves. A deferred
    /// pad feeds exactly one peer.
    pub fn connect(&self, peer: PadRef) -> Result<()> {
        let mut state = self.state.lock();
        if state.peer.is_some() {
            return Err(PipelineError::PadLink(format!(
                "deferred pad '{}' is already connected downstream",
                self.name
            )));
        }
        if let Some(target) = &state.target {
            target.link(&peer)?;
        }
        state.peer = Some(peer);
        Ok(())
    }

    /// Resolve the promise with the discovered pad. The first successful
    /// bind wins; later calls report [`BindOutcome::AlreadyBound`] and leave
    /// the resolved target untouched.
    pub fn bind(&self, target: PadRef) -> Result<BindOutcome> {
        let mut state = self.state.lock();
        if state.target.is_some() {
            return Ok(BindOutcome::AlreadyBound);
        }
        if let Some(peer) = &state.peer {
            target.link(peer)?;
        }
        state.target = Some(target);
        Ok(BindOutcome::Bound)
    }

    pub fn is_bound(&self) -> bool {
        self.state.lock().target.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().peer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::sim::SimEngine;
    use crate::core::engine::Engine;

    #[test]
    fn test_connect_then_bind_links() {
        let engine = SimEngine::new();
        let dec = engine.create_element("uridecodebin", "dec").unwrap();
        let mux = engine.create_element("nvstreammux", "mux").unwrap();
        let mux_sink = mux.request_pad("sink_0").unwrap();

        let out = DeferredPad::new("source-0.out");
        out.connect(mux_sink.clone()).unwrap();
        assert!(!out.is_bound());
        assert!(!mux_sink.is_linked());

        let src = dec.static_pad("src").unwrap();
        assert_eq!(out.bind(src).unwrap(), BindOutcome::Bound);
        assert!(mux_sink.is_linked());
    }

    #[test]
    fn test_bind_then_connect_links() {
        let engine = SimEngine::new();
        let dec = engine.create_element("uridecodebin", "dec").unwrap();
        let mux = engine.create_element("nvstreammux", "mux").unwrap();
        let mux_sink = mux.request_pad("sink_0").unwrap();

        let out = DeferredPad::new("source-0.out");
        out.bind(dec.static_pad("src").unwrap()).unwrap();
        out.connect(mux_sink.clone()).unwrap();
        assert!(mux_sink.is_linked());
    }

    #[test]
    fn test_first_bind_wins() {
        let engine = SimEngine::new();
        let a = engine.create_element("uridecodebin", "a").unwrap();
        let b = engine.create_element("uridecodebin", "b").unwrap();
        let mux = engine.create_element("nvstreammux", "mux").unwrap();
        let mux_sink = mux.request_pad("sink_0").unwrap();

        let out = DeferredPad::new("source-0.out");
        out.connect(mux_sink).unwrap();
        assert_eq!(
            out.bind(a.static_pad("src").unwrap()).unwrap(),
            BindOutcome::Bound
        );
        assert_eq!(
            out.bind(b.static_pad("src").unwrap()).unwrap(),
            BindOutcome::AlreadyBound
        );
        // Only the first target is linked into the multiplexer.
        assert_eq!(engine.links_into("mux").len(), 1);
        assert_eq!(engine.links_into("mux")[0].from_element, "a");
    }

    #[test]
    fn test_single_downstream_peer() {
        let engine = SimEngine::new();
        let mux = engine.create_element("nvstreammux", "mux").unwrap();
        let out = DeferredPad::new("source-0.out");
        out.connect(mux.request_pad("sink_0").unwrap()).unwrap();
        assert!(out.connect(mux.request_pad("sink_1").unwrap()).is_err());
    }
}
