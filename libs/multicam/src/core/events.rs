//! Bus event dispatch.
//!
//! One watch per graph, evaluated synchronously on the bus thread. Error
//! and end-of-stream both terminate the run loop; the process exits the
//! same way in either case and callers see the difference only in the
//! logs. The watch always stays registered — termination goes through the
//! main loop so no in-flight message is dropped mid-shutdown.

use super::engine::{BusMessage, BusPoll, GraphRef};
use super::mainloop::MainLoop;

pub struct EventDispatcher;

impl EventDispatcher {
    /// Register the dispatch watch on the graph's bus.
    pub fn attach(graph: &GraphRef, main_loop: MainLoop) {
        graph.add_bus_watch(Box::new(move |message| {
            match message {
                BusMessage::Eos => {
                    tracing::info!("end-of-stream received, leaving run loop");
                    main_loop.quit();
                }
                BusMessage::Error {
                    source,
                    message,
                    debug: debug_info,
                } => {
                    tracing::error!(
                        element = %source,
                        debug = debug_info.as_deref().unwrap_or(""),
                        "engine error: {message}"
                    );
                    main_loop.quit();
                }
                // Everything else is somebody else's concern.
                _ => {}
            }
            BusPoll::Continue
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::sim::SimEngine;
    use crate::core::engine::Engine;

    fn attached() -> (std::sync::Arc<crate::core::engine::sim::SimGraph>, MainLoop) {
        let engine = SimEngine::new();
        let graph = engine.create_graph("g").unwrap();
        let main_loop = MainLoop::new();
        EventDispatcher::attach(&graph, main_loop.clone());
        (engine.graph("g").unwrap(), main_loop)
    }

    #[test]
    fn test_eos_quits_loop() {
        let (graph, main_loop) = attached();
        graph.post(BusMessage::Eos);
        assert!(main_loop.is_quit());
    }

    #[test]
    fn test_error_quits_loop() {
        let (graph, main_loop) = attached();
        graph.post_error("source-0", "could not read from resource", Some("rtsp timeout"));
        assert!(main_loop.is_quit());
    }

    #[test]
    fn test_warning_is_ignored_and_watch_kept() {
        let (graph, main_loop) = attached();
        graph.post_warning("mux", "buffers are late");
        assert!(!main_loop.is_quit());
        // The watch survives and still reacts afterwards.
        graph.post(BusMessage::Eos);
        assert!(main_loop.is_quit());
    }
}
