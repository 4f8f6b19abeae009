//! The built processing graph.

use std::path::{Path, PathBuf};

use super::engine::GraphRef;
use super::source::SourceAdapter;

/// Description of one active sink chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkKind {
    /// Live preview window.
    Display,
    /// Encode-to-file chain writing the timestamped container at `path`.
    Recording { path: PathBuf },
    /// No-op sink substituted when neither display nor recording is
    /// requested, so the branch point always has a consumer.
    Discard,
}

/// Immutable, fully wired graph. Topology never changes after
/// construction; the runtime only drives state transitions and drains the
/// bus. Sources are owned here and torn down with the graph.
pub struct Graph {
    inner: GraphRef,
    sources: Vec<SourceAdapter>,
    sinks: Vec<SinkKind>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("name", &self.inner.name())
            .field("num_streams", &self.sources.len())
            .field("sinks", &self.sinks)
            .finish()
    }
}

impl Graph {
    pub(crate) fn new(inner: GraphRef, sources: Vec<SourceAdapter>, sinks: Vec<SinkKind>) -> Self {
        Self {
            inner,
            sources,
            sinks,
        }
    }

    pub fn num_streams(&self) -> usize {
        self.sources.len()
    }

    pub fn sources(&self) -> &[SourceAdapter] {
        &self.sources
    }

    pub fn sinks(&self) -> &[SinkKind] {
        &self.sinks
    }

    /// Path of the recording sink, if one is active.
    pub fn recording_path(&self) -> Option<&Path> {
        self.sinks.iter().find_map(|s| match s {
            SinkKind::Recording { path } => Some(path.as_path()),
            _ => None,
        })
    }

    pub(crate) fn engine_graph(&self) -> &GraphRef {
        &self.inner
    }
}
