//! Named stage creation over the engine factory seam.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::engine::{ElementRef, Engine};
use super::error::Result;

/// Creates named opaque processing stages. A failed creation is fatal and
/// non-retryable: the capability is missing from the engine installation,
/// so callers abort graph construction and unwind whatever was built.
pub struct StageFactory {
    engine: Arc<dyn Engine>,
    sequence: AtomicUsize,
}

impl StageFactory {
    /// Wrap an engine handle, running its process-wide initialization first
    /// (a no-op on every call after the first).
    pub fn new(engine: Arc<dyn Engine>) -> Result<Self> {
        engine.ensure_init()?;
        Ok(Self {
            engine,
            sequence: AtomicUsize::new(0),
        })
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    /// Create a stage with a generated unique name (`<kind>-<n>`).
    pub fn create(&self, kind: &str) -> Result<ElementRef> {
        let n = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.create_named(kind, &format!("{kind}-{n}"))
    }

    /// Create a stage with an explicit name.
    pub fn create_named(&self, kind: &str, name: &str) -> Result<ElementRef> {
        let element = self.engine.create_element(kind, name)?;
        tracing::debug!(kind, name, "created element");
        Ok(element)
    }
}
