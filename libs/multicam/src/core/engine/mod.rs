//! Seam to the external processing engine.
//!
//! The engine owns decode, inference, compositing, encode and rendering; this
//! crate only creates elements, wires pads, drives state transitions and
//! drains the bus. Everything the orchestration layer needs from the engine
//! is expressed through the object-safe traits in this module, so the core
//! never links against a media stack directly.

pub mod sim;

use std::sync::Arc;
use std::time::Duration;

use super::error::Result;

/// Memory feature a discovered video pad must carry before a source adapter
/// binds to it. Pads without it decode into host memory and are rejected.
pub const MEMORY_NVMM: &str = "memory:NVMM";

pub type ElementRef = Arc<dyn Element>;
pub type PadRef = Arc<dyn Pad>;
pub type GraphRef = Arc<dyn EngineGraph>;

/// Hook invoked when an element exposes a new output pad at runtime.
/// Arguments are the element and the freshly created pad.
pub type PadAddedHook = Box<dyn Fn(&ElementRef, &PadRef) + Send + Sync>;

/// Hook invoked when a container element creates a nested sub-element.
/// Arguments are the parent and the new child.
pub type ChildAddedHook = Box<dyn Fn(&ElementRef, &ElementRef) + Send + Sync>;

/// Bus watch callback. Returning [`BusPoll::Remove`] unregisters the watch;
/// delivery is serial, the callback never runs concurrently with itself.
pub type BusWatch = Box<dyn FnMut(&BusMessage) -> BusPoll + Send>;

/// Value stored in an element's write-once property table.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Str(String),
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for PropertyValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        Self::UInt(v as u64)
    }
}

impl From<usize> for PropertyValue {
    fn from(v: usize) -> Self {
        Self::UInt(v as u64)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Direction of a pad relative to its owning element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadDirection {
    /// Data flows out of the element.
    Src,
    /// Data flows into the element.
    Sink,
}

/// Negotiated capabilities of a pad: media type plus memory features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadCaps {
    pub media_type: String,
    pub features: Vec<String>,
}

impl PadCaps {
    pub fn new(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            features: Vec::new(),
        }
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }

    pub fn is_video(&self) -> bool {
        self.media_type.starts_with("video")
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// Engine-side graph state. The controller-level lifecycle state machine
/// lives in `core::runtime`; this is what the engine reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Null,
    Paused,
    Playing,
}

/// Structured message drained from the graph's bus.
#[derive(Debug, Clone)]
pub enum BusMessage {
    /// All sources reached end-of-stream.
    Eos,
    /// Engine-reported error from a named element.
    Error {
        source: String,
        message: String,
        debug: Option<String>,
    },
    /// Non-fatal engine diagnostic. Ignored by the dispatcher.
    Warning { source: String, message: String },
}

/// Return value of a bus watch callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusPoll {
    Continue,
    Remove,
}

/// Typed connection endpoint on an element.
pub trait Pad: Send + Sync {
    fn name(&self) -> String;

    /// Name of the element this pad belongs to. A pad belongs to exactly
    /// one element for its whole lifetime.
    fn owner(&self) -> String;

    fn direction(&self) -> PadDirection;

    /// Negotiated caps, if negotiation has happened yet.
    fn caps(&self) -> Option<PadCaps>;

    /// Link this src pad to a downstream sink pad. Links are one-to-one:
    /// a second link on either endpoint fails.
    fn link(&self, peer: &PadRef) -> Result<()>;

    fn is_linked(&self) -> bool;
}

/// Opaque handle to one external processing stage.
pub trait Element: Send + Sync {
    fn name(&self) -> String;
    fn kind(&self) -> String;

    /// Set a creation-time property. The table is write-once: setting the
    /// same key twice is an error.
    fn set_property(&self, key: &str, value: PropertyValue) -> Result<()>;

    fn property(&self, key: &str) -> Option<PropertyValue>;

    /// Fixed pad that exists for the element's whole lifetime.
    fn static_pad(&self, name: &str) -> Option<PadRef>;

    /// On-demand pad (e.g. `sink_0` on a multiplexer, `src_1` on a branch).
    fn request_pad(&self, name: &str) -> Result<PadRef>;

    /// Convenience src→sink link between this element's static `src` pad and
    /// the downstream element's static `sink` pad.
    fn link(&self, downstream: &ElementRef) -> Result<()>;

    fn connect_pad_added(&self, hook: PadAddedHook);
    fn connect_child_added(&self, hook: ChildAddedHook);
}

impl std::fmt::Debug for dyn Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

/// The engine-owned container the elements live in. Topology changes stop
/// once the orchestration layer hands the graph to the runtime.
pub trait EngineGraph: Send + Sync {
    fn name(&self) -> String;

    fn add(&self, element: &ElementRef) -> Result<()>;

    /// Request a state transition. Completion may be asynchronous; observe
    /// progress through [`EngineGraph::state`].
    fn set_state(&self, state: EngineState) -> Result<()>;

    /// Bounded-wait query of the current state. Never blocks longer than
    /// `timeout`.
    fn state(&self, timeout: Duration) -> EngineState;

    /// Ask every source to drain: the engine posts [`BusMessage::Eos`] once
    /// in-flight buffers have flushed (best effort).
    fn send_eos(&self);

    fn add_bus_watch(&self, watch: BusWatch);
}

/// Factory surface of the external engine.
pub trait Engine: Send + Sync {
    /// Process-wide engine initialization. Idempotent: every call after the
    /// first is a no-op.
    fn ensure_init(&self) -> Result<()>;

    fn create_element(&self, kind: &str, name: &str) -> Result<ElementRef>;

    fn create_graph(&self, name: &str) -> Result<GraphRef>;
}
