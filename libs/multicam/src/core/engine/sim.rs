//! In-process simulation engine.
//!
//! Implements the full engine seam with recorded topology, immediate (or
//! deliberately deferred) state transitions and a serial bus. It moves no
//! media: elements are name/kind/property records, links are entries in a
//! table. That is exactly what the orchestration core needs to be exercised
//! against — the test suite and the CLI's dry-run path both build real
//! graphs on top of it.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use super::{
    BusMessage, BusPoll, BusWatch, ChildAddedHook, Element, ElementRef, Engine, EngineGraph,
    EngineState, GraphRef, Pad, PadAddedHook, PadCaps, PadDirection, PadRef, PropertyValue,
};
use crate::core::error::{PipelineError, Result};

/// One recorded pad-to-pad link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimLink {
    pub from_element: String,
    pub from_pad: String,
    pub to_element: String,
    pub to_pad: String,
}

/// Simulation engine. Create with [`SimEngine::new`]; the same `Arc` serves
/// as the factory handle and as the test inspection surface.
pub struct SimEngine {
    self_ref: Weak<SimEngine>,
    initialized: AtomicBool,
    init_runs: AtomicU32,
    unavailable: Mutex<HashSet<String>>,
    elements: Mutex<HashMap<String, Arc<SimElement>>>,
    graphs: Mutex<HashMap<String, Arc<SimGraph>>>,
    links: Mutex<Vec<SimLink>>,
}

impl SimEngine {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            self_ref: weak.clone(),
            initialized: AtomicBool::new(false),
            init_runs: AtomicU32::new(0),
            unavailable: Mutex::new(HashSet::new()),
            elements: Mutex::new(HashMap::new()),
            graphs: Mutex::new(HashMap::new()),
            links: Mutex::new(Vec::new()),
        })
    }

    /// Mark an element kind as not installed: creation of it fails the way
    /// a missing engine plugin would.
    pub fn make_unavailable(&self, kind: &str) {
        self.unavailable.lock().insert(kind.to_string());
    }

    /// Number of times process-wide initialization actually ran (0 or 1).
    pub fn init_runs(&self) -> u32 {
        self.init_runs.load(Ordering::SeqCst)
    }

    /// Look up an element by name.
    pub fn element(&self, name: &str) -> Option<Arc<SimElement>> {
        self.elements.lock().get(name).cloned()
    }

    /// Elements of a kind, in creation order is not guaranteed.
    pub fn elements_of_kind(&self, kind: &str) -> Vec<Arc<SimElement>> {
        self.elements
            .lock()
            .values()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    /// Look up a graph by name.
    pub fn graph(&self, name: &str) -> Option<Arc<SimGraph>> {
        self.graphs.lock().get(name).cloned()
    }

    /// Snapshot of every recorded link.
    pub fn links(&self) -> Vec<SimLink> {
        self.links.lock().clone()
    }

    /// Links terminating at the named element.
    pub fn links_into(&self, element: &str) -> Vec<SimLink> {
        self.links
            .lock()
            .iter()
            .filter(|l| l.to_element == element)
            .cloned()
            .collect()
    }

    /// Links originating at the named element.
    pub fn links_from(&self, element: &str) -> Vec<SimLink> {
        self.links
            .lock()
            .iter()
            .filter(|l| l.from_element == element)
            .cloned()
            .collect()
    }

    fn record_link(&self, link: SimLink) -> Result<()> {
        let mut links = self.links.lock();
        if links
            .iter()
            .any(|l| l.to_element == link.to_element && l.to_pad == link.to_pad)
        {
            return Err(PipelineError::PadLink(format!(
                "sink pad {}:{} already has an incoming link",
                link.to_element, link.to_pad
            )));
        }
        if links
            .iter()
            .any(|l| l.from_element == link.from_element && l.from_pad == link.from_pad)
        {
            return Err(PipelineError::PadLink(format!(
                "src pad {}:{} is already linked",
                link.from_element, link.from_pad
            )));
        }
        tracing::trace!(
            "link {}:{} -> {}:{}",
            link.from_element,
            link.from_pad,
            link.to_element,
            link.to_pad
        );
        links.push(link);
        Ok(())
    }

    fn pad_is_linked(&self, element: &str, pad: &str) -> bool {
        self.links.lock().iter().any(|l| {
            (l.from_element == element && l.from_pad == pad)
                || (l.to_element == element && l.to_pad == pad)
        })
    }
}

impl Engine for SimEngine {
    fn ensure_init(&self) -> Result<()> {
        if !self.initialized.swap(true, Ordering::SeqCst) {
            self.init_runs.fetch_add(1, Ordering::SeqCst);
            tracing::debug!("simulation engine initialized");
        }
        Ok(())
    }

    fn create_element(&self, kind: &str, name: &str) -> Result<ElementRef> {
        if self.unavailable.lock().contains(kind) {
            return Err(PipelineError::ElementCreation {
                kind: kind.to_string(),
                reason: "no such element factory".to_string(),
            });
        }
        let mut elements = self.elements.lock();
        if elements.contains_key(name) {
            return Err(PipelineError::ElementCreation {
                kind: kind.to_string(),
                reason: format!("element name '{name}' already in use"),
            });
        }
        let element = Arc::new(SimElement {
            engine: self.self_ref.clone(),
            name: name.to_string(),
            kind: kind.to_string(),
            props: Mutex::new(HashMap::new()),
            pads: Mutex::new(Vec::new()),
            pad_added: Mutex::new(Vec::new()),
            child_added: Mutex::new(Vec::new()),
        });
        elements.insert(name.to_string(), element.clone());
        Ok(element)
    }

    fn create_graph(&self, name: &str) -> Result<GraphRef> {
        let mut graphs = self.graphs.lock();
        if graphs.contains_key(name) {
            return Err(PipelineError::Graph(format!(
                "graph '{name}' already exists"
            )));
        }
        let graph = Arc::new(SimGraph {
            name: name.to_string(),
            members: Mutex::new(Vec::new()),
            state: Mutex::new(EngineState::Null),
            pending_playing_polls: AtomicU32::new(0),
            watchers: Mutex::new(Vec::new()),
        });
        graphs.insert(name.to_string(), graph.clone());
        Ok(graph)
    }
}

/// Simulated processing element.
pub struct SimElement {
    engine: Weak<SimEngine>,
    name: String,
    kind: String,
    props: Mutex<HashMap<String, PropertyValue>>,
    pads: Mutex<Vec<Arc<SimPad>>>,
    pad_added: Mutex<Vec<PadAddedHook>>,
    child_added: Mutex<Vec<ChildAddedHook>>,
}

impl SimElement {
    fn make_pad(&self, name: &str, direction: PadDirection) -> Arc<SimPad> {
        let pad = Arc::new(SimPad {
            engine: self.engine.clone(),
            owner: self.name.clone(),
            name: name.to_string(),
            direction,
            caps: Mutex::new(None),
        });
        self.pads.lock().push(pad.clone());
        pad
    }

    fn find_pad(&self, name: &str) -> Option<Arc<SimPad>> {
        self.pads.lock().iter().find(|p| p.name == name).cloned()
    }

    /// All pads created so far.
    pub fn pads(&self) -> Vec<Arc<SimPad>> {
        self.pads.lock().clone()
    }

    /// Number of registered pad-added hooks.
    pub fn pad_added_hooks(&self) -> usize {
        self.pad_added.lock().len()
    }

    /// Number of registered child-added hooks.
    pub fn child_added_hooks(&self) -> usize {
        self.child_added.lock().len()
    }

    /// Expose a new src pad with the given caps and fire the pad-added
    /// hooks, the way format discovery does at runtime.
    pub fn emit_pad_added(self: &Arc<Self>, caps: PadCaps) -> PadRef {
        let index = self.pads.lock().len();
        let pad = self.make_pad(&format!("src_{index}"), PadDirection::Src);
        *pad.caps.lock() = Some(caps);
        let element: ElementRef = self.clone();
        let pad_ref: PadRef = pad.clone();
        for hook in self.pad_added.lock().iter() {
            hook(&element, &pad_ref);
        }
        pad_ref
    }

    /// Announce a nested sub-element and fire the child-added hooks.
    pub fn emit_child_added(self: &Arc<Self>, child: &Arc<SimElement>) {
        let parent: ElementRef = self.clone();
        let child_ref: ElementRef = child.clone();
        for hook in self.child_added.lock().iter() {
            hook(&parent, &child_ref);
        }
    }
}

impl Element for SimElement {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> String {
        self.kind.clone()
    }

    fn set_property(&self, key: &str, value: PropertyValue) -> Result<()> {
        let mut props = self.props.lock();
        if props.contains_key(key) {
            return Err(PipelineError::Graph(format!(
                "property '{key}' on '{}' is write-once",
                self.name
            )));
        }
        props.insert(key.to_string(), value);
        Ok(())
    }

    fn property(&self, key: &str) -> Option<PropertyValue> {
        self.props.lock().get(key).cloned()
    }

    fn static_pad(&self, name: &str) -> Option<PadRef> {
        if let Some(pad) = self.find_pad(name) {
            return Some(pad);
        }
        // Every simulated element carries the two canonical static pads.
        match name {
            "src" => Some(self.make_pad("src", PadDirection::Src) as PadRef),
            "sink" => Some(self.make_pad("sink", PadDirection::Sink) as PadRef),
            _ => None,
        }
    }

    fn request_pad(&self, name: &str) -> Result<PadRef> {
        if self.find_pad(name).is_some() {
            return Err(PipelineError::PadLink(format!(
                "pad '{name}' on '{}' already requested",
                self.name
            )));
        }
        let direction = if name.starts_with("src") {
            PadDirection::Src
        } else {
            PadDirection::Sink
        };
        Ok(self.make_pad(name, direction))
    }

    fn link(&self, downstream: &ElementRef) -> Result<()> {
        let src = self.static_pad("src").ok_or_else(|| {
            PipelineError::PadLink(format!("'{}' has no static src pad", self.name))
        })?;
        let sink = downstream.static_pad("sink").ok_or_else(|| {
            PipelineError::PadLink(format!("'{}' has no static sink pad", downstream.name()))
        })?;
        src.link(&sink)
    }

    fn connect_pad_added(&self, hook: PadAddedHook) {
        self.pad_added.lock().push(hook);
    }

    fn connect_child_added(&self, hook: ChildAddedHook) {
        self.child_added.lock().push(hook);
    }
}

/// Simulated pad. Link state lives in the engine's link table.
pub struct SimPad {
    engine: Weak<SimEngine>,
    owner: String,
    name: String,
    direction: PadDirection,
    caps: Mutex<Option<PadCaps>>,
}

impl Pad for SimPad {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn owner(&self) -> String {
        self.owner.clone()
    }

    fn direction(&self) -> PadDirection {
        self.direction
    }

    fn caps(&self) -> Option<PadCaps> {
        self.caps.lock().clone()
    }

    fn link(&self, peer: &PadRef) -> Result<()> {
        if self.direction != PadDirection::Src {
            return Err(PipelineError::PadLink(format!(
                "{}:{} is not a src pad",
                self.owner, self.name
            )));
        }
        if peer.direction() != PadDirection::Sink {
            return Err(PipelineError::PadLink(format!(
                "{}:{} is not a sink pad",
                peer.owner(),
                peer.name()
            )));
        }
        let engine = self
            .engine
            .upgrade()
            .ok_or_else(|| PipelineError::Graph("engine dropped".to_string()))?;
        engine.record_link(SimLink {
            from_element: self.owner.clone(),
            from_pad: self.name.clone(),
            to_element: peer.owner(),
            to_pad: peer.name(),
        })
    }

    fn is_linked(&self) -> bool {
        self.engine
            .upgrade()
            .map(|e| e.pad_is_linked(&self.owner, &self.name))
            .unwrap_or(false)
    }
}

/// Simulated graph container with a serial bus.
pub struct SimGraph {
    name: String,
    members: Mutex<Vec<ElementRef>>,
    state: Mutex<EngineState>,
    pending_playing_polls: AtomicU32,
    watchers: Mutex<Vec<BusWatch>>,
}

impl SimGraph {
    /// Member elements in insertion order.
    pub fn members(&self) -> Vec<ElementRef> {
        self.members.lock().clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.lock().iter().any(|e| e.name() == name)
    }

    /// Report `Paused` for the next `polls` state queries after a Playing
    /// transition, then settle on `Playing`. Exercises readiness barriers.
    pub fn defer_playing(&self, polls: u32) {
        self.pending_playing_polls.store(polls, Ordering::SeqCst);
    }

    /// Post a message on the bus. Delivery is serial: watchers run one at a
    /// time on the caller's thread, and a watcher returning
    /// [`BusPoll::Remove`] is dropped.
    pub fn post(&self, message: BusMessage) {
        let mut watchers = self.watchers.lock();
        watchers.retain_mut(|watch| watch(&message) == BusPoll::Continue);
    }

    pub fn post_error(&self, source: &str, message: &str, debug: Option<&str>) {
        self.post(BusMessage::Error {
            source: source.to_string(),
            message: message.to_string(),
            debug: debug.map(str::to_string),
        });
    }

    pub fn post_warning(&self, source: &str, message: &str) {
        self.post(BusMessage::Warning {
            source: source.to_string(),
            message: message.to_string(),
        });
    }
}

impl EngineGraph for SimGraph {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn add(&self, element: &ElementRef) -> Result<()> {
        let mut members = self.members.lock();
        if members.iter().any(|e| e.name() == element.name()) {
            return Err(PipelineError::Graph(format!(
                "element '{}' already in graph '{}'",
                element.name(),
                self.name
            )));
        }
        members.push(element.clone());
        Ok(())
    }

    fn set_state(&self, state: EngineState) -> Result<()> {
        *self.state.lock() = state;
        Ok(())
    }

    fn state(&self, _timeout: Duration) -> EngineState {
        let current = *self.state.lock();
        if current == EngineState::Playing {
            // Deferred-readiness mode: burn one poll, report Paused.
            let pending = self.pending_playing_polls.load(Ordering::SeqCst);
            if pending > 0 {
                self.pending_playing_polls.store(pending - 1, Ordering::SeqCst);
                return EngineState::Paused;
            }
        }
        current
    }

    fn send_eos(&self) {
        tracing::debug!(graph = %self.name, "end-of-stream requested");
        self.post(BusMessage::Eos);
    }

    fn add_bus_watch(&self, watch: BusWatch) {
        self.watchers.lock().push(watch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::MEMORY_NVMM;

    fn engine() -> Arc<SimEngine> {
        SimEngine::new()
    }

    #[test]
    fn test_init_is_idempotent() {
        let e = engine();
        e.ensure_init().unwrap();
        e.ensure_init().unwrap();
        assert_eq!(e.init_runs(), 1);
    }

    #[test]
    fn test_unavailable_kind_fails_creation() {
        let e = engine();
        e.make_unavailable("nvinfer");
        let err = e.create_element("nvinfer", "infer").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ElementCreation { ref kind, .. } if kind == "nvinfer"
        ));
    }

    #[test]
    fn test_properties_are_write_once() {
        let e = engine();
        let el = e.create_element("queue", "q0").unwrap();
        el.set_property("leaky", PropertyValue::from(2u32)).unwrap();
        assert!(el.set_property("leaky", PropertyValue::from(1u32)).is_err());
        assert_eq!(el.property("leaky"), Some(PropertyValue::UInt(2)));
    }

    #[test]
    fn test_sink_pad_accepts_one_incoming_link() {
        let e = engine();
        let a = e.create_element("queue", "a").unwrap();
        let b = e.create_element("queue", "b").unwrap();
        let c = e.create_element("fakesink", "c").unwrap();
        a.link(&c).unwrap();
        let err = b.link(&c).unwrap_err();
        assert!(matches!(err, PipelineError::PadLink(_)));
        assert_eq!(e.links_into("c").len(), 1);
    }

    #[test]
    fn test_src_pad_accepts_one_outgoing_link() {
        let e = engine();
        let a = e.create_element("tee", "a").unwrap();
        let b = e.create_element("queue", "b").unwrap();
        let c = e.create_element("queue", "c").unwrap();
        a.link(&b).unwrap();
        let err = a.link(&c).unwrap_err();
        assert!(matches!(err, PipelineError::PadLink(_)));
        assert_eq!(e.links_from("a").len(), 1);
    }

    #[test]
    fn test_link_direction_enforced() {
        let e = engine();
        let a = e.create_element("queue", "a").unwrap();
        let b = e.create_element("queue", "b").unwrap();
        let a_sink = a.static_pad("sink").unwrap();
        let b_sink = b.static_pad("sink").unwrap();
        assert!(a_sink.link(&b_sink).is_err());
    }

    #[test]
    fn test_pad_added_hook_fires_with_caps() {
        let e = engine();
        let dec = e.create_element("uridecodebin", "dec").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        dec.connect_pad_added(Box::new(move |_el, pad| {
            seen_clone.lock().push(pad.caps());
        }));
        let dec = e.element("dec").unwrap();
        dec.emit_pad_added(PadCaps::new("video/x-raw").with_feature(MEMORY_NVMM));
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].as_ref().unwrap().has_feature(MEMORY_NVMM));
    }

    #[test]
    fn test_bus_watch_remove_is_honored() {
        let e = engine();
        let graph = e.create_graph("g").unwrap();
        let sim = e.graph("g").unwrap();
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = count.clone();
        graph.add_bus_watch(Box::new(move |_msg| {
            count_clone.fetch_add(1, Ordering::SeqCst);
            BusPoll::Remove
        }));
        sim.post(BusMessage::Eos);
        sim.post(BusMessage::Eos);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_defer_playing_reports_paused_first() {
        let e = engine();
        let graph = e.create_graph("g").unwrap();
        let sim = e.graph("g").unwrap();
        sim.defer_playing(2);
        graph.set_state(EngineState::Playing).unwrap();
        let t = Duration::from_millis(1);
        assert_eq!(graph.state(t), EngineState::Paused);
        assert_eq!(graph.state(t), EngineState::Paused);
        assert_eq!(graph.state(t), EngineState::Playing);
    }
}
