//! Remote stream source adapters.
//!
//! One adapter per configured URI. The adapter creates a container-opening
//! element and exposes a single [`DeferredPad`] output; the binding resolves
//! once format discovery surfaces a video pad with the required zero-copy
//! memory feature. Discovery is asynchronous relative to graph
//! construction, so the builder links the output into the multiplexer
//! before it is resolved.

use std::sync::Arc;

use super::engine::{ElementRef, PadRef, MEMORY_NVMM};
use super::error::Result;
use super::factory::StageFactory;
use super::kinds;
use super::ports::{BindOutcome, DeferredPad};

/// One configured stream: a decode-capable element plus its promised
/// output port. Torn down with the owning graph.
pub struct SourceAdapter {
    index: usize,
    uri: String,
    element: ElementRef,
    output: Arc<DeferredPad>,
}

impl SourceAdapter {
    pub fn new(factory: &StageFactory, index: usize, uri: &str) -> Result<Self> {
        let element = factory.create_named(kinds::URI_DECODE, &format!("source-{index}"))?;
        element.set_property("uri", uri.into())?;

        let output = DeferredPad::new(format!("source-{index}.out"));
        let hook_output = output.clone();
        element.connect_pad_added(Box::new(move |parent, pad| {
            on_pad_discovered(&hook_output, parent, pad);
        }));
        watch_nested_decoders(&element);

        tracing::debug!(index, uri, "created source adapter");
        Ok(Self {
            index,
            uri: uri.to_string(),
            element,
            output,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn element(&self) -> &ElementRef {
        &self.element
    }

    /// The adapter's uniform output port. Unbound until discovery.
    pub fn output(&self) -> &Arc<DeferredPad> {
        &self.output
    }
}

/// Discovery callback: bind the adapter output to the first video pad that
/// carries the zero-copy memory feature. A video pad without it is a
/// degraded condition — diagnostic only, the adapter stays unbound and the
/// pipeline keeps running.
fn on_pad_discovered(output: &Arc<DeferredPad>, parent: &ElementRef, pad: &PadRef) {
    let Some(caps) = pad.caps() else {
        tracing::debug!(
            element = %parent.name(),
            pad = %pad.name(),
            "discovered pad has no caps yet, ignoring"
        );
        return;
    };
    if !caps.is_video() {
        tracing::debug!(
            element = %parent.name(),
            media_type = %caps.media_type,
            "ignoring non-video pad"
        );
        return;
    }
    if !caps.has_feature(MEMORY_NVMM) {
        tracing::warn!(
            element = %parent.name(),
            pad = %pad.name(),
            "decoder did not negotiate {MEMORY_NVMM}; {} stays unbound",
            output.name()
        );
        return;
    }
    match output.bind(pad.clone()) {
        Ok(BindOutcome::Bound) => {
            tracing::info!(element = %parent.name(), output = %output.name(), "source output bound");
        }
        Ok(BindOutcome::AlreadyBound) => {
            tracing::debug!(output = %output.name(), "output already bound, ignoring later pad");
        }
        Err(e) => {
            tracing::warn!(output = %output.name(), error = %e, "failed to link discovered pad");
        }
    }
}

/// Containers may nest container-within-container: whenever a discovered
/// child is itself a decode container, register the same hook on it.
fn watch_nested_decoders(element: &ElementRef) {
    element.connect_child_added(Box::new(|parent, child| {
        if child.kind().contains(kinds::DECODE_CONTAINER_MARKER) {
            tracing::debug!(
                parent = %parent.name(),
                child = %child.name(),
                "nested decode container, re-subscribing discovery hook"
            );
            watch_nested_decoders(child);
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::sim::SimEngine;
    use crate::core::engine::{Engine, PadCaps};

    fn adapter(engine: &Arc<SimEngine>) -> SourceAdapter {
        let factory = StageFactory::new(engine.clone()).unwrap();
        SourceAdapter::new(&factory, 0, "rtsp://cam0/stream").unwrap()
    }

    #[test]
    fn test_uri_is_set_on_decoder() {
        let engine = SimEngine::new();
        let source = adapter(&engine);
        let uri = source.element().property("uri").unwrap();
        assert_eq!(uri, "rtsp://cam0/stream".into());
    }

    #[test]
    fn test_video_pad_with_memory_feature_binds() {
        let engine = SimEngine::new();
        let source = adapter(&engine);
        let dec = engine.element("source-0").unwrap();
        dec.emit_pad_added(PadCaps::new("video/x-raw").with_feature(MEMORY_NVMM));
        assert!(source.output().is_bound());
    }

    #[test]
    fn test_audio_pad_is_ignored() {
        let engine = SimEngine::new();
        let source = adapter(&engine);
        let dec = engine.element("source-0").unwrap();
        dec.emit_pad_added(PadCaps::new("audio/x-raw"));
        assert!(!source.output().is_bound());
    }

    #[test]
    fn test_video_pad_without_memory_feature_stays_unbound() {
        let engine = SimEngine::new();
        let source = adapter(&engine);
        let dec = engine.element("source-0").unwrap();
        dec.emit_pad_added(PadCaps::new("video/x-raw"));
        assert!(!source.output().is_bound());
        // A later, correctly negotiated pad still binds.
        dec.emit_pad_added(PadCaps::new("video/x-raw").with_feature(MEMORY_NVMM));
        assert!(source.output().is_bound());
    }

    #[test]
    fn test_nested_decoders_are_resubscribed() {
        let engine = SimEngine::new();
        let _source = adapter(&engine);
        let dec = engine.element("source-0").unwrap();

        let _ = engine
            .create_element("nvv4l2decodebin", "nested-0")
            .unwrap();
        let child = engine.element("nested-0").unwrap();
        dec.emit_child_added(&child);
        assert_eq!(child.child_added_hooks(), 1);

        // Container-within-container: the grandchild gets the hook too.
        let _ = engine.create_element("h264decodebin", "nested-1").unwrap();
        let grandchild = engine.element("nested-1").unwrap();
        child.emit_child_added(&grandchild);
        assert_eq!(grandchild.child_added_hooks(), 1);
    }

    #[test]
    fn test_non_decoder_children_are_not_watched() {
        let engine = SimEngine::new();
        let _source = adapter(&engine);
        let dec = engine.element("source-0").unwrap();
        let _ = engine.create_element("rtspsrc", "net-0").unwrap();
        let child = engine.element("net-0").unwrap();
        dec.emit_child_added(&child);
        assert_eq!(child.child_added_hooks(), 0);
    }
}
