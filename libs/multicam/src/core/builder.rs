//! Graph construction.
//!
//! Assembles N source adapters, the shared batching/inference/compositing
//! trunk, and the requested sink chains into one immutable [`Graph`].
//! Construction is deterministic and all-or-nothing: a creation or wiring
//! failure aborts and everything built so far is dropped.

use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;

use super::config::PipelineConfig;
use super::engine::{ElementRef, Engine, PadRef, PropertyValue};
use super::error::{PipelineError, Result};
use super::factory::StageFactory;
use super::graph::{Graph, SinkKind};
use super::kinds;
use super::source::SourceAdapter;

/// Name of the engine graph container.
pub const GRAPH_NAME: &str = "multicam";

/// Bound on batch-formation latency, in microseconds.
const BATCHED_PUSH_TIMEOUT_US: i64 = 4_000_000;

/// Recording encoder bitrate, bits per second.
const RECORD_BITRATE: u64 = 20_000_000;

/// At most this many tiles per row.
const MAX_TILE_COLUMNS: usize = 3;

/// One sink chain: its description, the element wiring enters through, and
/// every element the chain contributed to the graph.
struct SinkChain {
    kind: SinkKind,
    entry: ElementRef,
    elements: Vec<ElementRef>,
}

pub struct GraphBuilder {
    factory: StageFactory,
    config: PipelineConfig,
}

impl GraphBuilder {
    pub fn new(engine: Arc<dyn Engine>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            factory: StageFactory::new(engine)?,
            config,
        })
    }

    /// Build the fully wired graph.
    pub fn build(self) -> Result<Graph> {
        let n = self.config.num_streams();
        let graph = self.factory.engine().create_graph(GRAPH_NAME)?;

        // Sources, in configuration order.
        let mut sources = Vec::with_capacity(n);
        for (index, uri) in self.config.stream_uris.iter().enumerate() {
            sources.push(SourceAdapter::new(&self.factory, index, uri)?);
        }

        // Batching multiplexer: one inbound link per source, batch = N.
        let mux = self.factory.create_named(kinds::STREAM_MUX, "mux")?;
        mux.set_property("live-source", true.into())?;
        mux.set_property("width", self.config.width.into())?;
        mux.set_property("height", self.config.height.into())?;
        mux.set_property("batch-size", n.into())?;
        mux.set_property(
            "batched-push-timeout",
            PropertyValue::Int(BATCHED_PUSH_TIMEOUT_US),
        )?;

        // Shared inference over the batched frames.
        let infer = self.factory.create_named(kinds::INFERENCE, "infer")?;
        infer.set_property(
            "config-file-path",
            self.config.model_config.display().to_string().into(),
        )?;
        infer.set_property("batch-size", n.into())?;
        infer.set_property("interval", self.config.inference_interval.into())?;

        // Tiler: at most three tiles per row; the row count uses truncating
        // division (N=4 gives columns=3, rows=1).
        let tiler = self.factory.create_named(kinds::TILER, "tiler")?;
        let columns = n.min(MAX_TILE_COLUMNS);
        let rows = n / columns;
        tiler.set_property("rows", rows.into())?;
        tiler.set_property("columns", columns.into())?;
        tiler.set_property("width", self.config.width.into())?;
        tiler.set_property("height", self.config.height.into())?;

        let convert = self.factory.create_named(kinds::CONVERT, "convert")?;
        let osd = self.factory.create_named(kinds::OSD, "osd")?;

        // Branch point plus the transform shared by every sink chain.
        let tee = self.factory.create_named(kinds::TEE, "tee")?;
        let transform = self.factory.create_named(kinds::EGL_TRANSFORM, "transform")?;

        let mut sinks: Vec<SinkChain> = Vec::new();
        if self.config.record {
            // Presence of record_dir is checked by validate().
            let dir = self.config.record_dir.clone().unwrap_or_default();
            sinks.push(self.make_recording_chain(dir)?);
        }
        if self.config.display {
            sinks.push(self.make_display_chain()?);
        }
        if sinks.is_empty() {
            // Never leave the branch without a consumer: an unconsumed
            // branch output would backpressure-stall the whole trunk.
            sinks.push(self.make_discard_chain()?);
        }

        // Everything joins the graph before wiring starts.
        for source in &sources {
            graph.add(source.element())?;
        }
        for element in [&mux, &infer, &tiler, &convert, &osd, &tee, &transform] {
            graph.add(element)?;
        }
        for chain in &sinks {
            for element in &chain.elements {
                graph.add(element)?;
            }
        }

        // Source[i].out -> Mux.sink_i, tolerating not-yet-resolved outputs.
        for (index, source) in sources.iter().enumerate() {
            let mux_sink = mux.request_pad(&format!("sink_{index}"))?;
            source.output().connect(mux_sink)?;
        }

        // Shared trunk.
        mux.link(&infer)?;
        infer.link(&tiler)?;
        tiler.link(&convert)?;
        convert.link(&osd)?;
        osd.link(&tee)?;

        // Per-sink isolation queues decouple each sink's consumption rate
        // from the trunk. The transform tail is shared across chains; with
        // more than one sink the later tail links are refused by the engine
        // and the first chain keeps the transform, so these two links are
        // advisory rather than checked.
        for (index, chain) in sinks.iter().enumerate() {
            let queue = self.factory.create(kinds::QUEUE)?;
            graph.add(&queue)?;
            let tee_src = tee.request_pad(&format!("src_{index}"))?;
            let queue_sink = static_sink_pad(&queue)?;
            tee_src.link(&queue_sink)?;
            link_tail(&queue, &transform);
            link_tail(&transform, &chain.entry);
        }

        let sink_kinds: Vec<SinkKind> = sinks.into_iter().map(|c| c.kind).collect();
        tracing::info!(
            streams = n,
            sinks = ?sink_kinds,
            "graph built"
        );
        Ok(Graph::new(graph, sources, sink_kinds))
    }

    /// Flattened encode-to-file chain:
    /// convert -> H.264 encoder -> parser -> matroska mux -> file sink.
    fn make_recording_chain(&self, dir: PathBuf) -> Result<SinkChain> {
        let timestamp = Local::now().format("%Y-%m-%dT%H-%M-%S%z");
        let path = dir.join(format!("multicam-{timestamp}.mkv"));

        let convert = self.factory.create_named(kinds::CONVERT, "record-convert")?;
        let encoder = self.factory.create_named(kinds::H264_ENCODER, "record-encoder")?;
        encoder.set_property("bitrate", PropertyValue::UInt(RECORD_BITRATE))?;
        encoder.set_property("maxperf-enable", true.into())?;
        let parser = self.factory.create_named(kinds::H264_PARSER, "record-parser")?;
        let muxer = self.factory.create_named(kinds::MATROSKA_MUX, "record-mux")?;
        let filesink = self.factory.create_named(kinds::FILE_SINK, "record-sink")?;
        filesink.set_property("sync", false.into())?;
        filesink.set_property("location", path.display().to_string().into())?;

        convert.link(&encoder)?;
        encoder.link(&parser)?;
        parser.link(&muxer)?;
        muxer.link(&filesink)?;

        tracing::info!(path = %path.display(), "recording sink enabled");
        Ok(SinkChain {
            kind: SinkKind::Recording { path },
            entry: convert.clone(),
            elements: vec![convert, encoder, parser, muxer, filesink],
        })
    }

    /// Live preview sink: no forced sync, no quality-of-service drops.
    fn make_display_chain(&self) -> Result<SinkChain> {
        let renderer = self.factory.create_named(kinds::EGL_SINK, "display-sink")?;
        renderer.set_property("sync", false.into())?;
        renderer.set_property("qos", false.into())?;
        Ok(SinkChain {
            kind: SinkKind::Display,
            entry: renderer.clone(),
            elements: vec![renderer],
        })
    }

    fn make_discard_chain(&self) -> Result<SinkChain> {
        let sink = self.factory.create_named(kinds::FAKE_SINK, "discard-sink")?;
        tracing::debug!("no display or recording requested, terminating branch with discard sink");
        Ok(SinkChain {
            kind: SinkKind::Discard,
            entry: sink.clone(),
            elements: vec![sink],
        })
    }
}

fn static_sink_pad(element: &ElementRef) -> Result<PadRef> {
    element.static_pad("sink").ok_or_else(|| {
        PipelineError::PadLink(format!("'{}' has no static sink pad", element.name()))
    })
}

/// Link the shared sink tail. Refusals here are expected once the first
/// chain claimed the transform; they are logged and ignored.
fn link_tail(upstream: &ElementRef, downstream: &ElementRef) {
    if let Err(e) = upstream.link(downstream) {
        tracing::warn!(
            from = %upstream.name(),
            to = %downstream.name(),
            error = %e,
            "sink tail link refused"
        );
    }
}
