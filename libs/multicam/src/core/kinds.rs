//! Engine capability kinds requested by the builder.
//!
//! The strings are opaque to this crate; the engine resolves them against
//! its installed plugin set.

/// Container opener with asynchronous format discovery.
pub const URI_DECODE: &str = "uridecodebin";
/// Batching multiplexer combining per-stream frames for shared inference.
pub const STREAM_MUX: &str = "nvstreammux";
/// Object-detection inference stage.
pub const INFERENCE: &str = "nvinfer";
/// Compositor tiling N streams into one view.
pub const TILER: &str = "nvmultistreamtiler";
/// Format converter.
pub const CONVERT: &str = "nvvideoconvert";
/// Detection overlay renderer.
pub const OSD: &str = "nvdsosd";
/// Transform feeding the EGL display sink.
pub const EGL_TRANSFORM: &str = "nvegltransform";
/// Live preview sink.
pub const EGL_SINK: &str = "nveglglessink";
/// Fan-out branch point.
pub const TEE: &str = "tee";
/// Per-sink isolation queue.
pub const QUEUE: &str = "queue";
/// Hardware H.264 encoder.
pub const H264_ENCODER: &str = "nvv4l2h264enc";
/// H.264 bitstream parser.
pub const H264_PARSER: &str = "h264parse";
/// Matroska container muxer.
pub const MATROSKA_MUX: &str = "matroskamux";
/// File writer sink.
pub const FILE_SINK: &str = "filesink";
/// No-op discard sink.
pub const FAKE_SINK: &str = "fakesink";

/// Substring identifying nested decode containers created during format
/// discovery; such children get the discovery hooks re-registered.
pub const DECODE_CONTAINER_MARKER: &str = "decodebin";
