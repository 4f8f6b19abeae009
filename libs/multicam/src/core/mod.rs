pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod factory;
pub mod graph;
pub mod kinds;
pub mod mainloop;
pub mod ports;
pub mod runtime;
pub mod source;

pub use builder::{GraphBuilder, GRAPH_NAME};
pub use config::PipelineConfig;
pub use engine::{
    BusMessage, BusPoll, Element, ElementRef, Engine, EngineGraph, EngineState, GraphRef, Pad,
    PadCaps, PadDirection, PadRef, PropertyValue, MEMORY_NVMM,
};
pub use error::{PipelineError, Result};
pub use events::EventDispatcher;
pub use factory::StageFactory;
pub use graph::{Graph, SinkKind};
pub use mainloop::MainLoop;
pub use ports::{BindOutcome, DeferredPad};
pub use runtime::{PipelineRuntime, PipelineState};
pub use source::SourceAdapter;
