use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Engine initialization failed: {0}")]
    EngineInit(String),

    #[error("Failed to create element '{kind}': {reason}")]
    ElementCreation { kind: String, reason: String },

    #[error("Pad link error: {0}")]
    PadLink(String),

    #[error("Pipeline graph error: {0}")]
    Graph(String),

    #[error("State change failed: {0}")]
    StateChange(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Model download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("Model archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
