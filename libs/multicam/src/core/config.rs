//! Pipeline configuration.
//!
//! One immutable record supplied at construction. Loadable from YAML or
//! JSON; every knob maps onto exactly one element property or wiring
//! decision in the graph builder.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::{PipelineError, Result};

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_interval() -> u32 {
    1
}

fn default_display() -> bool {
    true
}

/// Immutable pipeline configuration. `stream_uris` defines N and the
/// per-source wiring order; everything else parameterizes single stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Remote stream URIs, one source per entry, wired in order.
    pub stream_uris: Vec<String>,

    /// Frame width fed to the multiplexer and tiler.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Frame height fed to the multiplexer and tiler.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Model descriptor consumed by the inference stage.
    pub model_config: PathBuf,

    /// Run inference every k batches; 1 = every batch.
    #[serde(default = "default_interval")]
    pub inference_interval: u32,

    /// Record the composited output to a container file.
    #[serde(default)]
    pub record: bool,

    /// Folder the timestamped recording lands in. Required when `record`.
    #[serde(default)]
    pub record_dir: Option<PathBuf>,

    /// Show the composited output in a live preview window.
    #[serde(default = "default_display")]
    pub display: bool,
}

impl PipelineConfig {
    /// Load and validate a config file. The format is chosen by extension:
    /// `.json` parses as JSON, anything else as YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_str(&raw)
                .map_err(|e| PipelineError::Configuration(format!("{}: {e}", path.display())))?
        } else {
            serde_yaml::from_str(&raw)
                .map_err(|e| PipelineError::Configuration(format!("{}: {e}", path.display())))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stream_uris.is_empty() {
            return Err(PipelineError::Configuration(
                "at least one stream URI is required".to_string(),
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(PipelineError::Configuration(format!(
                "frame size {}x{} is invalid",
                self.width, self.height
            )));
        }
        if self.model_config.as_os_str().is_empty() {
            return Err(PipelineError::Configuration(
                "model descriptor path is required".to_string(),
            ));
        }
        if self.record && self.record_dir.is_none() {
            return Err(PipelineError::Configuration(
                "record is enabled but no record_dir is set".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of configured streams; defines the multiplexer batch size and
    /// the tiler geometry.
    pub fn num_streams(&self) -> usize {
        self.stream_uris.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> PipelineConfig {
        PipelineConfig {
            stream_uris: vec!["rtsp://cam0/stream".to_string()],
            width: 1920,
            height: 1080,
            model_config: PathBuf::from("models/peoplenet.txt"),
            inference_interval: 1,
            record: false,
            record_dir: None,
            display: true,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_empty_stream_list_rejected() {
        let mut c = base();
        c.stream_uris.clear();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let mut c = base();
        c.height = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_record_requires_folder() {
        let mut c = base();
        c.record = true;
        assert!(c.validate().is_err());
        c.record_dir = Some(PathBuf::from("/tmp"));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_yaml_defaults_apply() {
        let yaml = "stream_uris:\n  - rtsp://cam0/stream\nmodel_config: models/peoplenet.txt\n";
        let c: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(c.width, 1920);
        assert_eq!(c.height, 1080);
        assert_eq!(c.inference_interval, 1);
        assert!(!c.record);
        assert!(c.display);
        assert_eq!(c.num_streams(), 1);
    }
}
