//! Pretrained detector bundle download and extraction.
//!
//! Inference configs reference weights that ship separately as zip
//! archives. A [`ModelBundle`] names one of those archives and knows
//! where it unpacks relative to a model directory; fetching is
//! idempotent and skips bundles that are already on disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::error::Result;

/// One downloadable pretrained model archive.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    name: &'static str,
    variant: &'static str,
    url: &'static str,
}

impl ModelBundle {
    /// People and face detector.
    pub fn peoplenet() -> Self {
        Self {
            name: "peoplenet",
            variant: "tlt_peoplenet_pruned_v2.0",
            url: "https://api.ngc.nvidia.com/v2/models/nvidia/tlt_peoplenet/versions/pruned_v2.0/zip",
        }
    }

    /// Vehicle, person and sign detector tuned for dash cameras.
    pub fn dashcamnet() -> Self {
        Self {
            name: "dashcamnet",
            variant: "tlt_dashcamnet_pruned_v2.0",
            url: "https://api.ngc.nvidia.com/v2/models/nvidia/tao/dashcamnet/versions/pruned_v1.0/zip",
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Directory the archive unpacks into, under `model_dir`.
    pub fn extracted_dir(&self, model_dir: &Path) -> PathBuf {
        model_dir.join(self.name).join(self.variant)
    }

    /// Download and unpack the bundle under `model_dir`. Returns the
    /// extraction directory. A bundle that is already unpacked is left
    /// alone.
    pub fn fetch(&self, model_dir: &Path) -> Result<PathBuf> {
        let target = self.extracted_dir(model_dir);
        if target.is_dir() {
            tracing::info!(model = self.name, path = %target.display(), "model already present, skipping download");
            return Ok(target);
        }

        tracing::info!(
            model = self.name,
            url = self.url,
            "downloading pretrained weights, this may take a while"
        );
        let response = reqwest::blocking::get(self.url)?.error_for_status()?;
        let bytes = response.bytes()?;

        let archive_path = std::env::temp_dir().join(format!("{}.zip", self.variant));
        let mut file = fs::File::create(&archive_path)?;
        file.write_all(&bytes)?;

        fs::create_dir_all(&target)?;
        let mut archive = zip::ZipArchive::new(fs::File::open(&archive_path)?)?;
        archive.extract(&target)?;

        tracing::info!(model = self.name, path = %target.display(), "model extracted");
        Ok(target)
    }
}

/// All bundles the pipeline knows how to fetch.
pub fn known_bundles() -> Vec<ModelBundle> {
    vec![ModelBundle::peoplenet(), ModelBundle::dashcamnet()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracted_dir_is_name_then_variant() {
        let dir = ModelBundle::peoplenet().extracted_dir(Path::new("/opt/models"));
        assert_eq!(
            dir,
            PathBuf::from("/opt/models/peoplenet/tlt_peoplenet_pruned_v2.0")
        );
    }

    #[test]
    fn fetch_skips_existing_bundle() {
        let tmp = tempfile::tempdir().unwrap();
        let bundle = ModelBundle::dashcamnet();
        let target = bundle.extracted_dir(tmp.path());
        fs::create_dir_all(&target).unwrap();

        // No network touched: the pre-created directory short-circuits.
        let out = bundle.fetch(tmp.path()).unwrap();
        assert_eq!(out, target);
    }

    #[test]
    fn known_bundles_have_distinct_names() {
        let bundles = known_bundles();
        assert_eq!(bundles.len(), 2);
        assert_ne!(bundles[0].name(), bundles[1].name());
    }
}
