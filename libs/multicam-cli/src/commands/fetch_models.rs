use std::path::Path;

use anyhow::{bail, Result};

use multicam::models::known_bundles;

/// Download and unpack pretrained detector bundles into `dir`.
pub fn run(dir: &Path, only: Option<&str>) -> Result<()> {
    let bundles = known_bundles();
    let selected: Vec<_> = match only {
        Some(name) => {
            let matched: Vec<_> = bundles.into_iter().filter(|b| b.name() == name).collect();
            if matched.is_empty() {
                bail!("unknown model '{name}'");
            }
            matched
        }
        None => bundles,
    };

    for bundle in &selected {
        let path = bundle.fetch(dir)?;
        println!("{}: {}", bundle.name(), path.display());
    }
    Ok(())
}
