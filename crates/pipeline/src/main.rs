//! Volume Feature Pipeline - Main Entry Point
//!
//! Usage: `volume-pipeline [settings.toml]`. Prints one JSON line per feature
//! kind with the transformer name and its output width.

use std::path::PathBuf;

use pipeline::{build_transformer, init_logging, FeatureKind, Settings};
use serde_json::json;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::load(path.as_deref())?;
    init_logging(&settings.logging)?;

    info!("=== Volume Feature Pipeline v{} ===", env!("CARGO_PKG_VERSION"));
    if let Some(dir) = &settings.diagnostics_dir {
        info!(dir = %dir.display(), "kernel estimator diagnostics enabled");
    }

    for kind in FeatureKind::ALL {
        let transformer = build_transformer(&settings, kind)?;
        let line = json!({
            "kind": kind,
            "transformer": transformer.name(),
            "output_width": transformer.output_width(),
        });
        println!("{line}");
    }

    Ok(())
}
