//! Runs every export listed in a JSON manifest.
//!
//! ```text
//! rig_exporter path/to/manifest.json
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;

use anyhow::{Context, bail};
use rigport::{ExportManifest, run_manifest};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        bail!("usage: rig_exporter <manifest.json>");
    };

    let manifest = ExportManifest::load(&path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let summary = run_manifest(&manifest).context("Export aborted")?;

    log::info!(
        "Done: {} model(s), {} animation(s)",
        summary.models,
        summary.animations
    );
    Ok(())
}
