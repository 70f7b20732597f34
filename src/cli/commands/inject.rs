//! inject-metadata command - Patch icon and title into an existing map

use std::path::PathBuf;

use crate::cli::Context;
use crate::render::{inject_metadata_file, Metadata};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Inject the configured icon and title into the map at `out`.
pub fn inject_metadata(ctx: &Context, out: Option<PathBuf>) -> Result<()> {
    let config = ctx.load_config()?;
    let path = out.unwrap_or_else(|| config.artifact_path());
    let metadata = Metadata::new(config.icon_href(), config.title());

    let info = inject_metadata_file(&path, &metadata)
        .with_context(|| format!("Failed to inject metadata into {}", path.display()))?;

    output::print(
        format!("Metadata injected into {} ({})", info.path.display(), info.digest),
        ctx.verbosity(),
    );
    Ok(())
}
