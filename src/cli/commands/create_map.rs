//! create-map command - Run the pipeline and report the outcome

use std::path::PathBuf;

use crate::cli::Context;
use crate::core::codes::CodeSource;
use crate::pipeline::{Pipeline, PipelineError};
use crate::render::Metadata;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Arguments for `create-map`.
#[derive(Debug, Clone, Default)]
pub struct CreateMapArgs {
    pub codes: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub inject_metadata: bool,
    pub open: bool,
    pub json: bool,
}

/// Rebuild the map.
///
/// Exits with an error when the run fails; the error names the failing step.
pub fn create_map(ctx: &Context, args: CreateMapArgs) -> Result<()> {
    let verbosity = ctx.verbosity();
    let config = ctx.load_config()?;

    let codes_file = args.codes.unwrap_or_else(|| config.codes_file());
    output::debug(
        format!("loading code specifications from {}", codes_file.display()),
        verbosity,
    );
    let source = CodeSource::load(&codes_file).map_err(PipelineError::from)?;

    let mut pipeline = Pipeline::from_config(&config)?;
    if let Some(out) = args.out {
        pipeline = pipeline.with_artifact_path(out);
    }
    if args.inject_metadata {
        pipeline = pipeline.with_metadata(Some(Metadata::new(config.icon_href(), config.title())));
    }

    let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let report = rt.block_on(pipeline.run(&source)).map_err(|e| {
        let step = e.step();
        anyhow::Error::new(e).context(format!("Map rebuild failed at step '{}'", step))
    })?;

    if args.json {
        output::json(&report)?;
    } else {
        output::print(&report, verbosity);
        if !report.unknown_countries.is_empty() {
            output::warn(
                format!(
                    "no standard code for:\n{}",
                    output::format_list(&report.unknown_countries, "  - ")
                ),
                verbosity,
            );
        }
    }

    if args.open {
        open::that(&report.artifact_path).with_context(|| {
            format!("Failed to open {}", report.artifact_path.display())
        })?;
    }

    Ok(())
}
