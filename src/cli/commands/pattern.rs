//! pattern command - Print the match pattern for one code specification

use crate::cli::Context;
use crate::core::codes::CodeSpec;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Print the pattern sent to the count store for `spec`.
pub fn pattern(ctx: &Context, spec: &str) -> Result<()> {
    let parsed = CodeSpec::parse(spec).context("Invalid code specification")?;
    output::debug(format!("parsed '{}' as {:?}", spec, parsed), ctx.verbosity());
    println!("{}", parsed.pattern());
    Ok(())
}
