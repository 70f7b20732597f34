//! config command - Show the effective configuration

use crate::cli::Context;
use anyhow::{Context as _, Result};

/// Print the effective configuration, defaults included, as TOML.
pub fn show(ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let rendered =
        toml::to_string_pretty(&config.effective()).context("Failed to render configuration")?;

    if !ctx.quiet {
        match config.loaded_from() {
            Some(path) => println!("# Loaded from {}", path.display()),
            None => println!("# No configuration file found; showing defaults"),
        }
    }
    print!("{}", rendered);
    Ok(())
}

/// Print the path of the configuration file in use.
pub fn path(ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    match config.loaded_from() {
        Some(path) => println!("{}", path.display()),
        None => {
            if !ctx.quiet {
                eprintln!("No configuration file found; using defaults");
            }
        }
    }
    Ok(())
}
