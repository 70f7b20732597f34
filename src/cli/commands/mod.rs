//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and applies command-line overrides
//! 2. Calls into the library
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! `create-map` talks to the count store and the geocoder over the network.
//! Its handler builds a tokio runtime and blocks on the pipeline run, so the
//! rest of the CLI stays synchronous.

mod completion;
mod config_cmd;
mod create_map;
mod inject;
mod pattern;

pub use completion::completion;
pub use config_cmd::{path as config_path, show as config_show};
pub use create_map::{create_map, CreateMapArgs};
pub use inject::inject_metadata;
pub use pattern::pattern;

use super::args::{Command, ConfigAction};
use super::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::CreateMap {
            codes,
            out,
            inject_metadata,
            open,
            json,
        } => create_map(
            ctx,
            CreateMapArgs {
                codes,
                out,
                inject_metadata,
                open,
                json,
            },
        ),
        Command::Pattern { spec } => pattern(ctx, &spec),
        Command::InjectMetadata { out } => inject_metadata(ctx, out),
        Command::Config { action } => match action {
            ConfigAction::Show => config_show(ctx),
            ConfigAction::Path => config_path(ctx),
        },
        Command::Completion { shell } => completion(shell),
    }
}
