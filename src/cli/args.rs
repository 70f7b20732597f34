//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this configuration file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// countmap - Aggregate per-country record counts onto a clustered world map
#[derive(Parser, Debug)]
#[command(name = "countmap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this configuration file instead of the default search path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rebuild the map from the current record counts
    #[command(
        name = "create-map",
        long_about = "Rebuild the map from the current record counts.\n\n\
            Counts stored records for every configured code specification, \
            drops countries with no records, resolves each country to a map \
            location and writes a marker-clustered map document. Countries \
            that cannot be located are left off the map and listed in the report.\n\n\
            The previous map is replaced only once the new one is fully written.",
        after_help = "\
EXAMPLES:
    # Rebuild using the configured code file and output path
    countmap create-map

    # Use another code file and write somewhere else
    countmap create-map --codes codes.json --out public/map.html

    # Machine-readable run report
    countmap create-map --json"
    )]
    CreateMap {
        /// Code specification file (JSON object of spec -> country name)
        #[arg(long, value_name = "FILE")]
        codes: Option<PathBuf>,

        /// Where to write the map document
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Inject the configured icon and title after writing
        #[arg(long)]
        inject_metadata: bool,

        /// Open the map in a browser when done
        #[arg(long)]
        open: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the match pattern for a code specification
    #[command(
        name = "pattern",
        after_help = "\
EXAMPLES:
    # Prefix pattern for a code family
    countmap pattern 250

    # Exact numeric range (EN DASH between the bounds)
    countmap pattern '9\u{2013}11'"
    )]
    Pattern {
        /// A single code or a range such as `9–11`
        spec: String,
    },

    /// Inject the icon and title into an existing map document
    #[command(name = "inject-metadata")]
    InjectMetadata {
        /// Map document to patch (defaults to the configured artifact path)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Show configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash (add to ~/.bashrc)
    countmap completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    countmap completion zsh >> ~/.zshrc"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the path of the configuration file in use
    Path,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_map_flags() {
        let cli = Cli::try_parse_from([
            "countmap",
            "--debug",
            "create-map",
            "--codes",
            "c.json",
            "--inject-metadata",
            "--json",
        ])
        .unwrap();

        assert!(cli.debug);
        match cli.command {
            Command::CreateMap {
                codes,
                out,
                inject_metadata,
                open,
                json,
            } => {
                assert_eq!(codes, Some(PathBuf::from("c.json")));
                assert_eq!(out, None);
                assert!(inject_metadata);
                assert!(!open);
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["countmap", "config", "show", "--config", "x.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}
