//! countmap - per-country record counts on a clustered world map
//!
//! countmap counts stored records under numeric country codes, resolves each
//! country to a location, and renders the counts as a marker-clustered map
//! document that is fully rebuilt on every run.
//!
//! # Architecture
//!
//! Data flows strictly one way:
//!
//! ```text
//! code spec -> pattern -> count -> non-empty counts -> standard codes
//!           -> coordinates -> markers -> artifact
//! ```
//!
//! - [`cli`] - Command-line interface layer (parses args, runs the pipeline)
//! - [`pipeline`] - Orchestrates one rebuild and reports its statistics
//! - [`core`] - Code specifications, domain types, configuration, run lock
//! - [`store`] - Count store abstraction and adapters
//! - [`geo`] - Country name and location lookups with failure tolerance
//! - [`render`] - Map assembly, atomic persistence, metadata injection
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. An invalid code specification or an unreachable store fails the run
//!    before the artifact is touched
//! 2. A lookup failure for one country never fails the run
//! 3. Resolvers return one output per input, in input order
//! 4. Metadata injection is idempotent

pub mod cli;
pub mod core;
pub mod geo;
pub mod pipeline;
pub mod render;
pub mod store;
pub mod ui;
