//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All user-facing lines go through this module so quiet and JSON modes are
//! handled in one place. Diagnostics go through `tracing` instead.

pub mod output;
