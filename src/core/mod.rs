//! core
//!
//! Core domain types, configuration, and the run lock.
//!
//! # Modules
//!
//! - [`codes`] - Code specifications and their match patterns
//! - [`types`] - Row types: quantities, standard codes, geo points, records
//! - [`config`] - Configuration schema and loading
//! - [`lock`] - Exclusive run lock per artifact
//!
//! # Design Principles
//!
//! - Tolerated lookup failures are values carried by their row
//! - Pattern generation is a pure function of the specification

pub mod codes;
pub mod config;
pub mod lock;
pub mod types;
