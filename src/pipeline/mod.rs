//! pipeline
//!
//! End-to-end map rebuild: aggregate, filter, resolve, locate, assemble,
//! persist, and optionally inject metadata.
//!
//! # Lifecycle
//!
//! ```text
//! Aggregate -> Filter -> Resolve codes -> Locate -> Assemble -> Persist -> [Metadata]
//! ```
//!
//! Store failures and persistence failures end the run with a
//! [`PipelineError`] naming the step. Lookup failures in the resolve and
//! locate steps are absorbed per row and only show up in the [`RunReport`].
//!
//! # Modules
//!
//! - [`aggregate`]: count aggregation and the non-empty filter
//! - [`runner`]: the [`Pipeline`] orchestrator
//! - [`report`]: run statistics

pub mod aggregate;
pub mod report;
pub mod runner;

pub use aggregate::{aggregate, retain_non_empty};
pub use report::RunReport;
pub use runner::Pipeline;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::core::codes::{CodeSourceError, CodeSpecError};
use crate::core::lock::LockError;
use crate::render::RenderError;
use crate::store::StoreError;

/// Pipeline step, for reporting where a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Config,
    Spec,
    Lock,
    Aggregate,
    Persist,
    Metadata,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStep::Config => "config",
            PipelineStep::Spec => "spec",
            PipelineStep::Lock => "lock",
            PipelineStep::Aggregate => "aggregate",
            PipelineStep::Persist => "persist",
            PipelineStep::Metadata => "metadata",
        };
        f.write_str(name)
    }
}

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A collaborator could not be built from configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Source(#[from] CodeSourceError),

    /// Invalid code specification syntax.
    #[error(transparent)]
    Spec(#[from] CodeSpecError),

    /// Another run holds the artifact.
    #[error(transparent)]
    Locked(#[from] LockError),

    /// The count store failed a query.
    #[error("aggregation failed for '{spec}': {source}")]
    Aggregate { spec: String, source: StoreError },

    /// The artifact could not be written.
    #[error("failed to persist map: {0}")]
    Persist(RenderError),

    /// The artifact was written but metadata injection failed.
    #[error("metadata injection failed: {0}")]
    Metadata(RenderError),
}

impl PipelineError {
    /// The step that failed.
    pub fn step(&self) -> PipelineStep {
        match self {
            PipelineError::Config(_) | PipelineError::Source(_) => PipelineStep::Config,
            PipelineError::Spec(_) => PipelineStep::Spec,
            PipelineError::Locked(_) => PipelineStep::Lock,
            PipelineError::Aggregate { .. } => PipelineStep::Aggregate,
            PipelineError::Persist(_) => PipelineStep::Persist,
            PipelineError::Metadata(_) => PipelineStep::Metadata,
        }
    }

    /// Whether the count store could not be reached.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, PipelineError::Aggregate { source, .. } if source.is_unavailable())
    }
}
