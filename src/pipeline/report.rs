//! pipeline::report
//!
//! Run statistics returned by a successful pipeline run.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of a successful run.
///
/// Tolerated lookup failures are only visible here and in the artifact's
/// marker count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    /// Countries aggregated, including zero counts
    pub aggregated: usize,
    /// Countries left after dropping zero counts
    pub non_empty: usize,
    pub codes_resolved: usize,
    pub codes_unknown: usize,
    pub located: usize,
    pub missing: usize,
    pub markers: usize,
    /// Names that could not be mapped to a standard code
    pub unknown_countries: Vec<String>,
    /// Names that received no coordinates
    pub missing_countries: Vec<String>,
    pub artifact_path: PathBuf,
    pub artifact_digest: String,
    pub metadata_injected: bool,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Map written to {}", self.artifact_path.display())?;
        writeln!(f, "  run:        {}", self.run_id)?;
        writeln!(
            f,
            "  countries:  {} aggregated, {} non-empty",
            self.aggregated, self.non_empty
        )?;
        writeln!(
            f,
            "  codes:      {} resolved, {} unknown",
            self.codes_resolved, self.codes_unknown
        )?;
        writeln!(
            f,
            "  locations:  {} located, {} missing",
            self.located, self.missing
        )?;
        writeln!(f, "  markers:    {}", self.markers)?;
        if !self.missing_countries.is_empty() {
            writeln!(f, "  unplaced:   {}", self.missing_countries.join(", "))?;
        }
        if self.metadata_injected {
            writeln!(f, "  metadata:   injected")?;
        }
        write!(f, "  sha256:     {}", self.artifact_digest)
    }
}
