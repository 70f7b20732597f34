//! pipeline::aggregate
//!
//! Count aggregation and the non-empty filter.
//!
//! # Invariants
//!
//! - Every specification is parsed before the first store query, so an
//!   invalid entry never leaves a half-queried run behind
//! - One store query per entry, in source order
//! - Two entries naming the same country: the later count wins
//! - Any store error aborts the aggregation; there is no partial result

use super::PipelineError;
use crate::core::codes::CodeSource;
use crate::core::types::Quantities;
use crate::store::CountStore;

/// Count stored records per configured country.
///
/// # Errors
///
/// - [`PipelineError::Spec`] for the first invalid specification
/// - [`PipelineError::Aggregate`] if the store fails any query
pub async fn aggregate(
    store: &dyn CountStore,
    source: &CodeSource,
) -> Result<Quantities, PipelineError> {
    let parsed = source.parse_all()?;
    let mut quantities = Quantities::new();

    for (spec, entry) in parsed {
        let pattern = spec.pattern();
        let count = store
            .count_matching(&pattern)
            .await
            .map_err(|source| PipelineError::Aggregate {
                spec: entry.spec.clone(),
                source,
            })?;

        tracing::debug!(
            spec = %entry.spec,
            pattern = %pattern,
            country = %entry.country,
            count,
            "counted"
        );

        if let Some(previous) = quantities.insert(entry.country.as_str(), count) {
            tracing::warn!(
                country = %entry.country,
                previous,
                count,
                "country configured more than once; keeping the later count"
            );
        }
    }

    Ok(quantities)
}

/// Drop countries whose quantity is zero.
pub fn retain_non_empty(mut quantities: Quantities) -> Quantities {
    quantities.retain(|q| q.quantity != 0);
    quantities
}
