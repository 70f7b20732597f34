//! geo
//!
//! Country name and location lookups.
//!
//! # Architecture
//!
//! Lookup services sit behind the [`CountryLookup`] and [`Geocoder`]
//! traits and are injected into the resolvers at construction. The
//! resolvers own the tolerance policy: per-row failures become markers and
//! never abort a run.
//!
//! # Modules
//!
//! - `traits`: lookup traits and `LookupError`
//! - [`countries`]: ISO 3166-1 name lookup over the `isocountry` registry
//! - [`nominatim`]: Nominatim search geocoder
//! - [`resolver`]: order-preserving, failure-tolerant resolvers
//! - [`mock`]: mock geocoder for deterministic testing

pub mod countries;
pub mod mock;
pub mod nominatim;
pub mod resolver;
mod traits;

pub use traits::*;
