//! core::types
//!
//! Row types carried through the map pipeline.
//!
//! # Flow
//!
//! ```text
//! CountryQuantity -> ResolvedCountry -> MapRecord
//!                      (StandardCode)     (GeoPoint)
//! ```
//!
//! Tolerated lookup failures are values, not errors: an unmapped country
//! name is [`StandardCode::Unknown`] and a failed geocode is
//! [`GeoPoint::Missing`]. Both travel with their row so that one bad row
//! never stops the others.

use std::fmt;

use serde::Serialize;

/// Literal recorded for a country name that has no standard code.
pub const UNKNOWN_CODE: &str = "Unknown";

/// Observed count for one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryQuantity {
    pub country: String,
    pub quantity: u64,
}

/// Country quantities in insertion order with last-write-wins updates.
///
/// Re-inserting an existing country replaces its quantity in place, so the
/// row keeps the position of its first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quantities {
    rows: Vec<CountryQuantity>,
}

impl Quantities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the quantity for `country`.
    ///
    /// Returns the previous quantity if the country was already present.
    pub fn insert(&mut self, country: impl Into<String>, quantity: u64) -> Option<u64> {
        let country = country.into();
        match self.rows.iter_mut().find(|row| row.country == country) {
            Some(row) => Some(std::mem::replace(&mut row.quantity, quantity)),
            None => {
                self.rows.push(CountryQuantity { country, quantity });
                None
            }
        }
    }

    pub fn get(&self, country: &str) -> Option<u64> {
        self.rows
            .iter()
            .find(|row| row.country == country)
            .map(|row| row.quantity)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountryQuantity> {
        self.rows.iter()
    }

    /// Keep only rows matching the predicate, preserving order.
    pub fn retain(&mut self, keep: impl FnMut(&CountryQuantity) -> bool) {
        self.rows.retain(keep);
    }

    /// Country names in order.
    pub fn countries(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.country.clone()).collect()
    }

    /// Total of all quantities.
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|row| row.quantity).sum()
    }
}

impl IntoIterator for Quantities {
    type Item = CountryQuantity;
    type IntoIter = std::vec::IntoIter<CountryQuantity>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Quantities {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut quantities = Quantities::new();
        for (country, quantity) in iter {
            quantities.insert(country, quantity);
        }
        quantities
    }
}

/// A standardized two-letter country code, or the unknown marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StandardCode {
    /// ISO 3166-1 alpha-2 code.
    Alpha2(String),
    /// The country name could not be mapped.
    Unknown,
}

impl StandardCode {
    /// The code as used for geocoding (`"Unknown"` for unmapped names).
    pub fn as_str(&self) -> &str {
        match self {
            StandardCode::Alpha2(code) => code,
            StandardCode::Unknown => UNKNOWN_CODE,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, StandardCode::Alpha2(_))
    }
}

impl fmt::Display for StandardCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A country with its quantity and resolved standard code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCountry {
    pub country: String,
    pub quantity: u64,
    pub code: StandardCode,
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Geocoding outcome for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoPoint {
    Located(Coordinates),
    Missing,
}

impl GeoPoint {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            GeoPoint::Located(coords) => Some(*coords),
            GeoPoint::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, GeoPoint::Missing)
    }
}

/// Final row consumed by the map assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRecord {
    pub country: String,
    pub quantity: u64,
    pub location: GeoPoint,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_last_write_wins_in_place() {
        let mut q = Quantities::new();
        assert_eq!(q.insert("France", 3), None);
        q.insert("Chad", 5);
        assert_eq!(q.insert("France", 7), Some(3));

        assert_eq!(q.get("France"), Some(7));
        assert_eq!(q.countries(), vec!["France", "Chad"]);
    }

    #[test]
    fn from_iter_applies_overwrites() {
        let q: Quantities = [("A", 1), ("B", 2), ("A", 0)].into_iter().collect();
        assert_eq!(q.len(), 2);
        assert_eq!(q.get("A"), Some(0));
        assert_eq!(q.total(), 2);
    }

    #[test]
    fn unknown_code_renders_literal() {
        assert_eq!(StandardCode::Unknown.as_str(), "Unknown");
        assert_eq!(StandardCode::Alpha2("FR".into()).to_string(), "FR");
        assert!(!StandardCode::Unknown.is_known());
    }

    #[test]
    fn geo_point_accessors() {
        let located = GeoPoint::Located(Coordinates::new(1.5, -2.0));
        assert_eq!(located.coordinates(), Some(Coordinates::new(1.5, -2.0)));
        assert!(GeoPoint::Missing.is_missing());
        assert_eq!(GeoPoint::Missing.coordinates(), None);
    }
}
