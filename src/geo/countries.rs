//! geo::countries
//!
//! Country name to ISO 3166-1 alpha-2 lookup.
//!
//! Official names come from the `isocountry` registry. Names are matched
//! case-insensitively with surrounding and repeated whitespace ignored.
//! Besides the registry names the table accepts common English forms
//! ("Russia", "South Korea", "Ivory Coast").
//!
//! # Example
//!
//! ```
//! use countmap::geo::countries::CountryTable;
//!
//! let table = CountryTable::new();
//! assert_eq!(table.lookup("France"), Some("FR"));
//! assert_eq!(table.lookup("  united   KINGDOM "), Some("GB"));
//! assert_eq!(table.lookup("Atlantis"), None);
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use isocountry::CountryCode;

use super::traits::{CountryLookup, LookupError};

/// Common names that differ from the registry name.
const ALIASES: &[(&str, &str)] = &[
    ("CI", "Côte d'Ivoire"),
    ("GB", "United Kingdom"),
    ("RU", "Russian Federation"),
    ("AX", "Aland Islands"),
    ("BL", "Saint Barthelemy"),
    ("BN", "Brunei"),
    ("BO", "Bolivia"),
    ("BQ", "Caribbean Netherlands"),
    ("BS", "The Bahamas"),
    ("CD", "Democratic Republic of the Congo"),
    ("CD", "DR Congo"),
    ("CD", "Congo-Kinshasa"),
    ("CG", "Republic of the Congo"),
    ("CG", "Congo-Brazzaville"),
    ("CI", "Cote d'Ivoire"),
    ("CI", "Ivory Coast"),
    ("CV", "Cape Verde"),
    ("CW", "Curacao"),
    ("CZ", "Czech Republic"),
    ("FK", "Falkland Islands"),
    ("FM", "Micronesia"),
    ("GB", "Great Britain"),
    ("GB", "UK"),
    ("GB", "United Kingdom of Great Britain and Northern Ireland"),
    ("GM", "The Gambia"),
    ("IR", "Iran"),
    ("KP", "North Korea"),
    ("KR", "South Korea"),
    ("KR", "Korea"),
    ("LA", "Laos"),
    ("MD", "Moldova"),
    ("MK", "Macedonia"),
    ("MK", "Republic of North Macedonia"),
    ("MM", "Burma"),
    ("MO", "Macau"),
    ("NL", "The Netherlands"),
    ("NL", "Holland"),
    ("PS", "Palestine"),
    ("RE", "Reunion"),
    ("RU", "Russia"),
    ("ST", "São Tomé and Príncipe"),
    ("SY", "Syria"),
    ("SZ", "Swaziland"),
    ("TL", "East Timor"),
    ("TR", "Turkey"),
    ("TW", "Taiwan"),
    ("TZ", "Tanzania"),
    ("US", "United States of America"),
    ("US", "USA"),
    ("VA", "Vatican City"),
    ("VA", "Holy See"),
    ("VE", "Venezuela"),
    ("VG", "British Virgin Islands"),
    ("VI", "U.S. Virgin Islands"),
    ("VN", "Vietnam"),
];

/// Case- and whitespace-insensitive key for a country name.
fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Name to alpha-2 lookup over the ISO registry plus aliases.
#[derive(Debug, Clone)]
pub struct CountryTable {
    by_name: HashMap<String, &'static str>,
}

impl Default for CountryTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CountryTable {
    pub fn new() -> Self {
        let mut by_name: HashMap<String, &'static str> = CountryCode::iter()
            .map(|code| (normalize(code.name()), code.alpha2()))
            .collect();
        for (code, alias) in ALIASES {
            by_name.insert(normalize(alias), *code);
        }
        Self { by_name }
    }

    /// Resolve a display name to its alpha-2 code.
    pub fn lookup(&self, country: &str) -> Option<&'static str> {
        self.by_name.get(&normalize(country)).copied()
    }

    /// Registry name for an alpha-2 code.
    pub fn name_of(&self, code: &str) -> Option<&'static str> {
        CountryCode::for_alpha2(&code.to_ascii_uppercase())
            .ok()
            .map(|country| country.name())
    }
}

#[async_trait]
impl CountryLookup for CountryTable {
    fn name(&self) -> &'static str {
        "iso3166"
    }

    async fn alpha2(&self, country: &str) -> Result<String, LookupError> {
        self.lookup(country)
            .map(str::to_string)
            .ok_or_else(|| LookupError::NotFound(country.to_string()))
    }
}
