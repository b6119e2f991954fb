//! Catalogue of country codes offered when entering trip segments.

use serde::Serialize;

/// Selectable country entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
}

pub const SCHENGEN_COUNTRIES: &[Country] = &[
    Country { code: "AT", name: "Austria" },
    Country { code: "BE", name: "Belgium" },
    Country { code: "BG", name: "Bulgaria" },
    Country { code: "HR", name: "Croatia" },
    Country { code: "CY", name: "Cyprus" },
    Country { code: "CZ", name: "Czech Republic" },
    Country { code: "DK", name: "Denmark" },
    Country { code: "EE", name: "Estonia" },
    Country { code: "FI", name: "Finland" },
    Country { code: "FR", name: "France" },
    Country { code: "DE", name: "Germany" },
    Country { code: "GR", name: "Greece" },
    Country { code: "HU", name: "Hungary" },
    Country { code: "IS", name: "Iceland" },
    Country { code: "IE", name: "Ireland" },
    Country { code: "IT", name: "Italy" },
    Country { code: "LV", name: "Latvia" },
    Country { code: "LI", name: "Liechtenstein" },
    Country { code: "LT", name: "Lithuania" },
    Country { code: "LU", name: "Luxembourg" },
    Country { code: "MT", name: "Malta" },
    Country { code: "NL", name: "Netherlands" },
    Country { code: "NO", name: "Norway" },
    Country { code: "PL", name: "Poland" },
    Country { code: "PT", name: "Portugal" },
    Country { code: "RO", name: "Romania" },
    Country { code: "SK", name: "Slovakia" },
    Country { code: "SI", name: "Slovenia" },
    Country { code: "ES", name: "Spain" },
    Country { code: "SE", name: "Sweden" },
    Country { code: "CH", name: "Switzerland" },
];

/// Looks up a catalogue entry by code, case-insensitively.
pub fn country_by_code(code: &str) -> Option<&'static Country> {
    let code = code.trim();
    SCHENGEN_COUNTRIES
        .iter()
        .find(|country| country.code.eq_ignore_ascii_case(code))
}

/// Human-readable label, e.g. `Germany (DE)`; falls back to the raw code.
pub fn display_name(code: &str) -> String {
    match country_by_code(code) {
        Some(country) => format!("{} ({})", country.name, country.code),
        None => code.trim().to_ascii_uppercase(),
    }
}
