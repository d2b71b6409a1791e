use std::sync::LazyLock;

use regex::Regex;

/// Category tag carried by every result of the venue endpoint.
pub const ESTABLISHMENT: &str = "establishment";

/// Category tag marking bare administrative regions.
pub const POLITICAL: &str = "political";

/// Containment radius in meters per venue category, smallest first.
/// Used when the provider gives categories instead of a bounding box.
pub const CATEGORY_RADIUS_M: &[(&str, f64)] = &[
    ("bus_station", 10.0),
    ("establishment", 30.0),
    ("art_gallery", 40.0),
    ("food", 40.0),
    ("subway_station", 50.0),
    ("movie_theater", 75.0),
    ("aquarium", 75.0),
    ("restaurant", 100.0),
    ("parking", 100.0),
    ("park", 100.0),
    ("zoo", 100.0),
    ("night_club", 150.0),
    ("museum", 150.0),
    ("church", 150.0),
    ("casino", 150.0),
    ("school", 200.0),
    ("city_hall", 200.0),
    ("hindu_temple", 200.0),
    ("hospital", 250.0),
    ("shopping_mall", 300.0),
    ("cemetery", 300.0),
    ("campground", 300.0),
    ("university", 500.0),
    ("amusement_park", 500.0),
    ("stadium", 750.0),
    ("airport", 1000.0),
];

/// Fallback radius when a draft has neither bounds nor a known category.
pub const DEFAULT_RADIUS_M: f64 = 30.0;

/// Venue categories that add noise without locating value; results carrying
/// any of these as their primary tag are not imported as leaves.
pub const IGNORED_VENUE_CATEGORIES: &[&str] = &["point_of_interest", "geocode", "route", "political"];

/// The table is ordered by radius, so the last matching entry decides: a
/// generic `establishment` tag never shadows a more specific category.
pub fn category_radius_m(categories: &[String]) -> Option<f64> {
    CATEGORY_RADIUS_M
        .iter()
        .rev()
        .find(|(cat, _)| categories.iter().any(|c| c == cat))
        .map(|(_, radius)| *radius)
}

/// The categories requested from the venue endpoint.
pub fn venue_search_categories() -> Vec<&'static str> {
    CATEGORY_RADIUS_M.iter().map(|(cat, _)| *cat).collect()
}

// Locale-specific boilerplate stripped from administrative names.
static NAME_REPLACEMENTS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"^State of ").expect("valid regex"), ""),
        (Regex::new(r"(?i) ltda").expect("valid regex"), ""),
        (Regex::new(r"\s*\-.+$").expect("valid regex"), ""),
        (Regex::new(r",.+$").expect("valid regex"), ""),
        (Regex::new(r"(?i)escola municipal").expect("valid regex"), "E.M."),
        (Regex::new(r"(?i)escola estadual").expect("valid regex"), "E.E."),
        (Regex::new(r"\d+\.\d+\.\d+ ").expect("valid regex"), ""),
    ]
});

/// Clean a display name of locale-specific boilerplate (legal suffixes,
/// trailing qualifier clauses, state prefixes).
pub fn clean_name(name: &str) -> String {
    let mut cleaned = name.to_string();
    for (pattern, replacement) in NAME_REPLACEMENTS.iter() {
        cleaned = pattern.replace(&cleaned, *replacement).into_owned();
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_state_prefix() {
        assert_eq!(clean_name("State of São Paulo"), "São Paulo");
    }

    #[test]
    fn strips_trailing_qualifiers() {
        assert_eq!(clean_name("Café Astor - Ipanema"), "Café Astor");
        assert_eq!(clean_name("Praça XV, Centro"), "Praça XV");
    }

    #[test]
    fn abbreviates_school_prefixes() {
        assert_eq!(clean_name("Escola Municipal Pedro II"), "E.M. Pedro II");
    }

    #[test]
    fn radius_prefers_the_most_specific_category() {
        let categories = vec![
            "restaurant".to_string(),
            "food".to_string(),
            "establishment".to_string(),
        ];
        // "restaurant" (100m) sits after "establishment" (30m) in the table
        assert_eq!(category_radius_m(&categories), Some(100.0));
        assert_eq!(category_radius_m(&["embassy".to_string()]), None);
    }
}
