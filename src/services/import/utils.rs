use once_cell::sync::Lazy;
use regex::Regex;

// Leading 5-digit postal code glued to a city name, e.g. "10115 Berlin".
static POSTAL_CITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{5})\s+(.+)$").expect("postal/city pattern"));

/// Lookup key for header matching: lower-cased, with whitespace and
/// underscores stripped. "Full_Address", "FULL ADDRESS" and "fulladdress"
/// all collapse to the same key.
pub fn normalize_header(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect::<String>()
        .to_lowercase()
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Prefix bare domains with https://; values that already carry a scheme are
/// passed through untouched.
pub fn ensure_scheme(value: &str) -> String {
    if value.starts_with("http://") || value.starts_with("https://") {
        value.to_string()
    } else {
        format!("https://{}", value)
    }
}

/// Split a combined "10115 Berlin" value into postal code and city.
pub fn split_postal_city(value: &str) -> Option<(String, String)> {
    POSTAL_CITY_RE
        .captures(value.trim())
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}
