use smallvec::SmallVec;

use super::types::BusinessRecord;
use super::utils::{ensure_scheme, is_blank, normalize_header, split_postal_city};

/// Map one raw CSV row onto a `BusinessRecord`.
///
/// Headers are processed in file order; each header matches at most one
/// target field. Blank cells are skipped outright, whatever their header.
pub fn map_row(headers: &[String], cells: &[String]) -> BusinessRecord {
    let mut record = BusinessRecord::default();

    for (header, raw) in headers.iter().zip(cells.iter()) {
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }
        apply_cell(&mut record, header, value);
    }

    record
}

// The alias table. Rules are tried top to bottom and the first match wins,
// so e.g. a "phone" header never reaches the "review" contains-check below it.
fn apply_cell(record: &mut BusinessRecord, header: &str, value: &str) {
    let key = normalize_header(header);

    if key == "name" || key.contains("businessname") {
        record.name = Some(value.to_string());
    } else if key == "fulladdress" || key == "address" {
        record.address = Some(value.to_string());
    } else if key == "street" {
        // Weaker alias: only fills the gap when no address column matched.
        if record.address.is_none() {
            record.address = Some(value.to_string());
        }
    } else if key == "website" || key == "url" {
        record.website = Some(value.to_string());
    } else if key == "domain" {
        if record.website.is_none() {
            record.website = Some(ensure_scheme(value));
        }
    } else if key == "emails" || key == "email" {
        record.email = Some(value.to_string());
    } else if key == "phone" || key.contains("phone") {
        record.phone_number = Some(value.to_string());
    } else if key == "municipality" || key == "city" {
        record.city = Some(value.to_string());
    } else if key == "categories" || key == "category" {
        record.category = Some(value.to_string());
    } else if key == "latitude" {
        if let Ok(parsed) = value.parse::<f64>() {
            record.latitude = Some(parsed);
        }
    } else if key == "longitude" {
        if let Ok(parsed) = value.parse::<f64>() {
            record.longitude = Some(parsed);
        }
    } else if key.contains("rating") {
        if let Ok(parsed) = value.parse::<f64>() {
            record.average_rating = Some(parsed);
        }
    } else if key.contains("review") {
        if let Ok(parsed) = value.parse::<f64>() {
            record.review_count = Some(parsed as i64);
        }
    } else if key.contains("placeid") {
        record.google_place_id = Some(value.to_string());
    } else if key.contains("mapsurl") {
        record.google_maps_url = Some(value.to_string());
    }
    // Anything else is an unrecognized column; its value is dropped.
}

/// Secondary fields derived after header mapping: the postal-code/city split,
/// then the Germany country default.
pub fn derive_fields(record: &mut BusinessRecord) {
    if record.postal_code.is_none() {
        if let Some((postal_code, city)) =
            record.city.as_deref().and_then(split_postal_city)
        {
            record.postal_code = Some(postal_code);
            record.city = Some(city);
        }
    }

    if record.country.is_none()
        && record
            .address
            .as_deref()
            .map_or(false, |address| address.contains("Germany"))
    {
        record.country = Some("Germany".to_string());
    }
}

/// Display-only validation. Missing name/address mark the record invalid but
/// never block parsing or the preview.
pub fn validate(record: &mut BusinessRecord) {
    let mut errors: SmallVec<[String; 2]> = SmallVec::new();

    if record.name.as_deref().map_or(true, is_blank) {
        errors.push("Business name is required".to_string());
    }
    if record.address.as_deref().map_or(true, is_blank) {
        errors.push("Address is required".to_string());
    }

    record.is_valid = errors.is_empty();
    record.validation_errors = errors;
    record.has_website = record.website.as_deref().map_or(false, |w| !is_blank(w));
}
