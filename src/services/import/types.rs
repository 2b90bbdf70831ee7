use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Fixed preview page size.
pub const PAGE_SIZE: usize = 15;

/// One normalized row of an uploaded business file.
///
/// The canonical fields are the only ones that ever leave this service; the
/// trailing block (`row_index`, `is_valid`, `validation_errors`,
/// `has_website`) exists for the preview and is stripped before submission.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_place_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_maps_url: Option<String>,

    // Preview-only bookkeeping, never part of the outbound payload.
    pub row_index: usize,
    pub is_valid: bool,
    pub validation_errors: SmallVec<[String; 2]>,
    pub has_website: bool,
}

impl BusinessRecord {
    /// Whether the record falls into the given preview bucket. `Valid`,
    /// `Invalid` and `NoWebsite` are mutually exclusive; `All` is their union.
    pub fn status_matches(&self, filter: StatusFilter) -> bool {
        match filter {
            StatusFilter::All => true,
            StatusFilter::Valid => self.is_valid && self.has_website,
            StatusFilter::Invalid => !self.is_valid,
            StatusFilter::NoWebsite => self.is_valid && !self.has_website,
        }
    }

    /// String form of every business field, for the free-text preview search.
    pub fn search_fields(&self) -> Vec<String> {
        let text_fields = [
            &self.name,
            &self.address,
            &self.city,
            &self.postal_code,
            &self.country,
            &self.website,
            &self.email,
            &self.phone_number,
            &self.category,
            &self.google_place_id,
            &self.google_maps_url,
        ];

        let mut fields: Vec<String> = text_fields
            .into_iter()
            .filter_map(|value| value.clone())
            .collect();

        if let Some(latitude) = self.latitude {
            fields.push(latitude.to_string());
        }
        if let Some(longitude) = self.longitude {
            fields.push(longitude.to_string());
        }
        if let Some(rating) = self.average_rating {
            fields.push(rating.to_string());
        }
        if let Some(count) = self.review_count {
            fields.push(count.to_string());
        }

        fields
    }
}

/// Preview status filter as sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Valid,
    Invalid,
    NoWebsite,
}
