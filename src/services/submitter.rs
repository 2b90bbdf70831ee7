use std::collections::HashSet;

use reqwest::Client;
use serde::Serialize;

use crate::error::AppError;
use crate::services::import::BusinessRecord;

/// Outbound shape of one business. Built from a `BusinessRecord` by copying
/// the canonical fields only, so preview bookkeeping can never leak into the
/// request payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessPayload {
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
}

impl From<&BusinessRecord> for BusinessPayload {
    fn from(record: &BusinessRecord) -> Self {
        Self {
            name: record.name.clone(),
            address: record.address.clone(),
            city: record.city.clone(),
            postal_code: record.postal_code.clone(),
            country: record.country.clone(),
            website: record.website.clone(),
            email: record.email.clone(),
            phone_number: record.phone_number.clone(),
            category: record.category.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            average_rating: record.average_rating,
            review_count: record.review_count,
            google_place_id: record.google_place_id.clone(),
            google_maps_url: record.google_maps_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BulkImportRequest {
    businesses: Vec<BusinessPayload>,
}

/// Submission eligibility. Distinct from `is_valid` and re-derived here at
/// submit time rather than read from a cached flag.
pub fn is_eligible(record: &BusinessRecord) -> bool {
    record.is_valid && record.has_website
}

/// The rows that would actually be sent: eligible rows, intersected with the
/// explicit selection when one exists.
pub fn submission_set(
    records: &[BusinessRecord],
    selection: &HashSet<usize>,
) -> Vec<BusinessPayload> {
    records
        .iter()
        .filter(|record| is_eligible(record))
        .filter(|record| selection.is_empty() || selection.contains(&record.row_index))
        .map(BusinessPayload::from)
        .collect()
}

/// Client for the external business API.
pub struct BusinessApiClient {
    client: Client,
    endpoint: String,
}

impl BusinessApiClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Single bulk POST; no retries. A non-success status is reported as a
    /// transport failure and left to the caller to re-trigger.
    pub async fn submit(&self, businesses: Vec<BusinessPayload>) -> Result<(), AppError> {
        let count = businesses.len();
        let response = self
            .client
            .post(&self.endpoint)
            .json(&BulkImportRequest { businesses })
            .send()
            .await
            .map_err(|e| AppError::SubmitTransport(format!("Failed to reach business API: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::SubmitTransport(format!(
                "Business API returned status: {}",
                response.status()
            )));
        }

        tracing::info!("Submitted {} businesses to {}", count, self.endpoint);
        Ok(())
    }
}
