use bytes::Bytes;
use reqwest::Client;

use crate::error::AppError;
use crate::services::import::{derive_fields, map_row, validate, BusinessRecord};

/// Fetch an uploaded file from a signed URL.
pub async fn load_file_from_url(url: &str) -> Result<Bytes, AppError> {
    let client = Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::FileFetch(format!("Failed to fetch file: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::FileFetch(
            format!("Failed to fetch file. Status: {}", response.status())
        ));
    }

    response
        .bytes()
        .await
        .map_err(|e| AppError::FileFetch(format!("Failed to read response bytes: {}", e)))
}

/// Decode a CSV file into normalized business records.
///
/// The first row is the header line; every following row is mapped, derived
/// and validated in one pass. Rows whose cells are all blank are dropped and
/// do not consume a row index.
pub fn decode_csv(content: &str) -> Result<Vec<BusinessRecord>, AppError> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::ParseError(format!("Failed to read CSV header: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|e| AppError::ParseError(format!("Invalid CSV: {}", e)))?;
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();

        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }

        let mut record = map_row(&headers, &cells);
        derive_fields(&mut record);
        validate(&mut record);
        // 1-based position among surviving rows, stable across later
        // filtering and pagination.
        record.row_index = records.len() + 1;
        records.push(record);
    }

    tracing::debug!("Decoded {} records from CSV", records.len());
    Ok(records)
}
