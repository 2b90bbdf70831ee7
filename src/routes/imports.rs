use axum::{
    extract::{Query, State},
    http::{header, Method},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    error::AppError,
    services::{
        file_processor,
        import::{BusinessRecord, StatusFilter, PAGE_SIZE},
        session::ImportSession,
        submitter,
    },
    AppState,
};
use tower_http::cors::{Any, CorsLayer};

// Header-only CSV offered to users as a starting point.
const TEMPLATE_HEADERS: &str =
    "Name,Full Address,Municipality,Categories,Phone,Website,Domain,Email,Latitude,Longitude,Google Maps Url\n";

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/imports/parse", post(parse_import))
        .route("/imports/preview", get(preview_import))
        .route("/imports/selection", put(update_selection))
        .route("/imports/submit", post(submit_import))
        .route("/imports/template", get(download_template))
        .route("/imports/reset", post(reset_import))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest {
    file_name: String,
    content: Option<String>,
    signed_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    search: Option<String>,
    status: Option<StatusFilter>,
    page: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    row_indexes: Vec<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    file_name: Option<String>,
    total_records: usize,
    valid_count: usize,
    invalid_count: usize,
    no_website_count: usize,
    filtered_count: usize,
    page: usize,
    page_size: usize,
    total_pages: usize,
    records: Vec<BusinessRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    submitted: usize,
    ignored_invalid: usize,
    ignored_no_website: usize,
}

#[axum::debug_handler]
async fn parse_import(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ParseRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let start = std::time::Instant::now();
    tracing::info!("Starting import parse for file: {}", request.file_name);

    // 1. Validate the file name
    if !request.file_name.to_lowercase().ends_with(".csv") {
        tracing::error!("Unsupported file type: {}", request.file_name);
        return Err(AppError::InvalidInput("Only CSV files are supported".to_string()));
    }

    // 2. Mark the parse in flight; a second upload is rejected until this one settles
    {
        let mut session = state.session.write().await;
        if session.parsing {
            return Err(AppError::Busy("A file is already being parsed".to_string()));
        }
        session.parsing = true;
    }

    let result = decode_request(&state, &request).await;

    // 3. Store the outcome; a failed parse resets the file selection
    let mut session = state.session.write().await;
    session.parsing = false;
    match result {
        Ok(records) => {
            tracing::info!(
                "Parsed {} records from {} in {:?}",
                records.len(),
                request.file_name,
                start.elapsed()
            );
            session.replace_records(request.file_name, records);
            Ok(Json(build_preview(&session)))
        }
        Err(e) => {
            tracing::error!("Failed to parse {}: {}", request.file_name, e);
            session.clear();
            Err(e)
        }
    }
}

async fn decode_request(
    state: &AppState,
    request: &ParseRequest,
) -> Result<Vec<BusinessRecord>, AppError> {
    // Exactly one input source: inline content or a signed URL to fetch
    let content = match (&request.content, &request.signed_url) {
        (Some(content), None) => content.clone(),
        (None, Some(url)) => {
            tracing::info!("Downloading file from URL...");
            let download_start = std::time::Instant::now();
            let bytes = file_processor::load_file_from_url(url).await?;
            tracing::info!(
                "File downloaded, size: {}KB, took: {:?}",
                bytes.len() / 1024,
                download_start.elapsed()
            );
            String::from_utf8(bytes.to_vec())
                .map_err(|_| AppError::ParseError("File is not valid UTF-8".to_string()))?
        }
        _ => {
            return Err(AppError::InvalidInput(
                "Provide exactly one of content or signedUrl".to_string(),
            ))
        }
    };

    if content.len() > state.config.max_file_size {
        return Err(AppError::InvalidInput(format!(
            "File exceeds maximum size of {} bytes",
            state.config.max_file_size
        )));
    }

    file_processor::decode_csv(&content)
}

#[axum::debug_handler]
async fn preview_import(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PreviewParams>,
) -> Result<Json<PreviewResponse>, AppError> {
    let mut session = state.session.write().await;

    // Replace the stored view state with whatever the client asked for
    if let Some(search) = params.search {
        session.search_term = search;
    }
    if let Some(status) = params.status {
        session.status_filter = status;
    }
    if let Some(page) = params.page {
        session.page = page.max(1);
    }

    Ok(Json(build_preview(&session)))
}

#[axum::debug_handler]
async fn update_selection(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut session = state.session.write().await;

    // Unknown row indexes are dropped rather than rejected
    let known: HashSet<usize> = session.records.iter().map(|r| r.row_index).collect();
    session.selection = request
        .row_indexes
        .into_iter()
        .filter(|index| known.contains(index))
        .collect();

    Ok(Json(json!({ "selected": session.selection.len() })))
}

#[axum::debug_handler]
async fn submit_import(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SubmitResponse>, AppError> {
    let start = std::time::Instant::now();

    // 1. Compute the submission set under the busy guard; eligibility is
    //    re-derived here, not read from the preview
    let (businesses, ignored_invalid, ignored_no_website) = {
        let mut session = state.session.write().await;
        if session.submitting {
            return Err(AppError::Busy("A submission is already in progress".to_string()));
        }

        let businesses = submitter::submission_set(&session.records, &session.selection);
        if businesses.is_empty() {
            return Err(AppError::SubmitEmpty(
                "No valid businesses with websites to import".to_string(),
            ));
        }

        let (_valid, invalid, no_website) = session.status_counts();
        session.submitting = true;
        (businesses, invalid, no_website)
    };

    let submitted = businesses.len();
    tracing::info!("Submitting {} businesses to the import API", submitted);

    // 2. Single bulk call, no retries
    let result = state.api.submit(businesses).await;

    // 3. Success clears the session; failure keeps it for a manual retry
    let mut session = state.session.write().await;
    session.submitting = false;
    match result {
        Ok(()) => {
            tracing::info!(
                "Bulk import finished in {:?}: {} submitted, {} invalid, {} without website",
                start.elapsed(),
                submitted,
                ignored_invalid,
                ignored_no_website
            );
            session.clear();
            Ok(Json(SubmitResponse {
                submitted,
                ignored_invalid,
                ignored_no_website,
            }))
        }
        Err(e) => {
            tracing::error!("Bulk import failed: {}", e);
            Err(e)
        }
    }
}

async fn download_template() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"business-import-template.csv\"",
            ),
        ],
        TEMPLATE_HEADERS,
    )
}

#[axum::debug_handler]
async fn reset_import(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut session = state.session.write().await;
    if session.parsing || session.submitting {
        return Err(AppError::Busy("Import session is busy".to_string()));
    }
    session.clear();
    Ok(Json(json!({ "status": "reset" })))
}

fn build_preview(session: &ImportSession) -> PreviewResponse {
    let filtered = session.filtered();
    let (valid_count, invalid_count, no_website_count) = session.status_counts();
    let records = ImportSession::page_slice(&filtered, session.page).to_vec();

    PreviewResponse {
        file_name: session.file_name.clone(),
        total_records: session.records.len(),
        valid_count,
        invalid_count,
        no_website_count,
        filtered_count: filtered.len(),
        page: session.page,
        page_size: PAGE_SIZE,
        total_pages: ImportSession::total_pages(filtered.len()),
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::http::StatusCode;
    use axum_test::TestServer;

    fn test_server() -> TestServer {
        // Port 9 is the discard port; the submit transport path is never
        // exercised by these tests, only the pre-flight checks.
        let config = Config {
            max_file_size: 1024,
            business_api_url: "http://127.0.0.1:9/businesses/bulk".to_string(),
        };
        let state = Arc::new(AppState::new(config));
        let app = Router::new()
            .merge(crate::routes::routes())
            .merge(routes())
            .with_state(state);
        TestServer::new(app).expect("test server")
    }

    fn parse_body(csv: &str) -> serde_json::Value {
        json!({ "fileName": "businesses.csv", "content": csv })
    }

    const MIXED_CSV: &str = "Name,Full Address,Municipality,Website\n\
                             Acme GmbH,Hauptstr. 1 Germany,10115 Berlin,acme.de\n\
                             ,Nebenstr. 2,Hamburg,\n";

    #[tokio::test]
    async fn health_check_works() {
        let server = test_server();
        let response = server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "OK");
    }

    #[tokio::test]
    async fn template_is_a_csv_attachment() {
        let server = test_server();
        let response = server.get("/imports/template").await;
        response.assert_status_ok();
        assert!(response.text().starts_with("Name,Full Address,Municipality"));
    }

    #[tokio::test]
    async fn parse_returns_first_preview_page() {
        let server = test_server();
        let response = server.post("/imports/parse").json(&parse_body(MIXED_CSV)).await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["totalRecords"], 2);
        assert_eq!(body["validCount"], 1);
        assert_eq!(body["invalidCount"], 1);
        assert_eq!(body["noWebsiteCount"], 0);
        assert_eq!(body["page"], 1);
        assert_eq!(body["pageSize"], 15);

        let first = &body["records"][0];
        assert_eq!(first["name"], "Acme GmbH");
        assert_eq!(first["postalCode"], "10115");
        assert_eq!(first["city"], "Berlin");
        assert_eq!(first["country"], "Germany");
        assert_eq!(first["rowIndex"], 1);
        assert_eq!(first["isValid"], true);
    }

    #[tokio::test]
    async fn preview_filters_by_status() {
        let server = test_server();
        server.post("/imports/parse").json(&parse_body(MIXED_CSV)).await;

        let response = server.get("/imports/preview?status=valid").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["filteredCount"], 1);
        assert_eq!(body["records"][0]["name"], "Acme GmbH");

        let response = server.get("/imports/preview?status=invalid").await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["filteredCount"], 1);
        assert_eq!(body["records"][0]["rowIndex"], 2);
    }

    #[tokio::test]
    async fn preview_search_narrows_records() {
        let server = test_server();
        server.post("/imports/parse").json(&parse_body(MIXED_CSV)).await;

        let response = server.get("/imports/preview?status=all&search=hamburg").await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["filteredCount"], 1);
        assert_eq!(body["records"][0]["address"], "Nebenstr. 2");
    }

    #[tokio::test]
    async fn selection_drops_unknown_rows() {
        let server = test_server();
        server.post("/imports/parse").json(&parse_body(MIXED_CSV)).await;

        let response = server
            .put("/imports/selection")
            .json(&json!({ "rowIndexes": [1, 99] }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["selected"], 1);
    }

    #[tokio::test]
    async fn non_csv_files_are_rejected() {
        let server = test_server();
        let response = server
            .post("/imports/parse")
            .json(&json!({ "fileName": "businesses.xlsx", "content": "Name\nAcme\n" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_files_are_rejected() {
        let server = test_server();
        let big = format!("Name\n{}\n", "x".repeat(2048));
        let response = server.post("/imports/parse").json(&parse_body(&big)).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_csv_is_a_parse_error_and_resets_the_preview() {
        let server = test_server();
        server.post("/imports/parse").json(&parse_body(MIXED_CSV)).await;

        let response = server
            .post("/imports/parse")
            .json(&parse_body("Name,Address\nAcme,Hauptstr. 1,extra\n"))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        // The failed parse discarded the previous preview as well
        let response = server.get("/imports/preview").await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["totalRecords"], 0);
    }

    #[tokio::test]
    async fn submit_without_eligible_rows_is_an_error() {
        let server = test_server();
        let csv = "Name,Address,Website\nNo Site,Addr 1,\n,Addr 2,two.de\n";
        server.post("/imports/parse").json(&parse_body(csv)).await;

        // A transport failure would surface as 502; the empty set is caught
        // before any network call and maps to 400.
        let response = server.post("/imports/submit").await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let response = server.get("/imports/preview").await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["totalRecords"], 2);
    }

    #[tokio::test]
    async fn reset_discards_the_session() {
        let server = test_server();
        server.post("/imports/parse").json(&parse_body(MIXED_CSV)).await;

        let response = server.post("/imports/reset").await;
        response.assert_status_ok();

        let response = server.get("/imports/preview").await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["totalRecords"], 0);
        assert_eq!(body["fileName"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn pagination_pages_through_filtered_records() {
        let server = test_server();
        let mut csv = String::from("Name,Address,Website\n");
        for i in 1..=20 {
            csv.push_str(&format!("Biz {i},Addr {i},biz{i}.de\n"));
        }
        server.post("/imports/parse").json(&parse_body(&csv)).await;

        let response = server.get("/imports/preview?page=2").await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["totalPages"], 2);
        assert_eq!(body["records"].as_array().unwrap().len(), 5);
        assert_eq!(body["records"][0]["rowIndex"], 16);

        let response = server.get("/imports/preview?page=3").await;
        let body: serde_json::Value = response.json();
        assert!(body["records"].as_array().unwrap().is_empty());
    }
}
