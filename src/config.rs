use serde::Deserialize;
use anyhow::Result;
use dotenvy::dotenv;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub max_file_size: usize,
    pub business_api_url: String,
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        // The bulk-import endpoint of the business API
        let business_api_url = std::env::var("BUSINESS_API_URL")
            .map_err(|e| anyhow::anyhow!("Failed to load BUSINESS_API_URL: {}", e))?;

        let max_file_size = std::env::var("MAX_FILE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10 * 1024 * 1024); // 10MB

        Ok(Config {
            max_file_size,
            business_api_url,
        })
    }
}
