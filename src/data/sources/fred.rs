//! FRED economic data integration
//!
//! Downloads observations from the St. Louis Fed's FRED API and stores them
//! as `date,value` CSV files that `CsvSeriesStore` reads.

use crate::data::series::{parse_value, CsvSeriesStore, Observation, Series};
use crate::error::{RegimeError, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const FRED_BASE_URL: &str = "https://api.stlouisfed.org/fred";
const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;

/// Environment variable holding the API key
pub const FRED_API_KEY_ENV: &str = "FRED_API_KEY";

/// FRED data source
pub struct FredSource {
    api_key: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct FredResponse {
    observations: Vec<FredObservation>,
}

#[derive(Debug, Deserialize)]
struct FredObservation {
    date: String,
    value: String,
}

impl FredSource {
    /// Create a new FRED data source
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RegimeError::DataError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: FRED_BASE_URL.to_string(),
            client,
        })
    }

    /// Create a source using the key in `FRED_API_KEY`
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(FRED_API_KEY_ENV).map_err(|_| {
            RegimeError::ConfigError(format!("{} is not set", FRED_API_KEY_ENV))
        })?;
        Self::new(key)
    }

    /// Override the API root (mirrors, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch one series with retry logic
    pub async fn fetch_series(&self, id: &str, start: NaiveDate, end: NaiveDate) -> Result<Series> {
        let url = format!(
            "{}/series/observations?series_id={}&api_key={}&file_type=json&observation_start={}&observation_end={}",
            self.base_url,
            id,
            self.api_key,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );

        let mut retries = 0;
        loop {
            match self.request(&url).await {
                Ok(response) => return parse_response(id, response),
                Err(e) if retries < MAX_RETRIES => {
                    retries += 1;
                    log::warn!("Fetching {} failed (attempt {}): {}", id, retries, e);
                    tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * retries as u64))
                        .await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Download several series into `dir` as `<id>.csv`.
    ///
    /// A series that comes back with no observations at all aborts the
    /// download, since no panel can be built from it.
    pub async fn download_to_dir(
        &self,
        ids: &[String],
        start: NaiveDate,
        end: NaiveDate,
        dir: &Path,
    ) -> Result<Vec<Series>> {
        std::fs::create_dir_all(dir)?;
        let store = CsvSeriesStore::new(dir);
        let mut downloaded = Vec::with_capacity(ids.len());

        for id in ids {
            let series = self.fetch_series(id, start, end).await?;
            if series.is_empty() {
                return Err(RegimeError::EmptySeries(id.clone()));
            }
            CsvSeriesStore::write_file(&series, &store.path_for(id))?;
            log::info!("Downloaded {} observations for {}", series.len(), id);
            downloaded.push(series);
        }

        Ok(downloaded)
    }

    async fn request(&self, url: &str) -> Result<FredResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RegimeError::DataError(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RegimeError::DataError(format!(
                "FRED returned error: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RegimeError::DataError(format!("JSON parse error: {}", e)))
    }
}

fn parse_response(id: &str, response: FredResponse) -> Result<Series> {
    let observations = response
        .observations
        .into_iter()
        .map(|obs| {
            let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
                .map_err(|e| RegimeError::DataError(format!("Date parse error: {}", e)))?;
            Ok(Observation::new(date, parse_value(&obs.value)?))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Series::new(id, observations))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fred_source_creation() {
        let source = FredSource::new("test_key".to_string());
        assert!(source.is_ok());
    }

    #[test]
    fn test_parse_response_keeps_missing_markers() {
        let json = r#"{"observations":[
            {"date":"2020-01-01","value":"1.55"},
            {"date":"2020-02-01","value":"."}
        ]}"#;
        let response: FredResponse = serde_json::from_str(json).unwrap();
        let series = parse_response("FEDFUNDS", response).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.observations[0].value, Some(1.55));
        assert_eq!(series.observations[1].value, None);
    }
}
