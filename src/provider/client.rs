use super::{SentenceProvider, SentenceQuery};
use crate::models::SentenceRecord;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio_retry::{strategy::FixedInterval, RetryIf};
use tracing::{debug, error, warn};

const RETRY_INTERVAL_MS: u64 = 500;
const RETRY_ATTEMPTS: usize = 2;

/// REST client for the sentence server's `GET /sentences` endpoint.
pub struct HttpSentenceProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpSentenceProvider {
    pub fn new(base_url: String) -> Self {
        Self::new_with_client(base_url, Client::new())
    }

    pub fn new_with_client(base_url: String, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_once(&self, query: &SentenceQuery) -> Result<Vec<SentenceRecord>> {
        let url = format!("{}/sentences", self.base_url);
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .query(&query.params())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            error!("Sentence server error (status {}): {}", status, error_text);
            return Err(Error::Provider(format!(
                "Sentence server error (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        let values: Vec<serde_json::Value> = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse sentence list: {}", e);
            Error::Provider(format!("Failed to parse sentence list: {}", e))
        })?;

        Ok(parse_records(values))
    }
}

/// Decode each entry on its own so one malformed record does not sink the
/// whole response.
fn parse_records(values: Vec<serde_json::Value>) -> Vec<SentenceRecord> {
    let total = values.len();
    let records: Vec<SentenceRecord> = values
        .into_iter()
        .filter_map(|value| {
            let parsed = serde_json::from_value::<SentenceRecord>(value)
                .map_err(|e| Error::StaleData(e.to_string()))
                .and_then(|record| record.check_shape().map(|_| record));
            match parsed {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping sentence record: {}", e);
                    None
                }
            }
        })
        .collect();

    debug!("Decoded {} of {} sentence records", records.len(), total);
    records
}

#[async_trait]
impl SentenceProvider for HttpSentenceProvider {
    async fn fetch_sentences(&self, query: &SentenceQuery) -> Result<Vec<SentenceRecord>> {
        let retry_strategy = FixedInterval::from_millis(RETRY_INTERVAL_MS).take(RETRY_ATTEMPTS);

        RetryIf::spawn(
            retry_strategy,
            || async {
                self.fetch_once(query).await.map_err(|e| {
                    if matches!(e, Error::Http(_)) {
                        warn!("Sentence fetch failed: {}. Will retry...", e);
                    }
                    e
                })
            },
            |e: &Error| matches!(e, Error::Http(_)),
        )
        .await
    }
}
