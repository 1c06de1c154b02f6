// src/client.rs
use crate::models::{FundList, History, NavHistory, Snapshot};
use log::{error, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{self, Duration};

pub const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Fetches market data from the service, retrying every failure a fixed
/// number of times before giving up.
#[derive(Debug, Clone)]
pub struct MarketDataClient {
    http: Client,
    base_url: String,
    retries: u32,
    retry_delay: Duration,
}

impl MarketDataClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = delay;
        self
    }

    pub async fn snapshot(&self) -> Result<Snapshot, ClientError> {
        self.get_json(&[]).await
    }

    pub async fn history(&self, symbol: &str, days: Option<u32>) -> Result<History, ClientError> {
        let mut query = vec![("action", "history".to_string()), ("symbol", symbol.to_string())];
        if let Some(days) = days {
            query.push(("days", days.to_string()));
        }
        self.get_json(&query).await
    }

    pub async fn funds(&self) -> Result<FundList, ClientError> {
        self.get_json(&[("action", "funds".to_string())]).await
    }

    pub async fn nav_history(&self, code: &str, days: Option<u32>) -> Result<NavHistory, ClientError> {
        let mut query = vec![("action", "nav".to_string()), ("fund", code.to_string())];
        if let Some(days) = days {
            query.push(("days", days.to_string()));
        }
        self.get_json(&query).await
    }

    async fn get_json<T: DeserializeOwned>(&self, query: &[(&str, String)]) -> Result<T, ClientError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(query).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        "Fetch from {} failed ({}), retry {}/{}",
                        self.base_url, e, attempt, self.retries
                    );
                    time::sleep(self.retry_delay).await;
                }
                Err(e) => {
                    error!("Giving up on {} after {} attempts: {}", self.base_url, attempt + 1, e);
                    return Err(e);
                }
            }
        }
    }

    async fn fetch_once<T: DeserializeOwned>(&self, query: &[(&str, String)]) -> Result<T, ClientError> {
        let response = self.http.get(&self.base_url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

const MIN_WATCH_INTERVAL: Duration = Duration::from_millis(1);

/// Refetches the snapshot every `every` (at least 1ms) and forwards it to
/// `tx`. Failed rounds are logged and skipped; the loop ends as soon as the
/// receiver is gone, whether or not the server is answering.
pub async fn watch_snapshots(client: MarketDataClient, every: Duration, tx: mpsc::Sender<Snapshot>) {
    let mut ticker = time::interval(every.max(MIN_WATCH_INTERVAL));
    loop {
        let fetched = tokio::select! {
            _ = tx.closed() => break,
            fetched = async {
                ticker.tick().await;
                client.snapshot().await
            } => fetched,
        };
        match fetched {
            Ok(snapshot) => {
                if tx.send(snapshot).await.is_err() {
                    break;
                }
            }
            Err(e) => error!("Snapshot refresh failed: {}", e),
        }
    }
    info!("Snapshot receiver closed, stopping watcher.");
}
