//! EdgeX exchange HTTP adapter
//!
//! Holds the validated base URL and account credentials and exposes the
//! unauthenticated quote surface the engine polls. The signed order endpoints
//! live behind the same credentials but are not part of this crate's surface.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::config::SigningKey;
use crate::error::{GridError, Result};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// EdgeX REST client
#[derive(Debug, Clone)]
pub struct EdgeXAdapter {
    client: reqwest::Client,
    base_url: String,
    account_id: u64,
    signing_key: SigningKey,
}

/// One ticker observation
#[derive(Debug, Clone)]
pub struct Ticker {
    pub symbol: String,
    pub last_price: Option<Decimal>,
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
    pub fetched_at: DateTime<Utc>,
}

impl Ticker {
    /// Mid of best bid/ask, falling back to the last trade price
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid, self.best_ask) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::TWO),
            _ => self.last_price,
        }
    }
}

// ==================== API Response Types ====================

#[derive(Debug, Deserialize)]
struct TickerEnvelope {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    data: Vec<TickerData>,
}

/// EdgeX serializes prices as strings
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickerData {
    #[serde(default)]
    last_price: Option<String>,
    #[serde(default)]
    best_bid: Option<String>,
    #[serde(default)]
    best_ask: Option<String>,
}

fn parse_price(raw: &Option<String>) -> Option<Decimal> {
    raw.as_deref().and_then(|s| Decimal::from_str(s).ok())
}

impl EdgeXAdapter {
    pub fn new(base_url: &str, account_id: u64, signing_key: SigningKey) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(GridError::Http)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            account_id,
            signing_key,
        })
    }

    pub fn account_id(&self) -> u64 {
        self.account_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credential for the signed order path; redacted from Debug output
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Fetch the public ticker for one contract
    ///
    /// `symbol_param` is the query parameter name the deployment expects for
    /// the contract identifier (`contractId` on production).
    pub async fn get_ticker(&self, symbol_param: &str, symbol: &str) -> Result<Ticker> {
        let url = format!("{}/api/v1/public/quote/getTicker", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[(symbol_param, symbol)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GridError::Exchange(format!(
                "ticker request for {symbol} returned HTTP {status}"
            )));
        }

        let envelope: TickerEnvelope = response.json().await?;
        if let Some(code) = envelope.code.as_deref() {
            if code != "SUCCESS" {
                return Err(GridError::Exchange(format!(
                    "ticker request for {symbol} returned code {code}"
                )));
            }
        }
        let data = envelope.data.first().ok_or_else(|| {
            GridError::Exchange(format!("ticker response for {symbol} has no data"))
        })?;

        let ticker = Ticker {
            symbol: symbol.to_string(),
            last_price: parse_price(&data.last_price),
            best_bid: parse_price(&data.best_bid),
            best_ask: parse_price(&data.best_ask),
            fetched_at: Utc::now(),
        };
        debug!(
            "ticker symbol={} last={:?} bid={:?} ask={:?}",
            ticker.symbol, ticker.last_price, ticker.best_bid, ticker.best_ask
        );
        Ok(ticker)
    }
}
