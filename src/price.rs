use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::model::PriceQuote;

/// Substitute BTC/USD price when the live feed is unreachable. Same
/// constant the platform web client ships with.
pub const FALLBACK_PRICE_USD: Decimal = dec!(65432.10);

#[derive(Debug, Error)]
pub enum PriceFeedError {
    #[error("price feed request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("price feed returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("price feed payload is missing bitcoin.usd")]
    MissingPrice,
    #[error("price feed reported a non-positive price: {0}")]
    NonPositive(Decimal),
}

/// Single shared BTC/USD spot source. Live quotes are memoized for the
/// configured TTL so every widget on a refresh cycle sees one price and
/// the feed is hit once, not once per caller. Fallback quotes are never
/// cached; the next call retries the feed.
pub struct PriceOracle {
    client: Client,
    feed_url: String,
    fallback_usd: Decimal,
    ttl: Duration,
    cached: RwLock<Option<PriceQuote>>,
}

impl PriceOracle {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            feed_url: config.price_feed_url.clone(),
            fallback_usd: config.fallback_price_usd,
            ttl: Duration::seconds(config.price_ttl_secs as i64),
            cached: RwLock::new(None),
        })
    }

    /// Current quote, tagged with whether it is live or the fallback.
    /// Never fails: feed trouble degrades to the fallback price and a
    /// warning, matching what the platform web client always did, except
    /// here the caller can see it happened.
    pub async fn spot(&self) -> PriceQuote {
        let now = Utc::now();
        if let Some(quote) = self.cached.read().await.as_ref() {
            if is_fresh(quote, now, self.ttl) {
                debug!("using cached BTC price ${}", quote.usd);
                return quote.clone();
            }
        }

        match self.fetch_live().await {
            Ok(usd) => {
                let quote = PriceQuote {
                    usd,
                    is_fallback: false,
                    fetched_at: now,
                };
                *self.cached.write().await = Some(quote.clone());
                debug!("fetched live BTC price ${}", usd);
                quote
            }
            Err(e) => {
                warn!(
                    "⚠️ BTC price feed unavailable, substituting ${}: {}",
                    self.fallback_usd, e
                );
                PriceQuote {
                    usd: self.fallback_usd,
                    is_fallback: true,
                    fetched_at: now,
                }
            }
        }
    }

    async fn fetch_live(&self) -> Result<Decimal, PriceFeedError> {
        let response = self
            .client
            .get(&self.feed_url)
            .query(&[("ids", "bitcoin"), ("vs_currencies", "usd")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PriceFeedError::Status(response.status()));
        }

        let payload: serde_json::Value = response.json().await?;
        parse_spot_payload(&payload)
    }
}

fn parse_spot_payload(payload: &serde_json::Value) -> Result<Decimal, PriceFeedError> {
    let usd = payload
        .get("bitcoin")
        .and_then(|coin| coin.get("usd"))
        .and_then(|v| v.as_str().map(str::to_owned).or_else(|| Some(v.to_string())))
        .and_then(|s| s.parse::<Decimal>().ok())
        .ok_or(PriceFeedError::MissingPrice)?;

    if usd <= Decimal::ZERO {
        return Err(PriceFeedError::NonPositive(usd));
    }
    Ok(usd)
}

fn is_fresh(quote: &PriceQuote, now: DateTime<Utc>, ttl: Duration) -> bool {
    !quote.is_fallback && now - quote.fetched_at < ttl
}
