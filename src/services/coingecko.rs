use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::price_cache::{BtcQuote, PriceError, PriceSource};

const SIMPLE_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

#[derive(Clone)]
pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new() -> Self {
        Self::with_base_url(SIMPLE_PRICE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            base_url: base_url.to_string(),
        }
    }
}

impl Default for CoinGeckoClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn fetch_btc(&self) -> Result<BtcQuote, PriceError> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("ids", "bitcoin"),
                ("vs_currencies", "usd,brl"),
                ("include_24hr_change", "true"),
                ("include_24hr_vol", "true"),
                ("include_market_cap", "true"),
            ])
            .send()
            .await
            .map_err(|e| PriceError::Http(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(PriceError::Status { status, body });
        }

        let payload = res
            .json::<SimplePriceResponse>()
            .await
            .map_err(|e| PriceError::Payload(e.to_string()))?;

        payload.into_quote()
    }
}

#[derive(Debug, Deserialize)]
pub struct SimplePriceResponse {
    pub bitcoin: Option<BitcoinFields>,
}

#[derive(Debug, Deserialize)]
pub struct BitcoinFields {
    pub usd: f64,
    #[serde(default)]
    pub brl: f64,
    #[serde(default)]
    pub usd_24h_change: f64,
    #[serde(default)]
    pub usd_24h_vol: f64,
    #[serde(default)]
    pub usd_market_cap: f64,
}

impl SimplePriceResponse {
    pub fn into_quote(self) -> Result<BtcQuote, PriceError> {
        let btc = self
            .bitcoin
            .ok_or_else(|| PriceError::Payload("missing `bitcoin` entry".to_string()))?;

        if !btc.usd.is_finite() || btc.usd <= 0.0 {
            return Err(PriceError::Payload(format!("invalid usd price {}", btc.usd)));
        }

        Ok(BtcQuote {
            usd: btc.usd,
            brl: btc.brl,
            change_24h: btc.usd_24h_change,
            volume_24h: btc.usd_24h_vol,
            market_cap: btc.usd_market_cap,
        })
    }
}
