#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use http_body_util::BodyExt;
use mongodb::Client;

use cryptopulse::{
    config,
    services::{
        auth_service::SiteGate,
        price_cache::{BtcQuote, Clock, PriceCache, PriceError, PriceSource},
    },
    AppState,
};

pub async fn test_state(site_gate: SiteGate) -> AppState {
    let mut settings = config::load();
    settings.gemini_api_key = String::new();
    settings.openai_api_key = String::new();
    settings.resend_api_key = String::new();
    settings.rss_feeds = Vec::new();

    let client = Client::with_uri_str(&settings.mongodb_uri)
        .await
        .expect("mongodb client");
    let db = client.database(&settings.mongodb_db);

    AppState::new(db, settings, site_gate)
}

pub async fn response_body_string(res: Response) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

pub async fn response_json(res: Response) -> serde_json::Value {
    let body = response_body_string(res).await;
    serde_json::from_str(&body).unwrap_or_else(|e| panic!("not json ({e}): {body}"))
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += TimeDelta::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub struct FakeSource {
    price: Mutex<f64>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(price: f64) -> Self {
        Self {
            price: Mutex::new(price),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_price(&self, price: f64) {
        *self.price.lock().unwrap() = price;
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for FakeSource {
    async fn fetch_btc(&self) -> Result<BtcQuote, PriceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(PriceError::Status {
                status: 429,
                body: "rate limited".to_string(),
            });
        }

        let usd = *self.price.lock().unwrap();
        Ok(BtcQuote {
            usd,
            brl: usd * 5.0,
            change_24h: 1.5,
            volume_24h: 1_000_000.0,
            market_cap: 2_000_000_000.0,
        })
    }
}

pub fn cache_with(source: Arc<FakeSource>, clock: Arc<ManualClock>) -> PriceCache {
    PriceCache::new(source, clock, Duration::from_secs(30))
}
