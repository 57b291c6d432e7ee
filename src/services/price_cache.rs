//! Single-cell BTC price cache.
//!
//! A snapshot is reused while it is younger than the TTL. When a refresh
//! fails and an older snapshot exists, the stale snapshot is served instead
//! of the error; only a failed first fetch reaches the caller.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::models::PriceSnapshot;

#[derive(Debug, Error)]
pub enum PriceError {
    #[error("price request failed: {0}")]
    Http(String),
    #[error("price API error: {status} {body}")]
    Status { status: u16, body: String },
    #[error("unexpected price payload: {0}")]
    Payload(String),
}

/// Raw market figures, before the cache stamps them.
#[derive(Debug, Clone, PartialEq)]
pub struct BtcQuote {
    pub usd: f64,
    pub brl: f64,
    pub change_24h: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_btc(&self) -> Result<BtcQuote, PriceError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct PriceCache {
    source: Arc<dyn PriceSource>,
    clock: Arc<dyn Clock>,
    ttl: TimeDelta,
    cell: RwLock<Option<Arc<PriceSnapshot>>>,
}

impl PriceCache {
    pub fn new(source: Arc<dyn PriceSource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::seconds(30)),
            cell: RwLock::new(None),
        }
    }

    /// Last snapshot regardless of age.
    pub fn cached(&self) -> Option<Arc<PriceSnapshot>> {
        match self.cell.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn store(&self, snapshot: Arc<PriceSnapshot>) {
        match self.cell.write() {
            Ok(mut guard) => *guard = Some(snapshot),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot),
        }
    }

    fn is_fresh(&self, snapshot: &PriceSnapshot, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(snapshot.last_updated) < self.ttl
    }

    pub async fn get_or_fetch(&self) -> Result<Arc<PriceSnapshot>, PriceError> {
        let now = self.clock.now();
        let previous = self.cached();

        if let Some(snap) = &previous {
            if self.is_fresh(snap, now) {
                return Ok(snap.clone());
            }
        }

        match self.source.fetch_btc().await {
            Ok(quote) => {
                let snapshot = Arc::new(PriceSnapshot {
                    usd: quote.usd,
                    brl: quote.brl,
                    change_24h: quote.change_24h,
                    volume_24h: quote.volume_24h,
                    market_cap: quote.market_cap,
                    last_updated: self.clock.now(),
                });
                self.store(snapshot.clone());
                tracing::info!("[price] BTC updated: ${}", snapshot.usd);
                Ok(snapshot)
            }
            Err(e) => {
                tracing::error!("[price] error fetching BTC price: {}", e);
                match previous {
                    Some(stale) => {
                        tracing::warn!("[price] returning cached price from {}", stale.last_updated);
                        Ok(stale)
                    }
                    None => Err(e),
                }
            }
        }
    }
}
