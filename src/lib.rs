//! Library entrypoint for CryptoPulse.
//!
//! Integration tests under `tests/` import the app state, routers,
//! controllers and services from here.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

pub mod config;
pub mod models;

#[path = "middleware/auth.rs"]
pub mod auth;
#[path = "middleware/rate_limit.rs"]
pub mod rate_limit;

pub mod services;

#[path = "views/render.rs"]
pub mod render;
#[path = "views/templates.rs"]
pub mod templates;

pub mod controllers;
pub mod routes;

use services::{
    ai_gateway::{AiGateway, AiProvider, RetryPolicy},
    auth_service::SiteGate,
    coingecko::CoinGeckoClient,
    email_service::{Notifier, ResendClient},
    gemini::GeminiClient,
    openai::OpenAiClient,
    price_cache::{PriceCache, SystemClock},
};

/// Process uptime and the last successful news fetch, for `/api/health`.
#[derive(Debug)]
pub struct ServiceStatus {
    started_at: Instant,
    last_news_fetch: RwLock<Option<DateTime<Utc>>>,
}

impl ServiceStatus {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            last_news_fetch: RwLock::new(None),
        }
    }

    pub fn uptime_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    pub fn mark_news_fetch(&self, at: DateTime<Utc>) {
        match self.last_news_fetch.write() {
            Ok(mut guard) => *guard = Some(at),
            Err(poisoned) => *poisoned.into_inner() = Some(at),
        }
    }

    pub fn last_news_fetch(&self) -> Option<DateTime<Utc>> {
        match self.last_news_fetch.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl Default for ServiceStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: mongodb::Database,
    pub settings: config::Settings,
    pub hbs: templates::Hbs,
    pub http: reqwest::Client,
    pub prices: Arc<PriceCache>,
    pub ai: Arc<AiGateway>,
    pub notifier: Arc<dyn Notifier>,
    pub site_gate: SiteGate,
    pub events_tx: tokio::sync::broadcast::Sender<String>,
    pub status: Arc<ServiceStatus>,
    pub rate_limits: Arc<rate_limit::RateLimits>,
}

impl AppState {
    /// Wires the production clients. The site gate is passed in because
    /// hashing the password is the caller's (slow) decision.
    pub fn new(db: mongodb::Database, settings: config::Settings, site_gate: SiteGate) -> Self {
        let hbs = templates::build_handlebars();

        let prices = PriceCache::new(
            Arc::new(CoinGeckoClient::new()),
            Arc::new(SystemClock),
            Duration::from_secs(settings.price_cache_ttl_secs),
        );

        let providers: Vec<Arc<dyn AiProvider>> = vec![
            Arc::new(GeminiClient::new(
                settings.gemini_api_key.clone(),
                settings.gemini_model.clone(),
            )),
            Arc::new(OpenAiClient::new(
                settings.openai_api_key.clone(),
                settings.openai_model.clone(),
            )),
        ];

        let notifier = ResendClient::new(
            settings.resend_api_key.clone(),
            settings.alert_from_email.clone(),
            settings.app_url.clone(),
            hbs.clone(),
            render::display_offset(settings.display_utc_offset_hours),
        );

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("CryptoPulse/0.1")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let (events_tx, _events_rx) = tokio::sync::broadcast::channel::<String>(64);

        let rate_limits = rate_limit::RateLimits::new(
            settings.api_rate_limit_per_min,
            settings.chat_rate_limit_per_min,
        );

        Self {
            db,
            settings,
            hbs,
            http,
            prices: Arc::new(prices),
            ai: Arc::new(AiGateway::new(providers, RetryPolicy::default())),
            notifier: Arc::new(notifier),
            site_gate,
            events_tx,
            status: Arc::new(ServiceStatus::new()),
            rate_limits: Arc::new(rate_limits),
        }
    }
}
