pub mod ai_gateway;
pub mod coingecko;
pub mod db_init;
pub mod email_service;
pub mod gemini;
pub mod openai;
pub mod price_cache;
pub mod scheduler;

pub mod ai_service;
pub mod alert_monitor;
pub mod alerts_service;
pub mod auth_service;
pub mod news_service;
pub mod price_service;
pub mod rss_service;
