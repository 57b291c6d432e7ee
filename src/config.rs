use std::env;

#[derive(Debug, Clone)]
pub struct Settings {
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    pub app_url: String,

    pub jwt_secret: String,
    pub jwt_cookie_name: String,
    pub cookie_secure: bool,
    // empty => open access
    pub site_password: String,

    pub gemini_api_key: String,
    pub gemini_model: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub ai_response_language: String,

    pub resend_api_key: String,
    pub alert_from_email: String,

    pub rss_feeds: Vec<String>,
    pub display_utc_offset_hours: i32,

    pub price_cache_ttl_secs: u64,
    pub price_refresh_interval_secs: u64,
    pub alert_check_interval_secs: u64,
    pub price_history_interval_secs: u64,
    pub rss_interval_secs: u64,
    pub daily_summary_hour_utc: u32,

    // requests per minute per client
    pub api_rate_limit_per_min: u32,
    pub chat_rate_limit_per_min: u32,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Splits a comma-separated feed list, dropping blanks.
pub fn parse_feed_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|url| url.trim())
        .filter(|url| !url.is_empty())
        .map(|url| url.to_string())
        .collect()
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| "change-me-dev-secret".to_string());

    Settings {
        mongodb_uri: var_or("MONGODB_URI", "mongodb://localhost:27017"),
        mongodb_db: var_or("MONGODB_DB", "cryptopulse"),
        host: var_or("HOST", "127.0.0.1"),
        port: parsed_or("PORT", 3001),
        static_dir: var_or("STATIC_DIR", "public"),
        app_url: var_or("APP_URL", "http://localhost:3001"),

        jwt_secret,
        jwt_cookie_name: var_or("JWT_COOKIE_NAME", "auth"),
        cookie_secure: parsed_or("COOKIE_SECURE", false),
        site_password: env::var("SITE_PASSWORD").unwrap_or_default(),

        gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
        gemini_model: var_or("GEMINI_MODEL", "gemini-2.0-flash"),
        openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
        openai_model: var_or("OPENAI_MODEL", "gpt-4o-mini"),
        ai_response_language: var_or("AI_RESPONSE_LANGUAGE", "Brazilian Portuguese"),

        resend_api_key: env::var("RESEND_API_KEY").unwrap_or_default(),
        alert_from_email: var_or("ALERT_FROM_EMAIL", "alerts@cryptopulse.app"),

        rss_feeds: parse_feed_list(&env::var("RSS_FEEDS").unwrap_or_default()),
        display_utc_offset_hours: parsed_or("DISPLAY_UTC_OFFSET_HOURS", -3),

        price_cache_ttl_secs: parsed_or("PRICE_CACHE_TTL_SECS", 30),
        price_refresh_interval_secs: parsed_or("PRICE_REFRESH_INTERVAL_SECS", 30),
        alert_check_interval_secs: parsed_or("ALERT_CHECK_INTERVAL_SECS", 60),
        price_history_interval_secs: parsed_or("PRICE_HISTORY_INTERVAL_SECS", 300),
        rss_interval_secs: parsed_or("RSS_INTERVAL_SECS", 1800),
        daily_summary_hour_utc: parsed_or("DAILY_SUMMARY_HOUR_UTC", 8u32).min(23),

        api_rate_limit_per_min: parsed_or("API_RATE_LIMIT_PER_MIN", 100),
        chat_rate_limit_per_min: parsed_or("CHAT_RATE_LIMIT_PER_MIN", 10),
    }
}
