use std::net::SocketAddr;

use mongodb::Client;
use tracing_subscriber::EnvFilter;

use cryptopulse::{
    config,
    routes,
    services::{auth_service::SiteGate, db_init, scheduler},
    AppState,
};

#[tokio::main]
async fn main() {
    // RUST_LOG overrides; default keeps the bracketed service logs
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = config::load();

    // Mongo connection (lazy: the driver connects on first use)
    let client = match Client::with_uri_str(&settings.mongodb_uri).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("[boot] invalid MongoDB URI: {}", e);
            std::process::exit(1);
        }
    };
    let db = client.database(&settings.mongodb_db);

    let site_gate = match SiteGate::from_password(&settings.site_password, bcrypt::DEFAULT_COST) {
        Ok(g) => g,
        Err(e) => {
            tracing::error!("[boot] could not hash SITE_PASSWORD: {}", e);
            std::process::exit(1);
        }
    };

    if site_gate.is_open() {
        tracing::info!("[auth] no SITE_PASSWORD set, open access");
    } else {
        tracing::info!("[auth] password protection enabled");
    }

    let state = AppState::new(db, settings.clone(), site_gate);

    let ip = match settings.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            tracing::error!("[boot] invalid HOST {}: {}", settings.host, e);
            std::process::exit(1);
        }
    };
    let addr = SocketAddr::from((ip, settings.port));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("[boot] cannot bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("listening on http://{}", addr);

    // Listen first so health checks pass while the database and feeds warm up.
    tokio::spawn(bootstrap(state.clone()));

    // peer address keys the per-client rate limits
    let app = routes::app(state).into_make_service_with_connect_info::<SocketAddr>();
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", e);
    }
}

async fn bootstrap(state: AppState) {
    if let Err(e) = db_init::ensure_indexes(&state.db).await {
        tracing::error!("[boot] database init failed: {}", e);
    }

    scheduler::spawn_all(&state);

    tracing::info!("[boot] running initial RSS fetch");
    if let Err(e) = scheduler::refresh_news(&state).await {
        tracing::error!("[boot] initial RSS fetch failed: {}", e);
    }

    tracing::info!("[boot] fetching initial BTC price");
    if let Err(e) = scheduler::refresh_price(state.clone()).await {
        tracing::error!("[boot] initial BTC price fetch failed: {}", e);
    }

    tracing::info!("[boot] server ready");
}
