use std::time::Duration;

use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use reqwest::Client;
use serde_json::json;

use crate::{
    models::{Direction, PriceAlert},
    render,
    templates::{self, Hbs},
};

const RESEND_URL: &str = "https://api.resend.com/emails";

/// Delivers one message per triggered alert.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_price_alert(&self, alert: &PriceAlert, current_price: f64) -> Result<(), String>;
}

#[derive(Clone)]
pub struct ResendClient {
    http: Client,
    api_key: String,
    from: String,
    app_url: String,
    hbs: Hbs,
    offset: FixedOffset,
}

impl ResendClient {
    pub fn new(api_key: String, from: String, app_url: String, hbs: Hbs, offset: FixedOffset) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            api_key,
            from,
            app_url,
            hbs,
            offset,
        }
    }

    fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn render_price_alert(&self, alert: &PriceAlert, current_price: f64) -> Result<(String, String), String> {
        let current = render::fmt_usd(current_price);
        let direction_text = match alert.direction {
            Direction::Above => "above",
            Direction::Below => "below",
        };

        let ctx = json!({
            "email": alert.email,
            "current_price": current,
            "target_price": render::fmt_usd(alert.target_price),
            "direction_text": direction_text,
            "triggered_at": render::fmt_local_time(Utc::now(), self.offset),
            "app_url": self.app_url,
        });

        let html = self
            .hbs
            .render(templates::PRICE_ALERT_EMAIL, &ctx)
            .map_err(|e| format!("template error: {e}"))?;

        let subject = format!("BTC alert: price reached {current}!");
        Ok((subject, html))
    }
}

#[async_trait]
impl Notifier for ResendClient {
    async fn send_price_alert(&self, alert: &PriceAlert, current_price: f64) -> Result<(), String> {
        if !self.has_key() {
            return Err("RESEND_API_KEY not configured".to_string());
        }

        let (subject, html) = self.render_price_alert(alert, current_price)?;

        let res = self
            .http
            .post(RESEND_URL)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [alert.email],
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("Resend send failed: {status} {body}"));
        }

        tracing::info!(
            "[email] alert sent to {} for BTC at {}",
            alert.email,
            render::fmt_usd(current_price)
        );
        Ok(())
    }
}
