use axum_extra::extract::cookie::{Cookie, SameSite};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Settings;

/// Token handed out when the site has no password.
pub const OPEN_TOKEN: &str = "open";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    // expiry (unix timestamp seconds)
    pub exp: usize,
}

/// Site-wide password gate. Only a bcrypt hash of the password is kept.
#[derive(Debug, Clone, Default)]
pub struct SiteGate {
    password_hash: Option<String>,
}

impl SiteGate {
    pub fn open() -> Self {
        Self { password_hash: None }
    }

    pub fn from_password(password: &str, cost: u32) -> Result<Self, String> {
        if password.is_empty() {
            return Ok(Self::open());
        }

        let password_hash = hash(password, cost).map_err(|e| e.to_string())?;
        Ok(Self {
            password_hash: Some(password_hash),
        })
    }

    pub fn is_open(&self) -> bool {
        self.password_hash.is_none()
    }

    pub fn check_password(&self, candidate: &str) -> bool {
        match &self.password_hash {
            Some(h) => verify(candidate, h).unwrap_or(false),
            None => true,
        }
    }
}

pub fn make_jwt_with_days(settings: &Settings, days: i64) -> Result<String, String> {
    let exp = (Utc::now() + Duration::days(days)).timestamp() as usize;

    let claims = Claims {
        sub: "site".to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| e.to_string())
}

pub fn verify_jwt(settings: &Settings, token: &str) -> bool {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &validation,
    )
    .is_ok()
}

pub fn auth_cookie(settings: &Settings, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(settings.jwt_cookie_name.clone(), token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    if settings.cookie_secure {
        cookie.set_secure(true);
    }
    cookie
}
