//! Runtime configuration from environment variables (a `.env` file is honored).

use std::env;
use std::path::PathBuf;

/// Active players per match before new registrations go to the waitlist.
pub const DEFAULT_CAPACITY: usize = 16;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite connection string, e.g. `sqlite:data/halisaha.db`.
    pub database_url: String,
    pub photo_dir: PathBuf,
    pub capacity: usize,
    pub payments: PaymentConfig,
}

#[derive(Clone, Debug)]
pub struct PaymentConfig {
    /// Public base URL of the app, used for checkout success/cancel redirects.
    pub app_url: String,
    pub app_name: String,
    pub currency: String,
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub stripe_api_base: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:8080".to_string(),
            app_name: "Perşembe Halısaha".to_string(),
            currency: "gbp".to_string(),
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            stripe_api_base: "https://api.stripe.com".to_string(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "sqlite:data/halisaha.db".to_string()
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Config {
    /// Read HOST, PORT, DATABASE_URL, PHOTO_DIR, MATCH_CAPACITY, APP_URL, APP_NAME,
    /// PAYMENT_CURRENCY, STRIPE_SECRET_KEY, STRIPE_WEBHOOK_SECRET and STRIPE_API_BASE.
    /// Missing or unparsable values fall back to defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = PaymentConfig::default();
        let payments = PaymentConfig {
            app_url: non_empty("APP_URL").unwrap_or(defaults.app_url),
            app_name: non_empty("APP_NAME").unwrap_or(defaults.app_name),
            currency: non_empty("PAYMENT_CURRENCY").unwrap_or(defaults.currency),
            stripe_secret_key: non_empty("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: non_empty("STRIPE_WEBHOOK_SECRET"),
            stripe_api_base: non_empty("STRIPE_API_BASE").unwrap_or(defaults.stripe_api_base),
        };
        if payments.stripe_secret_key.is_none() {
            log::warn!("STRIPE_SECRET_KEY is not set; card payments are disabled");
        }
        if payments.stripe_webhook_secret.is_none() {
            log::warn!("STRIPE_WEBHOOK_SECRET is not set; Stripe webhooks will be rejected");
        }

        Self {
            host: non_empty("HOST").unwrap_or_else(default_host),
            port: non_empty("PORT").and_then(|p| p.parse().ok()).unwrap_or_else(default_port),
            database_url: non_empty("DATABASE_URL").unwrap_or_else(default_database_url),
            photo_dir: non_empty("PHOTO_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("photos")),
            capacity: non_empty("MATCH_CAPACITY")
                .and_then(|c| c.parse().ok())
                .filter(|c| *c > 0)
                .unwrap_or(DEFAULT_CAPACITY),
            payments,
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
