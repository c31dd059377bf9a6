//! HTTP API: JSON endpoints over the organizer logic. Every handler takes the shared
//! [`AppState`], runs its operation against the database pool, and answers with JSON.

mod matches;
mod payments;
mod players;
mod registrations;

use crate::config::{Config, PaymentConfig, DEFAULT_CAPACITY};
use crate::db::{self, DbPool};
use crate::error::Result;
use crate::payment::StripeClient;
use crate::photos::{PhotoStorage, PUBLIC_PREFIX};
use actix_files::Files;
use actix_web::{get, web, HttpResponse, Responder};

/// Largest accepted request body (photo uploads).
const MAX_PAYLOAD: usize = 5 * 1024 * 1024;

/// Everything a request handler needs. Built once at startup.
pub struct AppState {
    pub pool: DbPool,
    pub photos: PhotoStorage,
    pub capacity: usize,
    pub payments: PaymentConfig,
    /// `None` when no Stripe key is configured.
    pub stripe: Option<StripeClient>,
}

impl AppState {
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = db::create_pool(&config.database_url).await?;
        db::run_migrations(&pool).await?;
        let stripe = config
            .payments
            .stripe_secret_key
            .as_ref()
            .map(|key| StripeClient::new(key.clone(), config.payments.stripe_api_base.clone()));
        Ok(Self {
            pool,
            photos: PhotoStorage::new(config.photo_dir.clone()),
            capacity: config.capacity,
            payments: config.payments.clone(),
            stripe,
        })
    }

    /// In-memory database with payments disabled (tests).
    pub async fn in_memory(photo_dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        Ok(Self {
            pool: db::memory_pool().await?,
            photos: PhotoStorage::new(photo_dir),
            capacity: DEFAULT_CAPACITY,
            payments: PaymentConfig::default(),
            stripe: None,
        })
    }
}

pub type State = web::Data<AppState>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "halisaha",
    })
}

/// Register every route. Literal paths come before `{id}` paths that would otherwise shadow them.
pub fn configure(state: State) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        let photo_dir = state.photos.dir().to_path_buf();
        cfg.app_data(state)
            .app_data(web::PayloadConfig::new(MAX_PAYLOAD))
            .service(api_health)
            // matches
            .service(matches::api_list_matches)
            .service(matches::api_create_match)
            .service(matches::api_create_next_thursday)
            .service(matches::api_active_match)
            .service(matches::api_past_matches)
            .service(matches::api_get_match)
            .service(matches::api_update_status)
            .service(matches::api_update_score)
            .service(matches::api_match_players)
            .service(matches::api_waitlist)
            .service(matches::api_auto_assign)
            .service(matches::api_save_teams)
            .service(matches::api_team_power)
            // registrations
            .service(registrations::api_register)
            .service(registrations::api_remove_player)
            .service(registrations::api_cancel)
            .service(registrations::api_set_payment)
            .service(registrations::api_set_team)
            .service(registrations::api_manual_payment)
            // payments
            .service(payments::api_checkout)
            .service(payments::api_verify_payment)
            .service(payments::api_stripe_webhook)
            // players
            .service(players::api_list_players)
            .service(players::api_ranking)
            .service(players::api_get_player)
            .service(players::api_update_profile)
            .service(players::api_update_ratings)
            .service(players::api_confirm_player)
            .service(players::api_update_photo)
            .service(players::api_player_stats)
            .service(players::api_player_history)
            .service(players::api_player_teammates)
            .service(Files::new(PUBLIC_PREFIX, photo_dir));
    }
}
