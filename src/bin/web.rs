//! Single binary web server: JSON API under /api, player photos under /photos.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! Other settings (DATABASE_URL, PHOTO_DIR, MATCH_CAPACITY, STRIPE_*) are read from the
//! environment or a `.env` file.

use actix_web::{get, web::Data, App, HttpResponse, HttpServer};
use halisaha::{api, api::AppState, Config};

/// Avoid 404 noise in browser tabs.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    std::fs::create_dir_all(&config.photo_dir)?;
    let state = match AppState::from_config(&config).await {
        Ok(state) => Data::new(state),
        Err(e) => {
            log::error!("Could not open the database: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    let bind = config.server_addr();
    log::info!("Starting server at http://{}", bind);
    log::info!("Match capacity: {} players", config.capacity);

    HttpServer::new(move || App::new().service(favicon).configure(api::configure(state.clone())))
        .bind(bind)?
        .run()
        .await
}
