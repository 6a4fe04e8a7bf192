use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use std::io;
use std::sync::Arc;

use studytasks::auth::{PasswordHasher, TokenService};
use studytasks::config::Config;
use studytasks::store::{Database, PgTaskStore, PgUserStore};
use studytasks::AppState;

fn startup_error(context: &str, cause: impl std::fmt::Display) -> io::Error {
    log::error!("{}: {}", context, cause);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, cause))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| startup_error("invalid configuration", e))?;
    let tokens = TokenService::new(&config.jwt_secret).map_err(|e| startup_error("invalid configuration", e))?;
    let hasher =
        PasswordHasher::new(config.bcrypt_cost).map_err(|e| startup_error("password hasher unavailable", e))?;

    let db = Arc::new(Database::new(config.database_url.clone()));
    db.connect()
        .await
        .map_err(|e| startup_error("failed to connect to database", e))?;

    if config.api_key.is_none() {
        log::warn!("API_KEY is not set; the /api key gate is disabled");
    }

    let state = AppState::new(
        Arc::new(PgUserStore::new(db.clone())),
        Arc::new(PgTaskStore::new(db)),
        tokens,
        hasher,
        config.api_key.clone(),
    );

    log::info!("Starting studytasks server at {}", config.server_url());
    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(move |cfg| state.configure(cfg))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
