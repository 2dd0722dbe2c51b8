//! SlapHard backend server.
//!
//! Wires the room store, the persistence journal, and the [`Parlor`] into
//! an actix-web application exposing `/health` and the `/ws` game socket.
//!
//! ## Submodules
//!
//! - [`config`] — Environment-driven configuration
//! - [`ws`] — Websocket session pump
pub mod config;
pub mod ws;

pub use config::ServerConfig;

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::web;
use slap_gameroom::MemoryStore;
use slap_gameroom::Parlor;
use slap_gameroom::RedisStore;
use slap_gameroom::RoomStore;
use std::sync::Arc;

async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

fn cors_for(origins: &[String]) -> Cors {
    if origins.is_empty() {
        // Development fallback; production requires explicit origins.
        return Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();
    }
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let store: Arc<dyn RoomStore> = match &config.redis_url {
        Some(url) => {
            log::info!("using redis room store");
            Arc::new(RedisStore::open(url)?)
        }
        None => {
            log::warn!("using in-memory room store; rooms die with this process");
            Arc::new(MemoryStore::new())
        }
    };

    let repo = match config.database_url.as_deref().filter(|_| config.enable_db_persistence) {
        Some(url) => {
            let client = slap_database::db(url).await?;
            let repo = slap_database::Repository::new(client);
            repo.migrate().await?;
            Some(repo)
        }
        None => {
            log::info!("db persistence disabled");
            None
        }
    };

    let parlor = web::Data::new(Parlor::new(store, repo));
    let origins = config.cors_origins.clone();
    let port = config.port;
    log::info!("starting server on port {}", port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(cors_for(&origins))
            .app_data(parlor.clone())
            .route("/health", web::get().to(health))
            .route("/ws", web::get().to(ws::socket))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;
    Ok(())
}
