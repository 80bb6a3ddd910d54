use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use llamabot::cli::{
    commands::{Cli, Commands},
    run_cli,
};
use llamabot::config::AppConfig;
use llamabot::db;
use llamabot::llm::catalog::{load_models_info, ModelCatalog};
use llamabot::llm::create_provider;
use std::time::Duration;
use tracing::{error, info};

// The hosted transcription endpoint caps uploads at 25 MB
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}

async fn index() -> impl Responder {
    let html = include_str!("../static/index.html");
    HttpResponse::Ok().content_type("text/html").body(html)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Serve) {
        run_cli(cli.command, cli.config).await;
        return Ok(());
    }

    info!("Starting LLAMABOT server...");

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let db_pool = match db::get_connection(&config.database) {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let llm_provider = match create_provider(&config) {
        Some(p) => p,
        None => {
            error!("Groq API key is missing in the configuration");
            std::process::exit(1);
        }
    };

    let catalog = web::Data::new(ModelCatalog::new(
        llm_provider.clone(),
        load_models_info(&config.models.info_path),
        Duration::from_secs(config.models.cache_ttl_secs),
    ));

    let host = config.server.host.clone();
    let port = config.server.port;

    info!("Server listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(llm_provider.clone()))
            .app_data(catalog.clone())
            .route("/", web::get().to(index))
            .route("/health", web::get().to(health))
            .configure(llamabot::api::routes::configure)
            .configure(llamabot::api::websocket::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
