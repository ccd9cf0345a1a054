use std::io;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use visage::{
    config::AppConfig,
    generation,
    logger::{self, LoggerConfig},
    orchestrator::{Orchestrator, PipelineSettings},
    server::{self, AppState},
    storage::CloudinaryStore,
    Result,
};

async fn build_pipeline(config: &AppConfig) -> Result<Orchestrator> {
    config.validate()?;

    let generator = generation::build_generator(config).await?;
    let describer = generation::build_describer(config)?;
    let store = Arc::new(CloudinaryStore::new(config.cloudinary.clone())?);
    Orchestrator::new(generator, store, describer, PipelineSettings::from(config))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let (config, config_error) = match AppConfig::from_env() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    if let Err(e) = logger::init_with_config(LoggerConfig::for_debug(config.server.debug)) {
        eprintln!("{}", e);
    }

    if dotenv_loaded {
        log::info!(".env file loaded");
    } else {
        log::debug!("No .env file found, using process environment");
    }
    logger::log_config_info(&config);

    let pipeline = match config_error {
        Some(e) => Err(e),
        None => build_pipeline(&config).await,
    };

    let debug = config.server.debug;
    let max_upload_bytes = config.server.max_upload_bytes;
    let state = match pipeline {
        Ok(orchestrator) => AppState::new(Arc::new(orchestrator), debug, max_upload_bytes),
        Err(e) => {
            log::error!("{}; /generate will answer 500 until this is fixed", e);
            AppState::unconfigured(e.detail(), debug, max_upload_bytes)
        }
    };

    let origins = config.server.allowed_origins.clone();
    let port = config.server.port;

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::new("%r %s %Dms"))
            .configure(|cfg| server::routes(cfg, &origins))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
