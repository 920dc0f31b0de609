use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use pinkvanity::config::{LogFormat, Settings};
use pinkvanity::routes::{self, AppState};
use pinkvanity::services::{Debouncer, MatchApiClient, MessageRouter, PageAnalyzer, Preferences, SavingsLedger, Storage};
use pinkvanity::Overlay;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors, including unknown message types
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path errors (e.g. malformed segments)
pub fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(settings: &Settings) {
    // LOG_LEVEL / LOG_FORMAT win over the config file
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true);

    match LogFormat::parse(&log_format) {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
        LogFormat::Compact => subscriber.compact().init(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Configuration first so logging can follow it
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings);
    info!("Starting PinkVanity companion...");

    let storage = match Storage::open(&settings.storage.dir).await {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            error!("Failed to open storage at {}: {}", settings.storage.dir.display(), e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    info!("Storage opened at {}", settings.storage.dir.display());

    let preferences = Preferences::with_default_api_url(storage.clone(), settings.api.default_url.clone());
    match preferences.install_defaults().await {
        Ok(true) => info!("PinkVanity installed, default preferences written"),
        Ok(false) => {}
        Err(e) => error!("Failed to write default preferences: {}", e),
    }

    let ledger = SavingsLedger::spawn(storage.clone()).await;

    let api = Arc::new(MatchApiClient::new(
        preferences.clone(),
        settings.api.cache_size,
        settings.api.cache_ttl(),
    ));

    info!(
        "Matching API client initialized (quick-match cache: {} entries, TTL: {}s)",
        settings.api.cache_size, settings.api.cache_ttl_secs
    );

    let analyzer = Arc::new(PageAnalyzer::new(
        preferences.clone(),
        api.clone(),
        Arc::new(Mutex::new(Overlay::new())),
    ));

    let router = MessageRouter::new(ledger, preferences, analyzer, api)
        .with_remote_savings(settings.api.sync_savings);

    let app_state = AppState::new(router, Debouncer::new(settings.analysis.debounce()));

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(2);

    info!("Starting HTTP server on {}:{}", host, port);

    let allowed_origins = settings.server.allowed_origins.clone();

    HttpServer::new(move || {
        let cors = routes::cors(allowed_origins.clone());

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
