// Route exports
pub mod messages;
pub mod settings;
pub mod widget;

use actix_cors::Cors;
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use tokio::sync::Mutex;
use crate::core::{Overlay, Widget};
use crate::models::{ErrorResponse, HealthResponse};
use crate::services::{Debouncer, MessageRouter, RouterError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub router: MessageRouter,
    pub overlay: Arc<Mutex<Overlay>>,
    pub debouncer: Arc<Debouncer>,
    /// Widget session of the current tab, if one is mounted
    pub widget: Arc<Mutex<Option<Widget>>>,
}

impl AppState {
    pub fn new(router: MessageRouter, debouncer: Debouncer) -> Self {
        let overlay = router.analyzer().overlay().clone();
        Self {
            router,
            overlay,
            debouncer: Arc::new(debouncer),
            widget: Arc::new(Mutex::new(None)),
        }
    }
}

const EXTENSION_SCHEMES: [&str; 2] = ["chrome-extension://", "moz-extension://"];

/// Whether a browser origin may call the companion
pub fn is_allowed_origin(origin: &str, extra: &[String]) -> bool {
    EXTENSION_SCHEMES.iter().any(|scheme| origin.starts_with(scheme))
        || extra.iter().any(|allowed| allowed == origin)
}

/// CORS policy: extension pages plus the configured extra origins.
/// Ordinary websites cannot reach the API from a visitor's browser.
pub fn cors(extra: Vec<String>) -> Cors {
    Cors::default()
        .allowed_origin_fn(move |origin, _req| {
            origin
                .to_str()
                .map(|origin| is_allowed_origin(origin, &extra))
                .unwrap_or(false)
        })
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .service(
            web::scope("/api/v1")
                .configure(messages::configure)
                .configure(settings::configure)
                .configure(widget::configure),
        );
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

pub(crate) fn bad_request(error: &str, message: impl ToString) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code: 400,
    })
}

pub(crate) fn internal_error(error: &str, message: impl ToString) -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code: 500,
    })
}

/// Map a router failure onto the matching HTTP error
pub(crate) fn router_error(e: RouterError) -> HttpResponse {
    match e {
        RouterError::Validation(msg) => bad_request("Validation failed", msg),
        RouterError::Analyze(e) => {
            tracing::warn!("Page analysis failed: {}", e);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: "Page fetch failed".to_string(),
                message: e.to_string(),
                status_code: 502,
            })
        }
        other => {
            tracing::error!("Message handling failed: {}", other);
            internal_error("Message handling failed", other)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_response() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
        };

        assert_eq!(response.status, "healthy");
    }

    #[test]
    fn test_allowed_origins() {
        let extra = vec!["http://localhost:5173".to_string()];
        assert!(is_allowed_origin("chrome-extension://abcdefghijklmnop", &[]));
        assert!(is_allowed_origin("moz-extension://1234-5678", &[]));
        assert!(is_allowed_origin("http://localhost:5173", &extra));
        assert!(!is_allowed_origin("https://evil.example", &extra));
        assert!(!is_allowed_origin("http://localhost:5173.evil.example", &extra));
        assert!(!is_allowed_origin("https://chrome-extension.example", &[]));
    }

    #[test]
    fn test_validation_maps_to_400() {
        let resp = router_error(RouterError::Validation("product: length".into()));
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }
}
