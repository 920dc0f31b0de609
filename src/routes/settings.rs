use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::models::{ConnectionTestRequest, ConnectionTestResponse, OptionsForm, UserSettings};
use crate::routes::{bad_request, internal_error, AppState};
use crate::services::ApiError;

/// Configure settings and options routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/settings", web::get().to(get_settings))
        .route("/settings", web::put().to(put_settings))
        .route("/settings", web::delete().to(reset_settings))
        .route("/options", web::get().to(get_options))
        .route("/options", web::put().to(put_options))
        .route("/options/test", web::post().to(test_connection))
        .route("/data", web::delete().to(clear_data));
}

/// Widget user settings, defaults when nothing valid is stored
///
/// GET /api/v1/settings
async fn get_settings(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.router.preferences().get_user_settings().await)
}

/// PUT /api/v1/settings
///
/// Request body:
/// ```json
/// { "measurements": { "bustIn": 34, "waistIn": 28 }, "fitPreference": "fitted" }
/// ```
async fn put_settings(state: web::Data<AppState>, settings: web::Json<UserSettings>) -> impl Responder {
    let settings = settings.into_inner();
    match state.router.preferences().set_user_settings(&settings).await {
        Ok(()) => {
            sync_widget_settings(&state, settings).await;
            HttpResponse::Ok().json(settings)
        }
        Err(e) => {
            tracing::error!("Failed to save user settings: {}", e);
            internal_error("Failed to save settings", e)
        }
    }
}

/// Reset to defaults
///
/// DELETE /api/v1/settings
async fn reset_settings(state: web::Data<AppState>) -> impl Responder {
    match state.router.preferences().reset_user_settings().await {
        Ok(()) => {
            sync_widget_settings(&state, UserSettings::default()).await;
            HttpResponse::Ok().json(UserSettings::default())
        }
        Err(e) => {
            tracing::error!("Failed to reset user settings: {}", e);
            internal_error("Failed to reset settings", e)
        }
    }
}

// Keep a mounted widget in step with settings changed elsewhere.
async fn sync_widget_settings(state: &AppState, settings: UserSettings) {
    if let Some(widget) = state.widget.lock().await.as_mut() {
        widget.replace_settings(settings);
    }
}

/// Options page values
///
/// GET /api/v1/options
async fn get_options(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.router.preferences().options().await)
}

/// PUT /api/v1/options
///
/// Request body:
/// ```json
/// { "enabled": true, "apiUrl": "http://localhost:8000", "measurements": { "waist_inches": 28, "hip_inches": 38 } }
/// ```
///
/// A blank `apiUrl` saves the default URL.
async fn put_options(state: web::Data<AppState>, form: web::Json<OptionsForm>) -> impl Responder {
    let form = form.into_inner().normalized();
    if let Err(errors) = form.validate() {
        tracing::info!("Validation failed for options form: {:?}", errors);
        return bad_request("Validation failed", errors);
    }

    let preferences = state.router.preferences();
    match preferences.save_options(&form).await {
        Ok(()) => {
            tracing::info!("Options saved (enabled: {})", form.enabled);
            HttpResponse::Ok().json(preferences.options().await)
        }
        Err(e) => {
            tracing::error!("Failed to save options: {}", e);
            internal_error("Failed to save options", e)
        }
    }
}

/// Check the typed API URL before saving it
///
/// POST /api/v1/options/test
///
/// Request body:
/// ```json
/// { "apiUrl": "http://localhost:8000" }
/// ```
///
/// Failures still answer 200 with `connected: false`, since the options
/// page only shows the message.
async fn test_connection(state: web::Data<AppState>, body: web::Json<ConnectionTestRequest>) -> impl Responder {
    let body = ConnectionTestRequest {
        api_url: body.into_inner().api_url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()),
    };
    if let Err(errors) = body.validate() {
        return bad_request("Validation failed", errors);
    }

    let url = body
        .api_url
        .unwrap_or_else(|| state.router.preferences().default_api_url().to_string());

    let result = match state.router.api().health_at(&url).await {
        Ok(health) => {
            tracing::info!("Connection test to {} succeeded", url);
            ConnectionTestResponse::connected(&health)
        }
        Err(ApiError::Status(status)) => {
            tracing::info!("Connection test to {} returned {}", url, status);
            ConnectionTestResponse::failed("API returned an error")
        }
        Err(e) => {
            tracing::info!("Connection test to {} failed: {}", url, e);
            ConnectionTestResponse::failed("Could not connect to API")
        }
    };

    HttpResponse::Ok().json(result)
}

/// Clear all PinkVanity data
///
/// DELETE /api/v1/data
///
/// Empties both storage areas and the savings ledger. A mounted widget
/// falls back to default settings.
async fn clear_data(state: web::Data<AppState>) -> impl Responder {
    if let Err(e) = state.router.preferences().clear_all().await {
        tracing::error!("Failed to clear storage: {}", e);
        return internal_error("Failed to clear data", e);
    }

    if let Err(e) = state.router.ledger().reset().await {
        tracing::error!("Failed to reset savings ledger: {}", e);
        return internal_error("Failed to clear data", e);
    }

    sync_widget_settings(&state, UserSettings::default()).await;
    state.overlay.lock().await.hide();

    tracing::info!("All PinkVanity data cleared");
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "All data cleared"
    }))
}
