use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use crate::core::widget::WIDGET_WIDTH;
use crate::core::{widget_site, PointerEvent, SettingsForm, Size, Widget};
use crate::models::{ErrorResponse, WidgetPosition, WidgetSite};
use crate::routes::{internal_error, AppState};

/// Configure widget session routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/widget", web::get().to(get_widget))
        .route("/widget/mount", web::post().to(mount))
        .route("/widget/viewport", web::post().to(resize))
        .route("/widget/pointer", web::post().to(pointer))
        .route("/widget/toggle", web::post().to(toggle))
        .route("/widget/hide", web::post().to(hide))
        .route("/widget/settings", web::post().to(save_settings))
        .route("/widget/position", web::get().to(get_position))
        .route("/widget/position", web::put().to(put_position));
}

#[derive(Debug, Deserialize)]
pub struct MountRequest {
    pub hostname: String,
    pub viewport: Size,
    #[serde(default = "default_card")]
    pub card: Size,
}

fn default_card() -> Size {
    Size { width: WIDGET_WIDTH, height: 240.0 }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Debug, Deserialize)]
pub struct PointerRequest {
    pub kind: PointerKind,
    #[serde(flatten)]
    pub event: PointerEvent,
}

/// What the page shim needs to redraw the widget
#[derive(Debug, Serialize)]
pub struct WidgetView {
    pub site: WidgetSite,
    pub expanded: bool,
    pub visible: bool,
    pub dragging: bool,
    pub position: WidgetPosition,
    pub toggle_label: &'static str,
    pub summary: String,
    pub saved_label: &'static str,
    pub html: Option<String>,
}

impl From<&Widget> for WidgetView {
    fn from(w: &Widget) -> Self {
        Self {
            site: w.site(),
            expanded: w.is_expanded(),
            visible: w.is_visible(),
            dragging: w.is_dragging(),
            position: w.position(),
            toggle_label: w.toggle_label(),
            summary: w.summary(),
            saved_label: w.saved_label(),
            html: w.render(),
        }
    }
}

fn no_widget() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        error: "No widget mounted".to_string(),
        message: "Mount the widget on a supported site first".to_string(),
        status_code: 404,
    })
}

/// GET /api/v1/widget
async fn get_widget(state: web::Data<AppState>) -> impl Responder {
    match state.widget.lock().await.as_ref() {
        Some(widget) => HttpResponse::Ok().json(WidgetView::from(widget)),
        None => no_widget(),
    }
}

/// Mount the widget for a page; `null` on unsupported hosts
///
/// POST /api/v1/widget/mount
async fn mount(state: web::Data<AppState>, req: web::Json<MountRequest>) -> impl Responder {
    let mut slot = state.widget.lock().await;

    let Some(site) = widget_site(&req.hostname) else {
        tracing::debug!("No widget for host {}", req.hostname);
        *slot = None;
        return HttpResponse::Ok().json(Option::<WidgetView>::None);
    };

    let preferences = state.router.preferences();
    let settings = preferences.get_user_settings().await;
    let saved_position = preferences.get_widget_position().await;

    let widget = Widget::mount(site, settings, saved_position, req.viewport, req.card);
    tracing::info!("Widget mounted on {}", site);

    let view = WidgetView::from(&widget);
    *slot = Some(widget);
    HttpResponse::Ok().json(Some(view))
}

/// POST /api/v1/widget/viewport
async fn resize(state: web::Data<AppState>, viewport: web::Json<Size>) -> impl Responder {
    let mut slot = state.widget.lock().await;
    let Some(widget) = slot.as_mut() else {
        return no_widget();
    };

    widget.resize_viewport(viewport.into_inner());
    HttpResponse::Ok().json(WidgetView::from(&*widget))
}

/// Drag handle pointer events; the final position is persisted on release
///
/// POST /api/v1/widget/pointer
///
/// Request body:
/// ```json
/// { "kind": "move", "button": 0, "x": 412.0, "y": 96.5 }
/// ```
async fn pointer(state: web::Data<AppState>, req: web::Json<PointerRequest>) -> impl Responder {
    let mut slot = state.widget.lock().await;
    let Some(widget) = slot.as_mut() else {
        return no_widget();
    };

    match req.kind {
        PointerKind::Down => {
            widget.pointer_down(req.event);
        }
        PointerKind::Move => {
            widget.pointer_move(req.event);
        }
        PointerKind::Up | PointerKind::Cancel => {
            if let Some(pos) = widget.pointer_up() {
                if let Err(e) = state.router.preferences().set_widget_position(pos).await {
                    tracing::warn!("Failed to persist widget position: {}", e);
                }
            }
        }
    }

    HttpResponse::Ok().json(WidgetView::from(&*widget))
}

/// POST /api/v1/widget/toggle
async fn toggle(state: web::Data<AppState>) -> impl Responder {
    let mut slot = state.widget.lock().await;
    let Some(widget) = slot.as_mut() else {
        return no_widget();
    };

    widget.toggle();
    HttpResponse::Ok().json(WidgetView::from(&*widget))
}

/// POST /api/v1/widget/hide
async fn hide(state: web::Data<AppState>) -> impl Responder {
    let mut slot = state.widget.lock().await;
    let Some(widget) = slot.as_mut() else {
        return no_widget();
    };

    widget.hide();
    HttpResponse::Ok().json(WidgetView::from(&*widget))
}

/// Settings panel "Save"
///
/// POST /api/v1/widget/settings
///
/// Request body (raw input values):
/// ```json
/// { "bust": "34", "waist": "", "hips": "38.5", "fitPreference": "fitted" }
/// ```
async fn save_settings(state: web::Data<AppState>, form: web::Json<SettingsForm>) -> impl Responder {
    let mut slot = state.widget.lock().await;
    let Some(widget) = slot.as_mut() else {
        return no_widget();
    };

    let settings = widget.save_settings(&form, chrono::Utc::now().timestamp_millis());
    if let Err(e) = state.router.preferences().set_user_settings(&settings).await {
        tracing::error!("Failed to save widget settings: {}", e);
        return internal_error("Failed to save settings", e);
    }

    HttpResponse::Ok().json(WidgetView::from(&*widget))
}

/// Saved widget position, `null` when unset
///
/// GET /api/v1/widget/position
async fn get_position(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.router.preferences().get_widget_position().await)
}

/// PUT /api/v1/widget/position
async fn put_position(state: web::Data<AppState>, pos: web::Json<WidgetPosition>) -> impl Responder {
    let pos = pos.into_inner();
    match state.router.preferences().set_widget_position(pos).await {
        Ok(()) => HttpResponse::Ok().json(pos),
        Err(e) => {
            tracing::error!("Failed to save widget position: {}", e);
            internal_error("Failed to save position", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_request_flattens_event() {
        let req: PointerRequest =
            serde_json::from_str(r#"{"kind": "move", "x": 10.0, "y": 20.0}"#).unwrap();
        assert!(matches!(req.kind, PointerKind::Move));
        assert_eq!(req.event.button, 0);
        assert_eq!(req.event.x, 10.0);
    }

    #[test]
    fn test_mount_request_default_card() {
        let req: MountRequest = serde_json::from_str(
            r#"{"hostname": "www.zara.com", "viewport": {"width": 1280, "height": 800}}"#,
        )
        .unwrap();
        assert_eq!(req.card.width, WIDGET_WIDTH);
    }
}
