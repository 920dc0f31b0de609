use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::OverlayContent;
use crate::models::{
    BadgeResponse, DashboardResponse, DemoKind, ErrorResponse, LocalStats, Message, MessageResponse,
    OverlayResponse, PageMessage, RecentSwap,
};
use crate::routes::{bad_request, internal_error, router_error, AppState};
use crate::services::{badge_text, BADGE_COLOR};

/// Dashboard rows shown in the popup
const RECENT_SWAPS: usize = 5;
const TITLE_MAX_CHARS: usize = 30;

/// Configure message, dashboard and overlay routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/messages", web::post().to(post_message))
        .route("/navigation", web::post().to(navigation))
        .route("/stats", web::get().to(get_stats))
        .route("/user-id", web::get().to(get_user_id))
        .route("/overlay", web::get().to(get_overlay))
        .route("/overlay/swap", web::post().to(swap_overlay))
        .route("/overlay/close", web::post().to(close_overlay))
        .route("/badge", web::get().to(get_badge))
        .route("/dashboard", web::get().to(get_dashboard))
        .route("/demo/{kind}", web::get().to(get_demo));
}

/// Router entry point
///
/// POST /api/v1/messages
///
/// Request body:
/// ```json
/// { "type": "RECORD_SAVINGS", "amount": 4.0, "category": "personal_care", "product": "Gillette Mach3" }
/// ```
async fn post_message(state: web::Data<AppState>, msg: web::Json<Message>) -> impl Responder {
    match state.router.handle(msg.into_inner()).await {
        Ok(resp) => HttpResponse::Ok().json(resp),
        Err(e) => router_error(e),
    }
}

/// SPA navigation: analyze the page once it settles
///
/// POST /api/v1/navigation
///
/// Returns 202 immediately; a newer navigation within the debounce window
/// replaces this one.
async fn navigation(state: web::Data<AppState>, page: web::Json<PageMessage>) -> impl Responder {
    if let Err(errors) = page.validate() {
        return bad_request("Validation failed", errors);
    }

    let page = page.into_inner();
    let analyzer = state.router.analyzer().clone();

    tracing::debug!("Navigation to {}, analyzing in {:?}", page.url, state.debouncer.delay());
    state.debouncer.trigger(async move {
        match analyzer.analyze_message(&page).await {
            Ok(outcome) => tracing::info!("Navigation analysis of {}: {}", page.url, outcome),
            Err(e) => tracing::warn!("Navigation analysis of {} failed: {}", page.url, e),
        }
    });

    HttpResponse::Accepted().json(serde_json::json!({ "scheduled": true }))
}

/// GET /api/v1/stats
async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    match state.router.ledger().stats().await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => internal_error("Failed to read savings", e),
    }
}

/// GET /api/v1/user-id
async fn get_user_id(state: web::Data<AppState>) -> impl Responder {
    match state.router.handle(Message::GetUserId).await {
        Ok(resp) => HttpResponse::Ok().json(resp),
        Err(e) => router_error(e),
    }
}

/// Current overlay markup for the page shim
///
/// GET /api/v1/overlay
async fn get_overlay(state: web::Data<AppState>) -> impl Responder {
    let overlay = state.overlay.lock().await;
    let state_name = overlay.content().map(|c| match c {
        OverlayContent::Loading => "loading",
        OverlayContent::ProductMatch(_) => "product_match",
        OverlayContent::ClothingMatch(_) => "clothing_match",
        OverlayContent::Error(_) => "error",
    });

    HttpResponse::Ok().json(OverlayResponse {
        visible: overlay.is_visible(),
        state: state_name.map(str::to_string),
        can_swap: overlay.swap_message().is_some(),
        html: overlay.render(),
    })
}

/// The "Swap & Save!" button
///
/// POST /api/v1/overlay/swap
async fn swap_overlay(state: web::Data<AppState>) -> impl Responder {
    let swap = state.overlay.lock().await.swap_message();
    let Some(record) = swap else {
        return bad_request("Nothing to swap", "The overlay is not showing a product match");
    };

    let amount = record.amount;
    match state.router.handle(Message::RecordSavings(record)).await {
        Ok(MessageResponse::RecordSavings(resp)) => HttpResponse::Ok().json(serde_json::json!({
            "success": resp.success,
            "totalSaved": resp.total_saved,
            "message": format!("Great choice! You're saving ${:.2}!", amount),
        })),
        Ok(other) => HttpResponse::Ok().json(other),
        Err(e) => router_error(e),
    }
}

/// POST /api/v1/overlay/close
async fn close_overlay(state: web::Data<AppState>) -> impl Responder {
    state.overlay.lock().await.hide();
    HttpResponse::NoContent().finish()
}

/// GET /api/v1/badge
async fn get_badge(state: web::Data<AppState>) -> impl Responder {
    match state.router.ledger().stats().await {
        Ok(stats) => HttpResponse::Ok().json(BadgeResponse {
            text: badge_text(stats.total_saved),
            color: BADGE_COLOR.to_string(),
        }),
        Err(e) => internal_error("Failed to read savings", e),
    }
}

/// Popup dashboard
///
/// GET /api/v1/dashboard
async fn get_dashboard(state: web::Data<AppState>) -> impl Responder {
    let stats = match state.router.ledger().stats().await {
        Ok(stats) => stats,
        Err(e) => return internal_error("Failed to read savings", e),
    };

    let api_connected = match state.router.api().health().await {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("Matching API offline: {}", e);
            false
        }
    };

    HttpResponse::Ok().json(build_dashboard(&stats, api_connected))
}

/// Demo responses, for trying the flow without a retailer page
///
/// GET /api/v1/demo/{kind}
async fn get_demo(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let kind: DemoKind = match path.parse() {
        Ok(kind) => kind,
        Err(e) => return bad_request("Unknown demo", e),
    };

    match state.router.api().get_demo_response(kind).await {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => {
            tracing::error!("Demo request failed: {}", e);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: "Matching API unavailable".to_string(),
                message: e.to_string(),
                status_code: 502,
            })
        }
    }
}

pub fn build_dashboard(stats: &LocalStats, api_connected: bool) -> DashboardResponse {
    DashboardResponse {
        total_saved: format_currency(stats.total_saved),
        transaction_count: format!("{} swaps", stats.transactions.len()),
        recent: stats
            .recent(RECENT_SWAPS)
            .map(|t| RecentSwap {
                product: truncate(&t.product, TITLE_MAX_CHARS),
                amount: format!("+{}", format_currency(t.amount)),
            })
            .collect(),
        api_connected,
    }
}

/// US dollar formatting with thousands separators, e.g. `$1,234.50`
fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Transaction;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(12.5), "$12.50");
        assert_eq!(format_currency(1234.567), "$1,234.57");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 30), "short");
        let long = "Gillette Venus Extra Smooth Sensitive Razor";
        assert_eq!(truncate(long, 30), "Gillette Venus Extra Smooth Se...");
    }

    #[test]
    fn test_dashboard_shows_five_newest() {
        let stats = LocalStats {
            total_saved: 21.0,
            transactions: (1..=6)
                .map(|i| Transaction {
                    amount: i as f64,
                    category: "personal_care".into(),
                    product: format!("item {}", i),
                    timestamp: i,
                })
                .collect(),
        };

        let dashboard = build_dashboard(&stats, true);
        assert_eq!(dashboard.total_saved, "$21.00");
        assert_eq!(dashboard.transaction_count, "6 swaps");
        assert_eq!(dashboard.recent.len(), 5);
        assert_eq!(dashboard.recent[0].product, "item 6");
        assert_eq!(dashboard.recent[0].amount, "+$6.00");
        assert_eq!(dashboard.recent[4].product, "item 2");
    }
}
