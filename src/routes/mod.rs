use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::{auth::AuthenticatedUser, state::AppState};

pub mod approvals;
pub mod channels;
pub mod documents;
pub mod emergency;
pub mod health;
pub mod meetings;
pub mod preferences;
pub mod routing;

/// Attachments travel base64 inside the document record, so bodies get large.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

fn cors_layer(allowed: Option<&str>) -> CorsLayer {
    let allow_origin = match allowed {
        Some(origins) => {
            let headers: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .filter_map(|value| match value.parse::<HeaderValue>() {
                    Ok(header) => Some(header),
                    Err(err) => {
                        warn!(origin = %value, error = %err, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(headers)
        }
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn create_router(state: AppState) -> Router<()> {
    let cors = cors_layer(state.config.cors_allowed_origin.as_deref());

    let documents_routes = Router::new()
        .route(
            "/",
            get(documents::list_documents).post(documents::create_document),
        )
        .route("/:id", get(documents::get_document))
        .route("/:id/summary", post(documents::summarize_document));

    let approvals_routes = Router::new()
        .route("/", get(approvals::list_approvals))
        .route(
            "/:id/decision",
            get(approvals::get_decision).post(approvals::decide),
        );

    let preferences_routes = Router::new().route(
        "/:recipient_id",
        get(preferences::get_preferences).put(preferences::update_preferences),
    );

    let emergency_routes = Router::new()
        .route(
            "/settings/:recipient_id",
            get(preferences::get_emergency_settings).put(preferences::update_emergency_settings),
        )
        .route(
            "/submissions",
            get(emergency::list_submissions).post(emergency::submit_emergency),
        )
        .route("/logs", get(emergency::list_logs))
        .route("/schedules/:document_id", get(emergency::list_schedules))
        .route(
            "/documents/:document_id/notifications",
            delete(emergency::cancel_notifications),
        );

    let meetings_routes = Router::new()
        .route(
            "/",
            get(meetings::list_meetings).post(meetings::create_meeting),
        )
        .route("/conflicts", post(meetings::check_conflicts))
        .route("/suggestions", post(meetings::suggest_slots))
        .route("/:id/status", patch(meetings::update_status));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/documents", documents_routes)
        .nest("/api/approvals", approvals_routes)
        .route("/api/channels", get(channels::list_channels))
        .nest("/api/preferences", preferences_routes)
        .nest("/api/emergency", emergency_routes)
        .route(
            "/api/routing/mode",
            get(routing::get_mode).put(routing::set_mode),
        )
        .nest("/api/meetings", meetings_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
