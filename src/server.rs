use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & static data
        .route("/health", get(routes::health::health))
        .route("/api/screens", get(routes::screens::resolve))
        .route("/api/catalog", get(routes::sessions::catalog))
        // Sessions
        .route("/api/sessions", post(routes::sessions::create))
        .route(
            "/api/sessions/{id}",
            get(routes::sessions::get).delete(routes::sessions::remove),
        )
        .route("/api/sessions/{id}/navigate", post(routes::sessions::navigate))
        // Setup
        .route("/api/sessions/{id}/setup/url", put(routes::setup::set_url))
        .route("/api/sessions/{id}/setup/url/blur", post(routes::setup::blur_url))
        .route(
            "/api/sessions/{id}/setup/tests/select-all",
            post(routes::setup::select_all),
        )
        .route("/api/sessions/{id}/setup/tests/clear", post(routes::setup::clear))
        .route(
            "/api/sessions/{id}/setup/tests/{test_id}/toggle",
            post(routes::setup::toggle_test),
        )
        // Scan
        .route(
            "/api/sessions/{id}/scan",
            get(routes::scan::status).post(routes::scan::start),
        )
        .route("/api/sessions/{id}/scan/stream", get(routes::scan::stream))
        .route("/api/sessions/{id}/scan/cancel", post(routes::scan::cancel))
        // Results
        .route("/api/sessions/{id}/results", get(routes::results::list))
        .route("/api/sessions/{id}/results/export", get(routes::results::export))
        .route(
            "/api/sessions/{id}/results/{record_id}/toggle",
            post(routes::results::toggle),
        )
        // Fix instructions
        .route("/api/sessions/{id}/fixes", get(routes::fixes::list))
        .route(
            "/api/sessions/{id}/fixes/{issue_id}/select",
            post(routes::fixes::select),
        )
        .route(
            "/api/sessions/{id}/fixes/{issue_id}/toggle",
            post(routes::fixes::toggle),
        )
        // Report
        .route(
            "/api/sessions/{id}/report",
            get(routes::report::status).post(routes::report::submit),
        )
        .route(
            "/api/sessions/{id}/report/sections/{section_id}/toggle",
            post(routes::report::toggle_section),
        )
        .route(
            "/api/sessions/{id}/report/delivery",
            put(routes::report::set_delivery),
        )
        .route(
            "/api/sessions/{id}/report/lead/{field}",
            put(routes::report::set_lead_field),
        )
        .route(
            "/api/sessions/{id}/report/lead/{field}/blur",
            post(routes::report::blur_lead_field),
        )
        .route("/api/sessions/{id}/report/cancel", post(routes::report::cancel))
        .route(
            "/api/sessions/{id}/report/download",
            get(routes::report::download),
        )
        // Logs
        .route("/api/logs/history", get(routes::logs::log_history))
        .route("/api/logs/stream", get(routes::logs::log_stream))
        // Lifecycle
        .route("/api/shutdown", post(routes::health::shutdown))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
