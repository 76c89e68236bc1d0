use anyhow::Context as _;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::routes;
use super::state::DashboardState;

/// All dashboard routes bound to `state`.
pub fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        // HTML pages
        .route("/", get(routes::index))
        // JSON API endpoints
        .route("/api/layout", get(routes::get_layout))
        .route("/api/stats", get(routes::get_stats))
        .route("/api/dispatch", post(routes::dispatch_event))
        // HTMX HTML partials
        .route("/api/stats/html", get(routes::get_stats_html))
        .route("/ui/click", post(routes::ui_click))
        .route("/ui/cell", post(routes::ui_cell))
        .route("/ui/page", post(routes::ui_page))
        .with_state(state)
}

/// Start the Axum web dashboard server and run until Ctrl-C.
pub async fn start_dashboard(state: Arc<DashboardState>) -> anyhow::Result<()> {
    let addr = state.config.addr();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Warning: failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
