use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::state::DashboardState;
use super::templates;
use crate::app::{Change, Event};
use crate::component::{ActiveCell, ComponentId};
use crate::error::Error;
use crate::logger::SessionMetrics;
use crate::utils::html_escape;

// ── GET / — main dashboard page ──────────────────────────────────────

pub async fn index(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    let app = state.app.lock().await;
    let metrics = state.metrics.read().await;
    Html(templates::render_index(
        &state.config.title,
        app.layout(),
        &metrics,
    ))
}

// ── GET /api/layout — the live component tree as JSON ───────────────

pub async fn get_layout(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    let app = state.app.lock().await;
    Json(app.layout().clone())
}

// ── GET /api/stats — session metrics as JSON ─────────────────────────

pub async fn get_stats(State(state): State<Arc<DashboardState>>) -> Json<SessionMetrics> {
    Json(state.metrics.read().await.clone())
}

// ── GET /api/stats/html — HTML partial for HTMX ─────────────────────

pub async fn get_stats_html(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    let m = state.metrics.read().await;
    Html(templates::render_stats(&m))
}

// ── POST /api/dispatch — JSON event in, property changes out ────────

#[derive(Serialize)]
pub struct DispatchResponse {
    pub changes: Vec<Change>,
}

pub async fn dispatch_event(
    State(state): State<Arc<DashboardState>>,
    Json(event): Json<Event>,
) -> Response {
    match state.dispatch(event).await {
        Ok(outcome) => Json(DispatchResponse {
            changes: outcome.changes,
        })
        .into_response(),
        Err(e) => (status_for(&e), Json(json!({ "error": e.to_string() }))).into_response(),
    }
}

// ── POST /ui/click — button click from HTMX ─────────────────────────

#[derive(Deserialize)]
pub struct ClickForm {
    /// JSON-encoded component id.
    pub id: String,
}

pub async fn ui_click(
    State(state): State<Arc<DashboardState>>,
    Form(form): Form<ClickForm>,
) -> Response {
    let id = match parse_id(&form.id) {
        Ok(id) => id,
        Err(e) => return error_fragment(&e),
    };
    fragments(state.click(id).await)
}

// ── POST /ui/cell — cell selection from HTMX ────────────────────────

#[derive(Deserialize)]
pub struct CellForm {
    /// JSON-encoded table id.
    pub table: String,
    pub row: usize,
    pub column: usize,
    pub column_id: String,
}

pub async fn ui_cell(
    State(state): State<Arc<DashboardState>>,
    Form(form): Form<CellForm>,
) -> Response {
    let id = match parse_id(&form.table) {
        Ok(id) => id,
        Err(e) => return error_fragment(&e),
    };
    let cell = ActiveCell {
        row: form.row,
        column: form.column,
        column_id: form.column_id,
    };
    let event = Event {
        id,
        property: "active_cell".to_string(),
        value: json!(cell),
    };
    fragments(state.dispatch(event).await)
}

// ── POST /ui/page — pagination from HTMX ────────────────────────────

#[derive(Deserialize)]
pub struct PageForm {
    /// JSON-encoded table id.
    pub table: String,
    pub page: usize,
}

pub async fn ui_page(
    State(state): State<Arc<DashboardState>>,
    Form(form): Form<PageForm>,
) -> Response {
    let id = match parse_id(&form.table) {
        Ok(id) => id,
        Err(e) => return error_fragment(&e),
    };
    let event = Event {
        id,
        property: "page_current".to_string(),
        value: json!(form.page),
    };
    fragments(state.dispatch(event).await)
}

// ── Helpers ──────────────────────────────────────────────────────────

fn parse_id(raw: &str) -> Result<ComponentId, Error> {
    serde_json::from_str(raw).map_err(|e| Error::InvalidValue {
        property: "id".to_string(),
        reason: e.to_string(),
    })
}

fn fragments(result: crate::error::Result<super::state::Outcome>) -> Response {
    match result {
        Ok(outcome) => Html(outcome.fragments).into_response(),
        Err(e) => error_fragment(&e),
    }
}

fn error_fragment(e: &Error) -> Response {
    (
        status_for(e),
        Html(format!(
            r#"<div class="alert" role="alert"><strong>Error:</strong> {}</div>"#,
            html_escape(&e.to_string())
        )),
    )
        .into_response()
}

pub fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::ComponentNotFound(_) => StatusCode::NOT_FOUND,
        Error::UnknownProperty { .. } | Error::InvalidValue { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
