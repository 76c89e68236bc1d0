use askama::Template;
use serde_json::json;

use crate::component::{Component, ComponentId, DataTable, TableColumn};
use crate::logger::SessionMetrics;
use crate::utils::{display_value, html_escape};

// ── Askama Templates ─────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub title: &'a str,
    pub layout: &'a str,
    pub stats: &'a str,
}

#[derive(Template)]
#[template(path = "partials/table.html")]
pub struct TableTemplate<'a> {
    pub dom_id: String,
    pub oob: bool,
    pub header_background: &'a str,
    pub cell_background: &'a str,
    pub overflow: &'a str,
    pub columns: &'a [TableColumn],
    pub rows: Vec<Vec<CellView>>,
    pub page_label: String,
    pub prev_vals: Option<String>,
    pub next_vals: Option<String>,
}

pub struct CellView {
    pub text: String,
    pub vals: String,
    pub active: bool,
}

#[derive(Template)]
#[template(path = "partials/button.html")]
pub struct ButtonTemplate<'a> {
    pub dom_id: String,
    pub oob: bool,
    pub label: &'a str,
    pub n_clicks: u64,
    pub vals: String,
}

#[derive(Template)]
#[template(path = "partials/stats.html")]
pub struct StatsTemplate {
    pub events: usize,
    pub callbacks_fired: usize,
    pub no_updates: usize,
    pub tables_added: usize,
    pub errors: usize,
    pub error_rate: f64,
}

// ── Render helpers (called from routes.rs) ───────────────────────────

pub fn render_index(title: &str, layout: &Component, metrics: &SessionMetrics) -> String {
    let layout = render_component(layout);
    let stats = render_stats(metrics);
    let template = IndexTemplate {
        title,
        layout: &layout,
        stats: &stats,
    };
    template.render().unwrap_or_else(|e| {
        format!("<h1>Template error: {}</h1>", html_escape(&e.to_string()))
    })
}

pub fn render_stats(m: &SessionMetrics) -> String {
    let template = StatsTemplate {
        events: m.events,
        callbacks_fired: m.callbacks_fired,
        no_updates: m.no_updates,
        tables_added: m.tables_added,
        errors: m.errors,
        error_rate: m.error_rate(),
    };
    template.render().unwrap_or_default()
}

/// Render a component subtree as HTML.
pub fn render_component(component: &Component) -> String {
    render(component, false)
}

/// Render a component marked for an htmx out-of-band swap, so it replaces
/// the element with the same id wherever it is on the page.
pub fn render_oob(component: &Component) -> String {
    render(component, true)
}

fn render(component: &Component, oob: bool) -> String {
    match component {
        Component::Div { id, children } => format!(
            "<div{}{}>{}</div>",
            id_attr(id.as_ref()),
            oob_attr(oob && id.is_some()),
            render_children(children)
        ),
        Component::Container { children } => {
            format!(r#"<div class="figure">{}</div>"#, render_children(children))
        }
        Component::Label { text } => {
            format!(r#"<label class="figure-title">{}</label>"#, html_escape(text))
        }
        Component::Paragraph { text } => format!("<p>{}</p>", html_escape(text)),
        Component::Alert { id, children } => format!(
            r#"<div{} class="alert" role="alert"{}>{}</div>"#,
            id_attr(Some(id)),
            oob_attr(oob),
            render_children(children)
        ),
        Component::Button {
            id,
            label,
            n_clicks,
        } => ButtonTemplate {
            dom_id: id.dom_id(),
            oob,
            label,
            n_clicks: *n_clicks,
            vals: json!({ "id": id_json(id) }).to_string(),
        }
        .render()
        .unwrap_or_default(),
        Component::DataTable(table) => render_table(table, oob),
    }
}

fn render_table(table: &DataTable, oob: bool) -> String {
    let table_id = id_json(&table.id);
    let offset = table.page_offset();

    let rows = table
        .page_rows()
        .iter()
        .enumerate()
        .map(|(row, record)| {
            table
                .columns
                .iter()
                .enumerate()
                .map(|(column, col)| CellView {
                    text: record.get(&col.id).map(display_value).unwrap_or_default(),
                    vals: json!({
                        "table": table_id,
                        "row": row,
                        "column": column,
                        "column_id": col.id,
                    })
                    .to_string(),
                    active: table
                        .active_cell
                        .as_ref()
                        .is_some_and(|c| c.row == row && c.column_id == col.id),
                })
                .collect()
        })
        .collect();

    let page_vals = |page: usize| json!({ "table": table_id, "page": page }).to_string();
    let last_page = table.page_count() - 1;

    TableTemplate {
        dom_id: table.id.dom_id(),
        oob,
        header_background: &table.style.header_background,
        cell_background: &table.style.cell_background,
        overflow: &table.style.overflow,
        columns: &table.columns,
        rows,
        page_label: format!(
            "Page {} of {} (rows {}-{} of {})",
            table.page_current.saturating_add(1),
            table.page_count(),
            offset.saturating_add(1).min(table.data.len()),
            offset.saturating_add(table.page_size).min(table.data.len()),
            table.data.len()
        ),
        prev_vals: (table.page_current > 0).then(|| page_vals(table.page_current - 1)),
        next_vals: (table.page_current < last_page).then(|| page_vals(table.page_current + 1)),
    }
    .render()
    .unwrap_or_default()
}

fn render_children(children: &[Component]) -> String {
    children.iter().map(render_component).collect()
}

fn id_attr(id: Option<&ComponentId>) -> String {
    id.map(|id| format!(r#" id="{}""#, html_escape(&id.dom_id())))
        .unwrap_or_default()
}

fn oob_attr(oob: bool) -> &'static str {
    if oob {
        r#" hx-swap-oob="true""#
    } else {
        ""
    }
}

/// A component id as the JSON string the browser posts back.
fn id_json(id: &ComponentId) -> String {
    serde_json::to_string(id).unwrap_or_default()
}
