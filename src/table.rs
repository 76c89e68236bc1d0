use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::app::{Callback, Dependency, Output};
use crate::callback_manager::Registrar;
use crate::component::{ActiveCell, Component, ComponentId, DataTable, TableColumn, TableStyle};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::figure::Figure;
use crate::utils::{display_value, normalize_suffix};

/// Shown in a table's alert while no cell is selected.
pub const PLACEHOLDER: &str = "Select a cell";

pub const DEFAULT_PAGE_SIZE: usize = 10;

// Process-wide so tables built anywhere never share an id
static NEXT_TABLE: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug, Clone, PartialEq)]
pub struct TableOptions {
    pub page_size: usize,
    pub style: TableStyle,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            style: TableStyle::default(),
        }
    }
}

/// Figure showing one dataset as a paginated table, with an alert
/// describing the selected cell.
pub struct TableBuilder {
    data: Arc<Dataset>,
    suffix: String,
    title: String,
    table_id: ComponentId,
    alert_id: ComponentId,
    options: TableOptions,
}

impl TableBuilder {
    /// A table named from the next value of the process-wide counter.
    pub fn new(data: impl Into<Arc<Dataset>>) -> Self {
        let n = NEXT_TABLE.fetch_add(1, Ordering::Relaxed);
        Self::named(data, &format!("table {}", n))
    }

    /// A table with an explicit name. Two tables with the same normalised
    /// name collide when their callbacks are registered.
    pub fn named(data: impl Into<Arc<Dataset>>, name: &str) -> Self {
        let suffix = normalize_suffix(name);
        Self {
            data: data.into(),
            title: format!("Descriptive table {}", suffix),
            table_id: ComponentId::pattern(format!("{}_tbl", suffix), suffix.clone()),
            alert_id: ComponentId::pattern(format!("{}_alert", suffix), suffix.clone()),
            suffix,
            options: TableOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn table_id(&self) -> &ComponentId {
        &self.table_id
    }

    pub fn alert_id(&self) -> &ComponentId {
        &self.alert_id
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    fn kind(id: &ComponentId) -> &str {
        id.kind().unwrap_or_default()
    }
}

impl Figure for TableBuilder {
    fn build(&self) -> Result<Component> {
        self.data.validate()?;

        let table = DataTable {
            id: self.table_id.clone(),
            columns: self
                .data
                .columns()
                .iter()
                .map(|c| TableColumn {
                    name: c.clone(),
                    id: c.clone(),
                })
                .collect(),
            data: self.data.records(),
            page_size: self.options.page_size.max(1),
            page_current: 0,
            active_cell: None,
            style: self.options.style.clone(),
            editable: false,
            column_selectable: "single".to_string(),
        };

        Ok(Component::Container {
            children: vec![
                Component::Label {
                    text: self.title.clone(),
                },
                Component::DataTable(table),
                Component::Alert {
                    id: self.alert_id.clone(),
                    children: vec![Component::paragraph(PLACEHOLDER)],
                },
            ],
        })
    }

    fn register_callback(&self, manager: &mut dyn Registrar) -> Result<()> {
        let data = Arc::clone(&self.data);
        let table_kind = Self::kind(&self.table_id);

        manager.register(
            Callback::new(
                self.suffix.clone(),
                Dependency::matching(Self::kind(&self.alert_id), "children"),
                move |args| {
                    let text = describe_selection(&data, args.input(0), args.state(0), args.state(1));
                    Ok(Output::Children(vec![Component::paragraph(text)]))
                },
            )
            .input(Dependency::matching(table_kind, "active_cell"))
            .state(Dependency::matching(table_kind, "page_current"))
            .state(Dependency::matching(table_kind, "page_size")),
        )
    }
}

/// Describe the selected cell of `data`, or fall back to [`PLACEHOLDER`]
/// when nothing is selected or the selection is outside the page or data.
pub fn describe_selection(
    data: &Dataset,
    active_cell: &Value,
    page_current: &Value,
    page_size: &Value,
) -> String {
    let Ok(Some(cell)) = serde_json::from_value::<Option<ActiveCell>>(active_cell.clone()) else {
        return PLACEHOLDER.to_string();
    };

    let page_size = page_size.as_u64().unwrap_or(DEFAULT_PAGE_SIZE as u64) as usize;
    let page_current = page_current.as_u64().unwrap_or(0) as usize;
    if cell.row >= page_size {
        return PLACEHOLDER.to_string();
    }

    let Some(row) = page_current
        .checked_mul(page_size)
        .and_then(|offset| offset.checked_add(cell.row))
    else {
        return PLACEHOLDER.to_string();
    };
    match data.cell(row, &cell.column_id) {
        Some(value) => format!(
            "Selected cell: row {}, column {} = {}",
            row,
            cell.column_id,
            display_value(value)
        ),
        None => PLACEHOLDER.to_string(),
    }
}
