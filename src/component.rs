//! Renderable component tree.
//!
//! Figures build these descriptors; the [`App`](crate::app::App) keeps the
//! live tree and mutates it as events and callback outputs arrive. Every
//! component serialises to JSON tagged by `kind`.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::dataset::Record;
use crate::error::{Error, Result};

/// Identifier of a component in the layout.
///
/// Pattern ids (`{"type": .., "index": ..}`) let one callback serve every
/// component sharing a `type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentId {
    Pattern {
        #[serde(rename = "type")]
        kind: String,
        index: String,
    },
    Plain(String),
}

impl ComponentId {
    pub fn plain(id: impl Into<String>) -> Self {
        Self::Plain(id.into())
    }

    pub fn pattern(kind: impl Into<String>, index: impl Into<String>) -> Self {
        Self::Pattern {
            kind: kind.into(),
            index: index.into(),
        }
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::Pattern { kind, .. } => Some(kind),
            Self::Plain(_) => None,
        }
    }

    pub fn index(&self) -> Option<&str> {
        match self {
            Self::Pattern { index, .. } => Some(index),
            Self::Plain(_) => None,
        }
    }

    /// String usable as an HTML `id` attribute.
    pub fn dom_id(&self) -> String {
        match self {
            Self::Plain(id) => id.clone(),
            Self::Pattern { kind, index } => format!("{}-{}", kind, index),
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(id) => write!(f, "{}", id),
            Self::Pattern { kind, index } => write!(f, "{}[{}]", kind, index),
        }
    }
}

/// The selected table cell. `row` is relative to the page being shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCell {
    pub row: usize,
    pub column: usize,
    pub column_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    pub id: String,
}

/// Cosmetic table styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStyle {
    pub header_background: String,
    pub cell_background: String,
    pub overflow: String,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            header_background: "rgb(230, 230, 230)".to_string(),
            cell_background: "rgb(245, 245, 245)".to_string(),
            overflow: "scroll".to_string(),
        }
    }
}

/// A paginated, cell-selectable table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub id: ComponentId,
    pub columns: Vec<TableColumn>,
    pub data: Vec<Record>,
    pub page_size: usize,
    #[serde(default)]
    pub page_current: usize,
    #[serde(default)]
    pub active_cell: Option<ActiveCell>,
    #[serde(default)]
    pub style: TableStyle,
    #[serde(default)]
    pub editable: bool,
    pub column_selectable: String,
}

impl DataTable {
    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        self.data.len().div_ceil(self.page_size).max(1)
    }

    /// Rows displayed on the current page.
    pub fn page_rows(&self) -> &[Record] {
        let start = self.page_offset().min(self.data.len());
        let end = start.saturating_add(self.page_size).min(self.data.len());
        &self.data[start..end]
    }

    /// Absolute row index of the first row on the current page.
    pub fn page_offset(&self) -> usize {
        self.page_current.saturating_mul(self.page_size)
    }

    /// Move to `page`, clamped to the last page. Clears the selection.
    pub fn set_page(&mut self, page: usize) {
        self.page_current = page.min(self.page_count() - 1);
        self.active_cell = None;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Component {
    Div {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<ComponentId>,
        children: Vec<Component>,
    },
    Container {
        children: Vec<Component>,
    },
    Label {
        text: String,
    },
    Button {
        id: ComponentId,
        label: String,
        #[serde(default)]
        n_clicks: u64,
    },
    Paragraph {
        text: String,
    },
    Alert {
        id: ComponentId,
        children: Vec<Component>,
    },
    DataTable(DataTable),
}

impl Component {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph { text: text.into() }
    }

    pub fn button(id: &str, label: impl Into<String>) -> Self {
        Self::Button {
            id: ComponentId::plain(id),
            label: label.into(),
            n_clicks: 0,
        }
    }

    pub fn id(&self) -> Option<&ComponentId> {
        match self {
            Self::Div { id, .. } => id.as_ref(),
            Self::Button { id, .. } | Self::Alert { id, .. } => Some(id),
            Self::DataTable(table) => Some(&table.id),
            Self::Container { .. } | Self::Label { .. } | Self::Paragraph { .. } => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Div { .. } => "div",
            Self::Container { .. } => "container",
            Self::Label { .. } => "label",
            Self::Button { .. } => "button",
            Self::Paragraph { .. } => "paragraph",
            Self::Alert { .. } => "alert",
            Self::DataTable(_) => "data_table",
        }
    }

    pub fn children(&self) -> Option<&[Component]> {
        match self {
            Self::Div { children, .. }
            | Self::Container { children }
            | Self::Alert { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Component>> {
        match self {
            Self::Div { children, .. }
            | Self::Container { children }
            | Self::Alert { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Depth-first search for the component carrying `id`.
    pub fn find(&self, id: &ComponentId) -> Option<&Component> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children()?.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: &ComponentId) -> Option<&mut Component> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children_mut()?
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }

    /// Every table in this subtree, in display order.
    pub fn tables(&self) -> Vec<&DataTable> {
        let mut found = Vec::new();
        self.collect_tables(&mut found);
        found
    }

    fn collect_tables<'a>(&'a self, found: &mut Vec<&'a DataTable>) {
        if let Self::DataTable(table) = self {
            found.push(table);
        }
        for child in self.children().unwrap_or_default() {
            child.collect_tables(found);
        }
    }

    /// Read a property as JSON.
    pub fn prop(&self, property: &str) -> Result<Value> {
        let value = match (self, property) {
            (_, "id") => serde_json::to_value(self.id())?,
            (_, "children") if self.children().is_some() => {
                serde_json::to_value(self.children())?
            }
            (Self::Button { n_clicks, .. }, "n_clicks") => Value::from(*n_clicks),
            (Self::DataTable(t), "active_cell") => serde_json::to_value(&t.active_cell)?,
            (Self::DataTable(t), "page_current") => Value::from(t.page_current),
            (Self::DataTable(t), "page_size") => Value::from(t.page_size),
            (Self::DataTable(t), "data") => serde_json::to_value(&t.data)?,
            _ => return Err(self.unknown_property(property)),
        };
        Ok(value)
    }

    /// Record a property a user can change directly: a click count, a cell
    /// selection or a page move. Everything else is written only by callbacks.
    pub fn set_input_prop(&mut self, property: &str, value: Value) -> Result<()> {
        match property {
            "n_clicks" | "active_cell" | "page_current" => self.set_prop(property, value),
            _ => Err(self.unknown_property(property)),
        }
    }

    /// Overwrite a property from JSON.
    pub fn set_prop(&mut self, property: &str, value: Value) -> Result<()> {
        match property {
            "children" => {
                if self.children().is_none() {
                    return Err(self.unknown_property(property));
                }
                let new_children: Vec<Component> = parse_prop(property, value)?;
                if let Some(children) = self.children_mut() {
                    *children = new_children;
                }
            }
            "n_clicks" => match self {
                Self::Button { n_clicks, .. } => *n_clicks = parse_prop(property, value)?,
                _ => return Err(self.unknown_property(property)),
            },
            "active_cell" => match self {
                Self::DataTable(t) => t.active_cell = parse_prop(property, value)?,
                _ => return Err(self.unknown_property(property)),
            },
            "page_current" => match self {
                Self::DataTable(t) => t.set_page(parse_prop(property, value)?),
                _ => return Err(self.unknown_property(property)),
            },
            "data" => match self {
                Self::DataTable(t) => {
                    t.data = parse_prop(property, value)?;
                    t.set_page(t.page_current);
                }
                _ => return Err(self.unknown_property(property)),
            },
            _ => return Err(self.unknown_property(property)),
        }
        Ok(())
    }

    fn unknown_property(&self, property: &str) -> Error {
        Error::UnknownProperty {
            id: self
                .id()
                .map(ToString::to_string)
                .unwrap_or_else(|| self.kind_name().to_string()),
            property: property.to_string(),
        }
    }
}

fn parse_prop<T: DeserializeOwned>(property: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::InvalidValue {
        property: property.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(rows: usize, page_size: usize) -> DataTable {
        DataTable {
            id: ComponentId::pattern("t_tbl", "t"),
            columns: vec![TableColumn {
                name: "A".into(),
                id: "A".into(),
            }],
            data: (0..rows)
                .map(|i| {
                    let mut r = Record::new();
                    r.insert("A".into(), json!(i));
                    r
                })
                .collect(),
            page_size,
            page_current: 0,
            active_cell: None,
            style: TableStyle::default(),
            editable: false,
            column_selectable: "single".into(),
        }
    }

    #[test]
    fn test_component_id_json_shapes() {
        let plain: ComponentId = serde_json::from_value(json!("create-button")).unwrap();
        assert_eq!(plain, ComponentId::plain("create-button"));

        let pattern: ComponentId =
            serde_json::from_value(json!({"type": "t_tbl", "index": "t"})).unwrap();
        assert_eq!(pattern, ComponentId::pattern("t_tbl", "t"));
        assert_eq!(
            serde_json::to_value(&pattern).unwrap(),
            json!({"type": "t_tbl", "index": "t"})
        );
    }

    #[test]
    fn test_component_id_strings() {
        let id = ComponentId::pattern("t_tbl", "t");
        assert_eq!(id.dom_id(), "t_tbl-t");
        assert_eq!(id.to_string(), "t_tbl[t]");
        assert_eq!(ComponentId::plain("x").dom_id(), "x");
    }

    #[test]
    fn test_pagination() {
        let mut t = table(25, 10);
        assert_eq!(t.page_count(), 3);
        assert_eq!(t.page_rows().len(), 10);
        t.set_page(2);
        assert_eq!(t.page_rows().len(), 5);
        assert_eq!(t.page_offset(), 20);
        t.set_page(99);
        assert_eq!(t.page_current, 2);
    }

    #[test]
    fn test_page_rows_shorter_than_page() {
        let t = table(3, 10);
        assert_eq!(t.page_rows().len(), 3);
        assert_eq!(t.page_count(), 1);
        assert_eq!(table(0, 10).page_count(), 1);
    }

    #[test]
    fn test_find_nested() {
        let tree = Component::Div {
            id: None,
            children: vec![Component::Container {
                children: vec![Component::DataTable(table(1, 10))],
            }],
        };
        let id = ComponentId::pattern("t_tbl", "t");
        assert!(tree.find(&id).is_some());
        assert!(tree.find(&ComponentId::plain("nope")).is_none());
        assert_eq!(tree.tables().len(), 1);
    }

    #[test]
    fn test_set_and_read_props() {
        let mut c = Component::DataTable(table(3, 10));
        c.set_prop(
            "active_cell",
            json!({"row": 1, "column": 0, "column_id": "A"}),
        )
        .unwrap();
        assert_eq!(c.prop("active_cell").unwrap()["row"], json!(1));

        c.set_prop("active_cell", Value::Null).unwrap();
        assert_eq!(c.prop("active_cell").unwrap(), Value::Null);

        let mut b = Component::button("create-button", "Create");
        b.set_prop("n_clicks", json!(3)).unwrap();
        assert_eq!(b.prop("n_clicks").unwrap(), json!(3));
    }

    #[test]
    fn test_unknown_and_invalid_props() {
        let mut b = Component::button("create-button", "Create");
        let err = b.set_prop("active_cell", Value::Null).unwrap_err();
        assert!(matches!(err, Error::UnknownProperty { .. }));

        let err = b.set_prop("n_clicks", json!("many")).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));

        assert!(Component::paragraph("x").prop("children").is_err());
    }

    #[test]
    fn test_component_json_is_tagged() {
        let json = serde_json::to_value(Component::paragraph("Select a cell")).unwrap();
        assert_eq!(json, json!({"kind": "paragraph", "text": "Select a cell"}));

        let back: Component = serde_json::from_value(json).unwrap();
        assert_eq!(back, Component::paragraph("Select a cell"));
    }

    #[test]
    fn test_input_props_exclude_callback_outputs() {
        let mut c = Component::DataTable(table(3, 10));
        c.set_input_prop("page_current", json!(0)).unwrap();
        let err = c.set_input_prop("data", json!([])).unwrap_err();
        assert!(matches!(err, Error::UnknownProperty { .. }));
        assert_eq!(c.prop("data").unwrap().as_array().unwrap().len(), 3);

        let mut div = Component::Div {
            id: Some(ComponentId::plain("tables-container")),
            children: vec![],
        };
        let err = div
            .set_input_prop("children", json!([{"kind": "paragraph", "text": "x"}]))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownProperty { .. }));
        assert!(div.children().unwrap().is_empty());
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let mut t = table(5, 10);
        t.page_current = usize::MAX / 2;
        assert_eq!(t.page_offset(), usize::MAX);
        assert!(t.page_rows().is_empty());
    }
}
