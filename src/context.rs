//! Composition root: owns the figures and the callback manager, and builds
//! the app they live in.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::app::{App, Callback, Dependency, Output, PatchOp};
use crate::callback_manager::{CallbackManager, CallbackRegistry, Registrar};
use crate::component::{Component, ComponentId};
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::figure::Figure;
use crate::table::{TableBuilder, TableOptions};

pub const ADD_BUTTON_ID: &str = "create-button";
pub const RESET_BUTTON_ID: &str = "reset-button";
pub const CONTAINER_ID: &str = "tables-container";

/// Figures plus the one callback manager wiring them to an [`App`].
///
/// The manager type is a parameter; each context creates its own instance.
///
/// ```ignore
/// let mut context = Context::<CallbackManager>::new(figures);
/// let app = context.start()?;
/// ```
pub struct Context<M: CallbackRegistry = CallbackManager> {
    figures: Vec<Arc<dyn Figure>>,
    manager: Arc<Mutex<M>>,
    default_dataset: Arc<Dataset>,
    options: TableOptions,
    started: bool,
}

impl<M: CallbackRegistry> Context<M> {
    pub fn new(figures: impl IntoIterator<Item = Box<dyn Figure>>) -> Self {
        Self {
            figures: figures.into_iter().map(Arc::<dyn Figure>::from).collect(),
            manager: Arc::new(Mutex::new(M::default())),
            default_dataset: Arc::new(Dataset::sample()),
            options: TableOptions::default(),
            started: false,
        }
    }

    /// Dataset shown by tables added with the "add table" button.
    pub fn with_default_dataset(mut self, dataset: Dataset) -> Self {
        self.default_dataset = Arc::new(dataset);
        self
    }

    /// Options for tables added at runtime.
    pub fn with_table_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    pub fn figure_count(&self) -> usize {
        self.figures.len()
    }

    /// Build every figure, in order. A malformed dataset aborts the whole build.
    pub fn build_figures(&self) -> Result<Vec<Component>> {
        build_all(&self.figures)
    }

    /// Have every figure register its callbacks. Returns how many figures registered.
    pub fn register_callbacks(&self) -> Result<usize> {
        let mut manager = self.manager()?;
        for figure in &self.figures {
            figure.register_callback(&mut *manager)?;
        }
        Ok(self.figures.len())
    }

    /// Build the layout, register all callbacks and bind them to a new app.
    pub fn start(&mut self) -> Result<App> {
        if self.started {
            return Err(Error::AlreadyBound);
        }
        self.default_dataset.validate()?;

        let initial = self.build_figures()?;
        let app = App::new(root_layout(initial));

        self.register_callbacks()?;
        self.register_add_table()?;
        self.register_reset()?;

        self.manager()?.bind_all(&app)?;
        self.started = true;
        Ok(app)
    }

    fn register_add_table(&self) -> Result<()> {
        let manager = Arc::clone(&self.manager);
        let dataset = Arc::clone(&self.default_dataset);
        let options = self.options.clone();

        let callback = Callback::new(
            "add-table",
            Dependency::exact(ComponentId::plain(CONTAINER_ID), "children"),
            move |args| {
                if args.input(0).as_u64().unwrap_or(0) == 0 {
                    return Ok(Output::NoUpdate);
                }

                let table = TableBuilder::new(Arc::clone(&dataset)).with_options(options.clone());
                let component = table.build()?;
                let mut manager = manager.lock().map_err(|_| Error::ManagerUnavailable)?;
                table.register_callback(&mut *manager)?;

                Ok(Output::Patch(vec![PatchOp::Append(component)]))
            },
        )
        .input(Dependency::exact(ComponentId::plain(ADD_BUTTON_ID), "n_clicks"));

        self.manager()?.register(callback)
    }

    fn register_reset(&self) -> Result<()> {
        let figures = self.figures.clone();

        let callback = Callback::new(
            "reset-tables",
            Dependency::exact(ComponentId::plain(CONTAINER_ID), "children"),
            move |args| {
                if args.input(0).as_u64().unwrap_or(0) == 0 {
                    return Ok(Output::NoUpdate);
                }
                Ok(Output::Patch(vec![
                    PatchOp::Clear,
                    PatchOp::Extend(build_all(&figures)?),
                ]))
            },
        )
        .input(Dependency::exact(ComponentId::plain(RESET_BUTTON_ID), "n_clicks"));

        self.manager()?.register(callback)
    }

    fn manager(&self) -> Result<MutexGuard<'_, M>> {
        self.manager.lock().map_err(|_| Error::ManagerUnavailable)
    }
}

fn build_all(figures: &[Arc<dyn Figure>]) -> Result<Vec<Component>> {
    figures.iter().map(|figure| figure.build()).collect()
}

/// Page skeleton: the two buttons and the container holding the tables.
pub fn root_layout(tables: Vec<Component>) -> Component {
    Component::Div {
        id: None,
        children: vec![
            Component::button(ADD_BUTTON_ID, "Create Tables"),
            Component::button(RESET_BUTTON_ID, "Reset Tables"),
            Component::Div {
                id: Some(ComponentId::plain(CONTAINER_ID)),
                children: tables,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Event;
    use crate::table::PLACEHOLDER;
    use serde_json::json;
    use std::collections::HashSet;

    fn sample_figures() -> Vec<Box<dyn Figure>> {
        let d2 = Dataset::from_columns([
            ("X", vec![json!(100), json!(200)]),
            ("Y", vec![json!(300), json!(400)]),
        ])
        .unwrap();
        vec![
            Box::new(TableBuilder::new(Dataset::sample())),
            Box::new(TableBuilder::new(d2)),
        ]
    }

    fn container(app: &App) -> &[Component] {
        app.component(&ComponentId::plain(CONTAINER_ID))
            .unwrap()
            .children()
            .unwrap()
    }

    fn add_button() -> ComponentId {
        ComponentId::plain(ADD_BUTTON_ID)
    }

    fn poison<M: CallbackRegistry>(context: &Context<M>) {
        let manager = Arc::clone(&context.manager);
        let handle = std::thread::spawn(move || {
            let _guard = manager.lock().unwrap();
            panic!("registrar thread died");
        });
        assert!(handle.join().is_err());
        assert!(context.manager.is_poisoned());
    }

    #[test]
    fn test_start_builds_initial_tables() {
        let mut context = Context::<CallbackManager>::new(sample_figures());
        let app = context.start().unwrap();
        assert_eq!(container(&app).len(), 2);
        assert_eq!(app.layout().tables().len(), 2);
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut context = Context::<CallbackManager>::new(sample_figures());
        context.start().unwrap();
        assert!(matches!(context.start(), Err(Error::AlreadyBound)));
    }

    #[test]
    fn test_n_clicks_add_n_tables_with_distinct_ids() {
        let mut context = Context::<CallbackManager>::new(sample_figures());
        let mut app = context.start().unwrap();

        for _ in 0..4 {
            app.click(&add_button()).unwrap();
        }

        let tables = app.layout().tables();
        assert_eq!(tables.len(), 6);
        let ids: HashSet<_> = tables.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn test_added_table_callbacks_work_immediately() {
        let mut context = Context::<CallbackManager>::new(Vec::new());
        let mut app = context.start().unwrap();
        assert!(container(&app).is_empty());

        app.click(&add_button()).unwrap();
        assert_eq!(container(&app).len(), 1);

        let table_id = app.layout().tables()[0].id.clone();
        let alert_id = ComponentId::pattern(
            table_id.kind().unwrap().replace("_tbl", "_alert"),
            table_id.index().unwrap(),
        );
        app.dispatch(&Event {
            id: table_id,
            property: "active_cell".into(),
            value: json!({"row": 1, "column": 1, "column_id": "B"}),
        })
        .unwrap();

        let alert = app.component(&alert_id).unwrap();
        assert_eq!(
            alert.children().unwrap(),
            &[Component::paragraph("Selected cell: row 1, column B = 5")]
        );
    }

    #[test]
    fn test_custom_default_dataset() {
        let d = Dataset::from_columns([("Q", vec![json!("a")])]).unwrap();
        let mut context = Context::<CallbackManager>::new(Vec::new()).with_default_dataset(d);
        let mut app = context.start().unwrap();
        app.click(&add_button()).unwrap();
        assert_eq!(app.layout().tables()[0].columns[0].id, "Q");
    }

    #[test]
    fn test_reset_restores_initial_tables() {
        let mut context = Context::<CallbackManager>::new(sample_figures());
        let mut app = context.start().unwrap();
        app.click(&add_button()).unwrap();
        app.click(&add_button()).unwrap();
        assert_eq!(container(&app).len(), 4);

        app.click(&ComponentId::plain(RESET_BUTTON_ID)).unwrap();
        assert_eq!(container(&app).len(), 2);

        // Reset tables are fresh: no selection, placeholder alert
        for table in app.layout().tables() {
            assert!(table.active_cell.is_none());
        }
        let first_alert = &container(&app)[0].children().unwrap()[2];
        assert_eq!(first_alert.children().unwrap(), &[Component::paragraph(PLACEHOLDER)]);
    }

    #[test]
    fn test_malformed_figure_aborts_start() {
        let bad: Dataset = serde_json::from_value(json!({"columns": []})).unwrap();
        let figures: Vec<Box<dyn Figure>> = vec![Box::new(TableBuilder::new(bad))];
        let mut context = Context::<CallbackManager>::new(figures);
        assert!(matches!(context.start(), Err(Error::MalformedDataset(_))));
    }

    #[test]
    fn test_malformed_default_dataset_aborts_start() {
        let bad: Dataset =
            serde_json::from_value(json!({"columns": ["A"], "rows": [[1, 2]]})).unwrap();
        let mut context = Context::<CallbackManager>::new(Vec::new()).with_default_dataset(bad);
        assert!(context.start().is_err());
    }

    #[test]
    fn test_duplicate_figure_names_abort_start() {
        let figures: Vec<Box<dyn Figure>> = vec![
            Box::new(TableBuilder::named(Dataset::sample(), "same")),
            Box::new(TableBuilder::named(Dataset::sample(), "same")),
        ];
        let mut context = Context::<CallbackManager>::new(figures);
        let err = context.start().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_poisoned_manager_fails_start() {
        let mut context = Context::<CallbackManager>::new(sample_figures());
        poison(&context);
        assert!(matches!(context.start(), Err(Error::ManagerUnavailable)));
    }

    #[test]
    fn test_poisoned_manager_fails_add_table() {
        let mut context = Context::<CallbackManager>::new(sample_figures());
        let mut app = context.start().unwrap();
        poison(&context);

        let err = app.click(&add_button()).unwrap_err();
        assert!(matches!(err, Error::ManagerUnavailable));
        assert_eq!(container(&app).len(), 2);
    }
}
