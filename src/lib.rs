use anyhow::{Context as _, Result};
use dotenvy::dotenv;
use serde_json::json;
use std::sync::Arc;

pub mod app;
pub mod callback_manager;
pub mod component;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod figure;
pub mod interface;
pub mod logger;
pub mod table;
pub mod utils;

use callback_manager::CallbackManager;
use dashboard::DashboardState;
use logger::Logger;
use table::TableOptions;

/// Run the application: load `.env` and config, build the tables and serve
/// the dashboard until Ctrl-C.
pub async fn run() -> Result<()> {
    // Load environment variables from .env
    dotenv().ok();

    let config = config::AppConfig::load();

    let logger = if config.enable_file_log {
        match Logger::new(&config.log_dir) {
            Ok(logger) => Some(logger),
            Err(e) => {
                eprintln!("Warning: session log disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let options = config.table_options();
    let mut context = Context::<CallbackManager>::new(initial_figures(&options)?)
        .with_default_dataset(config.default_dataset())
        .with_table_options(options);
    let app = context.start().context("Failed to start dashboard")?;

    if let Some(logger) = &logger {
        logger.log_startup(context.figure_count(), app.dispatcher().len())?;
    }
    interface::print_banner(&config, context.figure_count(), logger.as_ref());

    let state = Arc::new(DashboardState::new(config, app, logger));
    dashboard::start_dashboard(Arc::clone(&state)).await?;

    state.metrics.read().await.display();
    Ok(())
}

/// The two tables shown when the page first loads.
pub fn initial_figures(options: &TableOptions) -> error::Result<Vec<Box<dyn Figure>>> {
    let secondary = Dataset::from_columns([
        ("X", vec![json!(100), json!(200)]),
        ("Y", vec![json!(300), json!(400)]),
    ])?;
    let figures: Vec<Box<dyn Figure>> = vec![
        Box::new(TableBuilder::new(Dataset::sample()).with_options(options.clone())),
        Box::new(TableBuilder::new(secondary).with_options(options.clone())),
    ];
    Ok(figures)
}

// Re-exports for library consumers: common useful types
pub use app::{App, Callback, Dependency, Event, Output};
pub use callback_manager::{CallbackRegistry, Registrar};
pub use component::{Component, ComponentId};
pub use config::AppConfig;
pub use context::Context;
pub use dataset::Dataset;
pub use error::Error;
pub use figure::Figure;
pub use table::TableBuilder;
