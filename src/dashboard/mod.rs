//! Web dashboard module.
//!
//! Serves the tables page, forwards browser events (button clicks, cell
//! selection, pagination) to the [`App`](crate::app::App), and sends back
//! the components that changed as HTMX fragments or JSON.

pub mod routes;
pub mod server;
pub mod state;
pub mod templates;

pub use server::{router, start_dashboard};
pub use state::{DashboardState, Outcome};
