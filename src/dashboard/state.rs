use std::collections::HashSet;
use tokio::sync::{Mutex, RwLock};

use super::templates;
use crate::app::{App, Change, Event};
use crate::component::ComponentId;
use crate::config::AppConfig;
use crate::error::Result;
use crate::logger::{Logger, SessionMetrics};

/// Shared state for the web dashboard.
///
/// The app sits behind a single async mutex so events are handled one at a
/// time, in arrival order.
pub struct DashboardState {
    pub config: AppConfig,
    pub app: Mutex<App>,
    pub metrics: RwLock<SessionMetrics>,
    pub logger: Option<Logger>,
}

/// Result of one dispatched event.
pub struct Outcome {
    pub changes: Vec<Change>,
    /// Out-of-band HTML for the trigger and every changed component.
    pub fragments: String,
}

impl DashboardState {
    pub fn new(config: AppConfig, app: App, logger: Option<Logger>) -> Self {
        Self {
            config,
            app: Mutex::new(app),
            metrics: RwLock::new(SessionMetrics::new()),
            logger,
        }
    }

    pub async fn dispatch(&self, event: Event) -> Result<Outcome> {
        let mut app = self.app.lock().await;
        self.dispatch_locked(&mut app, event).await
    }

    pub async fn click(&self, id: ComponentId) -> Result<Outcome> {
        let mut app = self.app.lock().await;
        let event = match app.click_event(&id) {
            Ok(event) => event,
            Err(e) => {
                self.record_error(&e.to_string()).await;
                return Err(e);
            }
        };
        self.dispatch_locked(&mut app, event).await
    }

    async fn dispatch_locked(&self, app: &mut App, event: Event) -> Result<Outcome> {
        self.log(|l| l.log_event(&event));
        let tables_before = app.layout().tables().len();
        let has_callback = app
            .dispatcher()
            .lookup(&event.id, &event.property)
            .is_some();

        let changes = match app.dispatch(&event) {
            Ok(changes) => changes,
            Err(e) => {
                self.record_error(&e.to_string()).await;
                return Err(e);
            }
        };

        let tables_after = app.layout().tables().len();
        {
            let mut m = self.metrics.write().await;
            m.events += 1;
            if has_callback {
                m.callbacks_fired += 1;
                if changes.is_empty() {
                    m.no_updates += 1;
                }
            }
            m.tables_added += tables_after.saturating_sub(tables_before);
        }
        self.log(|l| l.log_callback(&event, changes.len()));
        if tables_after > tables_before {
            self.log(|l| l.log_table_added(tables_after));
        }

        let mut seen = HashSet::new();
        let fragments = std::iter::once(&event.id)
            .chain(changes.iter().map(|c| &c.id))
            .filter(|id| seen.insert((*id).clone()))
            .filter_map(|id| app.component(id).ok())
            .map(templates::render_oob)
            .collect();

        Ok(Outcome { changes, fragments })
    }

    async fn record_error(&self, message: &str) {
        {
            let mut m = self.metrics.write().await;
            m.events += 1;
            m.errors += 1;
        }
        self.log(|l| l.log_error(message));
    }

    fn log(&self, write: impl FnOnce(&Logger) -> anyhow::Result<()>) {
        if let Some(logger) = &self.logger {
            if let Err(e) = write(logger) {
                eprintln!("Warning: failed to write session log: {}", e);
            }
        }
    }
}
