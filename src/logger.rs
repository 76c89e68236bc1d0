use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::app::Event;
use crate::utils::ensure_dir;

/// Appends timestamped lines to one `session_*.log` file per process.
pub struct Logger {
    log_file: PathBuf,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct SessionMetrics {
    pub events: usize,
    pub callbacks_fired: usize,
    pub no_updates: usize,
    pub tables_added: usize,
    pub errors: usize,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of events that ended in a dispatch error, in percent.
    pub fn error_rate(&self) -> f64 {
        if self.events == 0 {
            return 0.0;
        }
        (self.errors as f64 / self.events as f64) * 100.0
    }

    pub fn display(&self) {
        use colored::Colorize;
        println!("\n{}", "━━━━━━━━━ Session Statistics ━━━━━━━━━".bright_cyan().bold());
        println!("Events dispatched: {}", self.events);
        println!("Callbacks fired: {}", self.callbacks_fired.to_string().green());
        println!("No-update results: {}", self.no_updates);
        println!("Tables added: {}", self.tables_added.to_string().green());
        println!("Errors: {}", self.errors.to_string().red());
        println!("Error rate: {:.1}%", self.error_rate());
        println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_cyan());
    }
}

impl Logger {
    pub fn new(log_dir: &str) -> Result<Self> {
        let dir = PathBuf::from(log_dir);
        ensure_dir(&dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_file = dir.join(format!("session_{}.log", timestamp));

        Ok(Self { log_file })
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_file
    }

    pub fn log(&self, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "[{}] {}", timestamp, message)?;
        Ok(())
    }

    pub fn log_startup(&self, figures: usize, callbacks: usize) -> Result<()> {
        self.log(&format!(
            "STARTUP: {} figures, {} callback bindings",
            figures, callbacks
        ))
    }

    pub fn log_event(&self, event: &Event) -> Result<()> {
        self.log(&format!(
            "EVENT {}.{} = {}",
            event.id, event.property, event.value
        ))
    }

    pub fn log_callback(&self, event: &Event, changes: usize) -> Result<()> {
        let status = if changes == 0 { "NO UPDATE" } else { "UPDATED" };
        self.log(&format!(
            "CALLBACK {} for {}.{} ({} changes)",
            status, event.id, event.property, changes
        ))
    }

    pub fn log_table_added(&self, total: usize) -> Result<()> {
        self.log(&format!("TABLE ADDED: {} tables displayed", total))
    }

    pub fn log_error(&self, error: &str) -> Result<()> {
        self.log(&format!("ERROR: {}", error))
    }
}
