use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::component::TableStyle;
use crate::dataset::Dataset;
use crate::table::TableOptions;

/// Application configuration, loaded from `dyntables.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub title: String,
    pub page_size: usize,
    pub max_page_size: usize,
    pub log_dir: String,
    pub enable_file_log: bool,
    pub header_background: String,
    pub cell_background: String,
    /// Dataset used by tables added at runtime. `None` means the built-in sample.
    pub default_dataset: Option<Dataset>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let style = TableStyle::default();
        Self {
            host: "127.0.0.1".to_string(),
            port: 8050,
            title: "Dynamic tables".to_string(),
            page_size: 10,
            max_page_size: 100,
            log_dir: "logs".to_string(),
            enable_file_log: true,
            header_background: style.header_background,
            cell_background: style.cell_background,
            default_dataset: None,
        }
    }
}

impl AppConfig {
    /// Load configuration with the chain: `./dyntables.toml` -> `~/dyntables.toml` -> defaults,
    /// then apply `DYNTABLES_HOST` / `DYNTABLES_PORT` from the environment.
    pub fn load() -> Self {
        let mut cfg = Self::load_file();
        cfg.apply_env(|key| env::var(key).ok());
        cfg
    }

    fn load_file() -> Self {
        let candidates = Self::config_paths();
        for path in &candidates {
            if let Ok(contents) = fs::read_to_string(path) {
                match toml::from_str::<AppConfig>(&contents) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: failed to parse {}: {}", path.display(), e);
                    }
                }
            }
        }
        Self::default()
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("dyntables.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("dyntables.toml"));
        }
        paths
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("DYNTABLES_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("DYNTABLES_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => eprintln!("Warning: ignoring invalid DYNTABLES_PORT '{}'", port),
            }
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Page size clamped to `1..=max_page_size`.
    pub fn effective_page_size(&self) -> usize {
        self.page_size.clamp(1, self.max_page_size.max(1))
    }

    pub fn table_options(&self) -> TableOptions {
        TableOptions {
            page_size: self.effective_page_size(),
            style: TableStyle {
                header_background: self.header_background.clone(),
                cell_background: self.cell_background.clone(),
                ..TableStyle::default()
            },
        }
    }

    pub fn default_dataset(&self) -> Dataset {
        self.default_dataset.clone().unwrap_or_else(Dataset::sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 8050);
        assert_eq!(cfg.page_size, 10);
        assert_eq!(cfg.max_page_size, 100);
        assert_eq!(cfg.log_dir, "logs");
        assert!(cfg.enable_file_log);
        assert_eq!(cfg.header_background, "rgb(230, 230, 230)");
        assert!(cfg.default_dataset.is_none());
        assert_eq!(cfg.default_dataset(), Dataset::sample());
    }

    #[test]
    fn test_partial_toml_deserialize() {
        let toml_str = r#"
            port = 9000
            page_size = 5
        "#;
        let cfg: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.page_size, 5);
        // Other fields should be defaults
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.max_page_size, 100);
    }

    #[test]
    fn test_default_dataset_from_toml() {
        let toml_str = r#"
            title = "Reservoirs"

            [default_dataset]
            columns = ["name", "level"]
            rows = [["Shasta", 0.82], ["Oroville", 0.77]]
        "#;
        let cfg: AppConfig = toml::from_str(toml_str).unwrap();
        let d = cfg.default_dataset();
        d.validate().unwrap();
        assert_eq!(d.len(), 2);
        assert_eq!(d.cell(1, "name"), Some(&json!("Oroville")));
    }

    #[test]
    fn test_page_size_clamped() {
        let mut cfg = AppConfig {
            page_size: 500,
            ..AppConfig::default()
        };
        assert_eq!(cfg.effective_page_size(), 100);
        cfg.page_size = 0;
        assert_eq!(cfg.effective_page_size(), 1);
        assert_eq!(cfg.table_options().page_size, 1);
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(|key| match key {
            "DYNTABLES_HOST" => Some("0.0.0.0".to_string()),
            "DYNTABLES_PORT" => Some("8123".to_string()),
            _ => None,
        });
        assert_eq!(cfg.addr(), "0.0.0.0:8123");

        cfg.apply_env(|key| (key == "DYNTABLES_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(cfg.port, 8123);
    }

    #[test]
    fn test_load_falls_back_to_defaults() {
        // When no config file exists, load() returns defaults
        let cfg = AppConfig::load();
        assert_eq!(cfg.max_page_size, AppConfig::default().max_page_size);
    }
}
