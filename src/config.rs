use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub network: NetworkConfig,
    pub search: SearchConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    /// URL (`http://`, `https://`) or local path of the JSON feed.
    pub source: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source: "news.json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct NetworkConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!("tui-news-preview/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period before a typed query is applied.
    pub debounce_ms: u64,
    pub history_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            history_size: 20,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct UiConfig {
    /// Delay between consecutive cards appearing.
    pub animation_step_ms: u64,
    /// Scroll offset, in lines, past which the back-to-top control shows.
    pub back_to_top_threshold: u16,
    /// Description lines shown before a card needs "show more".
    pub description_lines: usize,
    /// Optional JSON theme file with "light" and "dark" variants.
    pub theme_file: Option<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            animation_step_ms: 100,
            back_to_top_threshold: 12,
            description_lines: 3,
            theme_file: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_directory: Option<String>,
    pub module_levels: HashMap<String, String>,
    pub enable_performance_metrics: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_directory: None,
            module_levels: HashMap::new(),
            enable_performance_metrics: false,
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive built from the level and per-module overrides.
    pub fn filter_directive(&self) -> String {
        let mut modules: Vec<_> = self.module_levels.iter().collect();
        modules.sort();
        let mut filter = self.level.clone();
        for (module, level) in modules {
            filter.push_str(&format!(",{}={}", module, level));
        }
        filter
    }
}

impl AppConfig {
    pub fn load() -> Self {
        // Look for config.ron in current directory or next to executable
        let mut candidates = vec![PathBuf::from("config.ron")];
        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            candidates.push(dir.join("config.ron"));
        }

        for path in candidates {
            if let Some(config) = Self::load_from(&path) {
                return config;
            }
        }

        tracing::info!("No config file found, using defaults");
        Self::default()
    }

    /// Parse the config at `path`. A missing or malformed file yields `None`.
    pub fn load_from(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        match ron::from_str::<AppConfig>(&content) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                tracing::error!("Failed to parse config at {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: AppConfig = ron::from_str(
            r#"(
    // Feed settings
    feed: (source: "https://example.com/news.json"),
    search: (debounce_ms: 150),
)"#,
        )
        .unwrap();

        assert_eq!(config.feed.source, "https://example.com/news.json");
        assert_eq!(config.search.debounce_ms, 150);
        assert_eq!(config.search.history_size, 20);
        assert_eq!(config.ui.animation_step_ms, 100);
        assert_eq!(config.network.timeout_secs, 10);
    }

    #[test]
    fn load_from_rejects_malformed_files() {
        let path = std::env::temp_dir().join(format!(
            "tui-news-preview-config-{}.ron",
            std::process::id()
        ));
        fs::write(&path, "(feed: 42").unwrap();
        assert!(AppConfig::load_from(&path).is_none());
        let _ = fs::remove_file(path);

        assert!(AppConfig::load_from(Path::new("/nonexistent/config.ron")).is_none());
    }

    #[test]
    fn filter_directive_includes_module_levels() {
        let mut logging = LoggingConfig::default();
        logging
            .module_levels
            .insert("reqwest".to_string(), "warn".to_string());
        assert_eq!(logging.filter_directive(), "info,reqwest=warn");
    }
}
