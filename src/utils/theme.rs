//! Light/dark theme state and its persisted preference.
//!
//! Resolution order at startup is: persisted preference, then the terminal's
//! reported background, then light. A store that cannot be read or written
//! only costs persistence across runs.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use tracing::{info, warn};

use crate::internal::locale;
use crate::internal::page::Page;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Key-value storage for user preferences.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    values: HashMap<String, String>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences kept as a JSON object in the user's config directory.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl FilePreferenceStore {
    pub fn open_default() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("tui-news-preview");
        Self::open(config_dir.join("preferences.json"))
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let values = match path.exists() {
            true => {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read preferences {}", path.display()))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse preferences {}", path.display()))?
            }
            false => HashMap::new(),
        };
        info!(preferences_file = %path.display(), "Opened preference store");
        Ok(Self { path, values })
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let content =
            serde_json::to_string_pretty(&self.values).context("Failed to serialize preferences")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write preferences {}", self.path.display()))
    }
}

/// Interpret a `COLORFGBG` value ("fg;bg"). Backgrounds 0-6 are dark.
pub fn system_mode_from_colorfgbg(value: Option<&str>) -> Option<ThemeMode> {
    let bg = value?.rsplit(';').next()?.trim().parse::<u8>().ok()?;
    match bg {
        0..=6 => Some(ThemeMode::Dark),
        _ => Some(ThemeMode::Light),
    }
}

/// Best-effort read of the terminal's background preference.
pub fn detect_system_mode() -> Option<ThemeMode> {
    system_mode_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

/// What the theme toggle shows: the action it will perform next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleControl {
    pub icon: &'static str,
    pub label: &'static str,
}

pub struct ThemeController {
    mode: ThemeMode,
    store: Box<dyn PreferenceStore>,
}

impl ThemeController {
    pub fn new(store: Box<dyn PreferenceStore>, system: Option<ThemeMode>) -> Self {
        let saved = store
            .get(THEME_KEY)
            .and_then(|value| ThemeMode::from_str(&value).ok());
        let mode = saved.or(system).unwrap_or_default();
        info!(?saved, ?system, %mode, "Resolved initial theme");
        Self { mode, store }
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    /// Flip the theme and persist it. Returns the status announcement.
    pub fn toggle(&mut self) -> &'static str {
        self.mode = self.mode.toggled();
        if let Err(e) = self.store.set(THEME_KEY, &self.mode.to_string()) {
            warn!(error = %e, "Theme preference not persisted");
        }
        match self.mode {
            ThemeMode::Dark => locale::THEME_CHANGED_DARK,
            ThemeMode::Light => locale::THEME_CHANGED_LIGHT,
        }
    }

    pub fn control(&self) -> ToggleControl {
        match self.mode {
            ThemeMode::Dark => ToggleControl {
                icon: "☀",
                label: locale::SWITCH_TO_LIGHT,
            },
            ThemeMode::Light => ToggleControl {
                icon: "☾",
                label: locale::SWITCH_TO_DARK,
            },
        }
    }

    /// Write the document-level theme marker.
    pub fn apply(&self, page: &mut Page) {
        page.theme = self.mode;
    }
}
