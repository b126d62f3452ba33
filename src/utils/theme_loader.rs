use anyhow::{Context, Result};
use ratatui::style::Color;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::theme::ThemeMode;

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeFile {
    pub name: String,
    pub themes: Vec<ThemeVariant>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeVariant {
    pub name: String,
    pub mode: String, // "light" or "dark"
    pub colors: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuiTheme {
    pub background: Color,
    pub foreground: Color,
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub link: Color,
}

impl TuiTheme {
    pub fn light() -> Self {
        Self {
            background: Color::Rgb(0xff, 0xfc, 0xf0),
            foreground: Color::Rgb(0x10, 0x0f, 0x0f),
            muted: Color::Rgb(0x6f, 0x6e, 0x69),
            accent: Color::Rgb(0x20, 0x5e, 0xa6),
            border: Color::Rgb(0xce, 0xcd, 0xc3),
            selection_bg: Color::Rgb(0xe6, 0xe4, 0xd9),
            selection_fg: Color::Rgb(0x10, 0x0f, 0x0f),
            highlight_bg: Color::Rgb(0xec, 0xcb, 0x60),
            highlight_fg: Color::Rgb(0x10, 0x0f, 0x0f),
            link: Color::Rgb(0x20, 0x5e, 0xa6),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::Rgb(0x10, 0x0f, 0x0f),
            foreground: Color::Rgb(0xce, 0xcd, 0xc3),
            muted: Color::Rgb(0x87, 0x85, 0x80),
            accent: Color::Rgb(0x43, 0x85, 0xbe),
            border: Color::Rgb(0x40, 0x3e, 0x3c),
            selection_bg: Color::Rgb(0x28, 0x27, 0x26),
            selection_fg: Color::Rgb(0xce, 0xcd, 0xc3),
            highlight_bg: Color::Rgb(0xad, 0x83, 0x01),
            highlight_fg: Color::Rgb(0x10, 0x0f, 0x0f),
            link: Color::Rgb(0x43, 0x85, 0xbe),
        }
    }

    pub fn builtin(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::light(),
            ThemeMode::Dark => Self::dark(),
        }
    }
}

impl Default for TuiTheme {
    fn default() -> Self {
        Self::light()
    }
}

/// Load the variant for `mode` from a JSON theme file. Colours the file does
/// not define keep the built-in value for that mode.
#[tracing::instrument(skip(path), fields(path = ?path, mode = %mode))]
pub fn load_theme(path: &Path, mode: ThemeMode) -> Result<TuiTheme> {
    let content = fs::read_to_string(path).context("Failed to read theme file")?;
    let theme_file: ThemeFile =
        serde_json::from_str(&content).context("Failed to parse theme JSON")?;

    let mode_name = mode.to_string();
    let variant = theme_file
        .themes
        .iter()
        .find(|t| t.mode.eq_ignore_ascii_case(&mode_name))
        .context("No matching theme variant found")?;

    let base = TuiTheme::builtin(mode);
    let pick = |keys: &[&str], fallback: Color| {
        keys.iter()
            .find_map(|key| variant.colors.get(*key))
            .and_then(|hex| parse_color(hex))
            .unwrap_or(fallback)
    };

    let theme = TuiTheme {
        background: pick(&["background"], base.background),
        foreground: pick(&["foreground"], base.foreground),
        muted: pick(&["muted.foreground"], base.muted),
        accent: pick(&["accent.foreground", "base.blue"], base.accent),
        border: pick(&["border"], base.border),
        selection_bg: pick(
            &["selection.background", "list.active.background"],
            base.selection_bg,
        ),
        selection_fg: pick(&["selection.foreground", "foreground"], base.selection_fg),
        highlight_bg: pick(&["highlight.background", "base.yellow"], base.highlight_bg),
        highlight_fg: pick(&["highlight.foreground"], base.highlight_fg),
        link: pick(&["link", "base.blue"], base.link),
    };

    tracing::info!(theme = %theme_file.name, variant = %variant.name, "Loaded theme file");
    Ok(theme)
}

/// Palette for `mode`: the configured theme file when it loads, otherwise
/// the built-in palette.
pub fn palette_for(mode: ThemeMode, theme_file: Option<&str>) -> TuiTheme {
    match theme_file {
        Some(path) => load_theme(Path::new(path), mode).unwrap_or_else(|e| {
            tracing::error!("Failed to load theme '{}': {:#}", path, e);
            TuiTheme::builtin(mode)
        }),
        None => TuiTheme::builtin(mode),
    }
}

fn parse_color(hex: &str) -> Option<Color> {
    if let Ok(c) = hex.parse::<Color>() {
        return Some(c);
    }

    let hex = hex.trim_start_matches('#');
    match hex.len() {
        // 8-char hex carries alpha; only RGB is used.
        6 | 8 if hex.is_ascii() => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}
