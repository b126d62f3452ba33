use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::internal::locale;
use crate::internal::page::{Card, DisplayText, OriginalText, Page};

/// Normalized search text: trimmed and lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    query: String,
}

/// Per-character lowercasing shared by matching and highlighting.
fn fold(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

impl SearchQuery {
    pub fn new(raw: &str) -> Self {
        Self {
            query: fold(raw.trim()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.query
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// Case-insensitive literal substring test. The empty query matches anything.
    pub fn matches(&self, text: &str) -> bool {
        self.is_empty() || fold(text).contains(&self.query)
    }
}

/// Lower-cased copy of a text that remembers, for every byte, which source
/// character produced it. Lowercasing can change byte lengths and expand one
/// character into several ("İ" becomes "i̇").
struct Folded {
    lowered: String,
    sources: Vec<(usize, usize)>,
}

impl Folded {
    fn new(text: &str) -> Self {
        let mut lowered = String::with_capacity(text.len());
        let mut sources = Vec::with_capacity(text.len());
        for (start, c) in text.char_indices() {
            let end = start + c.len_utf8();
            for lower in c.to_lowercase() {
                lowered.push(lower);
                sources.extend(std::iter::repeat_n((start, end), lower.len_utf8()));
            }
        }
        Self { lowered, sources }
    }

    /// Source byte range covering lowered bytes `start..end`.
    fn source_range(&self, start: usize, end: usize) -> (usize, usize) {
        (self.sources[start].0, self.sources[end - 1].1)
    }
}

/// Wraps literal, case-insensitive occurrences of a query in highlight markers.
///
/// Matching runs on the same lower-cased text that [`SearchQuery::matches`]
/// tests, so a visible card always carries at least one marker.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    pub fn new(query: &SearchQuery) -> Self {
        let pattern = match query.is_empty() {
            true => None,
            false => Regex::new(&regex::escape(query.as_str()))
                .inspect_err(|e| tracing::warn!(error = %e, "Highlight pattern rejected"))
                .ok(),
        };
        Self { pattern }
    }

    /// Scan left to right and mark every non-overlapping match; everything else
    /// is copied through untouched.
    pub fn highlight(&self, text: &str) -> DisplayText {
        let Some(pattern) = &self.pattern else {
            return DisplayText::plain(text);
        };

        let folded = Folded::new(text);
        let mut out = DisplayText::default();
        let mut last = 0;
        for found in pattern.find_iter(&folded.lowered) {
            let (start, end) = folded.source_range(found.start(), found.end());
            // Two matches inside one expanded character share its source range.
            if start < last {
                continue;
            }
            out.push(&text[last..start], false);
            out.push(&text[start..end], true);
            last = end;
        }
        out.push(&text[last..], false);
        out
    }
}

/// Result of one filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOutcome {
    pub visible: usize,
    pub total: usize,
}

impl FilterOutcome {
    pub fn has_matches(&self) -> bool {
        self.visible > 0
    }
}

/// Filters and highlights the cards of a page against the current query.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    query: SearchQuery,
}

impl FilterEngine {
    /// Capture every card on the page. Returns `None` when there is nothing to
    /// filter, in which case search stays disabled.
    pub fn init(page: &mut Page) -> Option<Self> {
        if page.cards.is_empty() {
            tracing::info!("No cards on the page, search disabled");
            return None;
        }
        let engine = Self::default();
        page.cards.iter_mut().for_each(|card| engine.capture(card));
        tracing::info!(cards = page.cards.len(), "Search initialized");
        Some(engine)
    }

    /// Store the card's displayed title and description as its originals.
    /// Originals are written once and never replaced.
    pub fn capture(&self, card: &mut Card) {
        if card.originals.is_some() {
            return;
        }
        card.originals = Some(OriginalText {
            title: card.title_text(),
            description: card.description_text(),
        });
    }

    pub fn set_query(&mut self, raw: &str) {
        self.query = SearchQuery::new(raw);
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    #[tracing::instrument(skip_all, fields(query = %self.query.as_str()))]
    pub fn apply(&self, page: &mut Page) -> FilterOutcome {
        let highlighter = Highlighter::new(&self.query);
        let mut visible = 0;

        for card in page.cards.iter_mut() {
            let (title, description) = match &card.originals {
                Some(originals) => (originals.title.as_str(), originals.description.as_str()),
                None => ("", ""),
            };

            let is_visible = self.query.matches(title) || self.query.matches(description);
            card.hidden = !is_visible;
            if !is_visible {
                continue;
            }
            visible += 1;

            // Without originals there is nothing safe to rewrite from.
            let Some(originals) = &card.originals else {
                continue;
            };
            if let Some(displayed) = card.title.as_mut() {
                *displayed = highlighter.highlight(&originals.title);
            }
            if let Some(displayed) = card.description.as_mut() {
                *displayed = highlighter.highlight(&originals.description);
            }
        }

        match visible {
            0 => page.placeholder.show(locale::NO_MATCHES),
            _ => page.placeholder.hide(),
        }

        let outcome = FilterOutcome {
            visible,
            total: page.cards.len(),
        };
        tracing::debug!(visible = outcome.visible, total = outcome.total, "Filter applied");
        outcome
    }
}

/// Search history - tracks recent searches
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchHistory {
    pub queries: Vec<String>,
    #[serde(skip)]
    file_path: Option<PathBuf>,
    #[serde(skip)]
    max_size: usize,
}

impl SearchHistory {
    pub fn new(max_size: usize) -> Self {
        Self {
            queries: Vec::new(),
            file_path: None,
            max_size,
        }
    }

    pub fn load_or_create(max_size: usize) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("tui-news-preview");

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }

        let file_path = config_dir.join("search_history.json");

        match file_path.exists() {
            true => {
                let content =
                    fs::read_to_string(&file_path).context("Failed to read search history file")?;
                let mut history: SearchHistory = serde_json::from_str(&content)
                    .context("Failed to parse search history file")?;
                history.file_path = Some(file_path);
                history.max_size = max_size;
                history.queries.truncate(max_size);
                Ok(history)
            }
            false => Ok(Self {
                queries: Vec::new(),
                file_path: Some(file_path),
                max_size,
            }),
        }
    }

    pub fn save(&self) -> Result<()> {
        if let Some(path) = &self.file_path {
            let content =
                serde_json::to_string_pretty(self).context("Failed to serialize search history")?;
            fs::write(path, content).context("Failed to write search history file")?;
        }
        Ok(())
    }

    /// Record a query as the most recent one. Blank queries are ignored and a
    /// repeated query moves to the front.
    pub fn add(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        self.queries.retain(|q| q != query);
        self.queries.insert(0, query.to_string());
        self.queries.truncate(self.max_size);
    }

    pub fn get_recent(&self, index: usize) -> Option<&String> {
        self.queries.get(index)
    }
}
