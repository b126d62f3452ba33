//! In-memory document the rest of the app reads and mutates.
//!
//! Cards enter the page as HTML fragments produced by the render pipeline and
//! are parsed back into elements here, so every piece of feed text reaches the
//! page through the same markup a browser would receive.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::internal::render::instagram_link_markup;
use crate::utils::html::{escape_attr, escape_text};
use crate::utils::theme::ThemeMode;

static CARD_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("article.news-card"));
static IMAGE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("img"));
static DATE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("time"));
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("a.stretched-link"));
static INSTAGRAM_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("a.instagram-link"));
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("h3"));
static DESCRIPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| selector(".news-content p"));
static CTA_SELECTOR: Lazy<Selector> = Lazy::new(|| selector(".read-more"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector parses")
}

/// A run of displayed text, optionally wrapped in a highlight marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub highlighted: bool,
}

/// Text as currently displayed on a card: plain runs and highlighted runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayText {
    segments: Vec<Segment>,
}

impl DisplayText {
    pub fn plain(text: impl Into<String>) -> Self {
        let mut out = Self::default();
        out.push(&text.into(), false);
        out
    }

    /// Append a run. Empty runs are dropped and adjacent plain runs merge;
    /// adjacent highlighted runs stay separate so each match keeps its marker.
    pub fn push(&mut self, text: &str, highlighted: bool) {
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(last) if !highlighted && !last.highlighted => last.text.push_str(text),
            _ => self.segments.push(Segment {
                text: text.to_string(),
                highlighted,
            }),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The text with every highlight marker stripped.
    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn highlighted_count(&self) -> usize {
        self.segments.iter().filter(|s| s.highlighted).count()
    }

    /// Markup with every run escaped and matches wrapped in `<mark>`.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment.highlighted {
                true => {
                    out.push_str("<mark>");
                    out.push_str(&escape_text(&segment.text));
                    out.push_str("</mark>");
                }
                false => out.push_str(&escape_text(&segment.text)),
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardImage {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDate {
    /// Normalized `datetime` attribute.
    pub datetime: String,
    pub display: String,
}

/// Title and description as they were when the card was captured.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OriginalText {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShowMoreToggle {
    pub expanded: bool,
}

/// One rendered article. Every element is optional: a fragment missing a
/// piece yields a card without it rather than no card at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Card {
    pub image: Option<CardImage>,
    pub date: Option<CardDate>,
    pub link: Option<String>,
    pub instagram_link: Option<String>,
    pub title: Option<DisplayText>,
    pub description: Option<DisplayText>,
    pub call_to_action: Option<String>,
    pub originals: Option<OriginalText>,
    pub hidden: bool,
    pub revealed: bool,
    pub show_more: Option<ShowMoreToggle>,
}

impl Card {
    fn from_element(element: ElementRef<'_>) -> Self {
        let text_of = |sel: &Selector| {
            element
                .select(sel)
                .next()
                .map(|el| el.text().collect::<String>())
        };
        let attr_of = |sel: &Selector, name: &str| {
            element
                .select(sel)
                .next()
                .and_then(|el| el.value().attr(name))
                .map(str::to_string)
        };

        let image = element.select(&IMAGE_SELECTOR).next().map(|img| CardImage {
            src: img.value().attr("src").unwrap_or_default().to_string(),
            alt: img.value().attr("alt").unwrap_or_default().to_string(),
        });
        let date = element.select(&DATE_SELECTOR).next().map(|time| CardDate {
            datetime: time.value().attr("datetime").unwrap_or_default().to_string(),
            display: time.text().collect(),
        });

        Self {
            image,
            date,
            link: attr_of(&LINK_SELECTOR, "href"),
            instagram_link: attr_of(&INSTAGRAM_SELECTOR, "href"),
            title: text_of(&TITLE_SELECTOR).map(DisplayText::plain),
            description: text_of(&DESCRIPTION_SELECTOR).map(DisplayText::plain),
            call_to_action: text_of(&CTA_SELECTOR),
            ..Default::default()
        }
    }

    pub fn title_text(&self) -> String {
        self.title.as_ref().map(DisplayText::plain_text).unwrap_or_default()
    }

    pub fn description_text(&self) -> String {
        self.description
            .as_ref()
            .map(DisplayText::plain_text)
            .unwrap_or_default()
    }

    pub fn is_expanded(&self) -> bool {
        self.show_more.is_some_and(|toggle| toggle.expanded)
    }

    /// Serialize the card in its current state.
    pub fn to_html(&self) -> String {
        let mut classes = vec!["news-card"];
        if self.revealed {
            classes.push("visible");
        }
        if self.hidden {
            classes.push("hidden");
        }

        let mut out = format!("<article class=\"{}\">", classes.join(" "));
        if let Some(image) = &self.image {
            out.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
                escape_attr(&image.src),
                escape_attr(&image.alt)
            ));
        }
        out.push_str("<div class=\"news-content\"><div class=\"card-meta\">");
        if let Some(date) = &self.date {
            out.push_str(&format!(
                "<time class=\"news-date\" datetime=\"{}\">{}</time>",
                escape_attr(&date.datetime),
                escape_text(&date.display)
            ));
        }
        if let Some(url) = &self.instagram_link {
            out.push_str(&instagram_link_markup(url));
        }
        out.push_str("</div>");
        if let Some(title) = &self.title {
            let heading = format!("<h3>{}</h3>", title.to_html());
            match &self.link {
                Some(link) => out.push_str(&format!(
                    "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"stretched-link\">{}</a>",
                    escape_attr(link),
                    heading
                )),
                None => out.push_str(&heading),
            }
        }
        if let Some(description) = &self.description {
            let class = match self.is_expanded() {
                true => " class=\"expanded\"",
                false => "",
            };
            out.push_str(&format!("<p{}>{}</p>", class, description.to_html()));
        }
        if let Some(cta) = &self.call_to_action {
            out.push_str(&format!(
                "<div class=\"card-footer\"><span class=\"read-more\">{}</span></div>",
                escape_text(cta)
            ));
        }
        out.push_str("</div></article>");
        out
    }
}

/// The shared "no results" / error element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Placeholder {
    pub text: String,
    pub visible: bool,
}

impl Placeholder {
    pub fn show(&mut self, text: &str) {
        self.text = text.to_string();
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub theme: ThemeMode,
    pub cards: Vec<Card>,
    pub placeholder: Placeholder,
    pub loading: bool,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_cards(&mut self) {
        self.cards.clear();
    }

    /// Parse an HTML fragment and append one card per `article.news-card`.
    /// Returns how many cards were appended.
    pub fn insert_cards(&mut self, markup: &str) -> usize {
        let fragment = Html::parse_fragment(markup);
        let before = self.cards.len();
        self.cards
            .extend(fragment.select(&CARD_SELECTOR).map(Card::from_element));
        self.cards.len() - before
    }

    /// Indices of cards the current filter leaves visible.
    pub fn visible_indices(&self) -> Vec<usize> {
        self.cards
            .iter()
            .enumerate()
            .filter(|(_, card)| !card.hidden)
            .map(|(index, _)| index)
            .collect()
    }

    /// Standalone HTML document reflecting the current state.
    pub fn to_html(&self) -> String {
        let cards: String = self.cards.iter().map(Card::to_html).collect();
        let placeholder_class = match self.placeholder.visible {
            true => "no-results-message",
            false => "no-results-message hidden",
        };
        format!(
            "<!DOCTYPE html>\n<html lang=\"pt-BR\" data-theme=\"{}\">\n<head><meta charset=\"utf-8\"><title>Notícias</title></head>\n<body>\n<main class=\"news-preview-container\">\n{}\n<p class=\"{}\">{}</p>\n</main>\n</body>\n</html>\n",
            self.theme,
            cards,
            placeholder_class,
            escape_text(&self.placeholder.text)
        )
    }
}
