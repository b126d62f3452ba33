use std::cmp::Ordering;

use crate::internal::locale;
use crate::internal::models::Article;
use crate::internal::page::Page;
use crate::utils::datetime::{fallback_display_date, normalized_date, parse_feed_date};
use crate::utils::html::{escape_attr, escape_text};

/// The only raw markup a card may contain besides the escaped feed text.
const INSTAGRAM_ICON_SVG: &str = concat!(
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20" viewBox="0 0 24 24" "#,
    r#"fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round">"#,
    r#"<rect x="2" y="2" width="20" height="20" rx="5" ry="5"></rect>"#,
    r#"<path d="M16 11.37A4 4 0 1 1 12.63 8 4 4 0 0 1 16 11.37z"></path>"#,
    r#"<line x1="17.5" y1="6.5" x2="17.51" y2="6.5"></line>"#,
    "</svg>"
);

/// Published articles, newest first.
///
/// The sort is stable, so articles sharing a date keep their feed order, and
/// articles whose date does not parse sink to the end.
pub fn select_for_display(articles: &[Article]) -> Vec<&Article> {
    let mut selected: Vec<(&Article, Option<jiff::civil::DateTime>)> = articles
        .iter()
        .filter(|article| article.published)
        .map(|article| (article, parse_feed_date(&article.date)))
        .collect();

    selected.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    selected.into_iter().map(|(article, _)| article).collect()
}

pub fn instagram_link_markup(url: &str) -> String {
    format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"instagram-link\" aria-label=\"{}\">{}</a>",
        escape_attr(url),
        escape_attr(locale::INSTAGRAM_LABEL),
        INSTAGRAM_ICON_SVG
    )
}

/// Markup for one card. Feed text is always escaped.
pub fn article_markup(article: &Article) -> String {
    let display_date = match article.display_date.trim().is_empty() {
        true => fallback_display_date(&article.date),
        false => article.display_date.clone(),
    };
    let instagram = article
        .instagram()
        .map(instagram_link_markup)
        .unwrap_or_default();

    format!(
        concat!(
            "<article class=\"news-card\">",
            "<img src=\"{img}\" alt=\"{alt}\" loading=\"lazy\">",
            "<div class=\"news-content\">",
            "<div class=\"card-meta\">",
            "<time class=\"news-date\" datetime=\"{datetime}\">{display}</time>{instagram}",
            "</div>",
            "<a href=\"{link}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"stretched-link\">",
            "<h3>{title}</h3>",
            "</a>",
            "<p>{description}</p>",
            "<div class=\"card-footer\"><span class=\"read-more\">{cta}</span></div>",
            "</div>",
            "</article>"
        ),
        img = escape_attr(&article.image_url),
        alt = escape_attr(&article.alt_text),
        datetime = escape_attr(&normalized_date(&article.date)),
        display = escape_text(&display_date),
        instagram = instagram,
        link = escape_attr(&article.link),
        title = escape_text(&article.title),
        description = escape_text(&article.description),
        cta = escape_text(&article.read_more_text),
    )
}

/// Replace the page's cards with the displayable subset of `articles`.
///
/// Safe to call repeatedly: previous cards are always removed first. Returns
/// the number of cards now on the page.
#[tracing::instrument(skip_all, fields(articles = articles.len()))]
pub fn render(page: &mut Page, articles: &[Article]) -> usize {
    page.clear_cards();

    let selected = select_for_display(articles);
    if selected.is_empty() {
        tracing::info!("No published articles to render");
        page.placeholder.show(locale::NO_PUBLISHED_NEWS);
        return 0;
    }

    let markup: String = selected.into_iter().map(article_markup).collect();
    let inserted = page.insert_cards(&markup);
    page.placeholder.hide();

    tracing::info!(cards = inserted, "Rendered news cards");
    inserted
}
