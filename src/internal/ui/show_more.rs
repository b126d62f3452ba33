use crate::internal::locale;
use crate::internal::page::{Card, Page, ShowMoreToggle};

/// Description truncation with an expand/collapse toggle for cards whose
/// description does not fit in `max_lines`.
#[derive(Debug, Clone, Copy)]
pub struct ShowMore {
    max_lines: usize,
}

impl ShowMore {
    pub fn new(max_lines: usize) -> Self {
        Self {
            max_lines: max_lines.max(1),
        }
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    /// Number of lines the description takes when wrapped to `width`.
    pub fn line_count(text: &str, width: usize) -> usize {
        if text.is_empty() {
            return 0;
        }
        textwrap::wrap(text, width.max(1)).len()
    }

    /// Measure every card at `width`, attaching a toggle only where the
    /// description overflows. Existing toggles keep their expanded state.
    pub fn refresh(&self, page: &mut Page, width: usize) {
        for card in page.cards.iter_mut() {
            let overflowing = card
                .description
                .as_ref()
                .is_some_and(|d| Self::line_count(&d.plain_text(), width) > self.max_lines);

            card.show_more = match (overflowing, card.show_more) {
                (true, Some(existing)) => Some(existing),
                (true, None) => Some(ShowMoreToggle::default()),
                (false, _) => None,
            };
        }
    }

    /// Flip the card's expanded state. Returns the new state, or `None` when
    /// the card has no toggle.
    pub fn toggle(card: &mut Card) -> Option<bool> {
        let toggle = card.show_more.as_mut()?;
        toggle.expanded = !toggle.expanded;
        Some(toggle.expanded)
    }

    pub fn label(card: &Card) -> Option<&'static str> {
        card.show_more.map(|toggle| match toggle.expanded {
            true => locale::SHOW_LESS,
            false => locale::SHOW_MORE,
        })
    }
}
