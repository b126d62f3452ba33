use std::time::{Duration, Instant};

use crate::internal::page::Page;

/// Staggered entrance: card `i` is revealed `i * step` after the start.
#[derive(Debug, Clone)]
pub struct EntranceAnimation {
    step: Duration,
    started_at: Option<Instant>,
    complete: bool,
}

impl EntranceAnimation {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            started_at: None,
            complete: false,
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.complete = false;
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Reveal every card whose delay has elapsed by `now`.
    pub fn tick(&mut self, page: &mut Page, now: Instant) {
        let Some(started_at) = self.started_at else {
            return;
        };
        if self.complete {
            return;
        }

        let elapsed = now.saturating_duration_since(started_at);
        for (index, card) in page.cards.iter_mut().enumerate() {
            if !card.revealed && self.step * index as u32 <= elapsed {
                card.revealed = true;
            }
        }
        self.complete = page.cards.iter().all(|card| card.revealed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_cards(n: usize) -> Page {
        let mut page = Page::new();
        let markup = "<article class=\"news-card\"><h3>x</h3></article>".repeat(n);
        page.insert_cards(&markup);
        page
    }

    fn revealed(page: &Page) -> Vec<bool> {
        page.cards.iter().map(|card| card.revealed).collect()
    }

    #[test]
    fn reveals_cards_in_steps() {
        let mut page = page_with_cards(3);
        let mut animation = EntranceAnimation::new(Duration::from_millis(100));
        let start = Instant::now();

        animation.tick(&mut page, start);
        assert_eq!(revealed(&page), vec![false, false, false]);

        animation.start(start);
        animation.tick(&mut page, start);
        assert_eq!(revealed(&page), vec![true, false, false]);

        animation.tick(&mut page, start + Duration::from_millis(150));
        assert_eq!(revealed(&page), vec![true, true, false]);
        assert!(!animation.is_complete());

        animation.tick(&mut page, start + Duration::from_millis(200));
        assert_eq!(revealed(&page), vec![true, true, true]);
        assert!(animation.is_complete());
    }

    #[test]
    fn completes_immediately_without_cards() {
        let mut page = Page::new();
        let mut animation = EntranceAnimation::new(Duration::from_millis(100));
        let start = Instant::now();
        animation.start(start);
        animation.tick(&mut page, start);
        assert!(animation.is_complete());
    }
}
