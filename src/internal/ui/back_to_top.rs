/// Floating "back to top" control: shown past a scroll threshold, and when
/// activated eases the scroll offset back to zero over several ticks.
#[derive(Debug, Clone)]
pub struct BackToTop {
    threshold: u16,
    visible: bool,
    scrolling: bool,
}

impl BackToTop {
    pub fn new(threshold: u16) -> Self {
        Self {
            threshold,
            visible: false,
            scrolling: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_scrolling(&self) -> bool {
        self.scrolling
    }

    pub fn on_scroll(&mut self, offset: u16) {
        self.visible = offset > self.threshold;
    }

    /// Start scrolling to the top. Ignored while the control is hidden.
    pub fn activate(&mut self) -> bool {
        if self.visible {
            self.scrolling = true;
        }
        self.scrolling
    }

    /// Any manual scroll interrupts the animation.
    pub fn interrupt(&mut self) {
        self.scrolling = false;
    }

    /// Next offset of the smooth scroll. Each tick covers a quarter of the
    /// remaining distance (at least one line).
    pub fn tick(&mut self, offset: u16) -> u16 {
        if !self.scrolling {
            return offset;
        }
        let next = offset.saturating_sub((offset / 4).max(1));
        if next == 0 {
            self.scrolling = false;
        }
        self.on_scroll(next);
        next
    }
}
