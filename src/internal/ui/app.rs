use anyhow::{Context, Result};
use std::fs;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};

use crate::api::{FeedClient, FeedSource};
use crate::config::AppConfig;
use crate::internal::debounce::Debouncer;
use crate::internal::locale;
use crate::internal::models::{Article, FetchState};
use crate::internal::notification::Notification;
use crate::internal::page::{Card, Page};
use crate::internal::render;
use crate::internal::search::{FilterEngine, FilterOutcome, SearchHistory};
use crate::internal::ui::animation::EntranceAnimation;
use crate::internal::ui::back_to_top::BackToTop;
use crate::internal::ui::show_more::ShowMore;
use crate::utils::theme::{
    FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, ThemeController,
    detect_system_mode,
};
use crate::utils::theme_loader::{TuiTheme, palette_for};

use ratatui::Frame;

pub const EXPORT_FILE: &str = "news-preview.html";
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const PAGE_SCROLL: u16 = 10;

/// Input modes for the UI.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum InputMode {
    Normal,
    Search,
}

/// Actions/messages sent through the app action channel.
#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    LoadFeed,
    FeedLoaded(Vec<Article>),
    FeedFailed(String),
    ToggleTheme,
    NextCard,
    PrevCard,
    ScrollDown(u16),
    ScrollUp(u16),
    BackToTop,
    ToggleShowMore,
    OpenLink,
    OpenInstagram,
    ExportPage,
}

/// Where each card landed in the last drawn frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardPlacement {
    pub index: usize,
    pub start: u16,
    pub height: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedLayout {
    pub content_width: usize,
    pub viewport: u16,
    pub total_lines: u16,
    pub placements: Vec<CardPlacement>,
}

impl FeedLayout {
    pub fn max_scroll(&self) -> u16 {
        self.total_lines.saturating_sub(self.viewport)
    }

    fn placement(&self, index: usize) -> Option<CardPlacement> {
        self.placements.iter().copied().find(|p| p.index == index)
    }
}

/// Fetch the feed and turn the outcome into the action that reports it.
pub async fn fetch_feed(client: &FeedClient, source: &FeedSource) -> Action {
    match client.fetch(source).await {
        Ok(articles) => Action::FeedLoaded(articles),
        Err(e) => Action::FeedFailed(format!("{:#}", e)),
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub config: AppConfig,
    pub page: Page,
    pub fetch_state: FetchState,
    pub feed_client: FeedClient,
    pub feed_source: FeedSource,
    pub filter: Option<FilterEngine>,
    pub last_outcome: Option<FilterOutcome>,
    pub debouncer: Debouncer,
    pub input_mode: InputMode,
    pub search_input: String,
    pub search_history: SearchHistory,
    pub history_index: Option<usize>,
    pub theme_controller: ThemeController,
    pub theme: TuiTheme,
    pub animation: EntranceAnimation,
    pub show_more: ShowMore,
    pub back_to_top: BackToTop,
    pub scroll: u16,
    pub selected: Option<usize>,
    pub layout: FeedLayout,
    pub notification: Option<Notification>,
    pub spinner_state: usize,
    pub last_spinner_update: Option<Instant>,
    pub action_tx: UnboundedSender<Action>,
    pub action_rx: UnboundedReceiver<Action>,
}

impl App {
    #[tracing::instrument]
    pub fn new() -> Self {
        let config = AppConfig::load();

        let store: Box<dyn PreferenceStore> = match FilePreferenceStore::open_default() {
            Ok(store) => Box::new(store),
            Err(e) => {
                tracing::warn!("Theme preference unavailable, not persisting: {:#}", e);
                Box::new(MemoryPreferenceStore::new())
            }
        };
        let theme_controller = ThemeController::new(store, detect_system_mode());

        let search_history = match SearchHistory::load_or_create(config.search.history_size) {
            Ok(h) => h,
            Err(e) => {
                tracing::error!("Failed to load search history: {}", e);
                SearchHistory::new(config.search.history_size)
            }
        };

        Self::with_parts(config, theme_controller, search_history)
    }

    /// Build an app from already-resolved parts.
    pub fn with_parts(
        config: AppConfig,
        theme_controller: ThemeController,
        search_history: SearchHistory,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let mut page = Page::new();
        theme_controller.apply(&mut page);
        let theme = palette_for(theme_controller.mode(), config.ui.theme_file.as_deref());

        tracing::info!(
            feed = %config.feed.source,
            theme = %theme_controller.mode(),
            "App initialized"
        );

        Self {
            running: true,
            feed_client: FeedClient::new(&config.network),
            feed_source: FeedSource::parse(&config.feed.source),
            debouncer: Debouncer::new(Duration::from_millis(config.search.debounce_ms)),
            animation: EntranceAnimation::new(Duration::from_millis(config.ui.animation_step_ms)),
            show_more: ShowMore::new(config.ui.description_lines),
            back_to_top: BackToTop::new(config.ui.back_to_top_threshold),
            page,
            fetch_state: FetchState::Idle,
            filter: None,
            last_outcome: None,
            input_mode: InputMode::Normal,
            search_input: String::new(),
            search_history,
            history_index: None,
            theme_controller,
            theme,
            scroll: 0,
            selected: None,
            layout: FeedLayout::default(),
            notification: None,
            spinner_state: 0,
            last_spinner_update: None,
            config,
            action_tx,
            action_rx,
        }
    }

    pub fn notify_status(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification::status(message));
    }

    pub fn notify_info(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification::info(message));
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification::error(message));
    }

    pub async fn run(&mut self, mut tui: crate::tui::Tui) -> Result<()> {
        let _ = self.action_tx.send(Action::LoadFeed);

        let mut event_interval = tokio::time::interval(Duration::from_millis(16));

        loop {
            self.on_tick(Instant::now());

            tui.draw(|f| self.ui(f)).context("failed to draw frame")?;

            tokio::select! {
                _ = event_interval.tick() => {
                    // Check for terminal events
                    if event::poll(Duration::from_millis(0))?
                        && let Event::Key(key) = event::read()?
                            && key.kind == KeyEventKind::Press {
                                self.handle_key_event(key, Instant::now());
                            }
                }
                Some(action) = self.action_rx.recv() => {
                    self.handle_action(action).await;
                }
            }

            if !self.running {
                break;
            }
        }
        Ok(())
    }

    /// Timer-driven work: debounced filtering, animations, notification expiry.
    pub fn on_tick(&mut self, now: Instant) {
        if self.debouncer.fire(now) {
            self.apply_filter();
        }

        self.animation.tick(&mut self.page, now);

        if self.back_to_top.is_scrolling() {
            self.scroll = self.back_to_top.tick(self.scroll);
        }

        if let Some(notification) = &self.notification
            && notification.should_dismiss(now)
        {
            self.notification = None;
        }

        match self.last_spinner_update {
            Some(last) if now.saturating_duration_since(last) >= Duration::from_millis(100) => {
                self.spinner_state = self.spinner_state.wrapping_add(1);
                self.last_spinner_update = Some(now);
            }
            Some(_) => {}
            None => self.last_spinner_update = Some(now),
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent, now: Instant) {
        match self.input_mode {
            InputMode::Search => self.handle_search_input(key, now),
            InputMode::Normal => {
                if let Some(action) = self.normal_key_action(key) {
                    let _ = self.action_tx.send(action);
                }
            }
        }
    }

    fn normal_key_action(&mut self, key: KeyEvent) -> Option<Action> {
        let action = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('/') => {
                // Search only exists once there are cards to filter.
                if self.filter.is_some() {
                    self.input_mode = InputMode::Search;
                }
                return None;
            }
            KeyCode::Char('t') => Action::ToggleTheme,
            KeyCode::Char('j') => Action::NextCard,
            KeyCode::Char('k') => Action::PrevCard,
            KeyCode::Down => Action::ScrollDown(1),
            KeyCode::Up => Action::ScrollUp(1),
            KeyCode::PageDown => Action::ScrollDown(PAGE_SCROLL),
            KeyCode::PageUp => Action::ScrollUp(PAGE_SCROLL),
            KeyCode::Char('g') | KeyCode::Home => Action::BackToTop,
            KeyCode::Char(' ') => Action::ToggleShowMore,
            KeyCode::Enter => Action::OpenLink,
            KeyCode::Char('i') => Action::OpenInstagram,
            KeyCode::Char('x') => Action::ExportPage,
            _ => return None,
        };
        Some(action)
    }

    fn handle_search_input(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Char(c) => {
                self.search_input.push(c);
                self.history_index = None;
                self.query_changed(now);
            }
            KeyCode::Backspace => {
                self.search_input.pop();
                self.history_index = None;
                self.query_changed(now);
            }
            KeyCode::Up => {
                // Navigate history up (older)
                let next = self.history_index.map_or(0, |i| i + 1);
                if let Some(query) = self.search_history.get_recent(next).cloned() {
                    self.history_index = Some(next);
                    self.search_input = query;
                    self.query_changed(now);
                }
            }
            KeyCode::Down => {
                // Navigate history down (newer)
                match self.history_index {
                    Some(0) => {
                        self.history_index = None;
                        self.search_input.clear();
                        self.query_changed(now);
                    }
                    Some(n) => {
                        if let Some(query) = self.search_history.get_recent(n - 1).cloned() {
                            self.history_index = Some(n - 1);
                            self.search_input = query;
                            self.query_changed(now);
                        }
                    }
                    None => {}
                }
            }
            KeyCode::Enter => {
                self.search_history.add(&self.search_input);
                if let Err(e) = self.search_history.save() {
                    tracing::warn!("Failed to save search history: {:#}", e);
                }
                self.input_mode = InputMode::Normal;
                self.history_index = None;
            }
            KeyCode::Esc => {
                self.search_input.clear();
                self.input_mode = InputMode::Normal;
                self.history_index = None;
                self.query_changed(now);
            }
            _ => {}
        }
    }

    /// Record the new raw query and restart the quiet period.
    fn query_changed(&mut self, now: Instant) {
        if let Some(filter) = self.filter.as_mut() {
            filter.set_query(&self.search_input);
            self.debouncer.schedule(now);
        }
    }

    fn apply_filter(&mut self) {
        let Some(filter) = &self.filter else {
            return;
        };
        let start = Instant::now();
        let outcome = filter.apply(&mut self.page);
        self.last_outcome = Some(outcome);

        if self.config.logging.enable_performance_metrics {
            tracing::debug!(elapsed = ?start.elapsed(), visible = outcome.visible, "filter.apply");
        }

        // Keep the selection on a card that is still shown.
        if self
            .selected
            .is_none_or(|i| self.page.cards.get(i).is_none_or(|card| card.hidden))
        {
            self.selected = self.page.visible_indices().first().copied();
        }
        self.set_scroll(0);
    }

    #[tracing::instrument(skip(self, action))]
    pub async fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::LoadFeed => {
                self.fetch_state = FetchState::Loading;
                self.page.loading = true;

                let client = self.feed_client.clone();
                let source = self.feed_source.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(fetch_feed(&client, &source).await);
                });
            }
            Action::FeedLoaded(articles) => self.on_feed_loaded(&articles, Instant::now()),
            Action::FeedFailed(error) => self.on_feed_failed(&error),
            Action::ToggleTheme => self.toggle_theme(),
            Action::NextCard => self.select_relative(1),
            Action::PrevCard => self.select_relative(-1),
            Action::ScrollDown(lines) => {
                self.back_to_top.interrupt();
                let target = self.scroll.saturating_add(lines).min(self.layout.max_scroll());
                self.set_scroll(target);
            }
            Action::ScrollUp(lines) => {
                self.back_to_top.interrupt();
                self.set_scroll(self.scroll.saturating_sub(lines));
            }
            Action::BackToTop => {
                if self.back_to_top.activate() {
                    self.selected = self.page.visible_indices().first().copied();
                }
            }
            Action::ToggleShowMore => {
                if let Some(card) = self.selected.and_then(|i| self.page.cards.get_mut(i)) {
                    ShowMore::toggle(card);
                }
            }
            Action::OpenLink => {
                let link = self.selected_card_link(|card| card.link.clone());
                self.open_url(link);
            }
            Action::OpenInstagram => {
                let link = self.selected_card_link(|card| card.instagram_link.clone());
                self.open_url(link);
            }
            Action::ExportPage => match self.export_page() {
                Ok(()) => self.notify_info(format!("Página exportada para {}", EXPORT_FILE)),
                Err(e) => {
                    tracing::error!("Export failed: {:#}", e);
                    self.notify_error(format!("Falha ao exportar: {}", e));
                }
            },
        }
    }

    /// Render the feed, then bring up everything that needs cards to exist.
    pub fn on_feed_loaded(&mut self, articles: &[Article], now: Instant) {
        self.fetch_state = FetchState::Loaded;
        self.page.loading = false;

        let count = render::render(&mut self.page, articles);
        self.filter = FilterEngine::init(&mut self.page);
        if let Some(filter) = self.filter.as_mut() {
            // Text typed before the feed arrived still applies.
            filter.set_query(&self.search_input);
            if !filter.query().is_empty() {
                self.debouncer.schedule(now);
            }
        }
        self.animation.start(now);
        if self.layout.content_width > 0 {
            self.show_more.refresh(&mut self.page, self.layout.content_width);
        }
        self.selected = self.page.visible_indices().first().copied();
        self.set_scroll(0);

        tracing::info!(cards = count, "Feed rendered");
    }

    pub fn on_feed_failed(&mut self, error: &str) {
        tracing::error!("Failed to load news feed: {}", error);
        self.fetch_state = FetchState::Failed;
        self.page.loading = false;
        self.page.clear_cards();
        self.page.placeholder.show(locale::FEED_LOAD_FAILED);
        self.filter = None;
        self.selected = None;
    }

    fn toggle_theme(&mut self) {
        let announcement = self.theme_controller.toggle();
        self.theme_controller.apply(&mut self.page);
        self.theme = palette_for(
            self.theme_controller.mode(),
            self.config.ui.theme_file.as_deref(),
        );
        self.notify_status(announcement);
    }

    fn select_relative(&mut self, delta: isize) {
        let visible = self.page.visible_indices();
        if visible.is_empty() {
            self.selected = None;
            return;
        }

        let position = self
            .selected
            .and_then(|i| visible.iter().position(|&v| v == i));
        let next = match position {
            Some(p) => p.saturating_add_signed(delta).min(visible.len() - 1),
            None => 0,
        };
        self.selected = Some(visible[next]);
        self.scroll_to_selected();
    }

    fn scroll_to_selected(&mut self) {
        let Some(placement) = self.selected.and_then(|i| self.layout.placement(i)) else {
            return;
        };
        self.back_to_top.interrupt();

        let bottom = placement.start.saturating_add(placement.height);
        let viewport_end = self.scroll.saturating_add(self.layout.viewport);
        if placement.start < self.scroll {
            self.set_scroll(placement.start);
        } else if bottom > viewport_end {
            let target = bottom.saturating_sub(self.layout.viewport).min(placement.start);
            self.set_scroll(target);
        }
    }

    fn set_scroll(&mut self, offset: u16) {
        self.scroll = offset;
        self.back_to_top.on_scroll(offset);
    }

    fn selected_card_link(&self, pick: impl Fn(&Card) -> Option<String>) -> Option<String> {
        self.selected
            .and_then(|i| self.page.cards.get(i))
            .and_then(pick)
            .filter(|link| !link.trim().is_empty())
    }

    fn open_url(&mut self, url: Option<String>) {
        let Some(url) = url else {
            return;
        };
        if let Err(e) = open::that(&url) {
            tracing::error!("Failed to open {}: {}", url, e);
            self.notify_error(format!("Não foi possível abrir {}", url));
        }
    }

    pub fn export_page(&self) -> Result<()> {
        fs::write(EXPORT_FILE, self.page.to_html())
            .with_context(|| format!("failed to write {}", EXPORT_FILE))?;
        tracing::info!(file = EXPORT_FILE, "Exported page");
        Ok(())
    }

    /// Record the content width of the card column; re-measures show-more
    /// toggles when it changes.
    pub fn sync_width(&mut self, width: usize) {
        if width != self.layout.content_width {
            self.layout.content_width = width;
            self.show_more.refresh(&mut self.page, width);
        }
    }

    pub fn spinner_char(&self) -> &'static str {
        SPINNER[self.spinner_state % SPINNER.len()]
    }

    pub fn ui(&mut self, f: &mut Frame) {
        crate::internal::ui::view::draw(self, f);
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn test_app() -> App {
        let controller = ThemeController::new(Box::new(MemoryPreferenceStore::new()), None);
        App::with_parts(AppConfig::default(), controller, SearchHistory::new(5))
    }

    fn article(title: &str, description: &str, date: &str) -> Article {
        Article {
            title: title.to_string(),
            description: description.to_string(),
            link: format!("https://example.com/{}", date),
            date: date.to_string(),
            published: true,
            ..Default::default()
        }
    }

    fn feed() -> Vec<Article> {
        vec![
            article("Feira de ciências", "Projetos", "2024-03-01"),
            article("Jogos escolares", "Resultados", "2024-02-01"),
            article("Reunião de pais", "Calendário", "2024-01-01"),
        ]
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str, now: Instant) {
        for c in text.chars() {
            app.handle_key_event(key(KeyCode::Char(c)), now);
        }
    }

    #[test]
    fn feed_loaded_renders_and_enables_search() {
        let mut app = test_app();
        app.on_feed_loaded(&feed(), Instant::now());

        assert_eq!(app.fetch_state, FetchState::Loaded);
        assert_eq!(app.page.cards.len(), 3);
        assert!(app.filter.is_some());
        assert_eq!(app.selected, Some(0));
        assert!(app.page.cards.iter().all(|c| c.originals.is_some()));
    }

    #[test]
    fn feed_failure_shows_message_and_no_cards() {
        let mut app = test_app();
        app.on_feed_failed("HTTP 500");

        assert_eq!(app.fetch_state, FetchState::Failed);
        assert!(app.page.cards.is_empty());
        assert!(app.page.placeholder.visible);
        assert_eq!(app.page.placeholder.text, locale::FEED_LOAD_FAILED);
        assert!(app.filter.is_none());
    }

    #[test]
    fn search_is_unavailable_without_cards() {
        let mut app = test_app();
        app.on_feed_loaded(&[], Instant::now());
        app.handle_key_event(key(KeyCode::Char('/')), Instant::now());
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.page.placeholder.text, locale::NO_PUBLISHED_NEWS);
    }

    #[test]
    fn typing_is_debounced_into_one_apply() {
        let mut app = test_app();
        let start = Instant::now();
        app.on_feed_loaded(&feed(), start);

        app.handle_key_event(key(KeyCode::Char('/')), start);
        assert_eq!(app.input_mode, InputMode::Search);
        type_text(&mut app, "jog", start + Duration::from_millis(50));

        app.on_tick(start + Duration::from_millis(100));
        assert!(app.last_outcome.is_none());

        app.on_tick(start + Duration::from_millis(400));
        assert_eq!(
            app.last_outcome,
            Some(FilterOutcome {
                visible: 1,
                total: 3
            })
        );
        assert_eq!(app.selected, Some(1));
        assert!(app.page.cards[0].hidden);
    }

    #[test]
    fn escape_clears_search_and_restores_cards() {
        let mut app = test_app();
        let start = Instant::now();
        app.on_feed_loaded(&feed(), start);

        app.handle_key_event(key(KeyCode::Char('/')), start);
        type_text(&mut app, "zzz", start);
        app.on_tick(start + Duration::from_secs(1));
        assert!(app.page.placeholder.visible);

        app.handle_key_event(key(KeyCode::Esc), start + Duration::from_secs(1));
        assert_eq!(app.input_mode, InputMode::Normal);
        app.on_tick(start + Duration::from_secs(2));
        assert!(!app.page.placeholder.visible);
        assert!(app.page.cards.iter().all(|c| !c.hidden));
    }

    #[test]
    fn enter_saves_query_and_history_recalls_it() {
        let mut app = test_app();
        let start = Instant::now();
        app.on_feed_loaded(&feed(), start);

        app.handle_key_event(key(KeyCode::Char('/')), start);
        type_text(&mut app, "feira", start);
        app.handle_key_event(key(KeyCode::Enter), start);
        assert_eq!(app.search_history.queries, vec!["feira"]);

        app.handle_key_event(key(KeyCode::Char('/')), start);
        app.handle_key_event(key(KeyCode::Esc), start);
        app.handle_key_event(key(KeyCode::Char('/')), start);
        app.handle_key_event(key(KeyCode::Up), start);
        assert_eq!(app.search_input, "feira");
        app.handle_key_event(key(KeyCode::Down), start);
        assert_eq!(app.search_input, "");
    }

    #[tokio::test]
    async fn toggle_theme_updates_document_and_announces() {
        let mut app = test_app();
        app.handle_action(Action::ToggleTheme).await;

        assert_eq!(app.page.theme, crate::utils::theme::ThemeMode::Dark);
        assert_eq!(app.theme, TuiTheme::dark());
        assert_eq!(
            app.notification.as_ref().map(|n| n.message.as_str()),
            Some(locale::THEME_CHANGED_DARK)
        );
    }

    #[tokio::test]
    async fn card_navigation_skips_hidden_cards() {
        let mut app = test_app();
        let start = Instant::now();
        app.on_feed_loaded(&feed(), start);
        app.page.cards[1].hidden = true;

        app.handle_action(Action::NextCard).await;
        assert_eq!(app.selected, Some(2));
        app.handle_action(Action::NextCard).await;
        assert_eq!(app.selected, Some(2));
        app.handle_action(Action::PrevCard).await;
        assert_eq!(app.selected, Some(0));
    }

    #[tokio::test]
    async fn back_to_top_scrolls_smoothly_to_origin() {
        let mut app = test_app();
        app.on_feed_loaded(&feed(), Instant::now());
        app.layout.viewport = 10;
        app.layout.total_lines = 200;

        app.handle_action(Action::ScrollDown(50)).await;
        assert_eq!(app.scroll, 50);
        assert!(app.back_to_top.is_visible());

        app.handle_action(Action::BackToTop).await;
        let mut now = Instant::now();
        let mut ticks = 0;
        while app.scroll > 0 && ticks < 100 {
            now += Duration::from_millis(16);
            app.on_tick(now);
            ticks += 1;
        }
        assert_eq!(app.scroll, 0);
        assert!(ticks > 1);
        assert!(!app.back_to_top.is_visible());
    }

    #[tokio::test]
    async fn show_more_toggles_selected_card() {
        let mut app = test_app();
        let long = "texto ".repeat(60);
        app.on_feed_loaded(&[article("Longa", &long, "2024-01-01")], Instant::now());
        app.sync_width(30);
        assert!(app.page.cards[0].show_more.is_some());

        app.handle_action(Action::ToggleShowMore).await;
        assert!(app.page.cards[0].is_expanded());
    }

    #[tokio::test]
    async fn quit_stops_the_loop() {
        let mut app = test_app();
        app.handle_action(Action::Quit).await;
        assert!(!app.running);
    }
}
