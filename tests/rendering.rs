use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};
use tui_news_preview::config::AppConfig;
use tui_news_preview::internal::locale;
use tui_news_preview::internal::models::Article;
use tui_news_preview::internal::search::SearchHistory;
use tui_news_preview::internal::ui::app::App;
use tui_news_preview::utils::theme::{MemoryPreferenceStore, ThemeController};

fn article(title: &str, description: &str, date: &str) -> Article {
    Article {
        title: title.to_string(),
        description: description.to_string(),
        link: "https://example.com".to_string(),
        date: date.to_string(),
        read_more_text: "Leia mais".to_string(),
        published: true,
        ..Default::default()
    }
}

fn loaded_app(now: Instant) -> App {
    let controller = ThemeController::new(Box::new(MemoryPreferenceStore::new()), None);
    let mut app = App::with_parts(AppConfig::default(), controller, SearchHistory::new(5));
    app.on_feed_loaded(
        &[
            article("Feira de ciências", "Projetos dos alunos", "2024-03-01"),
            article("Jogos escolares", "Resultados da semana", "2024-02-01"),
        ],
        now,
    );
    app.on_tick(now + Duration::from_secs(5));
    app
}

fn rows(buffer: &Buffer) -> Vec<String> {
    (0..buffer.area.height)
        .map(|y| {
            (0..buffer.area.width)
                .map(|x| buffer[(x, y)].symbol())
                .collect::<String>()
        })
        .collect()
}

/// Cell position of the first occurrence of `needle` (ASCII only).
fn find(buffer: &Buffer, needle: &str) -> Option<(u16, u16)> {
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            let matches = needle.chars().enumerate().all(|(i, c)| {
                x + (i as u16) < buffer.area.width
                    && buffer[(x + i as u16, y)].symbol() == c.to_string()
            });
            if matches {
                return Some((x, y));
            }
        }
    }
    None
}

fn press(app: &mut App, code: KeyCode, now: Instant) {
    app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE), now);
}

#[test]
fn test_feed_render() {
    let backend = TestBackend::new(80, 24);
    let mut terminal = Terminal::new(backend).unwrap();
    let mut app = loaded_app(Instant::now());

    terminal.draw(|f| app.ui(f)).unwrap();

    let text = rows(terminal.backend().buffer()).join("\n");
    assert!(text.contains("Feira de ciências"));
    assert!(text.contains("Jogos escolares"));
    assert!(text.contains("01/03/2024"));
    assert!(text.contains(locale::SEARCH_PLACEHOLDER));
    assert!(text.contains(locale::SWITCH_TO_DARK));
    assert!(text.contains("Leia mais →"));
    assert_eq!(app.layout.placements.len(), 2);
}

#[test]
fn test_loading_state_render() {
    let backend = TestBackend::new(60, 12);
    let mut terminal = Terminal::new(backend).unwrap();
    let controller = ThemeController::new(Box::new(MemoryPreferenceStore::new()), None);
    let mut app = App::with_parts(AppConfig::default(), controller, SearchHistory::new(5));
    app.page.loading = true;

    terminal.draw(|f| app.ui(f)).unwrap();

    let text = rows(terminal.backend().buffer()).join("\n");
    assert!(text.contains(locale::LOADING));
}

#[test]
fn test_search_highlight_render() {
    let backend = TestBackend::new(80, 24);
    let mut terminal = Terminal::new(backend).unwrap();
    let start = Instant::now();
    let mut app = loaded_app(start);

    press(&mut app, KeyCode::Char('/'), start);
    for c in "feira".chars() {
        press(&mut app, KeyCode::Char(c), start);
    }
    app.on_tick(start + Duration::from_secs(10));

    terminal.draw(|f| app.ui(f)).unwrap();
    let buffer = terminal.backend().buffer();

    let text = rows(buffer).join("\n");
    assert!(!text.contains("Jogos escolares"));
    assert!(text.contains("1/2"));

    let (x, y) = find(buffer, "Feira").expect("highlighted title is drawn");
    assert_eq!(buffer[(x, y)].bg, app.theme.highlight_bg);
    assert_eq!(buffer[(x + 4, y)].bg, app.theme.highlight_bg);
    assert_ne!(buffer[(x + 6, y)].bg, app.theme.highlight_bg);

    insta::assert_snapshot!(
        app.page.cards[0].title.as_ref().unwrap().to_html(),
        @"<mark>Feira</mark> de ciências"
    );
}

#[test]
fn test_no_matches_render() {
    let backend = TestBackend::new(80, 24);
    let mut terminal = Terminal::new(backend).unwrap();
    let start = Instant::now();
    let mut app = loaded_app(start);

    press(&mut app, KeyCode::Char('/'), start);
    for c in "xyz".chars() {
        press(&mut app, KeyCode::Char(c), start);
    }
    app.on_tick(start + Duration::from_secs(10));

    terminal.draw(|f| app.ui(f)).unwrap();

    let text = rows(terminal.backend().buffer()).join("\n");
    assert!(text.contains(locale::NO_MATCHES));
    assert!(!text.contains("Feira de ciências"));
}

#[test]
fn test_dark_theme_render() {
    let backend = TestBackend::new(80, 24);
    let mut terminal = Terminal::new(backend).unwrap();
    let mut app = loaded_app(Instant::now());

    press(&mut app, KeyCode::Char('t'), Instant::now());
    let action = app.action_rx.try_recv().unwrap();
    tokio::runtime::Runtime::new()
        .unwrap()
        .block_on(app.handle_action(action));

    terminal.draw(|f| app.ui(f)).unwrap();

    let text = rows(terminal.backend().buffer()).join("\n");
    assert!(text.contains(locale::SWITCH_TO_LIGHT));
    assert!(text.contains(locale::THEME_CHANGED_DARK));
}
