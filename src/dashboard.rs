use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::rngs::StdRng;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::{io, path::Path, time::Duration};
use tracing::{info, warn};

use crate::recommend::{
    classics, latest, movie_card, suggest_by_genre, top_rated, unique_genres, Catalog, CatalogEntry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Genres,
    Views,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    HighRated,
    Classics,
    Latest,
}

impl View {
    const ALL: [View; 3] = [View::HighRated, View::Classics, View::Latest];

    fn label(self) -> &'static str {
        match self {
            View::HighRated => "High Rated",
            View::Classics => "Classics",
            View::Latest => "Latest Movies",
        }
    }

    fn empty_message(self) -> &'static str {
        match self {
            View::HighRated => "No top suggestions available right now.",
            View::Classics => "No classic movies found.",
            View::Latest => "No latest movies available.",
        }
    }
}

pub struct App {
    catalog: Catalog,
    genres: Vec<String>,
    focus: Pane,
    genre_state: ListState,
    view_state: ListState,
    details: String,
    scroll: u16,
    rng: StdRng,
}

impl App {
    pub fn new(catalog: Catalog, rng: StdRng) -> Self {
        let (genres, details) = match unique_genres(&catalog) {
            Ok(genres) => (genres, String::new()),
            Err(e) => {
                warn!(error = %e, "genre column could not be parsed");
                (Vec::new(), format!("Oops! There was a problem parsing the genres: {e}"))
            }
        };

        let mut genre_state = ListState::default();
        if !genres.is_empty() {
            genre_state.select(Some(0));
        }
        let mut view_state = ListState::default();
        view_state.select(Some(0));

        Self {
            catalog,
            focus: if genres.is_empty() { Pane::Views } else { Pane::Genres },
            genres,
            genre_state,
            view_state,
            details,
            scroll: 0,
            rng,
        }
    }

    /// Replace the details pane, e.g. with a load error.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.details = message.into();
        self.scroll = 0;
    }

    /// Apply one key press. Returns `false` once the user asks to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Tab | KeyCode::Left | KeyCode::Right => self.toggle_focus(),
            KeyCode::Down => self.step(1),
            KeyCode::Up => self.step(-1),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(5),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(5),
            KeyCode::Enter => self.activate(),
            _ => {}
        }
        true
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Pane::Genres => Pane::Views,
            Pane::Views if !self.genres.is_empty() => Pane::Genres,
            Pane::Views => Pane::Views,
        };
    }

    fn step(&mut self, delta: isize) {
        let (state, len) = match self.focus {
            Pane::Genres => (&mut self.genre_state, self.genres.len()),
            Pane::Views => (&mut self.view_state, View::ALL.len()),
        };
        if len == 0 {
            state.select(None);
            return;
        }
        let current = state.selected().unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len as isize) as usize;
        state.select(Some(next));
    }

    fn activate(&mut self) {
        match self.focus {
            Pane::Genres => {
                if let Some(genre) = self.genre_state.selected().and_then(|i| self.genres.get(i)).cloned() {
                    self.show_genre(&genre);
                }
            }
            Pane::Views => {
                if let Some(view) = self.view_state.selected().and_then(|i| View::ALL.get(i)).copied() {
                    self.show_view(view);
                }
            }
        }
    }

    fn show_genre(&mut self, genre: &str) {
        let text = match suggest_by_genre(&self.catalog, genre, &mut self.rng) {
            Some(entry) => movie_card(&entry.movie),
            None => format!("Sorry, no movies found for genre: {genre}"),
        };
        self.set_status(text);
    }

    fn show_view(&mut self, view: View) {
        let entries: Vec<&CatalogEntry> = match view {
            View::HighRated => top_rated(&self.catalog),
            View::Classics => classics(&self.catalog),
            View::Latest => latest(&self.catalog),
        };
        let text = if entries.is_empty() {
            view.empty_message().to_string()
        } else {
            entries.iter().map(|entry| movie_card(&entry.movie)).collect()
        };
        self.set_status(text);
    }
}

pub fn run_dashboard(path: &Path, rng: StdRng) -> anyhow::Result<()> {
    let (catalog, load_error) = match Catalog::load(path) {
        Ok(catalog) => (catalog, None),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not load movie library");
            (Catalog::default(), Some(format!("Error: could not load {}: {e:#}", path.display())))
        }
    };
    info!(movies = catalog.len(), "dashboard starting");

    let mut app = App::new(catalog, rng);
    if let Some(message) = load_error {
        app.set_status(message);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !app.handle_key(key.code) {
                    return Ok(());
                }
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let background = Color::Rgb(0x2c, 0x3e, 0x50);
    let foreground = Color::Rgb(0xec, 0xf0, 0xf1);
    let heading = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let selected_style = Style::default().add_modifier(Modifier::REVERSED).fg(Color::Yellow);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(5), Constraint::Length(1)])
        .margin(1)
        .split(f.size());

    let title = Paragraph::new(vec![
        Line::from(Span::styled("Welcome to Movie Master Pro", heading)),
        Line::from("Find and explore your next favorite movie with curated suggestions based on genres, ratings, and more!"),
    ])
    .alignment(Alignment::Center)
    .style(Style::default().bg(background).fg(foreground))
    .wrap(Wrap { trim: true });
    f.render_widget(title, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Length(22), Constraint::Min(30)])
        .split(rows[1]);

    let focus = app.focus;
    let border = |pane: Pane| {
        if focus == pane {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(foreground)
        }
    };

    let genre_items: Vec<ListItem> = app.genres.iter().map(|g| ListItem::new(g.as_str())).collect();
    let genre_list = List::new(genre_items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border(Pane::Genres))
                .title("Choose for Me"),
        )
        .highlight_style(selected_style)
        .highlight_symbol(">> ");
    f.render_stateful_widget(genre_list, columns[0], &mut app.genre_state);

    let view_items: Vec<ListItem> = View::ALL.iter().map(|v| ListItem::new(v.label())).collect();
    let view_list = List::new(view_items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border(Pane::Views))
                .title("Top 10"),
        )
        .highlight_style(selected_style)
        .highlight_symbol(">> ");
    f.render_stateful_widget(view_list, columns[1], &mut app.view_state);

    let details = Paragraph::new(app.details.as_str())
        .block(Block::default().borders(Borders::ALL).title("Your Next Watch"))
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0));
    f.render_widget(details, columns[2]);

    let help = Paragraph::new("Tab: switch   Up/Down: move   Enter: suggest   PgUp/PgDn: scroll   q: quit")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, rows[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::MovieRecord;
    use crate::library::format_genres;
    use rand::SeedableRng;
    use ratatui::backend::TestBackend;

    fn movie(name: &str, year: &str, rating: &str, genre: &str) -> MovieRecord {
        MovieRecord {
            name: name.to_string(),
            year: year.to_string(),
            duration: "1h 57m".to_string(),
            genre: format_genres(&[genre.to_string()]),
            rating: rating.to_string(),
            director: "Ridley Scott".to_string(),
            cast: "Sigourney Weaver".to_string(),
            plot: "In space no one can hear you scream.".to_string(),
        }
    }

    fn app() -> App {
        let catalog = Catalog::new(vec![
            movie("Alien", "1979", "8.5", "Horror"),
            movie("Gladiator", "2000", "8.5", "Action"),
        ]);
        App::new(catalog, StdRng::seed_from_u64(3))
    }

    fn screen_text(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn genres_become_buttons() {
        let mut app = app();
        assert_eq!(app.genres, vec!["Action", "Horror"]);
        let screen = screen_text(&mut app);
        assert!(screen.contains("Movie Master Pro"));
        assert!(screen.contains("Horror"));
        assert!(screen.contains("Latest Movies"));
    }

    #[test]
    fn enter_on_a_genre_shows_a_matching_movie() {
        let mut app = app();
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Enter);
        assert!(app.details.starts_with("Alien\n1979"));
    }

    #[test]
    fn classics_view_lists_pre_2000_movies() {
        let mut app = app();
        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Enter);
        assert!(app.details.contains("Alien"));
        assert!(!app.details.contains("Gladiator"));
    }

    #[test]
    fn empty_library_reports_instead_of_failing() {
        let mut app = App::new(Catalog::default(), StdRng::seed_from_u64(1));
        assert_eq!(app.focus, Pane::Views);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.details, "No top suggestions available right now.");
    }

    #[test]
    fn broken_genre_column_surfaces_as_status_text() {
        let mut broken = movie("Alien", "1979", "8.5", "Horror");
        broken.genre = "Horror".to_string();
        let app = App::new(Catalog::new(vec![broken]), StdRng::seed_from_u64(1));
        assert!(app.genres.is_empty());
        assert!(app.details.starts_with("Oops! There was a problem parsing the genres"));
    }

    #[test]
    fn q_quits() {
        let mut app = app();
        assert!(app.handle_key(KeyCode::Down));
        assert!(!app.handle_key(KeyCode::Char('q')));
    }
}
