use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use pokedex::{
    connect, spawn_detail_fetch, spawn_listing_load, Action, Catalog, Command, Config,
    DetailState, EntityFetcher, ListingAggregator, ListingState, Pokemon, PokemonType,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

const PAGE_STEP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Search,
    TypePicker,
}

/// What the event loop should do after a key press
#[derive(Debug, PartialEq)]
pub enum Flow {
    Continue(Command),
    Quit,
}

pub struct App {
    pub catalog: Catalog,
    pub mode: Mode,
    pub state: TableState,
    /// Highlighted button in the type bar
    pub type_cursor: usize,
}

impl App {
    pub fn new() -> Self {
        Self {
            catalog: Catalog::new(),
            mode: Mode::Browse,
            state: TableState::default(),
            type_cursor: 0,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        // The overlay swallows keys until it is closed
        if self.catalog.selection().is_open() {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q')
            ) {
                self.catalog.close();
            }
            return Flow::Continue(Command::None);
        }

        match self.mode {
            Mode::Browse => self.handle_browse_key(key),
            Mode::Search => self.handle_search_key(key),
            Mode::TypePicker => self.handle_type_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Flow {
        let command = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('/') => {
                self.mode = Mode::Search;
                Command::None
            }
            KeyCode::Char('t') => {
                self.mode = Mode::TypePicker;
                self.type_cursor = self.catalog.filter().category.map_or(0, |t| t.index());
                Command::None
            }
            KeyCode::Char('r') => {
                self.catalog.reset_filters();
                Command::None
            }
            KeyCode::Char('R') => self.catalog.reload(),
            KeyCode::Enter => self.catalog.select_current(),
            _ => {
                self.move_cursor(key.code);
                Command::None
            }
        };
        Flow::Continue(command)
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.mode = Mode::Browse,
            KeyCode::Backspace => self.catalog.pop_query(),
            KeyCode::Char(c) => self.catalog.push_query(c),
            other => self.move_cursor(other),
        }
        Flow::Continue(Command::None)
    }

    fn handle_type_key(&mut self, key: KeyEvent) -> Flow {
        let count = PokemonType::ALL.len();
        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Left | KeyCode::Char('h') => {
                self.type_cursor = (self.type_cursor + count - 1) % count;
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.type_cursor = (self.type_cursor + 1) % count;
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.catalog.toggle_category(PokemonType::ALL[self.type_cursor]);
                self.mode = Mode::Browse;
            }
            _ => {}
        }
        Flow::Continue(Command::None)
    }

    fn move_cursor(&mut self, code: KeyCode) {
        match code {
            KeyCode::Down | KeyCode::Char('j') => self.catalog.next(),
            KeyCode::Up | KeyCode::Char('k') => self.catalog.previous(),
            KeyCode::PageDown => self.catalog.page_down(PAGE_STEP),
            KeyCode::PageUp => self.catalog.page_up(PAGE_STEP),
            KeyCode::Home => self.catalog.first(),
            KeyCode::End => self.catalog.last(),
            _ => {}
        }
    }
}

// ============================================================================
// EVENT LOOP
// ============================================================================

/// Background work currently owned by the loop
struct Tasks {
    fetcher: EntityFetcher,
    aggregator: Arc<ListingAggregator>,
    tx: UnboundedSender<Action>,
    listing: Option<JoinHandle<()>>,
}

impl Tasks {
    fn run(&mut self, app: &mut App, command: Command) {
        match command {
            Command::None => {}
            Command::LoadListing(generation) => {
                if let Some(previous) = self.listing.take() {
                    previous.abort();
                }
                self.listing = Some(spawn_listing_load(
                    self.aggregator.clone(),
                    generation,
                    self.tx.clone(),
                ));
            }
            Command::FetchDetail(ticket) => {
                let handle = spawn_detail_fetch(self.fetcher.clone(), ticket.clone(), self.tx.clone());
                app.catalog.track_detail(&ticket, handle.abort_handle());
            }
        }
    }
}

pub async fn run_ui(config: Config) -> Result<()> {
    let (fetcher, aggregator) = connect(&config)?;
    let (tx, rx) = mpsc::unbounded_channel();
    let mut tasks = Tasks {
        fetcher,
        aggregator: Arc::new(aggregator),
        tx,
        listing: None,
    };
    let mut app = App::new();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, &mut app, &mut tasks, rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tasks: &mut Tasks,
    mut rx: UnboundedReceiver<Action>,
) -> Result<()> {
    let command = app.catalog.load_listing();
    tasks.run(app, command);
    let mut events = EventStream::new();

    loop {
        terminal.draw(|f| ui(f, app))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    match app.handle_key(key) {
                        Flow::Quit => return Ok(()),
                        Flow::Continue(command) => tasks.run(app, command),
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            Some(action) = rx.recv() => {
                let command = app.catalog.handle_action(action);
                tasks.run(app, command);
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with search box
            Constraint::Length(3), // Type filter bar
            Constraint::Min(0),    // Listing
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_type_bar(f, chunks[1], app);
    render_listing(f, chunks[2], app);
    render_status_bar(f, chunks[3], app);

    if app.catalog.selection().is_open() {
        render_detail_overlay(f, centered(f.size(), 60, 60), app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let searching = app.mode == Mode::Search;
    let query = &app.catalog.filter().query;

    let spans = vec![
        Span::styled(
            "Pokédex",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled("Search: ", Style::default().fg(Color::Cyan)),
        Span::styled(
            if searching { format!("{}▏", query) } else { query.clone() },
            if searching {
                Style::default().fg(Color::White).add_modifier(Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::White)
            },
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_type_bar(f: &mut Frame, area: Rect, app: &App) {
    let active = app.catalog.filter().category;
    let picking = app.mode == Mode::TypePicker;

    let mut spans = vec![];
    for (i, tag) in PokemonType::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        let mut style = Style::default().fg(type_color(tag.as_str()));
        if active == Some(*tag) {
            style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
        }
        if picking && i == app.type_cursor {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        spans.push(Span::styled(tag.as_str(), style));
    }

    let bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if picking { Color::Yellow } else { Color::White }))
            .title(" Types "),
    );

    f.render_widget(bar, area);
}

fn render_listing(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Pokémon ");

    match app.catalog.listing() {
        ListingState::Loading => {
            let loading = Paragraph::new("  Loading Pokémon...")
                .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
                .block(block);
            f.render_widget(loading, area);
            return;
        }
        ListingState::Failed(message) => {
            let failed = Paragraph::new(vec![
                Line::from(Span::styled(
                    "  Failed to load the catalog",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("  {}", message)),
                Line::from(""),
                Line::from(Span::styled(
                    "  Press R to reload",
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )),
            ])
            .wrap(Wrap { trim: false })
            .block(block);
            f.render_widget(failed, area);
            return;
        }
        ListingState::Ready(_) => {}
    }

    let header_cells = ["#", "Name", "Types"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows: Vec<Row> = app
        .catalog
        .visible()
        .into_iter()
        .map(|p| {
            let types: Vec<Span> = p
                .types
                .iter()
                .flat_map(|t| {
                    [
                        Span::styled(t.clone(), Style::default().fg(type_color(t))),
                        Span::raw(" "),
                    ]
                })
                .collect();

            Row::new(vec![
                Cell::from(format!("{:>3}", p.id)),
                Cell::from(truncate(&p.name, 22)),
                Cell::from(Line::from(types)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Length(5), Constraint::Length(24), Constraint::Min(10)],
    )
    .header(header)
    .block(block)
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    app.state.select(app.catalog.cursor());
    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.catalog.cursor().map(|i| i + 1).unwrap_or(0);
    let filter = app.catalog.filter();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} of {} ", selected, app.catalog.visible_len(), app.catalog.entries().len()),
        Style::default().fg(Color::Cyan),
    )];

    if filter.is_active() {
        let mut parts = vec![];
        if !filter.query.is_empty() {
            parts.push(format!("\"{}\"", filter.query));
        }
        if let Some(tag) = filter.category {
            parts.push(tag.to_string());
        }
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", parts.join(" + ")),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("r", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" reset)"));
    }

    for (key, label) in [("Enter", " Details"), ("/", " Search"), ("t", " Type"), ("↑/↓", " Nav")] {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_overlay(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Pokémon Details ");

    let mut content = match app.catalog.detail() {
        DetailState::Loaded(pokemon) => detail_lines(pokemon),
        DetailState::Errored { id, message } => vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("  Could not load {}", id),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("  {}", message)),
        ],
        DetailState::Loading(_) | DetailState::Idle => vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Loading...",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )),
        ],
    };

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Press Esc to close",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));

    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(content).wrap(Wrap { trim: false }).block(block), area);
}

fn detail_lines(pokemon: &Pokemon) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut badges = vec![Span::styled("  Types: ", label)];
    for t in &pokemon.types {
        badges.push(Span::styled(
            format!("[{}] ", t),
            Style::default().fg(type_color(t)).add_modifier(Modifier::BOLD),
        ));
    }

    vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!("  {}", pokemon.name),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  #{}", pokemon.id), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
        Line::from(badges),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Height: ", label),
            Span::raw(format!("{} m", pokemon.height)),
        ]),
        Line::from(vec![
            Span::styled("  Weight: ", label),
            Span::raw(format!("{} kg", pokemon.weight)),
        ]),
        Line::from(vec![
            Span::styled("  Abilities: ", label),
            Span::raw(pokemon.abilities_line()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Sprite: ", label),
            Span::styled(
                pokemon.image.clone().unwrap_or_else(|| "(none)".to_string()),
                Style::default().fg(Color::Green),
            ),
        ]),
    ]
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn type_color(tag: &str) -> Color {
    match tag {
        "fire" => Color::Red,
        "water" | "ice" => Color::Blue,
        "grass" | "bug" => Color::Green,
        "electric" => Color::Yellow,
        "psychic" | "fairy" => Color::Magenta,
        "poison" | "ghost" | "dragon" => Color::LightMagenta,
        "ground" | "rock" | "fighting" => Color::LightRed,
        "flying" | "steel" => Color::Cyan,
        "dark" => Color::DarkGray,
        _ => Color::White,
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use pokedex::{CatalogSnapshot, PokemonId, Selection};
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn mon(id: u32, name: &str, types: &[&str]) -> Pokemon {
        Pokemon {
            id,
            name: name.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
            image: None,
            height: 0.7,
            weight: 6.9,
            abilities: vec!["overgrow".to_string(), "chlorophyll".to_string()],
        }
    }

    fn loaded_app() -> App {
        let mut app = App::new();
        app.catalog.handle_action(Action::ListingLoaded(0, Ok(CatalogSnapshot::new(vec![
            mon(1, "bulbasaur", &["grass", "poison"]),
            mon(4, "charmander", &["fire"]),
            mon(6, "charizard", &["fire", "flying"]),
            mon(7, "squirtle", &["water"]),
        ]))));
        app
    }

    fn visible_ids(app: &App) -> Vec<u32> {
        app.catalog.visible().iter().map(|p| p.id).collect()
    }

    fn render(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
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
    fn test_search_mode_edits_query() {
        let mut app = loaded_app();

        app.handle_key(key(KeyCode::Char('/')));
        assert_eq!(app.mode, Mode::Search);
        for c in "CHAR".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(visible_ids(&app), vec![4, 6]);

        // 'q' is text while searching
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), Flow::Continue(Command::None));
        app.handle_key(key(KeyCode::Backspace));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.catalog.filter().query, "CHAR");
    }

    #[test]
    fn test_type_picker_toggles_category() {
        let mut app = loaded_app();

        app.handle_key(key(KeyCode::Char('t')));
        app.handle_key(key(KeyCode::Right)); // fire
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.catalog.filter().category, Some(PokemonType::Fire));
        assert_eq!(visible_ids(&app), vec![4, 6]);

        // picker reopens on the active tag; Enter clears it
        app.handle_key(key(KeyCode::Char('t')));
        assert_eq!(app.type_cursor, 1);
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.catalog.filter().category, None);

        app.handle_key(key(KeyCode::Char('t')));
        app.handle_key(key(KeyCode::Left)); // wraps to fairy
        assert_eq!(app.type_cursor, 17);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.mode, Mode::Browse);
    }

    #[test]
    fn test_reset_key_clears_filters() {
        let mut app = loaded_app();
        app.catalog.set_query("zzz");
        app.catalog.toggle_category(PokemonType::Water);

        app.handle_key(key(KeyCode::Char('r')));

        assert_eq!(visible_ids(&app), vec![1, 4, 6, 7]);
    }

    #[test]
    fn test_enter_opens_overlay_and_esc_closes_it() {
        let mut app = loaded_app();
        app.handle_key(key(KeyCode::Down));

        let flow = app.handle_key(key(KeyCode::Enter));

        assert!(matches!(flow, Flow::Continue(Command::FetchDetail(ref t)) if t.id == PokemonId::Number(4)));
        assert_eq!(app.catalog.selection(), &Selection::Open(PokemonId::Number(4)));

        // Esc closes the overlay instead of quitting
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Flow::Continue(Command::None));
        assert_eq!(app.catalog.selection(), &Selection::Closed);
        assert_eq!(app.catalog.cursor(), Some(1));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = loaded_app();
        let ctrl_c = KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        };

        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), Flow::Quit);
        app.handle_key(key(KeyCode::Char('/')));
        assert_eq!(app.handle_key(ctrl_c), Flow::Quit);
    }

    #[test]
    fn test_reload_key_requests_listing() {
        let mut app = loaded_app();

        assert_eq!(app.handle_key(key(KeyCode::Char('R'))), Flow::Continue(Command::LoadListing(1)));
        assert_eq!(app.catalog.visible_len(), 0);
    }

    #[test]
    fn test_render_loading_listing() {
        let mut app = App::new();

        assert!(render(&mut app).contains("Loading Pokémon"));
    }

    #[test]
    fn test_render_overlay_loading_then_loaded() {
        let mut app = loaded_app();
        let ticket = match app.catalog.select(PokemonId::Number(1)) {
            Command::FetchDetail(ticket) => ticket,
            other => panic!("unexpected {:?}", other),
        };

        let screen = render(&mut app);
        assert!(screen.contains("Loading..."));
        assert!(!screen.contains("Abilities"));

        app.catalog.handle_action(Action::DetailLoaded(ticket, Ok(mon(1, "bulbasaur", &["grass", "poison"]))));
        let screen = render(&mut app);
        assert!(screen.contains("Abilities: overgrow, chlorophyll"));
        assert!(screen.contains("Height: 0.7 m"));
        assert!(screen.contains("Weight: 6.9 kg"));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("nidoran♀", 20), "nidoran♀");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
        assert_eq!(truncate("abcdefghij", 2), "ab");
        assert_eq!(truncate("abcdefghij", 0), "");
    }
}
