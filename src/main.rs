use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use sf6_terminal::api::HttpTrackerApi;
use sf6_terminal::clipboard::default_strategies;
use sf6_terminal::config::{AppConfig, CliArgs};
use sf6_terminal::dashboard::Dashboard;
use sf6_terminal::notify::{Notifier, TerminalNotifier};
use sf6_terminal::prefs::PrefStore;
use sf6_terminal::provider::spawn_provider;
use sf6_terminal::state::{Delta, Screen};
use sf6_terminal::stats::StatsController;
use sf6_terminal::ui;

struct App<N: Notifier> {
    dashboard: Dashboard<N>,
    stats: StatsController,
    screen: Screen,
    help_overlay: bool,
    should_quit: bool,
}

impl<N: Notifier> App<N> {
    fn new(dashboard: Dashboard<N>, stats: StatsController) -> Self {
        Self {
            dashboard,
            stats,
            screen: Screen::Dashboard,
            help_overlay: false,
            should_quit: false,
        }
    }

    fn start(&mut self, open_stats: bool, now: Instant) {
        self.dashboard.load(now);
        if open_stats {
            self.screen = Screen::Stats;
            self.stats.start(now);
        }
    }

    fn on_key(&mut self, key: KeyEvent, now: Instant) {
        if self.help_overlay {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.help_overlay = false;
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.help_overlay = true,
            _ => match self.screen {
                Screen::Dashboard => self.on_dashboard_key(key, now),
                Screen::Stats => self.on_stats_key(key),
            },
        }
    }

    fn on_dashboard_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Char('l') => self.dashboard.login(),
            KeyCode::Char('r') => self.dashboard.refresh(),
            KeyCode::Char('c') => self.dashboard.collect_pressed(),
            KeyCode::Char('p') => self.dashboard.toggle_periodic(now),
            KeyCode::Char('i') => self.dashboard.edit_interval(),
            KeyCode::Char('f') => self.dashboard.edit_filter(),
            KeyCode::Char('D') => self.dashboard.delete_database(),
            KeyCode::Char('s') | KeyCode::Enter => {
                if self.dashboard.open_stats() {
                    self.screen = Screen::Stats;
                    self.stats.start(now);
                }
            }
            KeyCode::Char('y') => self.dashboard.copy_stats_url(),
            KeyCode::Char('u') => self.dashboard.edit_user_code(),
            _ => {}
        }
    }

    fn on_stats_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('b') | KeyCode::Esc => {
                self.stats.stop();
                self.screen = Screen::Dashboard;
            }
            KeyCode::Char('[') => self.stats.step_limit(false),
            KeyCode::Char(']') => self.stats.step_limit(true),
            KeyCode::Char('o') => self.stats.next_opponent(),
            KeyCode::Char('O') => self.stats.clear_opponent(),
            KeyCode::Char('r') => self.stats.load(),
            _ => {}
        }
    }

    fn apply_delta(&mut self, delta: Delta, now: Instant) {
        if delta.is_stats() {
            self.stats.apply_delta(delta);
        } else {
            self.dashboard.apply_delta(delta, now);
        }
    }

    fn tick(&mut self, now: Instant) {
        self.dashboard.tick(now);
        self.stats.tick(now);
        for line in self.stats.drain_console() {
            self.dashboard.state.push_log(line);
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cli = CliArgs::parse(&args);
    let mut config = AppConfig::from_env();
    if let Some(base) = &cli.api_base {
        config = config.with_api_base(base);
    }
    let api = HttpTrackerApi::new(&config).context("build tracker client")?;
    let prefs = PrefStore::open_default(config.prefs_path.clone()).shared();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let terminal = Rc::new(RefCell::new(ratatui::Terminal::new(backend)?));

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(Arc::new(api), tx, cmd_rx);

    let dashboard = Dashboard::new(
        &config,
        TerminalNotifier::new(Rc::clone(&terminal)),
        Rc::clone(&prefs),
        Some(cmd_tx.clone()),
        default_strategies(config.osc52),
    );
    let stats = StatsController::new(prefs, Some(cmd_tx), config.stats_poll);
    let mut app = App::new(dashboard, stats);
    app.start(cli.open_stats, Instant::now());
    let res = run_app(&terminal, &mut app, rx);

    disable_raw_mode()?;
    {
        let mut terminal = terminal.borrow_mut();
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
    }

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend, N: Notifier>(
    terminal: &Rc<RefCell<Terminal<B>>>,
    app: &mut App<N>,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);

    loop {
        let now = Instant::now();
        while let Ok(delta) = rx.try_recv() {
            app.apply_delta(delta, now);
        }
        app.tick(now);

        terminal.borrow_mut().draw(|f| draw(f, app))?;

        if event::poll(tick_rate)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key, Instant::now());
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn draw<N: Notifier>(frame: &mut Frame, app: &App<N>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(ui::header_text(app.screen, app.dashboard.state.connection))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.screen {
        Screen::Dashboard => ui::render_dashboard(
            frame,
            chunks[1],
            &app.dashboard.state,
            app.dashboard.collection(),
        ),
        Screen::Stats => ui::render_stats(
            frame,
            chunks[1],
            &app.stats.view,
            &app.dashboard.state.logs,
        ),
    }

    let footer = Paragraph::new(ui::footer_text(app.screen))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.help_overlay {
        ui::render_help_overlay(frame, frame.size(), app.screen);
    }
}
