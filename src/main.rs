pub mod ui;

use bukvar::{
    achievements,
    app_dirs::AppDirs,
    audio::AudioEngine,
    config::{FileSettingsStore, Settings, SettingsStore},
    games::{self, GameOptions},
    item::ItemPool,
    logging,
    playback::{Caption, ClipClock, FileProbeSink},
    progress::{open_progress_store, ProgressStore},
    runtime::{AppEvent, CrosstermEventSource, Runner},
    Collaborators, GameRegistry, GameSession, StartParams,
};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    cell::RefCell,
    error::Error,
    io::{self, stdin},
    rc::Rc,
    time::Duration,
};
use tracing::{error, info};

use crate::ui::View;

const TICK_RATE_MS: u64 = 100;

/// letter and word games for early readers, in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Small Bulgarian early-literacy games: match letters to pictures, find the named picture, sort vowels from consonants and build words from syllables. Progress and stickers are kept between runs."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    /// open this game instead of the menu
    #[clap(short = 'g', long, value_enum)]
    game: Option<GameKind>,

    /// letter for the sound-match game
    #[clap(short = 'l', long)]
    letter: Option<String>,

    /// answer options per round
    #[clap(short = 'c', long, value_parser = clap::value_parser!(u8).range(2..=6))]
    choices: Option<u8>,

    /// print the word under each picture
    #[clap(long)]
    labels: bool,

    /// seed for reproducible rounds
    #[clap(long)]
    seed: Option<u64>,

    /// remember --choices and --labels for next time
    #[clap(long)]
    save: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// print stars, games played and stickers
    Stats,
    /// forget all progress
    Reset,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum GameKind {
    Phonics,
    Vocab,
    Sorting,
    Train,
}

impl GameKind {
    pub fn name(&self) -> &'static str {
        match self {
            GameKind::Phonics => games::PHONICS,
            GameKind::Vocab => games::VOCAB,
            GameKind::Sorting => games::SORTING,
            GameKind::Train => games::TRAIN,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameKind::Phonics => "Звук и картинка",
            GameKind::Vocab => "Намери картинката",
            GameKind::Sorting => "Гласни и съгласни",
            GameKind::Train => "Звуков влак",
        }
    }

    pub fn all() -> &'static [GameKind] {
        GameKind::value_variants()
    }
}

impl Cli {
    /// Stored settings with this run's flags on top
    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(choices) = self.choices {
            settings.num_choices = choices as usize;
        }
        if self.labels {
            settings.show_labels = true;
        }
        settings.normalized()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Menu,
    Playing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub state: AppState,
    pub view: Rc<RefCell<View>>,
    pub settings: Settings,
    pub menu_index: usize,
    pub current: Option<GameKind>,
    pub letter: Option<String>,
    pub caption: Caption,
    pub saving: bool,
    registry: GameRegistry,
    audio: Rc<RefCell<AudioEngine>>,
    clock: ClipClock,
}

impl App {
    pub fn new(
        settings: Settings,
        store: Rc<RefCell<dyn ProgressStore>>,
        seed: Option<u64>,
    ) -> bukvar::Result<Self> {
        let pool = ItemPool::embedded()?;
        let caption = Caption::default();
        let audio = AudioEngine::new(
            Box::new(FileProbeSink),
            Box::new(caption.clone()),
            settings.audio.clone(),
        )
        .with_speech_texts(pool.speech_texts());
        let audio = Rc::new(RefCell::new(audio));
        let view = Rc::new(RefCell::new(View::default()));

        let collab = Collaborators {
            pool: Rc::new(pool),
            audio: audio.clone(),
            store,
            surface: view.clone(),
        };
        let options = GameOptions {
            seed,
            ..GameOptions::from_settings(&settings)
        };
        let registry = games::registry(&collab, &options)?;

        Ok(Self {
            state: AppState::Menu,
            view,
            settings,
            menu_index: 0,
            current: None,
            letter: None,
            caption,
            saving: true,
            registry,
            audio,
            clock: ClipClock::default(),
        })
    }

    fn session(&mut self) -> Option<&mut (dyn GameSession + 'static)> {
        let name = self.current?.name();
        self.registry.get_mut(name)
    }

    pub fn start_game(&mut self, kind: GameKind) {
        self.view.borrow_mut().clear();
        self.current = Some(kind);
        let params = match kind {
            GameKind::Phonics => StartParams {
                target: self.letter.clone(),
            },
            _ => StartParams::default(),
        };
        match self.registry.start(kind.name(), &params) {
            Ok(session) => {
                if session.is_halted() {
                    self.view.borrow_mut().status = Some("Няма думи за тази игра".to_string());
                }
                info!(game = %kind, "game opened");
            }
            Err(err) => {
                error!(game = %kind, error = %err, "could not start game");
                self.view.borrow_mut().status = Some(err.to_string());
            }
        }
        self.state = AppState::Playing;
    }

    pub fn back_to_menu(&mut self) {
        if let Some(session) = self.session() {
            session.reset();
        }
        self.view.borrow_mut().clear();
        self.state = AppState::Menu;
    }

    pub fn choose_index(&mut self, index: usize) {
        let id = self.view.borrow().options.get(index).map(|o| o.id.clone());
        if let (Some(id), Some(session)) = (id, self.session()) {
            session.choose(&id);
        }
    }

    pub fn on_tick(&mut self, dt: Duration) {
        if let Some(session) = self.session() {
            session.tick(dt);
        }
        self.clock.tick(&mut self.audio.borrow_mut(), dt);
        self.caption.tick(dt);
        if self.state == AppState::Playing && self.view.borrow().stars.is_some() {
            self.state = AppState::Results;
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        let flow = self.handle_key(key);
        if flow == Flow::Quit {
            // A session quit from its results screen still earns its stickers
            self.registry.flush_achievements();
        }
        flow
    }

    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }
        match self.state {
            AppState::Menu => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
                KeyCode::Up => self.menu_index = self.menu_index.saturating_sub(1),
                KeyCode::Down => {
                    self.menu_index = (self.menu_index + 1).min(GameKind::all().len() - 1)
                }
                KeyCode::Enter => self.start_game(GameKind::all()[self.menu_index]),
                KeyCode::Char(c) => {
                    if let Some(kind) = digit_index(c).and_then(|i| GameKind::all().get(i)) {
                        self.menu_index = digit_index(c).unwrap_or(0);
                        self.start_game(*kind);
                    }
                }
                _ => {}
            },
            AppState::Playing => match key.code {
                KeyCode::Esc => self.back_to_menu(),
                KeyCode::Char('r') => {
                    if let Some(session) = self.session() {
                        session.repeat();
                    }
                }
                KeyCode::Char(c) => {
                    if let Some(i) = digit_index(c) {
                        self.choose_index(i);
                    }
                }
                _ => {}
            },
            AppState::Results => match key.code {
                KeyCode::Esc | KeyCode::Char('m') => self.back_to_menu(),
                KeyCode::Char('q') => return Flow::Quit,
                KeyCode::Enter | KeyCode::Char('n') => {
                    if let Some(kind) = self.current {
                        self.start_game(kind);
                    }
                }
                _ => {}
            },
        }
        Flow::Continue
    }
}

/// '1' is the first option
fn digit_index(c: char) -> Option<usize> {
    c.to_digit(10)
        .filter(|d| *d > 0)
        .map(|d| d as usize - 1)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = AppDirs::log_path() {
        if let Err(err) = logging::init_file_logging(&path) {
            eprintln!("logging disabled: {err}");
        }
    }
    let store = open_progress_store(AppDirs::progress_db_path().as_deref());

    match &cli.command {
        Some(Command::Stats) => {
            print_stats(&store);
            return Ok(());
        }
        Some(Command::Reset) => {
            let mut store = store;
            store.reset();
            println!("progress cleared");
            return Ok(());
        }
        None => {}
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let settings_store = FileSettingsStore::new();
    let settings = cli.apply(settings_store.load());
    if cli.save {
        settings_store.save(&settings)?;
    }

    let saving = store.is_persistent();
    let store: Rc<RefCell<dyn ProgressStore>> = Rc::new(RefCell::new(store));
    let mut app = App::new(settings, store, cli.seed)?;
    app.saving = saving;
    app.letter = cli.letter.clone();
    if let Some(kind) = cli.game {
        app.start_game(kind);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );

    loop {
        terminal.draw(|f| ui::draw(app, f))?;
        match runner.step() {
            AppEvent::Tick => app.on_tick(runner.tick_interval()),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if app.on_key(key) == Flow::Quit {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn print_stats(store: &dyn ProgressStore) {
    let record = store.read();

    println!("Games played");
    for kind in GameKind::all() {
        println!("  {:<20} {}", kind.title(), record.games_played(kind.name()));
    }

    println!("\nStars per letter");
    if record.best_scores.is_empty() {
        println!("  none yet");
    }
    for (letter, stars) in &record.best_scores {
        println!("  {letter}  {}", "★".repeat(*stars as usize));
    }

    println!("\nStickers ({}/{})", record.unlocked.len(), achievements::CATALOGUE.len());
    for id in &record.unlocked {
        if let Some(a) = achievements::find(id) {
            println!("  {} {} - {}", a.emoji, a.name, a.description);
        }
    }
}
