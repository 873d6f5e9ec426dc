//! Console front end.
//!
//! Reads commands from stdin, renders the board as text and runs image
//! acquisition as background tasks. Completions come back over a channel
//! into the same loop that owns the session, so the session is only ever
//! touched from one place.

use crate::acquire::{AssetAcquirer, ImageAcquirer};
use crate::catalog::CatalogSource;
use crate::config::ServerConfig;
use crate::relay::ImageRelay;
use crate::render::{render_board, render_events};
use std::sync::Arc;
use tileswap_engine::{
    AcquisitionError, FisherYates, GridShape, LifecycleError, LoadOutcome, LoadRequest,
    LoadTicket, Phase, PuzzleSession, Raster, TapOutcome,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};
use url::Url;

/// Result of one image acquisition, tagged with its load ticket.
pub type Completion = (LoadTicket, Result<Raster, AcquisitionError>);

/// Command help shown on start and on `help`.
pub const HELP: &str = "\
Commands:
  <n>          tap slot n (1-based, row by row)
  at <x> <y>   tap canvas coordinates
  shuffle      reshuffle the current level
  solve        reveal the solution
  next         go to the next level (once solved)
  grid <c> <r> rebuild the level with c columns and r rows
  level <n>    jump to level number n
  show         redraw the board
  help         show this help
  quit         exit";

/// A parsed console command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleCommand {
    /// Tap a slot (0-based).
    Tap(usize),
    /// Tap canvas coordinates.
    TapAt(f64, f64),
    /// Reshuffle the current level.
    Shuffle,
    /// Reveal the solution.
    Solve,
    /// Advance to the next level.
    Next,
    /// Rebuild with a new grid shape.
    Grid(u32, u32),
    /// Load a level by its number.
    Level(u32),
    /// Redraw.
    Show,
    /// Print help.
    Help,
    /// Exit.
    Quit,
}

/// Unparseable console input.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum CommandError {
    /// Blank line.
    #[display("Empty command")]
    Empty,
    /// First word is not a command.
    #[display("Unknown command '{}' (type 'help')", _0)]
    Unknown(String),
    /// Known command, bad arguments.
    #[display("Usage: {}", _0)]
    Usage(&'static str),
}

impl std::error::Error for CommandError {}

/// Parses one line of input.
pub fn parse_command(line: &str) -> Result<ConsoleCommand, CommandError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = words.split_first() else {
        return Err(CommandError::Empty);
    };

    if let Ok(number) = head.parse::<usize>() {
        return match (number, args) {
            (number, []) if number >= 1 => Ok(ConsoleCommand::Tap(number - 1)),
            _ => Err(CommandError::Usage("<slot>, counting from 1")),
        };
    }

    match (head.to_ascii_lowercase().as_str(), args) {
        ("at", [x, y]) => match (x.parse::<f64>(), y.parse::<f64>()) {
            (Ok(x), Ok(y)) => Ok(ConsoleCommand::TapAt(x, y)),
            _ => Err(CommandError::Usage("at <x> <y>")),
        },
        ("at", _) => Err(CommandError::Usage("at <x> <y>")),
        ("grid", [columns, rows]) => match (columns.parse::<u32>(), rows.parse::<u32>()) {
            (Ok(columns), Ok(rows)) if columns > 0 && rows > 0 => {
                Ok(ConsoleCommand::Grid(columns, rows))
            }
            _ => Err(CommandError::Usage("grid <columns> <rows>")),
        },
        ("grid", _) => Err(CommandError::Usage("grid <columns> <rows>")),
        ("level", [number]) => number
            .parse::<u32>()
            .map(ConsoleCommand::Level)
            .map_err(|_| CommandError::Usage("level <number>")),
        ("level", _) => Err(CommandError::Usage("level <number>")),
        ("shuffle", []) => Ok(ConsoleCommand::Shuffle),
        ("solve", []) => Ok(ConsoleCommand::Solve),
        ("next", []) => Ok(ConsoleCommand::Next),
        ("show", []) => Ok(ConsoleCommand::Show),
        ("help" | "?", []) => Ok(ConsoleCommand::Help),
        ("quit" | "exit" | "q", []) => Ok(ConsoleCommand::Quit),
        (other, _) => Err(CommandError::Unknown(other.to_string())),
    }
}

/// What the loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Redraw the board.
    Render,
    /// Print a line.
    Message(String),
    /// Exit the loop.
    Quit,
}

/// Session plus the machinery that feeds it images.
pub struct Console {
    session: PuzzleSession,
    acquirer: Arc<dyn ImageAcquirer>,
    completions: mpsc::UnboundedSender<Completion>,
    in_flight: Option<JoinHandle<()>>,
}

impl Console {
    /// Creates a console and the receiver its completions arrive on.
    pub fn new(
        session: PuzzleSession,
        acquirer: Arc<dyn ImageAcquirer>,
    ) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (completions, receiver) = mpsc::unbounded_channel();
        let console = Self {
            session,
            acquirer,
            completions,
            in_flight: None,
        };
        (console, receiver)
    }

    /// The session being played.
    pub fn session(&self) -> &PuzzleSession {
        &self.session
    }

    /// Requests the first level.
    pub fn start(&mut self) -> Result<(), LifecycleError> {
        let request = self.session.start()?;
        self.dispatch(request);
        Ok(())
    }

    /// Spawns the acquisition for `request`, aborting any superseded one.
    fn dispatch(&mut self, request: Option<LoadRequest>) {
        if let Some(previous) = self.in_flight.take() {
            if !previous.is_finished() {
                debug!("Aborting superseded image load");
            }
            previous.abort();
        }
        let Some(request) = request else {
            return;
        };

        let acquirer = Arc::clone(&self.acquirer);
        let completions = self.completions.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let result = acquirer.acquire(&request).await;
            if completions.send((request.ticket, result)).is_err() {
                debug!("Console closed before the image arrived");
            }
        }));
    }

    /// Hands a finished acquisition to the session.
    #[instrument(skip(self, completion), fields(ticket = ?completion.0))]
    pub fn complete(&mut self, completion: Completion) -> LoadOutcome {
        let (ticket, result) = completion;
        self.session.complete_load(ticket, result)
    }

    /// Runs one command.
    #[instrument(skip(self), fields(phase = %self.session.phase()))]
    pub fn execute(&mut self, command: ConsoleCommand) -> Result<Reply, LifecycleError> {
        let reply = match command {
            ConsoleCommand::Tap(slot) => {
                let outcome = self.session.tap(slot);
                self.describe_tap(outcome)
            }
            ConsoleCommand::TapAt(x, y) => {
                let outcome = self.session.tap_at(x, y);
                self.describe_tap(outcome)
            }
            ConsoleCommand::Shuffle => {
                self.session.reshuffle()?;
                Reply::Render
            }
            ConsoleCommand::Solve => {
                self.session.reveal_solution()?;
                Reply::Render
            }
            ConsoleCommand::Next => {
                let request = self.session.advance()?;
                self.dispatch(request);
                Reply::Render
            }
            ConsoleCommand::Grid(columns, rows) => {
                self.session.regrid(GridShape::new(columns, rows))?;
                Reply::Render
            }
            ConsoleCommand::Level(number) => {
                let request = self.session.load_level_number(number)?;
                self.dispatch(request);
                Reply::Render
            }
            ConsoleCommand::Show => Reply::Render,
            ConsoleCommand::Help => Reply::Message(HELP.to_string()),
            ConsoleCommand::Quit => Reply::Quit,
        };
        Ok(reply)
    }

    fn describe_tap(&self, outcome: TapOutcome) -> Reply {
        match outcome {
            TapOutcome::Discarded => match self.session.phase() {
                Phase::Loading => Reply::Message("Still loading...".to_string()),
                Phase::Solved => Reply::Message("Level solved. Type 'next' to continue".to_string()),
                _ => Reply::Message("Nothing to tap".to_string()),
            },
            TapOutcome::OutOfRange => Reply::Message("That is not on the board".to_string()),
            _ => Reply::Render,
        }
    }

    /// Event lines queued since the last call.
    pub fn take_event_lines(&mut self) -> Vec<String> {
        render_events(&self.session.drain_events())
    }
}

/// Drives a console from stdin until `quit` or end of input.
pub async fn run(
    mut console: Console,
    mut completions: mpsc::UnboundedReceiver<Completion>,
) -> anyhow::Result<()> {
    console.start()?;
    println!("{}\n", HELP);
    print!("{}", render_board(console.session()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(completion) = completions.recv() => {
                if console.complete(completion) != LoadOutcome::Stale {
                    for line in console.take_event_lines() {
                        println!("{}", line);
                    }
                    print!("{}", render_board(console.session()));
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line).map(|command| console.execute(command)) {
                    Err(e) => println!("{}", e),
                    Ok(Err(e)) => println!("{}", e),
                    Ok(Ok(Reply::Quit)) => break,
                    Ok(Ok(Reply::Message(message))) => println!("{}", message),
                    Ok(Ok(Reply::Render)) => print!("{}", render_board(console.session())),
                }
                for line in console.take_event_lines() {
                    println!("{}", line);
                }
            }
        }
    }

    info!("Console closed");
    Ok(())
}

/// Builds a console for `config` and plays until the player quits.
#[instrument(skip(config), fields(source = %source))]
pub async fn play(
    config: &ServerConfig,
    source: CatalogSource,
    server: Option<Url>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let relay = ImageRelay::new(config.relay().clone())?;
    let catalog = source.load(&reqwest::Client::new()).await;
    info!(levels = catalog.len(), "Catalog ready");

    let shuffler = match seed {
        Some(seed) => FisherYates::from_seed(seed),
        None => FisherYates::from_os_rng(),
    };
    let session = PuzzleSession::new(*config.engine(), catalog, shuffler);

    let acquirer: Arc<dyn ImageAcquirer> = match server {
        Some(server) => Arc::new(AssetAcquirer::from_server(server, relay)),
        None => Arc::new(AssetAcquirer::local(config.static_root().clone(), relay)),
    };

    let (console, completions) = Console::new(session, acquirer);
    run(console, completions).await
}
