mod config;
mod poller;
mod state;
mod theme;
mod ui;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use config::{Args, Config};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use grmon_core::Task;
use poller::{PollEvent, Poller};
use ratatui::{backend::CrosstermBackend, Terminal};
use serde::Serialize;
use std::{fs::OpenOptions, io, path::Path, sync::Mutex};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

#[derive(Serialize)]
struct OnceOutput<'a> {
    url: &'a str,
    fetched_at: DateTime<Local>,
    task_count: usize,
    issue_count: usize,
    tasks: &'a [Task],
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_args(Args::parse())?;
    init_logging(config.debug_log.as_deref())?;
    info!("start grmon ({})", env!("CARGO_PKG_VERSION"));

    let poller = Poller::new(&config)?;
    if config.once {
        return print_once(&poller).await;
    }

    let (tx, rx) = mpsc::channel(1);
    let mut app = state::App::new(config.engine_config(), poller.url());
    let poll_task = tokio::spawn(poller.run(tx));

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app, rx).await;
    restore_terminal(&mut terminal)?;
    poll_task.abort();
    result?;

    if let Some(failure) = &app.failure {
        warn!("stopped: {failure}");
        eprintln!("{failure}");
        std::process::exit(1);
    }
    info!("stopped");
    Ok(())
}

async fn print_once(poller: &Poller) -> Result<()> {
    let report = poller
        .fetch_once()
        .await
        .with_context(|| format!("fetch {}", poller.url()))?;
    let output = OnceOutput {
        url: poller.url(),
        fetched_at: Local::now(),
        task_count: report.tasks.len(),
        issue_count: report.issues.len(),
        tasks: &report.tasks,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_app(
    terminal: &mut Term,
    app: &mut state::App,
    mut rx: mpsc::Receiver<PollEvent>,
) -> Result<()> {
    let mut events = EventStream::new();
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        tokio::select! {
            polled = rx.recv() => match polled {
                Some(event) => app.on_poll_event(event),
                None => break,
            },
            input = events.next() => match input {
                Some(Ok(Event::Key(key)))
                    if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) =>
                {
                    app.handle_key(key)
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
                None => break,
            },
        }

        if app.should_quit() {
            break;
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Logs go to `path` when given; otherwise they are discarded so the
/// dashboard owns the terminal.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
    Ok(())
}
