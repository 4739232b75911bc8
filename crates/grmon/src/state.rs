use crate::poller::PollEvent;
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use grmon_core::{Engine, EngineConfig, Snapshot};
use ratatui::widgets::ListState;
use tracing::{debug, info};

const PAGE_ROWS: isize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Help,
    Paused,
}

pub struct App {
    /// Where dumps come from, shown until the first one arrives.
    pub source: String,
    pub engine: Engine,
    pub list_state: ListState,
    pub overlay: Option<Overlay>,
    /// Newest snapshot received while an overlay froze the view.
    pub held: Option<Snapshot>,
    pub last_update: Option<DateTime<Local>>,
    pub failure: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(config: EngineConfig, source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            engine: Engine::new(config),
            list_state: ListState::default(),
            overlay: None,
            held: None,
            last_update: None,
            failure: None,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn is_frozen(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn on_poll_event(&mut self, event: PollEvent) {
        match event {
            PollEvent::Snapshot(snapshot) => {
                if self.is_frozen() {
                    debug!(tasks = snapshot.len(), "holding snapshot while paused");
                    self.held = Some(snapshot);
                } else {
                    self.apply(snapshot);
                }
            }
            PollEvent::Failed(message) => {
                self.failure = Some(message);
                self.should_quit = true;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if is_quit_key(key) {
            self.should_quit = true;
            return;
        }
        if self.overlay.is_some() {
            self.dismiss_overlay();
            return;
        }

        match key.code {
            KeyCode::F(1) => self.overlay = Some(Overlay::Help),
            KeyCode::F(2) => self.overlay = Some(Overlay::Paused),
            KeyCode::Down => self.engine.move_selection(1),
            KeyCode::Up => self.engine.move_selection(-1),
            KeyCode::PageDown => self.engine.move_selection(PAGE_ROWS),
            KeyCode::PageUp => self.engine.move_selection(-PAGE_ROWS),
            KeyCode::Home => self.engine.select_first(),
            KeyCode::End => self.engine.select_last(),
            KeyCode::Backspace => self.engine.pop_filter_char(),
            KeyCode::Esc => self.engine.clear_filter(),
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.engine.push_filter_char(ch)
            }
            _ => {}
        }
    }

    pub fn list_title(&self) -> String {
        let total = self.engine.filtered_len();
        match self.engine.selection() {
            Some(row) => format!("Routines ({}/{})", row + 1, total),
            None => format!("Routines (0/{total})"),
        }
    }

    pub fn history_title(&self) -> String {
        let stats = self.engine.history().stats();
        format!(
            "History # goroutines (Min: {} Avg: {:.2} Max: {})",
            stats.min, stats.avg, stats.max
        )
    }

    fn apply(&mut self, snapshot: Snapshot) {
        let first = !self.engine.has_snapshot();
        self.engine.apply_snapshot(snapshot);
        self.last_update = Some(Local::now());
        if first {
            info!(tasks = self.engine.snapshot().len(), "first snapshot received");
        }
    }

    fn dismiss_overlay(&mut self) {
        self.overlay = None;
        if let Some(snapshot) = self.held.take() {
            self.apply(snapshot);
        }
    }
}

fn is_quit_key(key: KeyEvent) -> bool {
    match key.code {
        KeyCode::F(10) => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
