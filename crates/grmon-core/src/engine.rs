use crate::filter::filter_indices;
use crate::histogram::{Histogram, StatusLabels};
use crate::history::{History, DEFAULT_HISTORY_CAPACITY};
use crate::model::{Snapshot, Task};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub history_capacity: usize,
    pub labels: StatusLabels,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            labels: StatusLabels::default(),
        }
    }
}

/// Holds the latest snapshot and the views derived from it.
///
/// Every mutation recomputes what it affects: a new snapshot refreshes the
/// histogram, history and filtered rows; a filter edit refreshes the rows.
/// The selection is an index into the filtered rows and is clamped after each
/// change.
#[derive(Debug, Clone)]
pub struct Engine {
    labels: StatusLabels,
    snapshot: Option<Snapshot>,
    filter: String,
    filtered: Vec<usize>,
    selection: Option<usize>,
    histogram: Histogram,
    history: History,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            labels: config.labels,
            snapshot: None,
            filter: String::new(),
            filtered: Vec::new(),
            selection: None,
            histogram: Histogram::default(),
            history: History::new(config.history_capacity),
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.history.push(snapshot.len() as u64);
        self.histogram = Histogram::compute(&snapshot, &self.labels);
        self.snapshot = Some(snapshot);
        self.refilter();
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn snapshot(&self) -> &[Task] {
        self.snapshot.as_deref().unwrap_or_default()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
        self.refilter();
    }

    pub fn push_filter_char(&mut self, ch: char) {
        self.filter.push(ch);
        self.refilter();
    }

    pub fn pop_filter_char(&mut self) {
        if self.filter.pop().is_some() {
            self.refilter();
        }
    }

    pub fn clear_filter(&mut self) {
        if !self.filter.is_empty() {
            self.filter.clear();
            self.refilter();
        }
    }

    /// Filtered tasks in snapshot order.
    pub fn filtered(&self) -> impl Iterator<Item = &Task> + '_ {
        let tasks = self.snapshot();
        self.filtered.iter().map(move |idx| &tasks[*idx])
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let row = self.selection?;
        let idx = *self.filtered.get(row)?;
        self.snapshot().get(idx)
    }

    pub fn select(&mut self, row: usize) {
        self.selection = Some(row);
        self.clamp_selection();
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            self.selection = None;
            return;
        }
        let last = self.filtered.len() - 1;
        let current = self.selection.unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(last);
        self.selection = Some(next);
    }

    pub fn select_first(&mut self) {
        self.select(0);
    }

    pub fn select_last(&mut self) {
        self.select(usize::MAX);
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    fn refilter(&mut self) {
        self.filtered = filter_indices(self.snapshot(), &self.filter);
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        if self.filtered.is_empty() {
            self.selection = None;
            return;
        }
        let last = self.filtered.len() - 1;
        self.selection = Some(self.selection.map_or(0, |row| row.min(last)));
    }
}
