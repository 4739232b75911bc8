use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistoryStats {
    pub min: u64,
    pub avg: f64,
    pub max: u64,
}

/// Bounded task-count history with running stats.
///
/// `avg` halves towards each new sample instead of tracking the arithmetic
/// mean, so recent snapshots dominate.
#[derive(Debug, Clone)]
pub struct History {
    samples: VecDeque<u64>,
    capacity: usize,
    min: Option<u64>,
    max: u64,
    avg: Option<f64>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            min: None,
            max: 0,
            avg: None,
        }
    }

    pub fn push(&mut self, count: u64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(count);

        self.min = Some(self.min.map_or(count, |min| min.min(count)));
        self.max = self.max.max(count);
        let sample = count as f64;
        self.avg = Some(self.avg.map_or(sample, |avg| (avg + sample) / 2.0));
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Oldest sample first.
    pub fn samples(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.iter().copied()
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            min: self.min.unwrap_or(0),
            avg: self.avg.unwrap_or(0.0),
            max: self.max,
        }
    }
}
