use crate::model::Task;
use std::collections::{BTreeMap, HashMap, HashSet};

const DEFAULT_ABBREVIATIONS: [(&str, &str); 18] = [
    ("running", "run"),
    ("runnable", "rbl"),
    ("waiting", "wai"),
    ("IO wait", "IO"),
    ("chan receive", "cha"),
    ("chan send", "ch1"),
    ("select", "sel"),
    ("sync.Mutex.Lock", "syn"),
    ("sync.Cond.Wait", "syw"),
    ("syscall", "sys"),
    ("sleep", "slp"),
    ("idle", "idl"),
    ("dead", "ded"),
    ("copystack", "cps"),
    ("preempted", "pre"),
    ("GC assist wait", "gca"),
    ("GC sweep wait", "gcs"),
    ("GC scavenge wait", "gcv"),
];

/// Canonical short labels for well-known goroutine states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLabels {
    labels: HashMap<String, String>,
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            labels: DEFAULT_ABBREVIATIONS
                .iter()
                .map(|(status, label)| (status.to_string(), label.to_string()))
                .collect(),
        }
    }
}

impl StatusLabels {
    pub fn empty() -> Self {
        Self {
            labels: HashMap::new(),
        }
    }

    pub fn with_label(mut self, status: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(status.into(), label.into());
        self
    }

    pub fn get(&self, status: &str) -> Option<&str> {
        self.labels.get(status).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramEntry {
    pub status: String,
    pub count: u64,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    entries: Vec<HistogramEntry>,
}

impl Histogram {
    /// Counts tasks per status. Entries come out in byte-wise status order, which
    /// also fixes the order in which label collisions are resolved.
    pub fn compute(tasks: &[Task], labels: &StatusLabels) -> Self {
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for task in tasks {
            *counts.entry(task.status.as_str()).or_default() += 1;
        }

        let mut used = HashSet::new();
        let entries = counts
            .into_iter()
            .map(|(status, count)| {
                let label = assign_label(status, labels, &mut used);
                HistogramEntry {
                    status: status.to_string(),
                    count,
                    label,
                }
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[HistogramEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bars(&self) -> Vec<(&str, u64)> {
        self.entries
            .iter()
            .map(|entry| (entry.label.as_str(), entry.count))
            .collect()
    }

    pub fn legend(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("{}: {} ({})", entry.label, entry.status, entry.count))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn assign_label(status: &str, labels: &StatusLabels, used: &mut HashSet<String>) -> String {
    let candidate = labels
        .get(status)
        .map(str::to_string)
        .unwrap_or_else(|| status.chars().take(3).collect());

    let mut label = candidate.clone();
    if used.contains(&label) {
        let stem: String = candidate.chars().take(2).collect();
        let mut suffix = 2u32;
        loop {
            label = format!("{stem}{suffix}");
            if !used.contains(&label) {
                break;
            }
            suffix += 1;
        }
    }
    used.insert(label.clone());
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks(statuses: &[&str]) -> Vec<Task> {
        statuses
            .iter()
            .enumerate()
            .map(|(idx, status)| Task::new(idx as u64, *status))
            .collect()
    }

    fn labels_of(histogram: &Histogram) -> Vec<&str> {
        histogram
            .entries()
            .iter()
            .map(|entry| entry.label.as_str())
            .collect()
    }

    #[test]
    fn counts_and_sorts_statuses() {
        let histogram = Histogram::compute(
            &tasks(&["select", "running", "select", "IO wait", "chan receive"]),
            &StatusLabels::default(),
        );
        let summary: Vec<(&str, u64, &str)> = histogram
            .entries()
            .iter()
            .map(|entry| (entry.status.as_str(), entry.count, entry.label.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("IO wait", 1, "IO"),
                ("chan receive", 1, "cha"),
                ("running", 1, "run"),
                ("select", 2, "sel"),
            ]
        );
    }

    #[test]
    fn legend_lists_label_status_and_count() {
        let histogram = Histogram::compute(
            &tasks(&["select", "running", "select"]),
            &StatusLabels::default(),
        );
        assert_eq!(histogram.legend(), "run: running (1)\nsel: select (2)");
        assert_eq!(histogram.bars(), vec![("run", 1), ("sel", 2)]);
    }

    #[test]
    fn unknown_statuses_use_prefix_and_resolve_collisions() {
        let histogram = Histogram::compute(
            &tasks(&["semacquire", "select", "sem", "selectnb", "se"]),
            &StatusLabels::default(),
        );
        // Sorted: se, select, selectnb, sem, semacquire
        assert_eq!(labels_of(&histogram), vec!["se", "sel", "se2", "sem", "se3"]);
    }

    #[test]
    fn three_statuses_sharing_a_prefix_get_distinct_labels() {
        let histogram = Histogram::compute(
            &tasks(&["waitA", "waitB", "waitC", "waiting"]),
            &StatusLabels::empty(),
        );
        assert_eq!(labels_of(&histogram), vec!["wai", "wa2", "wa3", "wa4"]);
    }

    #[test]
    fn labels_stay_distinct_when_table_entries_collide() {
        let histogram = Histogram::compute(
            &tasks(&["chan receive", "chan send", "chalk", "ch2", "ch1x"]),
            &StatusLabels::default(),
        );
        let labels = labels_of(&histogram);
        let unique: HashSet<&str> = labels.iter().copied().collect();
        assert_eq!(unique.len(), labels.len(), "{labels:?}");
    }

    #[test]
    fn short_and_multibyte_statuses() {
        let histogram = Histogram::compute(&tasks(&["a", "ünïcode"]), &StatusLabels::empty());
        assert_eq!(labels_of(&histogram), vec!["a", "ünï"]);
    }

    #[test]
    fn custom_labels_override_defaults() {
        let labels = StatusLabels::default().with_label("select", "SL");
        let histogram = Histogram::compute(&tasks(&["select"]), &labels);
        assert_eq!(labels_of(&histogram), vec!["SL"]);
    }

    #[test]
    fn empty_snapshot_has_empty_histogram() {
        let histogram = Histogram::compute(&[], &StatusLabels::default());
        assert!(histogram.is_empty());
        assert_eq!(histogram.legend(), "");
    }
}
