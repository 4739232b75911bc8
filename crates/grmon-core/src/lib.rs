//! Goroutine dump parsing and the derived views shown by the `grmon` dashboard.

pub mod dump;
pub mod engine;
pub mod filter;
pub mod histogram;
pub mod history;
pub mod model;

pub use dump::{parse_dump, parse_dump_str, DumpError, DumpReport, ParseIssue, RecordError};
pub use engine::{Engine, EngineConfig};
pub use histogram::{Histogram, HistogramEntry, StatusLabels};
pub use history::{History, HistoryStats, DEFAULT_HISTORY_CAPACITY};
pub use model::{Frame, Snapshot, Task};
