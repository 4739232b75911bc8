use serde::{Deserialize, Serialize};
use std::fmt;

/// One parsed goroutine from a `debug=2` dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub status: String,
    #[serde(default)]
    pub wait_minutes: u64,
    #[serde(default)]
    pub locked_to_os_thread: bool,
    #[serde(default)]
    pub stack_frames: Vec<Frame>,
    #[serde(default)]
    pub created_by: Option<Frame>,
}

/// Ordered records from a single dump.
pub type Snapshot = Vec<Task>;

/// A call-site/location pair. The signature is kept exactly as printed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub function_signature: String,
    pub file_path: String,
    pub line: u32,
    #[serde(default)]
    pub offset: Option<u64>,
}

pub const LOCKED_TO_THREAD: &str = "locked to thread";

impl Task {
    pub fn new(id: u64, status: impl Into<String>) -> Self {
        Self {
            id,
            status: status.into(),
            wait_minutes: 0,
            locked_to_os_thread: false,
            stack_frames: Vec::new(),
            created_by: None,
        }
    }

    /// List row shown by the dashboard.
    pub fn summary(&self) -> String {
        format!("{:05} {}", self.id, self.status)
    }
}

impl Frame {
    /// `file://<path>#<line>` with the pc offset appended when known.
    pub fn location(&self) -> String {
        match self.offset {
            Some(offset) => format!("file://{}#{} +0x{:x}", self.file_path, self.line, offset),
            None => format!("file://{}#{}", self.file_path, self.line),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n   {}", self.function_signature, self.location())
    }
}
