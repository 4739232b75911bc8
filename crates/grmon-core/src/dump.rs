//! Parser for the text dump served by `/debug/pprof/goroutine?debug=2`.
//!
//! A dump is a sequence of blank-line separated blocks:
//!
//! ```text
//! goroutine 1 [chan receive, 16 minutes]:
//! main.main()
//! 	/home/user/app/main.go:109 +0xcf0
//! created by main.init
//! 	/home/user/app/init.go:12 +0x2a
//! ```
//!
//! Malformed headers and frames are skipped and reported in [`DumpReport::issues`];
//! only a failing reader aborts a parse.

use crate::model::{Frame, Snapshot, Task, LOCKED_TO_THREAD};
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::{debug, trace, warn};

pub const HEADER_PREFIX: &str = "goroutine ";
pub const CREATED_BY_PREFIX: &str = "created by ";
const FRAMES_ELIDED: &str = "...additional frames elided...";

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("failed to read dump: {0}")]
    Io(#[from] io::Error),
}

/// A recoverable problem with a single header or frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("header is shorter than the \"goroutine \" prefix")]
    HeaderTooShort,
    #[error("expected goroutine header, got {found:?}")]
    PrefixMismatch { found: String },
    #[error("could not parse goroutine id from {0:?}")]
    InvalidId(String),
    #[error("malformed state clause {0:?}")]
    MalformedState(String),
    #[error("could not parse wait minutes from {0:?}")]
    InvalidMinutes(String),
    #[error("empty location line")]
    EmptyLocation,
    #[error("location {0:?} has no file/line separator")]
    MissingLineSeparator(String),
    #[error("could not parse line number in {0:?}")]
    InvalidLine(String),
    #[error("could not parse pc offset in {0:?}")]
    InvalidOffset(String),
    #[error("call site {0:?} has no location line")]
    MissingLocation(String),
    #[error("location {0:?} has no preceding call site")]
    UnexpectedLocation(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file_path: String,
    pub line: u32,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    /// 1-based line number in the dump.
    pub line_number: usize,
    pub error: RecordError,
}

#[derive(Debug, Clone, Default)]
pub struct DumpReport {
    pub tasks: Snapshot,
    pub issues: Vec<ParseIssue>,
}

/// Parses a header such as `goroutine 268 [runnable, locked to thread]:`.
///
/// The returned task has no frames yet.
pub fn parse_header(line: &str) -> Result<Task, RecordError> {
    if line.len() < HEADER_PREFIX.len() {
        return Err(RecordError::HeaderTooShort);
    }
    let Some(rest) = line.strip_prefix(HEADER_PREFIX) else {
        return Err(RecordError::PrefixMismatch {
            found: line.chars().take(HEADER_PREFIX.len()).collect(),
        });
    };

    let (id_text, state) = rest
        .split_once(' ')
        .ok_or_else(|| RecordError::InvalidId(rest.to_string()))?;
    let id = id_text
        .parse::<u64>()
        .map_err(|_| RecordError::InvalidId(id_text.to_string()))?;

    let clause = state
        .trim_end()
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix("]:"))
        .ok_or_else(|| RecordError::MalformedState(state.to_string()))?;

    let mut segments = clause.split(',').map(str::trim);
    let status = segments.next().unwrap_or_default();
    let mut task = Task::new(id, status);
    for segment in segments {
        if segment == LOCKED_TO_THREAD {
            task.locked_to_os_thread = true;
            continue;
        }
        let amount = segment.split_once(' ').map_or(segment, |(amount, _)| amount);
        task.wait_minutes = amount
            .parse()
            .map_err(|_| RecordError::InvalidMinutes(segment.to_string()))?;
    }

    Ok(task)
}

/// Parses a location line such as `\t/usr/local/go/src/net/http/server.go:2969 +0x970`.
///
/// The rightmost `:` separates file and line, so drive-letter paths work. The
/// offset is only read when the last space comes after that separator.
pub fn parse_location(line: &str) -> Result<Location, RecordError> {
    let text = line.trim();
    if text.is_empty() {
        return Err(RecordError::EmptyLocation);
    }

    let colon = text
        .rfind(':')
        .ok_or_else(|| RecordError::MissingLineSeparator(text.to_string()))?;

    let (line_text, offset) = match text.rfind(' ') {
        Some(space) if space > colon => {
            let hex = text[space + 1..]
                .strip_prefix("+0x")
                .ok_or_else(|| RecordError::InvalidOffset(text.to_string()))?;
            let offset = u64::from_str_radix(hex, 16)
                .map_err(|_| RecordError::InvalidOffset(text.to_string()))?;
            (&text[colon + 1..space], Some(offset))
        }
        _ => (&text[colon + 1..], None),
    };

    let line = line_text
        .parse::<u32>()
        .map_err(|_| RecordError::InvalidLine(text.to_string()))?;

    Ok(Location {
        file_path: text[..colon].to_string(),
        line,
        offset,
    })
}

/// Reads a whole dump. Fails only when the reader does.
pub fn parse_dump<R: BufRead>(reader: R) -> Result<DumpReport, DumpError> {
    let mut scanner = DumpScanner::new();
    for line in reader.lines() {
        scanner.feed(&line?);
    }
    Ok(scanner.finish())
}

pub fn parse_dump_str(text: &str) -> DumpReport {
    let mut scanner = DumpScanner::new();
    for line in text.lines() {
        scanner.feed(line);
    }
    scanner.finish()
}

#[derive(Debug)]
enum CallSite {
    Stack(String),
    CreatedBy(String),
}

impl CallSite {
    fn from_line(line: &str) -> Self {
        match line.strip_prefix(CREATED_BY_PREFIX) {
            Some(signature) => CallSite::CreatedBy(signature.to_string()),
            None => CallSite::Stack(line.to_string()),
        }
    }

    fn into_signature(self) -> String {
        match self {
            CallSite::Stack(signature) | CallSite::CreatedBy(signature) => signature,
        }
    }
}

#[derive(Debug, Default)]
enum ScanState {
    #[default]
    AwaitingHeader,
    InRecord {
        task: Task,
        pending: Option<CallSite>,
    },
}

/// Line-at-a-time dump scanner.
#[derive(Debug, Default)]
pub struct DumpScanner {
    state: ScanState,
    line_number: usize,
    report: DumpReport,
}

impl DumpScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: &str) {
        self.line_number += 1;
        let line = line.strip_suffix('\r').unwrap_or(line);
        self.state = match std::mem::take(&mut self.state) {
            ScanState::AwaitingHeader => self.scan_header(line),
            ScanState::InRecord { task, pending } => self.scan_body(line, task, pending),
        };
    }

    pub fn finish(mut self) -> DumpReport {
        if let ScanState::InRecord { task, pending } = std::mem::take(&mut self.state) {
            self.close_record(task, pending);
        }
        debug!(
            tasks = self.report.tasks.len(),
            issues = self.report.issues.len(),
            "dump parsed"
        );
        self.report
    }

    fn scan_header(&mut self, line: &str) -> ScanState {
        if line.trim().is_empty() {
            return ScanState::AwaitingHeader;
        }
        // "goroutine" without the trailing space is still a broken header worth reporting.
        if !line.starts_with(HEADER_PREFIX.trim_end()) {
            trace!(line = self.line_number, "ignoring text outside of a goroutine block");
            return ScanState::AwaitingHeader;
        }
        match parse_header(line) {
            Ok(task) => ScanState::InRecord {
                task,
                pending: None,
            },
            Err(err) => {
                self.push_issue(err);
                ScanState::AwaitingHeader
            }
        }
    }

    fn scan_body(&mut self, line: &str, mut task: Task, pending: Option<CallSite>) -> ScanState {
        if line.trim().is_empty() {
            self.close_record(task, pending);
            return ScanState::AwaitingHeader;
        }

        if line.starts_with([' ', '\t']) {
            let Some(call) = pending else {
                self.push_issue(RecordError::UnexpectedLocation(line.trim().to_string()));
                return ScanState::InRecord {
                    task,
                    pending: None,
                };
            };
            match parse_location(line) {
                Ok(location) => attach_frame(&mut task, call, location),
                Err(err) => self.push_issue(err),
            }
            return ScanState::InRecord {
                task,
                pending: None,
            };
        }

        if line.starts_with(HEADER_PREFIX) {
            if let Ok(next) = parse_header(line) {
                self.close_record(task, pending);
                return ScanState::InRecord {
                    task: next,
                    pending: None,
                };
            }
        }

        if let Some(call) = pending {
            self.push_issue(RecordError::MissingLocation(call.into_signature()));
        }
        if line == FRAMES_ELIDED {
            return ScanState::InRecord {
                task,
                pending: None,
            };
        }
        ScanState::InRecord {
            task,
            pending: Some(CallSite::from_line(line)),
        }
    }

    fn close_record(&mut self, task: Task, pending: Option<CallSite>) {
        if let Some(call) = pending {
            self.push_issue(RecordError::MissingLocation(call.into_signature()));
        }
        self.report.tasks.push(task);
    }

    fn push_issue(&mut self, error: RecordError) {
        warn!(line = self.line_number, "skipping malformed dump line: {error}");
        self.report.issues.push(ParseIssue {
            line_number: self.line_number,
            error,
        });
    }
}

fn attach_frame(task: &mut Task, call: CallSite, location: Location) {
    let frame = |function_signature: String| Frame {
        function_signature,
        file_path: location.file_path,
        line: location.line,
        offset: location.offset,
    };
    match call {
        CallSite::Stack(signature) => task.stack_frames.push(frame(signature)),
        CallSite::CreatedBy(signature) => task.created_by = Some(frame(signature)),
    }
}
