use anyhow::{bail, Result};
use clap::Parser;
use grmon_core::{EngineConfig, StatusLabels};
use std::{path::PathBuf, time::Duration};

const MIN_INTERVAL_MS: u64 = 100;

#[derive(Parser, Debug)]
#[command(name = "grmon", version, about = "Live terminal view of a Go program's goroutines")]
pub struct Args {
    /// The pprof server IP or hostname
    #[arg(long, env = "GRMON_HOST", default_value = "localhost")]
    pub host: String,
    /// The pprof server port
    #[arg(long, env = "GRMON_PORT", default_value_t = 6060)]
    pub port: u16,
    #[arg(long, env = "GRMON_INTERVAL_MS", default_value_t = 1000)]
    pub interval_ms: u64,
    #[arg(long, env = "GRMON_TIMEOUT_MS", default_value_t = 5000)]
    pub timeout_ms: u64,
    /// Number of task-count samples kept for the history chart
    #[arg(long, env = "GRMON_HISTORY", default_value_t = 100)]
    pub history: usize,
    /// Append logs to this file
    #[arg(long, env = "GRMON_DEBUG")]
    pub debug: Option<PathBuf>,
    /// Override a status abbreviation, e.g. --label "chan receive=rcv"
    #[arg(long = "label", value_name = "STATUS=ABBR")]
    pub labels: Vec<String>,
    /// Fetch a single dump, print it as JSON and exit
    #[arg(long, default_value_t = false)]
    pub once: bool,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub url: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub history_capacity: usize,
    pub labels: StatusLabels,
    pub debug_log: Option<PathBuf>,
    pub once: bool,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self> {
        let mut labels = StatusLabels::default();
        for raw in &args.labels {
            let (status, label) = parse_label(raw)?;
            labels = labels.with_label(status, label);
        }

        Ok(Self {
            url: dump_url(&args.host, args.port),
            interval: Duration::from_millis(args.interval_ms.max(MIN_INTERVAL_MS)),
            timeout: Duration::from_millis(args.timeout_ms),
            history_capacity: args.history.max(1),
            labels,
            debug_log: args.debug,
            once: args.once,
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            history_capacity: self.history_capacity,
            labels: self.labels.clone(),
        }
    }
}

pub fn dump_url(host: &str, port: u16) -> String {
    format!("http://{host}:{port}/debug/pprof/goroutine?debug=2")
}

fn parse_label(raw: &str) -> Result<(&str, &str)> {
    let Some((status, label)) = raw.split_once('=') else {
        bail!("invalid --label {raw:?}: expected STATUS=ABBR");
    };
    let (status, label) = (status.trim(), label.trim());
    if status.is_empty() || label.is_empty() {
        bail!("invalid --label {raw:?}: status and abbreviation must not be empty");
    }
    Ok((status, label))
}
