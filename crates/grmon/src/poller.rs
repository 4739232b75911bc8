use crate::config::Config;
use grmon_core::{parse_dump, DumpError, DumpReport, Snapshot};
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PollError {
    #[error("failed to list goroutines: {0}")]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Parse(#[from] DumpError),
}

#[derive(Debug)]
pub enum PollEvent {
    Snapshot(Snapshot),
    /// The poller has stopped; the dashboard should exit with this message.
    Failed(String),
}

pub struct Poller {
    client: reqwest::Client,
    url: String,
    interval: Duration,
}

impl Poller {
    pub fn new(config: &Config) -> Result<Self, PollError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            interval: config.interval,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch_once(&self) -> Result<DumpReport, PollError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let report = parse_dump(Cursor::new(body))?;
        if !report.issues.is_empty() {
            debug!(issues = report.issues.len(), "dump contained malformed lines");
        }
        Ok(report)
    }

    /// Polls until a request fails or the receiver goes away.
    pub async fn run(self, tx: mpsc::Sender<PollEvent>) {
        info!("attach to server {}", self.url);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let event = match self.fetch_once().await {
                Ok(report) => PollEvent::Snapshot(report.tasks),
                Err(PollError::Parse(err)) => {
                    warn!("error while parsing dump: {err}");
                    continue;
                }
                Err(err) => {
                    let _ = tx.send(PollEvent::Failed(err.to_string())).await;
                    return;
                }
            };
            if tx.send(event).await.is_err() {
                debug!("dashboard closed, stopping poller");
                return;
            }
        }
    }
}
