// Log source: reads a log file line by line, keeps the lines matching the rule's pattern,
// pulls the timestamp out of each and hands (timestamp, line) to a LineHandler.
// Runs as one tokio task; awaiting its JoinHandle is the "ingestion complete" signal.

use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDateTime;
use regex::Regex;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::config::SourceConfig;
use crate::models::{Sample, Timestamp};

/// Per-line callback. Takes `&mut self`: the source never calls it concurrently.
pub trait LineHandler: Send + 'static {
    fn on_line(&mut self, timestamp: Timestamp, line: &str);
}

/// What to read and how to recognise a line worth ingesting.
#[derive(Debug, Clone)]
pub struct WatchRule {
    pub path: PathBuf,
    pub pattern: Regex,
    pub time_regex: Regex,
    pub time_format: String,
    pub follow: bool,
    pub poll_interval: Duration,
    pub idle_timeout: Duration,
}

/// Line counters for one source run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SourceStats {
    pub lines_read: u64,
    pub lines_matched: u64,
    /// Matched lines dropped because no timestamp could be parsed.
    pub lines_without_time: u64,
}

impl WatchRule {
    pub fn from_config(config: &SourceConfig) -> anyhow::Result<Self> {
        Ok(Self {
            path: PathBuf::from(&config.path),
            pattern: Regex::new(&config.pattern).context("source.pattern")?,
            time_regex: Regex::new(&config.time_regex).context("source.time_regex")?,
            time_format: config.time_format.clone(),
            follow: config.follow,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
        })
    }

    /// Timestamp text is the `time` group if present, else group 1, else the whole match.
    pub fn extract_timestamp(&self, line: &str) -> Option<Timestamp> {
        let caps = self.time_regex.captures(line)?;
        let text = caps
            .name("time")
            .or_else(|| caps.get(1))
            .or_else(|| caps.get(0))?
            .as_str();
        NaiveDateTime::parse_from_str(text, &self.time_format)
            .ok()
            .map(Sample::truncate_timestamp)
    }

    fn dispatch<H: LineHandler>(&self, raw: &[u8], handler: &mut H, stats: &mut SourceStats) {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches(['\r', '\n']);
        stats.lines_read += 1;
        if !self.pattern.is_match(line) {
            return;
        }
        stats.lines_matched += 1;
        match self.extract_timestamp(line) {
            Some(ts) => handler.on_line(ts, line),
            None => {
                stats.lines_without_time += 1;
                debug!(line, "matched line has no parseable timestamp");
            }
        }
    }
}

/// Spawns the reader task. The task hands the handler back when it finishes so the caller can
/// read whatever the handler accumulated.
pub fn spawn<H: LineHandler>(
    rule: WatchRule,
    handler: H,
) -> tokio::task::JoinHandle<anyhow::Result<(H, SourceStats)>> {
    tokio::spawn(async move { run(rule, handler).await })
}

#[instrument(skip_all, fields(path = %rule.path.display(), follow = rule.follow))]
async fn run<H: LineHandler>(
    rule: WatchRule,
    mut handler: H,
) -> anyhow::Result<(H, SourceStats)> {
    let file = File::open(&rule.path)
        .await
        .with_context(|| format!("open log {}", rule.path.display()))?;
    let mut reader = BufReader::new(file);
    let mut stats = SourceStats::default();
    let mut offset: u64 = 0;
    let mut pending: Vec<u8> = Vec::new();
    let mut last_data = Instant::now();

    loop {
        let n = reader.read_until(b'\n', &mut pending).await?;
        if n > 0 {
            offset += n as u64;
            last_data = Instant::now();
            if pending.ends_with(b"\n") {
                rule.dispatch(&pending, &mut handler, &mut stats);
                pending.clear();
            }
            continue;
        }

        // EOF
        if !rule.follow || last_data.elapsed() >= rule.idle_timeout {
            break;
        }
        let len = tokio::fs::metadata(&rule.path)
            .await
            .with_context(|| format!("stat log {}", rule.path.display()))?
            .len();
        if len < offset {
            warn!(offset, len, "log file shrank; reading from the start");
            reader.seek(SeekFrom::Start(0)).await?;
            offset = 0;
            pending.clear();
            continue;
        }
        tokio::time::sleep(rule.poll_interval).await;
    }

    // Writer is done; an unterminated last line is still a line.
    if !pending.is_empty() {
        rule.dispatch(&pending, &mut handler, &mut stats);
    }

    info!(
        lines_read = stats.lines_read,
        lines_matched = stats.lines_matched,
        lines_without_time = stats.lines_without_time,
        "log source finished"
    );
    Ok((handler, stats))
}
