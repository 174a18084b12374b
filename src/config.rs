use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::render::{Dialect, Projection};
use crate::report::ReportKind;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Turns the default log filter up to `debug` (RUST_LOG still wins when set).
    #[serde(default)]
    pub debug: bool,
    pub source: SourceConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub path: String,
    /// Regex a line must match to be handed to ingestion.
    pub pattern: String,
    /// Regex locating the timestamp text: the `time` named group, else group 1, else the whole match.
    pub time_regex: String,
    #[serde(default = "default_time_format")]
    pub time_format: String,
    /// Keep tailing after EOF until the file stays idle for `idle_timeout_secs`.
    #[serde(default)]
    pub follow: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_time_format() -> String {
    "%Y/%m/%d %H:%M:%S".into()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_idle_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_sites_path")]
    pub sites_path: String,
    #[serde(default = "default_groups_path")]
    pub groups_path: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout_secs(),
            sites_path: default_sites_path(),
            groups_path: default_groups_path(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_sites_path() -> String {
    "/api/v2/admin/idcs".into()
}

fn default_groups_path() -> String {
    "/api/v2/admin/groups/ips".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub kind: ReportKind,
    pub projection: Projection,
    pub dialect: Dialect,
    /// Absent or empty means console.
    #[serde(default)]
    pub output_file: Option<String>,
}

impl ReportConfig {
    pub fn output_file(&self) -> Option<&str> {
        self.output_file.as_deref().filter(|p| !p.is_empty())
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.source.path.is_empty(), "source.path must be non-empty");
        regex::Regex::new(&self.source.pattern)
            .with_context(|| format!("source.pattern is not a valid regex: {}", self.source.pattern))?;
        regex::Regex::new(&self.source.time_regex).with_context(|| {
            format!(
                "source.time_regex is not a valid regex: {}",
                self.source.time_regex
            )
        })?;
        anyhow::ensure!(
            !self.source.time_format.is_empty(),
            "source.time_format must be non-empty"
        );
        anyhow::ensure!(
            self.source.poll_interval_ms > 0,
            "source.poll_interval_ms must be > 0, got {}",
            self.source.poll_interval_ms
        );
        anyhow::ensure!(
            self.source.idle_timeout_secs > 0,
            "source.idle_timeout_secs must be > 0, got {}",
            self.source.idle_timeout_secs
        );
        anyhow::ensure!(
            self.directory.timeout_secs > 0,
            "directory.timeout_secs must be > 0, got {}",
            self.directory.timeout_secs
        );
        if self.report.kind.needs_sites() || self.report.kind.needs_groups() {
            anyhow::ensure!(
                !self.directory.base_url.is_empty(),
                "directory.base_url must be non-empty for report kind {}",
                self.report.kind
            );
        }
        Ok(())
    }
}
