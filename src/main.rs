use anyhow::{Context, Result};
use bandlog::*;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Roll bandwidth log samples up into per-address, per-site and per-group reports.
#[derive(Debug, Parser)]
#[command(name = "bandlog", version)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short = 'f', long = "config", env = "CONFIG_FILE", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // Enum values (kind / projection / dialect) are checked here, before any ingestion.
    let app_config = config::AppConfig::load(&cli.config)?;

    let default_level = if app_config.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let report_cfg = &app_config.report;
    let rule = source::WatchRule::from_config(&app_config.source)?;
    let store = Arc::new(store::SeriesStore::new());

    tracing::info!(path = %rule.path.display(), "waiting for ingestion to complete");
    let (ingestor, _) = source::spawn(rule, ingest::Ingestor::new(store.clone()))
        .await
        .context("log source task panicked")??;
    let stats = ingestor.stats();
    tracing::info!(
        lines = stats.lines,
        lines_without_tuples = stats.lines_without_tuples,
        samples = stats.samples,
        skipped_tuples = stats.skipped_tuples,
        addresses = store.len(),
        "ingestion complete"
    );

    let directory = if report_cfg.kind.needs_sites() || report_cfg.kind.needs_groups() {
        let client = directory::DirectoryClient::new(&app_config.directory)?;
        directory::DirectorySnapshot::fetch(&client, report_cfg.kind).await?
    } else {
        directory::DirectorySnapshot::default()
    };

    let sink = sink::Sink::from_output_file(report_cfg.output_file());
    let mut out = sink.open()?;
    let reporter = report::Reporter::new(&store, report_cfg.dialect, report_cfg.projection);
    reporter.write(report_cfg.kind, &directory, &mut out)?;
    tracing::info!(kind = %report_cfg.kind, sink = %sink, "report written");

    Ok(())
}
