//! leakscope CLI — binary entry point.
//!
//! `leakscope <file.c>` runs the full pipeline once: spawn the analyzer,
//! group its diagnostics, enrich each group, and stream `LOADING`/`FINAL`
//! frames to stdout for the hosting editor to consume. stdout is the frame
//! transport, so logs go to a file (or nowhere), never to the output
//! stream.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use leakscope_engine::{BufferId, Pipeline, Polled, config};
use leakscope_enrich::{EnrichOptions, LlmEnricher, retry::RetryConfig};
use leakscope_stream::FrameWriter;
use leakscope_types::StreamFrame;

/// Cadence of the event-drain loop while a run is in flight.
const POLL_INTERVAL_MS: u64 = 25;
const POLL_BUDGET: usize = 32;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(file) = open_log_file() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();
        return;
    }

    // If we can't open a log file, prefer "no logs" over corrupting the
    // frame stream on stdout.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::data_local_dir()?.join("leakscope");
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("leakscope.log"))
        .ok()
}

/// Manual argument handling: exactly one positional, the file to analyze.
fn parse_args(mut args: impl Iterator<Item = String>) -> Option<PathBuf> {
    let file = args.next()?;
    if args.next().is_some() || file == "-h" || file == "--help" {
        return None;
    }
    Some(PathBuf::from(file))
}

fn build_enricher(enrichment: &config::EnrichmentConfig) -> Result<LlmEnricher> {
    let api_key = std::env::var(&enrichment.api_key_env).with_context(|| {
        format!(
            "environment variable {} is not set; the enrichment service needs an API key",
            enrichment.api_key_env
        )
    })?;

    let mut options =
        EnrichOptions::new(api_key).with_timeout(Duration::from_secs(enrichment.timeout_secs));
    if let Some(api_url) = &enrichment.api_url {
        options = options.with_api_url(api_url.clone());
    }
    if let Some(model) = &enrichment.model {
        options = options.with_model(model.clone());
    }

    let retry = RetryConfig {
        max_retries: enrichment.max_retries,
        ..RetryConfig::default()
    };

    LlmEnricher::new(options, retry).context("building HTTP client")
}

async fn run(file: PathBuf) -> Result<()> {
    let config = match config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("ignoring unusable config: {e:#}");
            config::Config::default()
        }
    };

    let enricher = build_enricher(&config.enrichment)?;
    let mut pipeline = Pipeline::new(config, enricher);
    let buffer = BufferId::new(0);
    pipeline.start_run(buffer, file);

    let mut writer = FrameWriter::new(tokio::io::stdout());
    loop {
        let mut finished = false;
        for polled in pipeline.poll_events(POLL_BUDGET) {
            match polled {
                Polled::Frame { frame, .. } => {
                    let is_final = matches!(frame, StreamFrame::Final(_));
                    writer
                        .write_frame(&frame)
                        .await
                        .context("writing frame to stdout")?;
                    finished = finished || is_final;
                }
                Polled::Failed { error, .. } => {
                    bail!("analyzer run failed: {error}");
                }
                Polled::Stale { .. } => {}
            }
        }
        if finished {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
}

fn main() -> ExitCode {
    init_tracing();

    let Some(file) = parse_args(std::env::args().skip(1)) else {
        eprintln!("usage: leakscope <file.c>");
        return ExitCode::from(2);
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("leakscope: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(file)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("leakscope: {e:#}");
            ExitCode::FAILURE
        }
    }
}
