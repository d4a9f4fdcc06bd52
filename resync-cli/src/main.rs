mod config;
mod progress_bar;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use resync::{
    Endpoint, FollowMode, Formatter, ProgressChannel, Schema, SyncEngine, SyncOptions,
};
use resync_core::ClientConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::config::{FileConfig, Overrides};
use crate::progress_bar::SyncProgress;

#[derive(Parser, Debug)]
#[command(name = "resource-sync", version)]
#[command(about = "Copy hypermedia-linked resources from origins to a destination")]
struct Cli {
    /// Origins followed by the destination: http(s) URLs, .yaml files or `-`
    #[arg(value_name = "ENDPOINT", num_args = 2.., required = true)]
    endpoints: Vec<String>,

    /// Write JSON documents
    #[arg(short, long, conflicts_with = "yaml")]
    json: bool,

    /// Write YAML documents
    #[arg(short, long)]
    yaml: bool,

    /// Read HAL documents (default)
    #[arg(long, conflicts_with = "simple")]
    hal: bool,

    /// Read documents carrying `uri`, `type`, `parents` and `links` fields
    #[arg(long)]
    simple: bool,

    /// Links to follow: none, page, child or all
    #[arg(long, value_name = "MODE")]
    follow: Option<FollowMode>,

    /// Replace an existing destination file
    #[arg(long)]
    rm: bool,

    /// Maximum resources per write request
    #[arg(long, value_name = "N")]
    batch_size: Option<usize>,

    /// Attempts per request before giving up
    #[arg(long, value_name = "N")]
    max_attempts: Option<u32>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset, e.g. `debug` or `resync=trace`
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let schema = if self.simple {
            Some(Schema::Simple)
        } else if self.hal {
            Some(Schema::Hal)
        } else {
            None
        };
        let formatter = if self.json {
            Some(Formatter::Json)
        } else if self.yaml {
            Some(Formatter::Yaml)
        } else {
            None
        };

        Overrides {
            schema,
            follow: self.follow,
            formatter,
            remove: self.rm,
            batch_size: self.batch_size,
            max_attempts: self.max_attempts,
            log_level: self.log_level.clone(),
            log_json: self.log_json,
        }
    }

    /// Origins and destination, in command line order
    fn endpoints(&self, http: &ClientConfig) -> Result<(Vec<Endpoint>, Endpoint)> {
        let mut endpoints = self
            .endpoints
            .iter()
            .map(|descriptor| {
                Endpoint::parse_with_config(descriptor, http)
                    .with_context(|| format!("Invalid endpoint: {descriptor}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let destination = endpoints
            .pop()
            .context("A destination endpoint is required")?;
        Ok((endpoints, destination))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let overrides = cli.overrides();

    let config = match FileConfig::load_or_default(cli.config.as_deref()).await {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Error: {error:#}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match telemetry::initialize_logging(&config.logging(&overrides)) {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("Error: {error:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &config, config.sync_options(&overrides)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: &FileConfig, options: SyncOptions) -> Result<()> {
    let (origins, destination) = cli.endpoints(&config.http)?;
    info!(
        origins = origins.len(),
        destination = %destination,
        follow = %options.follow_mode,
        schema = %options.schema,
        batch_size = options.batch_size,
        "Starting sync"
    );

    let engine = SyncEngine::new(options);

    let cancellation = engine.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping at the next batch");
            cancellation.cancel();
        }
    });

    let metrics = if !cli.no_progress && destination.show_progress() {
        let (reporter, channel) = ProgressChannel::new();
        let renderer = tokio::spawn(SyncProgress::new().run(channel));

        let result = engine
            .sync_with_progress(&origins, &destination, Some(reporter))
            .await;
        // the reporter is dropped with the run, so the renderer drains and exits
        if let Err(join_error) = renderer.await {
            warn!("Progress display stopped: {join_error}");
        }
        result
    } else {
        engine.sync_with_progress(&origins, &destination, None).await
    }
    .with_context(|| format!("Sync to {destination} failed"))?;

    info!("{}", metrics.summary());
    Ok(())
}
