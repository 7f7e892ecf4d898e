// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! rankharvest — harvest a ranked feed and its comments from the command line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use url::Url;

use rankharvest::progress::{self, ProgressEventKind};
use rankharvest::{HarvestConfig, Pipeline, RankOrder};
use rankharvest_cli::browser::{BrowserOptions, ChromiumSessions};
use rankharvest_cli::{config, output};

#[derive(Parser)]
#[command(
    name = "rankharvest",
    about = "rankharvest — collect a ranked feed and each entry's comments",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Layout file (overrides RANKHARVEST_LAYOUT and ./rankharvest.json).
    #[arg(long, global = true)]
    layout: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest ranked entries and their comments
    Run {
        /// Maximum number of ranked entries
        #[arg(long, default_value = "10")]
        records: usize,
        /// Maximum number of comments per entry
        #[arg(long)]
        comments: usize,
        /// Final order: listed, asc or desc (by audience count)
        #[arg(long, default_value = "desc")]
        order: RankOrder,
        /// Concurrent extraction tasks per feed
        #[arg(long, default_value = "5")]
        workers: usize,
        /// Entries whose comments are collected at the same time
        #[arg(long, default_value = "1")]
        parallel: usize,
        /// Time budget per entry's comment collection, in milliseconds
        #[arg(long)]
        budget_ms: Option<u64>,
        /// Navigation timeout in milliseconds
        #[arg(long, default_value = "30000")]
        timeout: u64,
        /// Show the browser window
        #[arg(long)]
        headful: bool,
        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective feed layout as JSON
    Layout,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run {
            records,
            comments,
            order,
            workers,
            parallel,
            budget_ms,
            timeout,
            headful,
            json,
        } => {
            let harvest = HarvestConfig {
                worker_count: workers,
                record_concurrency: parallel,
                record_budget_ms: budget_ms,
                ..HarvestConfig::default()
            };
            run(
                cli.layout.as_deref(),
                harvest,
                records,
                comments,
                order,
                timeout,
                headful,
                json,
            )
            .await
        }
        Commands::Layout => config::load_layout(cli.layout.as_deref()).and_then(|layout| {
            println!("{}", serde_json::to_string_pretty(&layout)?);
            Ok(())
        }),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "rankharvest", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }
    result
}

#[allow(clippy::too_many_arguments)]
async fn run(
    layout_path: Option<&std::path::Path>,
    harvest: HarvestConfig,
    records: usize,
    comments: usize,
    order: RankOrder,
    timeout_ms: u64,
    headful: bool,
    json: bool,
) -> Result<()> {
    let layout = config::load_layout(layout_path)?;
    let base = Url::parse(&layout.feed_reference)
        .with_context(|| format!("feed reference is not a URL: {}", layout.feed_reference))?;

    let sessions = ChromiumSessions::launch(BrowserOptions {
        headless: !headful,
        navigation_timeout: std::time::Duration::from_millis(timeout_ms),
        overlay_dismiss: layout.overlay_dismiss.clone(),
        base: Some(base),
        ..BrowserOptions::default()
    })
    .await?;

    info!("harvesting {} (order {order})", layout.feed_reference);

    let (tx, mut rx) = progress::channel();
    let reporter = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match event.event {
                    ProgressEventKind::EntriesExtracted {
                        visible,
                        kept,
                        dropped,
                    } => info!(visible, kept, dropped, "entries extracted"),
                    ProgressEventKind::CollectionFinished {
                        title,
                        collected,
                        stop_reason,
                        elapsed_ms,
                        ..
                    } => info!(%title, collected, %stop_reason, elapsed_ms, "comments done"),
                    ProgressEventKind::Warning { message } => warn!("{message}"),
                },
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let pipeline = Pipeline::new(sessions, layout, harvest).with_progress(tx, "cli");
    let results = pipeline.run(records, comments, order).await;
    // Dropping the pipeline closes the progress channel.
    let sessions = pipeline.into_sessions();
    let _ = reporter.await;
    if let Err(e) = sessions.shutdown().await {
        warn!("{e:#}");
    }

    let mut stdout = std::io::stdout().lock();
    if json {
        output::write_json(&mut stdout, &results)?;
    } else {
        output::write_listing(&mut stdout, &results)?;
    }
    Ok(())
}
