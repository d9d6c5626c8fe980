//! coursewatch CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use coursewatch::{
    error::Result,
    models::{Config, Course},
    pipeline::{DeadlineWindow, PollCoordinator, Scheduler},
    services::{HttpSource, Source, register_courses, sink_from_config},
    storage::{LocalStorage, SnapshotStore},
};

/// coursewatch - Course update watcher
#[derive(Parser, Debug)]
#[command(
    name = "coursewatch",
    version,
    about = "Reports new course items and upcoming deadlines"
)]
struct Cli {
    /// Path to the configuration file (default: {storage_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Storage directory, overrides `storage.dir`
    #[arg(short, long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch courses until interrupted
    Run {
        /// Course ids, replacing the configured list
        courses: Vec<u64>,

        /// Poll interval in seconds, overrides `watch.interval_secs`
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Run a single check cycle for one course
    Check {
        /// Course id
        id: u64,
    },

    /// Validate the configuration
    Validate,

    /// Show stored snapshot info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => {
            let dir = cli
                .storage_dir
                .clone()
                .unwrap_or_else(|| Config::default().storage.dir);
            Config::load_or_default(dir.join("config.toml"))
        }
    };
    if let Some(dir) = &cli.storage_dir {
        config.storage.dir = dir.clone();
    }
    Ok(config)
}

/// Wire source, sink and store into a coordinator.
fn build(config: &Config) -> Result<(Arc<dyn Source>, PollCoordinator)> {
    let source: Arc<dyn Source> = Arc::new(HttpSource::new(&config.source)?);
    let sink = sink_from_config(&config.sink, &config.messages)?;
    let store: Arc<dyn SnapshotStore> = Arc::new(LocalStorage::with_file(
        &config.storage.dir,
        &config.storage.file,
    ));

    let coordinator = PollCoordinator::new(
        Arc::clone(&source),
        sink,
        store,
        DeadlineWindow::new(config.watch.deadline_window()),
    )
    .with_timeouts(config.source.timeout(), config.sink.timeout());
    Ok((source, coordinator))
}

async fn register(config: &Config, source: &dyn Source) -> Vec<Course> {
    register_courses(
        &config.watch.courses,
        source,
        &config.watch.course_url_template,
        config.source.timeout(),
    )
    .await
}

/// Resolves when Ctrl-C is received.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("coursewatch starting...");

    let mut config = load_config(&cli)?;
    log::info!("Storage directory: {}", config.storage.dir.display());

    match cli.command {
        Command::Run { courses, interval } => {
            if !courses.is_empty() {
                config.watch.courses = courses;
            }
            if let Some(secs) = interval {
                config.watch.interval_secs = secs;
            }
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }

            let (source, coordinator) = build(&config)?;
            let courses = register(&config, source.as_ref()).await;
            log::info!("Registered {} courses", courses.len());

            Scheduler::new(coordinator, courses, config.watch.interval())
                .run(shutdown_signal())
                .await;
        }

        Command::Check { id } => {
            config.watch.courses = vec![id];
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }

            let (source, coordinator) = build(&config)?;
            for course in register(&config, source.as_ref()).await {
                let outcome = coordinator.run_cycle(&course).await?;
                log::info!(
                    "{}: fetched={} saved={} new={} deadlines={} failed deliveries={}",
                    course.name,
                    outcome.fetched,
                    outcome.saved,
                    outcome.new_items,
                    outcome.deadline_items,
                    outcome.delivery_failures
                );
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} courses, every {}s)",
                config.watch.courses.len(),
                config.watch.interval_secs
            );
        }

        Command::Info => {
            let storage = LocalStorage::with_file(&config.storage.dir, &config.storage.file);
            log::info!("Snapshot file: {}", storage.path().display());

            let snapshots = storage.snapshots().await?;
            if snapshots.is_empty() {
                log::info!("No snapshot found yet.");
            }
            for (key, tree) in &snapshots {
                log::info!(
                    "Course {} ({}): {} items, {} leaves",
                    key,
                    tree.name,
                    tree.node_count(),
                    tree.leaves().len()
                );
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
