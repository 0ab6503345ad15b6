//! Sitelens main entry point
//!
//! This is the command-line interface for the Sitelens page analyzer.

use anyhow::Context;
use clap::{Parser, Subcommand};
use sitelens::config::{load_config_from_env, Config};
use sitelens::hub::{ChannelSubscriber, Hub, Subscriber};
use sitelens::output::{load_statistics, print_statistics, summary_line};
use sitelens::pipeline::{build_scheduler, cancel_on_signal, Intake};
use sitelens::storage::{open_store, Store};
use sitelens::{HttpAnalyzer, PageAnalyzer, Status};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sitelens: a background web page analyzer
///
/// Submitted URLs are analyzed by a long-running `serve` process, which
/// reports the page title, heading counts, link counts, and whether the page
/// carries a login form.
#[derive(Parser, Debug)]
#[command(name = "sitelens")]
#[command(version)]
#[command(about = "A background web page analyzer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the database path from the configuration
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the scheduler and worker pool, streaming status events to stdout
    Serve,

    /// Queue one or more URLs for analysis
    Submit {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Clear an item's results and queue it again
    Retry { id: String },

    /// Remove an item
    Delete { id: String },

    /// List stored items
    List {
        /// Only show items with this status (queued, running, done, error)
        #[arg(long)]
        status: Option<String>,
    },

    /// Print one item as JSON
    Show { id: String },

    /// Show statistics from the database
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_config_from_env(cli.config.as_deref()).context("loading configuration")?;
    if let Some(database) = &cli.database {
        config.storage.database_path = database.display().to_string();
    }

    let store: Arc<dyn Store> = Arc::new(
        open_store(Path::new(&config.storage.database_path))
            .with_context(|| format!("opening database {}", config.storage.database_path))?,
    );
    let hub = Arc::new(Hub::new());
    let intake = Intake::new(Arc::clone(&store), Arc::clone(&hub));

    match cli.command {
        Commands::Serve => handle_serve(&config, store, hub).await?,
        Commands::Submit { urls } => {
            for url in urls {
                match intake.submit(&url).await {
                    Ok(item) => println!("{}  {}", item.id, item.normalized_url),
                    Err(e) => {
                        tracing::error!("Could not queue {}: {}", url, e);
                        return Err(e.into());
                    }
                }
            }
        }
        Commands::Retry { id } => {
            let item = intake.request_reanalysis(&id).await?;
            println!("{}", summary_line(&item));
        }
        Commands::Delete { id } => {
            if !intake.delete(&id).await? {
                anyhow::bail!("Work item not found: {}", id);
            }
            println!("Deleted {}", id);
        }
        Commands::List { status } => {
            let items = match status {
                Some(raw) => {
                    let status = Status::from_db_string(&raw)
                        .with_context(|| format!("unknown status '{}'", raw))?;
                    store.query_by_status(status)?
                }
                None => store.list()?,
            };
            for item in &items {
                println!("{}", summary_line(item));
            }
        }
        Commands::Show { id } => {
            let item = store
                .get(&id)?
                .with_context(|| format!("Work item not found: {}", id))?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        Commands::Stats => {
            println!("Database: {}\n", config.storage.database_path);
            let stats = load_statistics(store.as_ref())?;
            print_statistics(&stats);
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that `serve` can keep stdout for events.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitelens=info,warn"),
            1 => EnvFilter::new("sitelens=debug,info"),
            2 => EnvFilter::new("sitelens=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs the pipeline until Ctrl-C
async fn handle_serve(config: &Config, store: Arc<dyn Store>, hub: Arc<Hub>) -> anyhow::Result<()> {
    let settings = config.pipeline_settings();
    let analyzer: Arc<dyn PageAnalyzer> =
        Arc::new(HttpAnalyzer::new(&config.user_agent).context("building HTTP client")?);

    let (subscriber, mut events) = ChannelSubscriber::channel(256);
    hub.register(subscriber as Arc<dyn Subscriber>).await;

    let printer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(event) = events.recv().await {
            let line = format!("{}\n", event);
            if stdout.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    let scheduler = build_scheduler(&settings, store, Arc::clone(&hub), analyzer);

    match scheduler.recover_interrupted().await {
        Ok(0) => {}
        Ok(n) => tracing::info!("Requeued {} items interrupted by a previous run", n),
        Err(e) => tracing::warn!("Could not recover interrupted items: {}", e),
    }

    let shutdown = CancellationToken::new();
    let signal = tokio::spawn(cancel_on_signal(
        tokio::signal::ctrl_c(),
        shutdown.clone(),
    ));

    scheduler.run(shutdown).await;
    signal.abort();

    // Items still Running are requeued on the next start
    printer.abort();

    Ok(())
}
