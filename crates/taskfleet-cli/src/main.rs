//! taskfleet CLI - dispatch demo batches to an in-process fabric.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use taskfleet_dispatch::{DispatchConfig, Dispatcher, FanoutSink, JsonLogSink, TracingSink};
use taskfleet_fabric::FabricConfig;

mod tasks;

/// taskfleet - dispatch a batch and watch it to completion
#[derive(Parser)]
#[command(name = "taskfleet")]
#[command(about = "Dispatch task batches and report their outcomes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch of demo tasks
    Run {
        /// Per-task timeout budget in seconds
        #[arg(long, default_value = "30", value_parser = parse_secs)]
        timeout: Duration,

        /// Delay between polling passes in seconds
        #[arg(long, default_value = "0.5", value_parser = parse_secs)]
        poll_interval: Duration,

        /// Bound on a single result retrieval in seconds
        #[arg(long, default_value = "20", value_parser = parse_secs)]
        result_wait: Duration,

        /// Directory for JSON event logs
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,

        /// Don't echo events and the summary to stdout
        #[arg(short, long)]
        quiet: bool,

        /// Disable colors in the summary table
        #[arg(long)]
        no_color: bool,

        /// Comma-separated task names (default: all demo tasks)
        #[arg(long, value_delimiter = ',')]
        tasks: Vec<String>,

        /// Worker loops per declared queue
        #[arg(long, default_value = "2")]
        consumers: usize,
    },

    /// List the demo tasks
    Tasks,
}

fn parse_secs(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a number of seconds"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid duration '{raw}': {e}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskfleet=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            timeout,
            poll_interval,
            result_wait,
            log_dir,
            quiet,
            no_color,
            tasks,
            consumers,
        } => {
            let config = DispatchConfig::default()
                .with_timeout_budget(timeout)
                .with_poll_interval(poll_interval)
                .with_result_wait(result_wait);
            run(config, log_dir, quiet, !no_color, tasks, consumers).await?;
        }
        Commands::Tasks => list_tasks(),
    }

    Ok(())
}

async fn run(
    config: DispatchConfig,
    log_dir: PathBuf,
    quiet: bool,
    color: bool,
    selection: Vec<String>,
    consumers: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let fabric_config = FabricConfig::from_env();
    info!(
        broker = %fabric_config.broker_url,
        backend = %fabric_config.result_backend,
        consumers,
        "Starting local fabric"
    );
    let fabric = Arc::new(tasks::build_fabric(fabric_config, consumers)?);

    let log_sink = JsonLogSink::create(&log_dir)?
        .with_console(!quiet)
        .with_color(color);
    let sink = FanoutSink::new()
        .with(Arc::new(log_sink))
        .with(Arc::new(TracingSink));

    let dispatcher = Dispatcher::new(fabric.clone(), Arc::new(sink), config);
    let report = dispatcher.submit_batch(tasks::select(&selection)).await?;

    fabric.shutdown();
    info!(
        successes = report.successes(),
        total = report.total(),
        "Run complete"
    );
    Ok(())
}

fn list_tasks() {
    let catalogue = tasks::catalogue();
    println!("Demo tasks ({}):", catalogue.len());
    println!("{:<10}  {:<8}  {:<8}  {}", "NAME", "QUEUE", "ATTEMPTS", "DESCRIPTION");
    println!("{}", "-".repeat(64));
    for demo in &catalogue {
        let queue = if tasks::QUEUES.contains(&demo.queue) {
            demo.queue.to_string()
        } else {
            format!("{}*", demo.queue)
        };
        println!(
            "{:<10}  {:<8}  {:<8}  {}",
            demo.name, queue, demo.max_attempts, demo.description
        );
    }
    println!();
    println!("* queue has no consumers");
}
