use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use procsnap::config::{Config, load_config, load_config_from_path};
use procsnap::logging::{init_tracing, parse_level};
use procsnap::report::render_text;
use procsnap::system::Collector;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "procsnap",
    about = "Sample /proc and print CPU, memory and per-process usage"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Delay between polls in milliseconds
    #[arg(long)]
    refresh_rate: Option<u64>,

    /// Number of polls to take. The first reports CPU since boot; later
    /// ones report live load.
    #[arg(long, default_value_t = 1)]
    count: u32,

    /// Emit each snapshot as a JSON document instead of a text report.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Read process information from this directory instead of /proc.
    #[arg(long)]
    proc_root: Option<PathBuf>,

    /// Process rows in the text report (0 = all)
    #[arg(long)]
    max_processes: Option<usize>,

    /// Log at debug level.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Write logs to stderr as JSON lines.
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        parse_level(&config.general.log_level)?
    };
    init_tracing(level, cli.log_json)?;

    run(config, &cli).await
}

async fn run(config: Config, cli: &Cli) -> Result<()> {
    if cli.count == 0 {
        return Err(eyre!("--count must be greater than 0"));
    }
    if config.general.refresh_rate_ms == 0 {
        return Err(eyre!("refresh rate must be greater than 0"));
    }

    let paths = config.sources.paths();
    let mut collector = match config.sources.clock_ticks {
        Some(hz) => Collector::with_clock_ticks(paths, hz),
        None => Collector::new(paths),
    };
    info!(
        proc_root = %collector.paths().proc_root.display(),
        clock_ticks = collector.clock_ticks(),
        count = cli.count,
        "starting"
    );

    let mut interval =
        tokio::time::interval(Duration::from_millis(config.general.refresh_rate_ms));
    for _ in 0..cli.count {
        // The first tick completes immediately; each poll finishes before the
        // next tick is awaited.
        interval.tick().await;
        let snapshot = collector.poll();
        if cli.json {
            println!("{}", serde_json::to_string(&snapshot)?);
        } else {
            println!("{}", render_text(&snapshot, config.general.max_processes));
        }
    }

    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(rate) = cli.refresh_rate {
        config.general.refresh_rate_ms = rate;
    }
    if let Some(ref root) = cli.proc_root {
        config.sources.proc_root = root.clone();
    }
    if let Some(rows) = cli.max_processes {
        config.general.max_processes = rows;
    }

    config
}
