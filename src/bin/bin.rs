use anyhow::{Context, Result};
use log::debug;
use logstats::report::{Format, Report};
use std::{io::stdout, path::PathBuf};
use structopt::StructOpt;

/// Summarize an access log: busiest client addresses, response codes and most requested URLs.
#[derive(StructOpt)]
struct Options {
    /// Log file to read, or `-` for standard input
    #[structopt(parse(from_os_str))]
    log_file: PathBuf,
    /// How many addresses and URLs to list
    #[structopt(short = "n", long, env = "LOG_STATS_TOP_N", default_value = "10")]
    top_n: usize,
    /// Refuse files larger than this many bytes (0 for no limit)
    #[structopt(long, env = "LOG_STATS_MAX_SIZE", default_value = "104857600")]
    max_size: u64,
    /// Report format: text or csv
    #[structopt(
        short,
        long,
        env = "LOG_STATS_FORMAT",
        default_value = "text",
        possible_values = Format::VARIANTS,
        case_insensitive = true
    )]
    format: Format,
    /// Also list request counts for each hour of the day
    #[structopt(long)]
    hourly: bool,
}

fn main() -> Result<()> {
    // Load from .env file if it is present
    dotenv::dotenv().ok();
    // Initialize logging
    env_logger::init();
    // Get command line arguments
    let options = Options::from_args();
    debug!("listing top {} entries, {} byte limit", options.top_n, options.max_size);
    let max_size = Some(options.max_size).filter(|&limit| limit > 0);
    let state = logstats::analyze_path(&options.log_file, max_size)
        .with_context(|| format!("failed to analyze {}", options.log_file.display()))?;
    let stdout = stdout();
    Report::new(&state, options.top_n, options.hourly)
        .write(options.format, stdout.lock())
        .context("failed to write report")?;
    Ok(())
}
