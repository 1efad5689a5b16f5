use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};
use inspector::{DEFAULT_STATUS_DAYS, MAX_STATUS_DAYS};

#[derive(Parser)]
#[command(about, long_about = None)]
pub struct CliArgs {
    /// Path to the YAML inspection configuration.
    #[arg(long, env = "INSPECTOR_CONFIG", default_value = "config/config.yaml")]
    pub config: PathBuf,

    /// Directory of recorded query results to answer queries from.
    #[arg(long, env = "INSPECTOR_REPLAY_DIR")]
    pub replay_dir: PathBuf,

    /// Where to write the JSON output. Defaults to a timestamped file in the working directory.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Query every metric once and produce an inspection report.
    Report,
    /// Judge every metric per day over a trailing window.
    Status {
        /// The number of days to cover, ending today. At most a year.
        #[arg(
            long,
            default_value_t = DEFAULT_STATUS_DAYS,
            value_parser = RangedU64ValueParser::<usize>::new().range(0..=MAX_STATUS_DAYS as u64)
        )]
        days: usize,
    },
}

impl Command {
    pub fn output_prefix(&self) -> &'static str {
        match self {
            Command::Report => "inspection-report",
            Command::Status { .. } => "inspection-status",
        }
    }
}
