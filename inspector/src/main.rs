use anyhow::Context;
use chrono::Local;
use clap::Parser as _;
use inspection_model::{load_config, store_model};
use inspector::{collect_status, ReplayProvider, ReportCollector};
use std::fs::File;
use std::path::PathBuf;

mod cli;

use cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = CliArgs::parse();

    log::debug!("Loading config from {}", args.config.display());
    let config = load_config(&args.config)?;

    let provider = ReplayProvider::load(&args.replay_dir)
        .with_context(|| format!("Cannot replay queries from {}", args.replay_dir.display()))?;
    if provider.is_empty() {
        log::warn!(
            "No recordings found in {}, every query will fail",
            args.replay_dir.display()
        );
    }

    let now = Local::now();
    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}-{}.json",
            args.command.output_prefix(),
            now.format("%Y%m%d_%H%M%S")
        ))
    });
    let mut file = File::create_new(&output)
        .with_context(|| format!("Failed to create output file {}", output.display()))?;

    match args.command {
        Command::Report => {
            let report = ReportCollector::new(&provider, &config).collect(now).await;
            store_model(&report, &mut file)?;
        }
        Command::Status { days } => {
            let status = collect_status(&provider, &config, days, now).await;
            store_model(&status, &mut file)?;
        }
    }

    log::info!("Wrote {}", output.display());

    Ok(())
}
