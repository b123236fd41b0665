// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use testlog_node::config::{split_host_args, NodeConfig};
use testlog_node::governance;
use testlog_node::telemetry::init_telemetry;

#[derive(Parser)]
#[command(name = "testlog-node")]
#[command(about = "Demo host that reports governance events to a test harness pipe", long_about = None)]
struct Cli {
    /// Named pipe the harness reads events from (also `-testlog=<path>`, then TESTLOG_PIPE)
    #[arg(long)]
    testlog: Option<PathBuf>,

    /// Number of governance rounds to play
    #[arg(long, default_value_t = 4)]
    rounds: usize,

    /// Pause between rounds, in milliseconds
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,
}

fn main() -> anyhow::Result<()> {
    init_telemetry();

    // clap would read `-testlog=<path>` as a bundle of short flags
    let (args, host_testlog) = split_host_args(std::env::args().collect());
    let cli = Cli::parse_from(args);
    let cfg = NodeConfig {
        testlog: cli.testlog.or(host_testlog.pipe_path),
        rounds: cli.rounds,
        interval: Duration::from_millis(cli.interval_ms),
    };

    tracing::info!("Starting node with config: {:?}", cfg);

    match cfg.init_testlog()? {
        Some(path) => tracing::info!("Test events go to {:?}", path),
        None => tracing::info!("Test log disabled"),
    }

    let summary = governance::play(&cfg)?;
    println!(
        "accepted={} rejected={} removed={}",
        summary.accepted, summary.rejected, summary.removed
    );

    testlog::shutdown();
    Ok(())
}
