// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging for the node binary.
///
/// Filter comes from `RUST_LOG`, defaulting to
/// `testlog=debug,testlog_node=debug`.
pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "testlog=debug,testlog_node=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
