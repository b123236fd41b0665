// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::PathBuf;
use std::time::Duration;
use crate::errors::Result;
use testlog::TestLogConfig;

#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Channel for test events; `None` runs without test reporting
    pub testlog: Option<PathBuf>,
    /// Governance objects to play through the call sites
    pub rounds: usize,
    pub interval: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            testlog: None,
            rounds: 4,
            interval: Duration::from_millis(0),
        }
    }
}

impl NodeConfig {
    /// Test-mode settings: the explicit path, or `TESTLOG_PIPE`.
    pub fn testlog_config(&self) -> TestLogConfig {
        match &self.testlog {
            Some(path) => TestLogConfig {
                pipe_path: Some(path.clone()),
            },
            None => TestLogConfig::from_env(),
        }
    }

    /// Configure the process-wide test channel, if one is set.
    ///
    /// Returns the path events will be written to.
    pub fn init_testlog(&self) -> Result<Option<PathBuf>> {
        let testlog = self.testlog_config();
        testlog.apply()?;
        Ok(testlog.pipe_path)
    }
}

/// Split the host's `-testlog=<path>` form out of a command line.
///
/// Returns the arguments left for clap and the test-mode settings taken
/// from the flag (or `TESTLOG_PIPE` when no flag is given).
pub fn split_host_args(args: Vec<String>) -> (Vec<String>, TestLogConfig) {
    let testlog = TestLogConfig::from_args(&args);
    let rest = args
        .into_iter()
        .filter(|a| TestLogConfig::parse_flag(a).is_none())
        .collect();
    (rest, testlog)
}
