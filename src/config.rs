// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Test-mode configuration.

use crate::sink::Result;
use std::ffi::OsStr;
use std::path::PathBuf;

/// Environment variable holding the channel path.
pub const TESTLOG_PIPE_ENV: &str = "TESTLOG_PIPE";

/// Command-line flag form used by the host: `-testlog=<path>`.
pub const TESTLOG_FLAG: &str = "-testlog=";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestLogConfig {
    pub pipe_path: Option<PathBuf>,
}

impl TestLogConfig {
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var_os(TESTLOG_PIPE_ENV).as_deref())
    }

    fn from_env_value(value: Option<&OsStr>) -> Self {
        Self {
            pipe_path: value.filter(|v| !v.is_empty()).map(PathBuf::from),
        }
    }

    /// Parse a single `-testlog=<path>` argument. Anything else is `None`.
    pub fn parse_flag(arg: &str) -> Option<Self> {
        let path = arg.strip_prefix(TESTLOG_FLAG)?;
        if path.is_empty() {
            return None;
        }
        Some(Self {
            pipe_path: Some(PathBuf::from(path)),
        })
    }

    /// First `-testlog=` flag in `args`, else the environment.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter()
            .find_map(|a| Self::parse_flag(a.as_ref()))
            .unwrap_or_else(Self::from_env)
    }

    /// Configure the process-wide sink. A config with no path leaves the
    /// sink unconfigured.
    pub fn apply(&self) -> Result<()> {
        match &self.pipe_path {
            Some(path) => crate::init(path),
            None => Ok(()),
        }
    }
}
