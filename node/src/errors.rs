// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Test log setup failed: {0}")]
    TestLog(#[from] testlog::SinkError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, NodeError>;
