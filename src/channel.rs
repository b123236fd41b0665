// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Output channel for event lines.
//!
//! The sink only needs "open this path for writing" and a `Write` handle
//! back; the opener is a trait so the sink can be driven against an
//! in-memory channel.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Longest line written in one piece. Pipe writes up to `PIPE_BUF` bytes
/// are atomic: all of the line lands or none of it.
#[cfg(unix)]
pub const MAX_LINE_LEN: usize = libc::PIPE_BUF;
#[cfg(not(unix))]
pub const MAX_LINE_LEN: usize = 4096;

pub trait ChannelOpener: Send + Sync {
    type Handle: Write + Send;

    /// Open `path` for writing without waiting for a reader.
    fn open(&self, path: &Path) -> io::Result<Self::Handle>;
}

/// Opens a named pipe (or any file) write-only and non-blocking.
///
/// On a FIFO with no reader attached the open fails with `ENXIO` instead
/// of blocking, and writes to a full pipe fail with `EAGAIN`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PipeOpener;

impl ChannelOpener for PipeOpener {
    type Handle = File;

    fn open(&self, path: &Path) -> io::Result<File> {
        let mut options = OpenOptions::new();
        options.write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_NONBLOCK);
        }
        options.open(path)
    }
}
