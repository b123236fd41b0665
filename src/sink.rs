// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Sink
//!
//! Owns the channel to the test harness and turns registered log calls into
//! event lines:
//!
//! ```text
//! <event_name>[:<value>]*\n
//! ```
//!
//! Values are written as-is. A value containing `:` or `\n` will be split
//! by the reader.
//!
//! # Guarantees
//! - Open, lookup, format and write happen under one lock, so lines from
//!   concurrent callers never interleave
//! - A missing path, a missing reader or a failed write only drops the event
//! - After a failed write the handle is closed and the next report reopens
//! - Lines longer than [`MAX_LINE_LEN`] are dropped unwritten, so a full
//!   pipe never ends up holding half a line

use crate::args::TestArgs;
use crate::channel::{ChannelOpener, PipeOpener, MAX_LINE_LEN};
use crate::registry::{EventRegistry, TestEvent};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Test log channel already configured: {current:?} (requested {requested:?})")]
    AlreadyConfigured { current: PathBuf, requested: PathBuf },

    #[error("Test log channel path is empty")]
    EmptyPath,

    #[error("Short write: {written} of {len} bytes")]
    ShortWrite { written: usize, len: usize },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, SinkError>;

struct SinkState<H> {
    path: Option<PathBuf>,
    handle: Option<H>,
}

pub struct EventSink<O: ChannelOpener = PipeOpener> {
    registry: EventRegistry,
    opener: O,
    state: Mutex<SinkState<O::Handle>>,
}

impl<O: ChannelOpener> EventSink<O> {
    /// Unconfigured sink; nothing is opened until `configure` and a report.
    pub fn new(registry: EventRegistry, opener: O) -> Self {
        Self {
            registry,
            opener,
            state: Mutex::new(SinkState {
                path: None,
                handle: None,
            }),
        }
    }

    // A panic while holding the lock (an out-of-range selection in an
    // unwinding build) leaves the state consistent: keep using it.
    fn lock(&self) -> MutexGuard<'_, SinkState<O::Handle>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the channel path. Does not open anything.
    ///
    /// The first path wins: configuring the same path again is a no-op,
    /// a different one is rejected.
    pub fn configure(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(SinkError::EmptyPath);
        }

        let mut state = self.lock();
        if let Some(current) = &state.path {
            if current == path {
                return Ok(());
            }
            tracing::warn!(
                current = %current.display(),
                requested = %path.display(),
                "Ignoring test log channel reconfiguration"
            );
            return Err(SinkError::AlreadyConfigured {
                current: current.clone(),
                requested: path.to_path_buf(),
            });
        }

        tracing::debug!(path = %path.display(), "Test log channel configured");
        state.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Report a log call. Never fails; every recoverable problem drops the
    /// event.
    ///
    /// # Panics
    /// If the registered event selects a position the call did not pass.
    pub fn report<A: TestArgs + ?Sized>(&self, format: &str, args: &A) {
        let mut guard = self.lock();
        let state = &mut *guard;

        if state.handle.is_none() {
            if let Some(path) = &state.path {
                match self.opener.open(path) {
                    Ok(handle) => {
                        tracing::info!(path = %path.display(), "Test log channel opened");
                        state.handle = Some(handle);
                    }
                    Err(e) => {
                        tracing::trace!(path = %path.display(), error = %e, "Test log channel unavailable");
                    }
                }
            }
        }

        let Some(handle) = state.handle.as_mut() else {
            return;
        };
        let Some(event) = self.registry.lookup(format) else {
            return;
        };

        let line = format_line(event, args);
        if line.len() > MAX_LINE_LEN {
            tracing::debug!(event = event.event_name, len = line.len(), "Test log line too long, dropped");
            return;
        }
        if let Err(e) = write_line(handle, &line) {
            tracing::debug!(event = event.event_name, error = %e, "Test log write failed, closing channel");
            state.handle = None;
        }
    }

    /// Release the channel handle. The path is kept, so a later report
    /// opens the channel again.
    ///
    /// Returns whether a handle was open.
    pub fn close(&self) -> bool {
        let mut state = self.lock();
        let was_open = state.handle.take().is_some();
        if was_open {
            tracing::info!("Test log channel released");
        }
        was_open
    }

    pub fn is_configured(&self) -> bool {
        self.lock().path.is_some()
    }

    pub fn is_open(&self) -> bool {
        self.lock().handle.is_some()
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.lock().path.clone()
    }
}

// Single write, never retried; lines are at most MAX_LINE_LEN.
fn write_line<W: Write>(handle: &mut W, line: &str) -> Result<()> {
    let bytes = line.as_bytes();
    let written = handle.write(bytes)?;
    if written != bytes.len() {
        return Err(SinkError::ShortWrite {
            written,
            len: bytes.len(),
        });
    }
    handle.flush()?;
    Ok(())
}

/// Render one wire line for `event` from the call's arguments.
///
/// The argument list is dispatched once per selected position.
pub fn format_line<A: TestArgs + ?Sized>(event: &TestEvent, args: &A) -> String {
    let mut line = String::with_capacity(event.event_name.len() + 1 + 16 * event.selected_positions.len());
    line.push_str(event.event_name);
    for &position in event.selected_positions {
        line.push(':');
        line.push_str(&args.arg_text(position));
    }
    line.push('\n');
    line
}
