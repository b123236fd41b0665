// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! testlog: re-emits selected host log calls as structured event lines on a
//! named pipe, for black-box tests to assert on.
//!
//! ```ignore
//! testlog::init("/tmp/node0")?;
//! testlog::test_log!("MNGOVERNANCEOBJECT -- Received object: %s\n", hash);
//! // pipe: govobj_received:<hash>\n
//! ```

pub mod args;
pub mod channel;
pub mod config;
pub mod printf;
pub mod registry;
pub mod sink;

pub use args::TestArgs;
pub use channel::{ChannelOpener, PipeOpener};
pub use config::TestLogConfig;
pub use registry::{EventRegistry, TestEvent};
pub use sink::{EventSink, SinkError};

#[doc(hidden)]
pub use tracing as __tracing;

use std::path::Path;
use std::sync::OnceLock;

static SINK: OnceLock<EventSink> = OnceLock::new();

/// The process-wide sink, built on first use from the built-in registry.
pub fn sink() -> &'static EventSink {
    SINK.get_or_init(|| EventSink::new(EventRegistry::builtin().clone(), PipeOpener))
}

/// Point the process-wide sink at `path`. Call once at startup.
pub fn init(path: impl AsRef<Path>) -> sink::Result<()> {
    sink().configure(path)
}

/// Report a log call to the process-wide sink.
pub fn report<A: TestArgs + ?Sized>(format: &str, args: &A) {
    // Unconfigured processes never touch the lock.
    if let Some(sink) = SINK.get() {
        sink.report(format, args);
    }
}

/// Release the process-wide channel handle.
pub fn shutdown() {
    if let Some(sink) = SINK.get() {
        sink.close();
    }
}

/// Report a log call with its original arguments, borrowed.
///
/// ```ignore
/// test_log!("AddGovernanceObject -- %s new, received form %s\n", hash, peer);
/// ```
#[macro_export]
macro_rules! test_log {
    ($format:expr $(,)?) => {
        $crate::report($format, &())
    };
    ($format:expr, $($arg:expr),+ $(,)?) => {
        $crate::report($format, &($(&$arg,)+))
    };
}

/// Log a printf-style message through `tracing` at debug level, then report
/// it as a test event.
#[macro_export]
macro_rules! log_print {
    ($category:expr, $format:expr $(, $arg:expr)* $(,)?) => {{
        let __args = ($(&$arg,)*);
        $crate::__tracing::debug!(category = $category, "{}", $crate::printf::render($format, &__args).trim_end());
        $crate::report($format, &__args);
    }};
}

#[cfg(test)]
pub mod tests;
