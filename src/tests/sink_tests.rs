// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::channel::{ChannelOpener, MAX_LINE_LEN};
use crate::registry::{EventRegistry, TestEvent};
use crate::sink::{format_line, EventSink, SinkError};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

pub(crate) const X_FORMAT: &str = "X -- got %s, n=%d\n";
pub(crate) const BARE_FORMAT: &str = "X -- bare\n";

#[derive(Default)]
pub(crate) struct ChannelLog {
    pub opens: Vec<PathBuf>,
    pub refuse_open: bool,
    pub fail_writes: usize,
    pub trickle: bool,
    pub short_writes: usize,
    pub bytes: Vec<u8>,
}

/// In-memory channel recording every open and every byte written.
#[derive(Clone, Default)]
pub(crate) struct MemoryChannel {
    pub log: Arc<Mutex<ChannelLog>>,
}

impl MemoryChannel {
    pub fn opens(&self) -> usize {
        self.log.lock().unwrap().opens.len()
    }

    pub fn output(&self) -> String {
        String::from_utf8(self.log.lock().unwrap().bytes.clone()).unwrap()
    }
}

pub(crate) struct MemoryHandle {
    log: Arc<Mutex<ChannelLog>>,
}

impl ChannelOpener for MemoryChannel {
    type Handle = MemoryHandle;

    fn open(&self, path: &Path) -> io::Result<MemoryHandle> {
        let mut log = self.log.lock().unwrap();
        log.opens.push(path.to_path_buf());
        if log.refuse_open {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        Ok(MemoryHandle { log: self.log.clone() })
    }
}

impl Write for MemoryHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let (trickle, n) = {
            let mut log = self.log.lock().unwrap();
            if log.fail_writes > 0 {
                log.fail_writes -= 1;
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            let n = if log.short_writes > 0 {
                log.short_writes -= 1;
                buf.len() / 2
            } else {
                buf.len()
            };
            (log.trickle, n)
        };
        if trickle {
            // Byte by byte, releasing the log in between: any interleaving
            // between writers shows up in the output
            for &b in &buf[..n] {
                self.log.lock().unwrap().bytes.push(b);
                thread::yield_now();
            }
        } else {
            self.log.lock().unwrap().bytes.extend_from_slice(&buf[..n]);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub(crate) fn x_registry() -> EventRegistry {
    EventRegistry::new([
        (X_FORMAT, TestEvent::new("x_event", &[0, 1])),
        (BARE_FORMAT, TestEvent::new("x_event", &[])),
    ])
    .unwrap()
}

pub(crate) fn memory_sink() -> (EventSink<MemoryChannel>, MemoryChannel) {
    let channel = MemoryChannel::default();
    (EventSink::new(x_registry(), channel.clone()), channel)
}

#[test]
fn test_format_line() {
    let event = TestEvent::new("x_event", &[0, 1]);
    assert_eq!(format_line(&event, &("abc", 7)), "x_event:abc:7\n");

    let reordered = TestEvent::new("x_event", &[1, 0, 1]);
    assert_eq!(format_line(&reordered, &("abc", 7)), "x_event:7:abc:7\n");

    let bare = TestEvent::new("x_event", &[]);
    assert_eq!(format_line(&bare, &()), "x_event\n");
    assert_eq!(format_line(&bare, &("ignored",)), "x_event\n");
}

#[test]
fn test_report_before_configure_is_noop() {
    let (sink, channel) = memory_sink();
    sink.report(X_FORMAT, &("abc", 7));

    assert!(!sink.is_configured());
    assert!(!sink.is_open());
    assert_eq!(channel.opens(), 0);
    assert_eq!(channel.output(), "");
}

#[test]
fn test_configure_does_not_open() {
    let (sink, channel) = memory_sink();
    sink.configure("/tmp/node0").unwrap();

    assert!(sink.is_configured());
    assert!(!sink.is_open());
    assert_eq!(sink.path(), Some(PathBuf::from("/tmp/node0")));
    assert_eq!(channel.opens(), 0);
}

#[test]
fn test_configure_once() {
    let (sink, _channel) = memory_sink();
    sink.configure("/tmp/node0").unwrap();
    sink.configure("/tmp/node0").unwrap();

    match sink.configure("/tmp/node12") {
        Err(SinkError::AlreadyConfigured { current, requested }) => {
            assert_eq!(current, PathBuf::from("/tmp/node0"));
            assert_eq!(requested, PathBuf::from("/tmp/node12"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(sink.path(), Some(PathBuf::from("/tmp/node0")));

    assert!(matches!(sink.configure(""), Err(SinkError::EmptyPath)));
}

#[test]
fn test_report_registered() {
    let (sink, channel) = memory_sink();
    sink.configure("/tmp/node0").unwrap();

    sink.report(X_FORMAT, &("abc", 7));
    sink.report(BARE_FORMAT, &());

    assert_eq!(channel.output(), "x_event:abc:7\nx_event\n");
    assert_eq!(channel.log.lock().unwrap().opens, vec![PathBuf::from("/tmp/node0")]);
}

#[test]
fn test_report_unregistered_writes_nothing() {
    let (sink, channel) = memory_sink();
    sink.configure("/tmp/node0").unwrap();

    sink.report("unrelated %s\n", &("z",));

    assert_eq!(channel.output(), "");
    // The channel is still opened first
    assert!(sink.is_open());
}

#[test]
fn test_open_failure_drops_event() {
    let (sink, channel) = memory_sink();
    channel.log.lock().unwrap().refuse_open = true;
    sink.configure("/tmp/node0").unwrap();

    sink.report(X_FORMAT, &("abc", 7));
    assert_eq!(channel.opens(), 1);
    assert!(!sink.is_open());
    assert!(sink.is_configured());
    assert_eq!(channel.output(), "");

    // Each report retries once
    sink.report(X_FORMAT, &("abc", 7));
    assert_eq!(channel.opens(), 2);

    // Reader shows up
    channel.log.lock().unwrap().refuse_open = false;
    sink.report(X_FORMAT, &("def", 8));
    assert_eq!(channel.opens(), 3);
    assert!(sink.is_open());
    assert_eq!(channel.output(), "x_event:def:8\n");
}

#[test]
fn test_write_failure_resets_handle() {
    let (sink, channel) = memory_sink();
    sink.configure("/tmp/node0").unwrap();

    sink.report(X_FORMAT, &("first", 1));
    assert!(sink.is_open());
    assert_eq!(channel.opens(), 1);

    channel.log.lock().unwrap().fail_writes = 1;
    sink.report(X_FORMAT, &("lost", 2));
    assert!(!sink.is_open());
    assert!(sink.is_configured());
    assert_eq!(channel.opens(), 1);

    sink.report(X_FORMAT, &("third", 3));
    assert_eq!(channel.opens(), 2);
    assert!(sink.is_open());
    assert_eq!(channel.output(), "x_event:first:1\nx_event:third:3\n");
}

#[test]
fn test_short_write_resets_handle() {
    let (sink, channel) = memory_sink();
    sink.configure("/tmp/node0").unwrap();

    channel.log.lock().unwrap().short_writes = 1;
    sink.report(X_FORMAT, &("partial", 1));
    assert!(!sink.is_open());
    // Only the half that landed; no retry of the rest
    assert_eq!(channel.output(), "x_event:p");

    sink.report(X_FORMAT, &("whole", 2));
    assert_eq!(channel.opens(), 2);
    assert!(channel.output().ends_with("x_event:whole:2\n"));
}

#[test]
fn test_oversized_line_dropped() {
    let (sink, channel) = memory_sink();
    sink.configure("/tmp/node0").unwrap();

    let big = "a".repeat(MAX_LINE_LEN);
    sink.report(X_FORMAT, &(&big, 1));
    assert_eq!(channel.output(), "");
    // Nothing was written, so the channel stays open
    assert!(sink.is_open());

    // Exactly at the limit still goes out
    let fits = "a".repeat(MAX_LINE_LEN - "x_event::1\n".len());
    sink.report(X_FORMAT, &(&fits, 1));
    sink.report(X_FORMAT, &("b", 2));
    assert_eq!(channel.output(), format!("x_event:{}:1\nx_event:b:2\n", fits));
    assert_eq!(channel.opens(), 1);
}

#[test]
fn test_close_releases_handle() {
    let (sink, channel) = memory_sink();
    assert!(!sink.close());

    sink.configure("/tmp/node0").unwrap();
    sink.report(X_FORMAT, &("a", 1));
    assert!(sink.close());
    assert!(!sink.is_open());
    assert!(sink.is_configured());

    sink.report(X_FORMAT, &("b", 2));
    assert_eq!(channel.opens(), 2);
    assert_eq!(channel.output(), "x_event:a:1\nx_event:b:2\n");
}

#[test]
fn test_concurrent_reports_keep_lines_whole() {
    let (sink, channel) = memory_sink();
    channel.log.lock().unwrap().trickle = true;
    sink.configure("/tmp/node0").unwrap();
    let sink = Arc::new(sink);

    let threads: Vec<_> = (0..8)
        .map(|t| {
            let sink = sink.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    let name = format!("thread{}", t);
                    sink.report(X_FORMAT, &(&name, i));
                }
            })
        })
        .collect();
    for handle in threads {
        handle.join().unwrap();
    }

    let output = channel.output();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 8 * 50);
    for line in lines {
        let fields: Vec<&str> = line.split(':').collect();
        assert_eq!(fields.len(), 3, "malformed line {:?}", line);
        assert_eq!(fields[0], "x_event");
        assert!(fields[1].starts_with("thread"));
        assert!(fields[2].parse::<u32>().is_ok());
    }
    assert_eq!(channel.opens(), 1);
}

#[test]
#[should_panic(expected = "out of range")]
fn test_position_mismatch_panics() {
    let (sink, _channel) = memory_sink();
    sink.configure("/tmp/node0").unwrap();
    // Registered with positions [0, 1], called with one argument
    sink.report(X_FORMAT, &("abc",));
}

#[test]
#[should_panic(expected = "out of range")]
fn test_zero_args_with_positions_panics() {
    let (sink, _channel) = memory_sink();
    sink.configure("/tmp/node0").unwrap();
    sink.report(X_FORMAT, &());
}

#[test]
fn test_sink_usable_after_mismatch_panic() {
    let (sink, channel) = memory_sink();
    sink.configure("/tmp/node0").unwrap();
    let sink = Arc::new(sink);

    let poisoned = sink.clone();
    let result = thread::spawn(move || poisoned.report(X_FORMAT, &("abc",))).join();
    assert!(result.is_err());

    sink.report(X_FORMAT, &("abc", 7));
    assert_eq!(channel.output(), "x_event:abc:7\n");
}
