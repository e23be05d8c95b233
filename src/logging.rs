//! Logging Control
//!
//! The core logs through `tracing`; this module owns the subscriber
//! installation and the runtime knobs behind the `log` builtin: message
//! level, stdout mirroring, and an optional log file. The subscriber is
//! process-global, matching the logger's role as a collaborator shared
//! by the shell and its host.
//!
//! Defaults on `init`: level INFO, stdout off, no file — quiet until a
//! host or the user asks for output. When `init` was never called (unit
//! tests, embedding hosts with their own subscriber) the setters are
//! no-ops.

use std::fs::OpenOptions;
use std::io;
use std::sync::{Mutex, OnceLock};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, Registry};

#[derive(Default)]
struct SinkState {
    stdout: bool,
    file: Option<std::fs::File>,
}

/// Shared log sink: every formatted event is written to the enabled
/// destinations at the moment it fires.
#[derive(Default)]
pub struct LogSink {
    state: Mutex<SinkState>,
}

pub struct SinkWriter(&'static LogSink);

impl io::Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.0.state.lock().unwrap();
        if state.stdout {
            let _ = io::stdout().write_all(buf);
        }
        if let Some(file) = state.file.as_mut() {
            let _ = file.write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.0.state.lock().unwrap();
        if state.stdout {
            let _ = io::stdout().flush();
        }
        if let Some(file) = state.file.as_mut() {
            let _ = file.flush();
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for &'static LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter(self)
    }
}

struct LogControl {
    handle: reload::Handle<LevelFilter, Registry>,
    sink: &'static LogSink,
}

static CONTROL: OnceLock<LogControl> = OnceLock::new();

/// Install the global subscriber. Safe to call once per process;
/// further calls (or a pre-existing subscriber) are ignored.
pub fn init() {
    let sink: &'static LogSink = Box::leak(Box::default());
    let (filter, handle) = reload::Layer::new(LevelFilter::INFO);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(sink),
        )
        .try_init()
        .is_ok();

    if installed {
        let _ = CONTROL.set(LogControl { handle, sink });
    }
}

/// Map the shell's 0-5 level scale onto a tracing filter and apply it.
/// 0 is the most verbose; 5 keeps only the most severe messages.
pub fn set_level(level: u8) {
    let Some(control) = CONTROL.get() else { return };
    let filter = match level {
        0 => LevelFilter::TRACE,
        1 => LevelFilter::DEBUG,
        2 => LevelFilter::INFO,
        3 => LevelFilter::WARN,
        _ => LevelFilter::ERROR,
    };
    if control.handle.reload(filter).is_err() {
        tracing::warn!("log level reload failed");
    }
}

/// Enable or disable mirroring log output to stdout.
pub fn set_stdout(enabled: bool) {
    let Some(control) = CONTROL.get() else { return };
    control.sink.state.lock().unwrap().stdout = enabled;
}

/// Append log output to `path` from now on.
pub fn set_file(path: &str) -> io::Result<()> {
    let Some(control) = CONTROL.get() else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    control.sink.state.lock().unwrap().file = Some(file);
    Ok(())
}
