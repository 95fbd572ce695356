// Logging - injected sinks for the resource manager
//
// Every wrapper receives a Logger at construction instead of reaching for a
// process-wide instance. Sinks decide where the lines end up.

use log::{Level, LevelFilter};
use parking_lot::Mutex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Destination for formatted log lines
pub trait LogSink: Send + Sync {
    fn write(&self, level: Level, args: fmt::Arguments<'_>);
}

/// Forwards to the `log` facade (env_logger in the binary)
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write(&self, level: Level, args: fmt::Arguments<'_>) {
        log::log!(target: "vk_walkthrough", level, "{}", args);
    }
}

/// Writes `[LEVEL]: message` lines to a file, flushed per line
pub struct FileSink {
    path: PathBuf,
    file: Mutex<Option<BufWriter<File>>>,
}

impl FileSink {
    /// Open (and truncate) the log file
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        Ok(Self {
            path,
            file: Mutex::new(Some(BufWriter::new(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the file. Later writes are dropped.
    pub fn close(&self) {
        if let Some(mut file) = self.file.lock().take() {
            let _ = file.flush();
        }
    }
}

impl LogSink for FileSink {
    fn write(&self, level: Level, args: fmt::Arguments<'_>) {
        let mut guard = self.file.lock();
        if let Some(file) = guard.as_mut() {
            let _ = writeln!(file, "[{}]: {}", level_tag(level), args);
            let _ = file.flush();
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        self.close();
    }
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// Cheap-to-clone handle passed into every wrapper
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    max_level: LevelFilter,
}

impl Logger {
    pub fn new<S: LogSink + 'static>(sink: S) -> Self {
        Self::from_arc(Arc::new(sink))
    }

    pub fn from_arc(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            max_level: LevelFilter::Info,
        }
    }

    pub fn console() -> Self {
        Self::new(ConsoleSink)
    }

    pub fn with_max_level(mut self, max_level: LevelFilter) -> Self {
        self.max_level = max_level;
        self
    }

    pub fn max_level(&self) -> LevelFilter {
        self.max_level
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if level <= self.max_level {
            self.sink.write(level, args);
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("max_level", &self.max_level)
            .finish_non_exhaustive()
    }
}

macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log(::log::Level::Info, format_args!($($arg)+))
    };
}

macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log(::log::Level::Warn, format_args!($($arg)+))
    };
}

macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log(::log::Level::Error, format_args!($($arg)+))
    };
}
