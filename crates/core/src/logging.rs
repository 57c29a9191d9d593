//! Category/level logging for the rendering pipeline.
//!
//! The pipeline runs per-vertex and per-pixel loops, so logging must cost
//! nothing when disabled and must not flood the output when enabled on a hot
//! path. This module provides:
//!
//! - **LogLevel**: Off < Error < Warn < Info < Debug < Trace
//! - **LogCategory**: pipeline stage that produced the message
//! - **LogConfig**: global, lock-free level table with a per-category override,
//!   a per-second rate limiter and an optional background file writer
//! - **log()**: lazily formats the message only when it will be emitted
//!
//! # Usage
//!
//! ```rust
//! use prism_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Raster, LogLevel::Trace, || {
//!     format!("skipping degenerate triangle at index {}", 42)
//! });
//! ```

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

/// Pipeline stage a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Draw call dispatch, primitive assembly, vertex fetch
    Pipeline,
    /// Homogeneous clipping
    Clip,
    /// Triangle/line/point filling
    Raster,
    /// Shader unit binding and execution
    Shader,
    /// Color/depth planes, viewport, capabilities
    Surface,
    /// Unimplemented features
    Stubs,
}

const CATEGORY_COUNT: usize = 6;

impl LogCategory {
    pub const ALL: [LogCategory; CATEGORY_COUNT] = [
        LogCategory::Pipeline,
        LogCategory::Clip,
        LogCategory::Raster,
        LogCategory::Shader,
        LogCategory::Surface,
        LogCategory::Stubs,
    ];

    fn index(self) -> usize {
        match self {
            LogCategory::Pipeline => 0,
            LogCategory::Clip => 1,
            LogCategory::Raster => 2,
            LogCategory::Shader => 3,
            LogCategory::Surface => 4,
            LogCategory::Stubs => 5,
        }
    }

    /// Parse a category name (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pipeline" => Some(LogCategory::Pipeline),
            "clip" => Some(LogCategory::Clip),
            "raster" => Some(LogCategory::Raster),
            "shader" => Some(LogCategory::Shader),
            "surface" => Some(LogCategory::Surface),
            "stubs" => Some(LogCategory::Stubs),
            _ => None,
        }
    }
}

/// Sliding one-second window per category
struct RateLimiter {
    max_per_second: AtomicUsize,
    window: Duration,
    state: Mutex<[WindowState; CATEGORY_COUNT]>,
}

#[derive(Default)]
struct WindowState {
    timestamps: VecDeque<Instant>,
    dropped: usize,
    last_drop_report: Option<Instant>,
}

impl RateLimiter {
    fn new(max_per_second: usize) -> Self {
        Self {
            max_per_second: AtomicUsize::new(max_per_second),
            window: Duration::from_secs(1),
            state: Mutex::new(Default::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, [WindowState; CATEGORY_COUNT]> {
        // A panic while holding the lock leaves the window data usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns `(allowed, dropped)` where `dropped` is set when a drop summary
    /// should be emitted
    fn should_allow(&self, category: LogCategory) -> (bool, Option<usize>) {
        let now = Instant::now();
        let mut state = self.lock();
        let slot = &mut state[category.index()];

        while let Some(&front) = slot.timestamps.front() {
            if now.duration_since(front) > self.window {
                slot.timestamps.pop_front();
            } else {
                break;
            }
        }

        if slot.timestamps.len() < self.max_per_second.load(Ordering::Relaxed) {
            slot.timestamps.push_back(now);
            if slot.dropped > 0 {
                let dropped = std::mem::take(&mut slot.dropped);
                slot.last_drop_report = Some(now);
                return (true, Some(dropped));
            }
            return (true, None);
        }

        slot.dropped += 1;
        let report_due = slot
            .last_drop_report
            .map_or(true, |last| now.duration_since(last) >= self.window);
        if report_due {
            let dropped = std::mem::take(&mut slot.dropped);
            slot.last_drop_report = Some(now);
            (false, Some(dropped))
        } else {
            (false, None)
        }
    }
}

/// Global logging configuration
pub struct LogConfig {
    global_level: AtomicU8,
    category_levels: [AtomicU8; CATEGORY_COUNT],
    log_sender: Mutex<Option<Sender<String>>>,
    file_logging_enabled: AtomicBool,
    rate_limiter: RateLimiter,
}

impl LogConfig {
    /// Everything off, 60 messages per second per category
    fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            category_levels: Default::default(),
            log_sender: Mutex::new(None),
            file_logging_enabled: AtomicBool::new(false),
            rate_limiter: RateLimiter::new(60),
        }
    }

    /// Process-wide instance
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(LogConfig::new)
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    /// Override the level for one category; `Off` falls back to the global level
    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.category_levels[category.index()].store(level as u8, Ordering::Relaxed);
    }

    pub fn get_level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.category_levels[category.index()].load(Ordering::Relaxed))
    }

    /// A category override wins when set, otherwise the global level applies
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        if level == LogLevel::Off {
            return false;
        }
        match self.get_level(category) {
            LogLevel::Off => level <= self.get_global_level(),
            category_level => level <= category_level,
        }
    }

    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        for category in LogCategory::ALL {
            self.set_level(category, LogLevel::Off);
        }
    }

    pub fn set_rate_limit(&self, max_per_second: usize) {
        self.rate_limiter
            .max_per_second
            .store(max_per_second, Ordering::Relaxed);
    }

    pub fn get_rate_limit(&self) -> usize {
        self.rate_limiter.max_per_second.load(Ordering::Relaxed)
    }

    /// Send messages to `path` through a background writer thread
    ///
    /// Replaces any previously configured file; the old writer exits once its
    /// channel is dropped.
    pub fn set_log_file(&self, path: PathBuf) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let (sender, receiver) = channel::<String>();

        thread::Builder::new()
            .name("prism-log-writer".to_string())
            .spawn(move || {
                while let Ok(message) = receiver.recv() {
                    let _ = writeln!(file, "{}", message);
                    let _ = file.flush();
                }
            })?;

        *self.sender() = Some(sender);
        self.file_logging_enabled.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Stop file logging and return to stderr
    pub fn clear_log_file(&self) {
        *self.sender() = None;
        self.file_logging_enabled.store(false, Ordering::Relaxed);
    }

    fn sender(&self) -> MutexGuard<'_, Option<Sender<String>>> {
        self.log_sender.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write_message(&self, message: String) {
        if self.file_logging_enabled.load(Ordering::Relaxed) {
            if let Some(sender) = self.sender().as_ref() {
                if let Err(unsent) = sender.send(message) {
                    eprintln!("{}", unsent.0);
                }
                return;
            }
        }
        eprintln!("{}", message);
    }
}

/// Log a message for `category` at `level`
///
/// `message_fn` only runs when the message passes both the level filter and
/// the rate limiter. Dropped messages are summarised at most once per second.
pub fn log<F>(category: LogCategory, level: LogLevel, message_fn: F)
where
    F: FnOnce() -> String,
{
    let config = LogConfig::global();
    if !config.should_log(category, level) {
        return;
    }

    let (allowed, dropped) = config.rate_limiter.should_allow(category);
    if let Some(count) = dropped.filter(|&n| n > 0) {
        config.write_message(format!(
            "[{:?}] WARNING: rate limit exceeded, {} message(s) dropped",
            category, count
        ));
    }
    if allowed {
        config.write_message(format!("[{:?}] {}", category, message_fn()));
    }
}
