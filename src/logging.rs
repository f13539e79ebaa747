//! Injected diagnostics handle.
//!
//! Backends and the transfer manager never call the `log` macros directly.
//! They hold a [`LogSink`] given to them at construction, which forwards
//! records to a concrete [`log::Log`] implementation. By default that is the
//! process-wide logger, but callers (and tests) can hand in their own.

use log::{Level, Log, Metadata, Record};
use std::fmt;

pub const DEFAULT_TARGET: &str = "filetransfer";

#[derive(Clone, Copy)]
pub struct LogSink {
    logger: &'static dyn Log,
    target: &'static str,
}

impl LogSink {
    /// Sink forwarding to whatever logger the process installed.
    pub fn global() -> Self {
        Self::new(log::logger())
    }

    pub fn new(logger: &'static dyn Log) -> Self {
        Self {
            logger,
            target: DEFAULT_TARGET,
        }
    }

    pub fn with_target(self, target: &'static str) -> Self {
        Self { target, ..self }
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let metadata = Metadata::builder()
            .level(level)
            .target(self.target)
            .build();
        if !self.logger.enabled(&metadata) {
            return;
        }
        self.logger.log(
            &Record::builder()
                .metadata(metadata)
                .args(args)
                .module_path_static(Some(module_path!()))
                .build(),
        );
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
