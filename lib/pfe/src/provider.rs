// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Providers allow the engine to work in different contexts by letting
//! implementations of core services be plugged in. Today that is only
//! logging: the hosting framework's trace channel in production, a
//! `println!` or an in-memory record under test. If it doesn't serve
//! an obvious purpose with at least two obvious implementations, then
//! it probably doesn't need to be a provider.

use alloc::boxed::Box;
use core::fmt;
use core::fmt::Display;

cfg_if! {
    if #[cfg(any(feature = "test-help", test))] {
        use crate::ddi::sync::KMutex;
        use alloc::string::String;
        use alloc::string::ToString;
        use alloc::vec::Vec;
    }
}

/// The set of all platform-specific providers required by a filter.
pub struct Providers {
    pub log: Box<dyn LogProvider>,
}

/// A logging provider provides the means to log messages to some
/// destination based on the context in which the engine is running.
///
/// The message is handed over as [`fmt::Arguments`] so that a
/// provider which discards it never pays for formatting, and the
/// engine never allocates to produce it.
///
/// Logging levels are provided by [`LogLevel`]. These levels will map
/// to the underlying provider with varying degrees of success.
pub trait LogProvider: Send + Sync {
    /// Log a message at the specified level.
    fn log(&self, level: LogLevel, msg: fmt::Arguments<'_>);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Note,
    Warn,
    Error,
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level_s = match self {
            Self::Note => "[NOTE]",
            Self::Warn => "[WARN]",
            Self::Error => "[ERROR]",
        };
        write!(f, "{level_s}")
    }
}

#[cfg(any(feature = "std", test))]
#[derive(Clone, Copy)]
pub struct PrintlnLog;

#[cfg(any(feature = "std", test))]
impl LogProvider for PrintlnLog {
    fn log(&self, level: LogLevel, msg: fmt::Arguments<'_>) {
        println!("{level} {msg}");
    }
}

/// Drop every message.
#[derive(Clone, Copy)]
pub struct NullLog;

impl LogProvider for NullLog {
    fn log(&self, _level: LogLevel, _msg: fmt::Arguments<'_>) {}
}

/// Keep every message in memory so tests can assert on the trace
/// channel.
#[cfg(any(feature = "test-help", test))]
#[derive(Default)]
pub struct RecordLog {
    lines: alloc::sync::Arc<KMutex<Vec<(LogLevel, String)>>>,
}

#[cfg(any(feature = "test-help", test))]
impl RecordLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A second handle onto the same record, for use after the
    /// original has been moved into a [`Providers`].
    pub fn handle(&self) -> Self {
        Self { lines: self.lines.clone() }
    }

    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lines.lock().iter().map(|(_, m)| m.clone()).collect()
    }
}

#[cfg(any(feature = "test-help", test))]
impl LogProvider for RecordLog {
    fn log(&self, level: LogLevel, msg: fmt::Arguments<'_>) {
        self.lines.lock().push((level, msg.to_string()));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn record_log_shares_its_lines() {
        let log = RecordLog::new();
        let handle = log.handle();
        let providers = Providers { log: Box::new(log) };
        providers.log.log(LogLevel::Note, format_args!("one {}", 1));
        providers.log.log(LogLevel::Warn, format_args!("two"));
        assert_eq!(
            handle.lines(),
            vec![
                (LogLevel::Note, "one 1".to_string()),
                (LogLevel::Warn, "two".to_string()),
            ]
        );
    }

    #[test]
    fn level_display() {
        assert_eq!(LogLevel::Error.to_string(), "[ERROR]");
    }
}
