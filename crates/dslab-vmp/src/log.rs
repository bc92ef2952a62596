//! Logging facilities.
//!
//! Records are prefixed with the simulation tick, the level and the component name,
//! e.g. `[t=  12 INFO  scenario] reconfiguration started`. The macros accept any context
//! exposing `time()` (time unit) and `name()`, such as
//! [`SimulationContext`](crate::core::context::SimulationContext) or an optimizer context.

use atty::Stream;
use colored::{Color, ColoredString, Colorize};
use log::Level;

/// Fixed-width level label, colored if stderr (log) goes to console.
pub fn level_label(level: Level) -> ColoredString {
    let (label, color) = match level {
        Level::Error => ("ERROR", Color::Red),
        Level::Warn => ("WARN ", Color::Yellow),
        Level::Info => ("INFO ", Color::Green),
        Level::Debug => ("DEBUG", Color::Blue),
        Level::Trace => ("TRACE", Color::Cyan),
    };
    if atty::is(Stream::Stderr) {
        label.color(color)
    } else {
        label.normal()
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_tick {
    ($level:expr, $ctx:expr, $($arg:tt)+) => (
        log::log!(
            target: $ctx.name(),
            $level,
            "[t={:>4} {} {}] {}",
            $ctx.time(), $crate::log::level_label($level), $ctx.name(), format_args!($($arg)+)
        )
    );
}

/// Logs a message at the info level.
///
/// # Examples
///
/// ```rust
/// use dslab_vmp::{log_info, SimulationContext};
///
/// fn report(ctx: &SimulationContext) {
///     log_info!(ctx, "served {} requests", ctx.counters().served);
/// }
/// ```
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $($arg:tt)+) => ($crate::__log_tick!(log::Level::Info, $ctx, $($arg)+));
}

/// Logs a message at the debug level.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $($arg:tt)+) => ($crate::__log_tick!(log::Level::Debug, $ctx, $($arg)+));
}

/// Logs a message at the trace level.
#[macro_export]
macro_rules! log_trace {
    ($ctx:expr, $($arg:tt)+) => ($crate::__log_tick!(log::Level::Trace, $ctx, $($arg)+));
}

/// Logs a message at the error level.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $($arg:tt)+) => ($crate::__log_tick!(log::Level::Error, $ctx, $($arg)+));
}

/// Logs a message at the warn level.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $($arg:tt)+) => ($crate::__log_tick!(log::Level::Warn, $ctx, $($arg)+));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_have_equal_width() {
        for level in [Level::Error, Level::Warn, Level::Info, Level::Debug, Level::Trace] {
            assert_eq!(level_label(level).chars().count(), 5);
        }
    }
}
