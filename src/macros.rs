// SPDX-License-Identifier: Apache-2.0 OR MIT
// Producer macros capturing the call site

/// Log a formatted message at Verbose severity
///
/// # Examples
/// ```ignore
/// log_verbose!("polling {} descriptors", n);
/// ```
#[macro_export]
macro_rules! log_verbose {
    ($($arg:tt)*) => {
        $crate::front::emit_formatted(
            $crate::Level::Verbose,
            file!(),
            module_path!(),
            line!(),
            format_args!($($arg)*),
        )
    };
}

/// Log a formatted message at Debug severity
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::front::emit_formatted(
            $crate::Level::Debug,
            file!(),
            module_path!(),
            line!(),
            format_args!($($arg)*),
        )
    };
}

/// Log a formatted message at Info severity
///
/// # Examples
/// ```ignore
/// log_info!("worker {} started", id);
/// ```
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::front::emit_formatted(
            $crate::Level::Info,
            file!(),
            module_path!(),
            line!(),
            format_args!($($arg)*),
        )
    };
}

/// Log a formatted message at Warn severity
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::front::emit_formatted(
            $crate::Level::Warn,
            file!(),
            module_path!(),
            line!(),
            format_args!($($arg)*),
        )
    };
}

/// Log a formatted message at Error severity
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::front::emit_formatted(
            $crate::Level::Error,
            file!(),
            module_path!(),
            line!(),
            format_args!($($arg)*),
        )
    };
}

/// Log a formatted message at Fatal severity. With a file-backed sink the
/// process does not return from this.
#[macro_export]
macro_rules! log_fatal {
    ($($arg:tt)*) => {
        $crate::front::emit_formatted(
            $crate::Level::Fatal,
            file!(),
            module_path!(),
            line!(),
            format_args!($($arg)*),
        )
    };
}

/// Log through a [`RateLimitedLog`](crate::RateLimitedLog) gate
///
/// # Examples
/// ```ignore
/// rate_limited_log!(gate, Level::Warn, "queue at {}%", pct);
/// ```
#[macro_export]
macro_rules! rate_limited_log {
    ($gate:expr, $level:expr, $($arg:tt)*) => {
        if $gate.check() {
            $crate::front::emit_formatted(
                $level,
                file!(),
                module_path!(),
                line!(),
                format_args!($($arg)*),
            )
        }
    };
}
