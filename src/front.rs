// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Formatting front-end and producer entry points.
//!
//! The manager installs a callback binding the active sink together with
//! the admitted level mask. Producers format into a stack buffer and hand
//! the bytes over; between teardown and the next setup no callback is
//! installed and every emit is a no-op.

use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use chrono::Local;

use crate::level::{Level, LevelMask};

/// Stack buffer size for one formatted record.
pub const LOG_STACK_BUFFER_SIZE: usize = 2048;

const SITE_FILE_MAX: usize = 18;
const SITE_FUNC_MAX: usize = 18;
/// Body budget before the trailing "()".
const SITE_BODY_MAX: usize = SITE_FILE_MAX + 2 + SITE_FUNC_MAX;
/// Width of the `file::func()` field in the record prefix.
const SITE_WIDTH: usize = SITE_BODY_MAX + 2;

pub type LogCallback = Arc<dyn Fn(Level, &[u8]) + Send + Sync>;

static CALLBACK: RwLock<Option<LogCallback>> = RwLock::new(None);
static MASK: AtomicU32 = AtomicU32::new(0);

/// Bind the producer path to a sink. Called by the manager once the sink
/// is up.
pub(crate) fn install(callback: LogCallback, mask: LevelMask) {
    *CALLBACK.write().unwrap() = Some(callback);
    MASK.store(mask.bits(), Ordering::Release);
}

/// Detach the producer path. Emits become no-ops until the next install.
pub(crate) fn clear() {
    MASK.store(LevelMask::EMPTY.bits(), Ordering::Release);
    *CALLBACK.write().unwrap() = None;
}

fn current_mask() -> LevelMask {
    LevelMask::from_bits(MASK.load(Ordering::Acquire))
}

/// Hand an already-formatted record to the active sink. Records outside
/// the level mask are rejected here, before any other work.
pub fn emit(level: Level, msg: &[u8]) {
    if !current_mask().admits(level) {
        return;
    }

    if let Some(callback) = CALLBACK.read().unwrap().as_ref() {
        callback(level, msg);
    }
}

/// Format a record with the standard prefix and emit it.
///
/// The prefix is `timestamp.millis tid file::func() line L:` with the
/// call-site field held to a fixed width. Everything is assembled in a
/// stack buffer; output past the buffer end is truncated silently.
pub fn emit_formatted(level: Level, file: &str, func: &str, line: u32, args: fmt::Arguments) {
    if !current_mask().admits(level) {
        return;
    }

    let mut buf = [0u8; LOG_STACK_BUFFER_SIZE];
    let record = format_record(&mut buf, level, file, func, line, args);
    emit(level, record);
}

/// Byte-slice writer that truncates silently instead of failing.
struct SliceWriter<'a> {
    buf: &'a mut [u8],
    used: usize,
}

impl<'a> SliceWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, used: 0 }
    }

    fn used(&self) -> usize {
        self.used
    }

    /// Replace the last `tail.len()` written bytes, used for the `...`
    /// elision sentinel.
    fn overwrite_tail(&mut self, tail: &[u8]) {
        if self.used >= tail.len() {
            self.buf[self.used - tail.len()..self.used].copy_from_slice(tail);
        }
    }

    fn into_str(self) -> &'a str {
        let SliceWriter { buf, used } = self;
        std::str::from_utf8(&buf[..used]).unwrap_or("")
    }
}

impl fmt::Write for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.buf.len() - self.used;
        let n = s.len().min(room);
        self.buf[self.used..self.used + n].copy_from_slice(&s.as_bytes()[..n]);
        self.used += n;
        Ok(())
    }
}

fn truncate_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Build the `file::func()` field, at most [`SITE_WIDTH`] bytes.
///
/// The file keeps its base name without extension and the function keeps
/// its final path segment. When the pair overflows the shared budget the
/// file side may borrow slack from a short function name, and the tail is
/// elided with `...`.
fn format_call_site<'a>(file: &str, func: &str, out: &'a mut [u8; SITE_WIDTH]) -> &'a str {
    let name = file.rsplit('/').next().unwrap_or(file);
    let name = name.split('.').next().unwrap_or(name);
    let func = func.rsplit("::").next().unwrap_or(func);

    let mut w = SliceWriter::new(out);

    if name.len() + func.len() <= SITE_FILE_MAX + SITE_FUNC_MAX {
        let _ = write!(w, "{}::{}()", name, func);
    } else {
        let mut file_budget = SITE_FILE_MAX;
        if func.len() < SITE_FUNC_MAX {
            file_budget += SITE_FUNC_MAX - func.len();
        }
        let name_cut = truncate_str(name, file_budget);
        let _ = write!(w, "{}::", name_cut);

        let func_cut = truncate_str(func, SITE_BODY_MAX - w.used());
        let _ = w.write_str(func_cut);

        if name_cut.len() + 2 + func.len() > SITE_BODY_MAX {
            w.overwrite_tail(b"...");
        }
        let _ = w.write_str("()");
    }

    w.into_str()
}

pub(crate) fn format_record<'a>(
    buf: &'a mut [u8],
    level: Level,
    file: &str,
    func: &str,
    line: u32,
    args: fmt::Arguments,
) -> &'a [u8] {
    let mut site_buf = [0u8; SITE_WIDTH];
    let site = format_call_site(file, func, &mut site_buf);

    let mut out = SliceWriter::new(buf);
    let _ = write!(
        out,
        "{} {:05} {:>width$} {:04} {}: ",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        thread_id(),
        site,
        line,
        level.initial(),
        width = SITE_WIDTH
    );
    let _ = out.write_fmt(args);

    let used = out.used();
    &buf[..used]
}

/// Kernel thread id on Linux, a stable per-thread hash elsewhere.
fn thread_id() -> u32 {
    #[cfg(target_os = "linux")]
    {
        unsafe { libc::gettid() as u32 }
    }
    #[cfg(not(target_os = "linux"))]
    {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        std::thread::current().id().hash(&mut hasher);
        hasher.finish() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(file: &str, func: &str) -> String {
        let mut buf = [0u8; SITE_WIDTH];
        format_call_site(file, func, &mut buf).to_string()
    }

    #[test]
    fn test_call_site_short() {
        assert_eq!(site("worker.rs", "relaylog::pipeline"), "worker::pipeline()");
        assert_eq!(site("src/sink/file.rs", "file"), "file::file()");
    }

    #[test]
    fn test_call_site_strips_extension_and_path() {
        assert_eq!(site("/a/b/c/queue.rs", "drain"), "queue::drain()");
    }

    #[test]
    fn test_call_site_elides_long_pair() {
        let long_file = "an_extremely_long_source_file_name.rs";
        let long_func = "a_function_with_a_long_name";
        let body = site(long_file, long_func);

        assert!(body.len() <= SITE_WIDTH);
        assert!(body.ends_with("...()"));
        assert!(body.starts_with("an_extremely_long_"));
    }

    #[test]
    fn test_call_site_short_func_lends_budget() {
        let long_file = "an_extremely_long_source_file_name.rs";
        let body = site(long_file, "go");

        // 16 characters of slack move from the function to the file side
        assert!(body.starts_with("an_extremely_long_source_file_name"));
        assert!(body.ends_with("::go()"));
    }

    #[test]
    fn test_format_record_prefix_shape() {
        let mut buf = [0u8; LOG_STACK_BUFFER_SIZE];
        let record = format_record(
            &mut buf,
            Level::Info,
            "front.rs",
            "relaylog::front",
            42,
            format_args!("hello {}", "world"),
        );
        let text = std::str::from_utf8(record).unwrap();

        assert!(text.ends_with(" 0042 I: hello world"), "got: {}", text);
        assert!(text.contains("front::front()"));
        // timestamp with millisecond suffix up front
        let (date, _) = text.split_once(' ').unwrap();
        assert_eq!(date.len(), 10);
    }

    #[test]
    fn test_format_record_truncates_at_buffer() {
        let mut buf = [0u8; LOG_STACK_BUFFER_SIZE];
        let huge = "x".repeat(3 * LOG_STACK_BUFFER_SIZE);
        let record = format_record(
            &mut buf,
            Level::Warn,
            "front.rs",
            "front",
            1,
            format_args!("{}", huge),
        );
        assert_eq!(record.len(), LOG_STACK_BUFFER_SIZE);
    }

}
