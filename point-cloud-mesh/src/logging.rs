/// One-line status and timing messages for the host's log callback
use std::ffi::{CString, c_char};
use std::fmt;
use std::time::Instant;

/// Host callback receiving a NUL-terminated UTF-8 line
pub type LogFn = unsafe extern "C" fn(message: *const c_char);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    Begin,
    Grid,
    Timer,
    Ok,
    Warn,
    Error,
}

impl fmt::Display for LogTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self {
            LogTag::Begin => "🔄",
            LogTag::Grid => "📦",
            LogTag::Timer => "⏱",
            LogTag::Ok => "✅",
            LogTag::Warn => "⚠️",
            LogTag::Error => "❌",
        };
        f.write_str(marker)
    }
}

/// Destination for pipeline messages.
/// Only the controlling thread writes to it; workers never log through it.
pub enum LogSink {
    Silent,
    Foreign(LogFn),
    Closure(Box<dyn Fn(&str)>),
}

impl LogSink {
    /// Wrap a possibly null foreign callback
    pub fn from_foreign(callback: Option<LogFn>) -> Self {
        match callback {
            Some(callback) => LogSink::Foreign(callback),
            None => LogSink::Silent,
        }
    }

    pub fn from_fn(f: impl Fn(&str) + 'static) -> Self {
        LogSink::Closure(Box::new(f))
    }

    /// Emit "<tag> <message>"
    pub fn log(&self, tag: LogTag, message: &str) {
        self.emit(&format!("{tag} {message}"));
    }

    /// Emit "<tag> <label> <ms> ms" with the label padded for alignment
    pub fn log_elapsed(&self, tag: LogTag, label: &str, ms: f64) {
        self.emit(&format!("{tag} {label:<20} {ms:.2} ms"));
    }

    fn emit(&self, line: &str) {
        match self {
            LogSink::Silent => {}
            LogSink::Closure(f) => f(line),
            LogSink::Foreign(callback) => {
                let line = CString::new(line.replace('\0', ""))
                    .unwrap_or_default();
                // SAFETY: the host supplied a callback taking a C string that
                // stays valid for the duration of the call.
                unsafe { callback(line.as_ptr()) };
            }
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        LogSink::Silent
    }
}

/// Emits one Timer line with the elapsed wall time when dropped.
pub struct ScopedTimer<'a> {
    label: &'static str,
    sink: &'a LogSink,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'static str, sink: &'a LogSink) -> Self {
        Self {
            label,
            sink,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        let ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!(phase = self.label, ms, "phase finished");
        self.sink.log_elapsed(LogTag::Timer, self.label, ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::ffi::CStr;
    use std::rc::Rc;
    use std::sync::Mutex;

    fn capture() -> (LogSink, Rc<RefCell<Vec<String>>>) {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let sink_lines = Rc::clone(&lines);
        let sink = LogSink::from_fn(move |line| sink_lines.borrow_mut().push(line.to_string()));
        (sink, lines)
    }

    #[test]
    fn tagged_lines() {
        let (sink, lines) = capture();
        sink.log(LogTag::Begin, "reconstruct: begin");
        sink.log_elapsed(LogTag::Timer, "Delaunay", 1.5);
        let lines = lines.borrow();
        assert_eq!(lines[0], "🔄 reconstruct: begin");
        assert_eq!(lines[1], format!("⏱ {:<20} 1.50 ms", "Delaunay"));
    }

    #[test]
    fn timer_logs_on_drop() {
        let (sink, lines) = capture();
        {
            let _t = ScopedTimer::new("bounds", &sink);
            assert!(lines.borrow().is_empty());
        }
        let lines = lines.borrow();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("⏱ bounds"));
        assert!(lines[0].ends_with(" ms"));
    }

    static FOREIGN_LINES: Mutex<Vec<String>> = Mutex::new(Vec::new());

    unsafe extern "C" fn record(message: *const c_char) {
        let line = unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned();
        FOREIGN_LINES.lock().unwrap().push(line);
    }

    #[test]
    fn foreign_callback_gets_c_strings() {
        let sink = LogSink::from_foreign(Some(record));
        sink.log(LogTag::Warn, "bad\0byte");
        let lines = FOREIGN_LINES.lock().unwrap();
        assert!(lines.iter().any(|l| l == "⚠️ badbyte"));
    }

    #[test]
    fn null_callback_is_silent() {
        let sink = LogSink::from_foreign(None);
        assert!(matches!(sink, LogSink::Silent));
        sink.log(LogTag::Ok, "nobody listens");
    }
}
