//! File-backed persistence for a [`Registry`].
//!
//! The on-disk format is one `key = value` record per line. Records are
//! written in registration order; on load both the compact (`key=value`)
//! and spaced (`key = value`) forms are accepted, because the file is
//! machine-written but hand-edited by operators.

use crate::{
    diag::{DiagnosticSink, Severity, TracingSink},
    error::{Result, StoreError},
    registry::Registry,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Loads and saves a [`Registry`]'s values through a backing text file.
///
/// Parse-level problems (unknown keys, bad values) are reported through
/// the diagnostic sink and never crash the owning program; only a file
/// that cannot be opened, or a malformed separator, surfaces as an `Err`.
///
/// All `Add` registrations must happen before [`load`](Self::load): values
/// for keys that are not yet registered are dropped as unknown.
pub struct FileStore {
    /// Path to the backing file
    path: PathBuf,
    /// Where load/save diagnostics go
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl FileStore {
    /// Create a store for `path` without touching the file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_diagnostics(path, Arc::new(TracingSink))
    }

    /// Create a store reporting through a caller-supplied sink.
    pub fn with_diagnostics(path: impl Into<PathBuf>, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            path: path.into(),
            diagnostics,
        }
    }

    /// Create a store and immediately load `registry` from the file.
    ///
    /// The "load on construction" form: problems are reported through the
    /// sink only, and the registry keeps its registration defaults when
    /// the file cannot be read. Callers that register bindings after
    /// construction must use [`new`](Self::new) and load explicitly.
    pub fn open(path: impl Into<PathBuf>, registry: &Registry) -> Self {
        let store = Self::new(path);
        // Failures were already reported through the sink.
        let _ = store.load(registry);
        store
    }

    /// Path to the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the backing file and apply matching values into `registry`.
    ///
    /// Unknown keys and unparseable values are diagnostics, not errors;
    /// records applied before a malformed separator stay applied.
    ///
    /// # Errors
    /// [`StoreError::FileOpen`] if the file cannot be read (the registry
    /// is left untouched), [`StoreError::Separator`] if a key token is not
    /// followed by `=` (the remainder of the file is ignored).
    pub fn load(&self, registry: &Registry) -> Result<()> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(source) => {
                self.emit(Severity::Error, || {
                    format!(
                        "cannot open configuration file `{}`: {source}",
                        self.path.display()
                    )
                });
                return Err(StoreError::FileOpen {
                    path: self.path.display().to_string(),
                    source,
                });
            }
        };

        let applied = self.apply(&contents, registry)?;

        info!(
            count = applied,
            path = %self.path.display(),
            "loaded configuration file"
        );

        Ok(())
    }

    /// Run the record state machine over `text`, returning how many values
    /// were applied.
    fn apply(&self, text: &str, registry: &Registry) -> Result<usize> {
        let mut cursor = Cursor::new(text);
        let mut applied = 0;

        while let Some(key) = cursor.next_key() {
            if !cursor.take_separator() {
                // Hard abort: a corrupted file must not be misread as a
                // sequence of unrelated bare tokens.
                self.emit(Severity::Warning, || {
                    format!(
                        "malformed separator after key `{key}` in file `{}`; ignoring the rest of the file",
                        self.path.display()
                    )
                });
                return Err(StoreError::Separator {
                    path: self.path.display().to_string(),
                    key: key.to_string(),
                });
            }

            let value = cursor.rest_of_line();

            match registry.lookup(key) {
                Some(item) => match item.parse(value) {
                    Ok(()) => applied += 1,
                    Err(err) => {
                        self.emit(Severity::Warning, || {
                            format!(
                                "invalid value for key `{key}` in file `{}`: {err}; keeping previous value",
                                self.path.display()
                            )
                        });
                    }
                },
                None => {
                    self.emit(Severity::Notice, || {
                        format!(
                            "unknown configuration key `{key}` in file `{}`",
                            self.path.display()
                        )
                    });
                }
            }
        }

        Ok(applied)
    }

    /// Write every binding as `<key> = <value>\r\n` in registration order.
    ///
    /// Writes to a caller-supplied sink without touching the backing file,
    /// so the formatting path can be exercised without filesystem access.
    ///
    /// # Errors
    /// Returns any error from the underlying writer.
    pub fn save_to<W: io::Write>(&self, registry: &Registry, writer: &mut W) -> Result<()> {
        for item in registry.items() {
            write!(writer, "{} = {}\r\n", item.name(), item.format())?;
        }

        Ok(())
    }

    /// Serialize `registry` into the backing file, replacing its content.
    ///
    /// The whole body is buffered first and written in a single call, so
    /// the file handle never outlives the write and a formatting problem
    /// cannot leave a half-written file behind.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the file cannot be written.
    pub fn save(&self, registry: &Registry) -> Result<()> {
        let mut body = Vec::new();
        self.save_to(registry, &mut body)?;

        fs::write(&self.path, body)?;

        info!(
            count = registry.len(),
            path = %self.path.display(),
            "saved configuration file"
        );

        Ok(())
    }

    /// Emit a diagnostic, formatting the message only if the sink wants it.
    fn emit(&self, severity: Severity, message: impl FnOnce() -> String) {
        if self.diagnostics.enabled(severity) {
            self.diagnostics.write(severity, &message());
        }
    }
}

/// Token-aware scanner over the file text.
///
/// Records are line-oriented, but key/separator scanning crosses line
/// boundaries the way stream extraction would, so a key token left without
/// an `=` is detected even when the `=` candidate sits on the next line.
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self, ch: char) {
        self.pos += ch.len_utf8();
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.bump(ch);
        }
    }

    fn skip_inline_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch != ' ' && ch != '\t' {
                break;
            }
            self.bump(ch);
        }
    }

    /// Next key token; stops at whitespace or `=` so the compact form
    /// splits correctly. `None` means clean end of input.
    fn next_key(&mut self) -> Option<&'a str> {
        self.skip_whitespace();

        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '=' {
                break;
            }
            self.bump(ch);
        }

        if self.pos == start {
            None
        } else {
            Some(&self.text[start..self.pos])
        }
    }

    /// Consume the `=` separator, tolerating whitespace around it.
    /// Returns `false` when the next non-whitespace character is not `=`
    /// (or the input ends first).
    fn take_separator(&mut self) -> bool {
        self.skip_whitespace();

        if self.peek() == Some('=') {
            self.bump('=');
            self.skip_inline_whitespace();
            true
        } else {
            false
        }
    }

    /// The value: the rest of the physical line, excluding the line
    /// terminator and a trailing carriage return. May be empty.
    fn rest_of_line(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.bump(ch);
        }

        let line = &self.text[start..self.pos];

        if self.peek() == Some('\n') {
            self.bump('\n');
        }

        line.strip_suffix('\r').unwrap_or(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueError;
    use crate::value::ConfigValue;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Sink capturing every diagnostic for later assertions.
    #[derive(Default)]
    struct RecordingSink {
        messages: Mutex<Vec<(Severity, String)>>,
    }

    impl RecordingSink {
        fn count(&self, severity: Severity) -> usize {
            self.messages
                .lock()
                .expect("lock recorded diagnostics")
                .iter()
                .filter(|(s, _)| *s == severity)
                .count()
        }

        fn last(&self) -> Option<(Severity, String)> {
            self.messages
                .lock()
                .expect("lock recorded diagnostics")
                .last()
                .cloned()
        }
    }

    impl DiagnosticSink for RecordingSink {
        fn enabled(&self, _severity: Severity) -> bool {
            true
        }

        fn write(&self, severity: Severity, message: &str) {
            self.messages
                .lock()
                .expect("lock recorded diagnostics")
                .push((severity, message.to_string()));
        }
    }

    fn store_for(text: &str) -> (TempDir, FileStore, Arc<RecordingSink>) {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("settings.cfg");
        fs::write(&path, text).expect("write settings file");

        let sink = Arc::new(RecordingSink::default());
        let store = FileStore::with_diagnostics(path, Arc::clone(&sink) as Arc<dyn DiagnosticSink>);
        (dir, store, sink)
    }

    #[test]
    fn test_load_spaced_and_compact_forms() {
        for text in ["a=5\r\n", "a = 5\r\n", "a   =   5\r\n", "a= 5\r\n", "a =5\r\n"] {
            let (_dir, store, _sink) = store_for(text);
            let mut registry = Registry::new();
            let a = registry.bind("a", 0_i32);

            store.load(&registry).expect("load well-formed file");
            assert_eq!(*a.read().expect("read a"), 5, "input: {text:?}");
        }
    }

    #[test]
    fn test_load_accepts_lf_only_lines() {
        let (_dir, store, _sink) = store_for("a = 1\nb = 2\n");
        let mut registry = Registry::new();
        let a = registry.bind("a", 0_i32);
        let b = registry.bind("b", 0_i32);

        store.load(&registry).expect("load LF-only file");
        assert_eq!(*a.read().expect("read a"), 1);
        assert_eq!(*b.read().expect("read b"), 2);
    }

    #[test]
    fn test_load_preserves_embedded_whitespace_in_strings() {
        let (_dir, store, _sink) = store_for("greeting = hello  world\r\n");
        let mut registry = Registry::new();
        let greeting = registry.bind("greeting", String::new());

        store.load(&registry).expect("load file");
        assert_eq!(*greeting.read().expect("read greeting"), "hello  world");
    }

    #[test]
    fn test_load_empty_value() {
        let (_dir, store, _sink) = store_for("name =\r\nport = 7\r\n");
        let mut registry = Registry::new();
        let name = registry.bind("name", "default".to_string());
        let port = registry.bind("port", 0_u16);

        store.load(&registry).expect("load file");
        assert_eq!(*name.read().expect("read name"), "");
        assert_eq!(*port.read().expect("read port"), 7);
    }

    #[test]
    fn test_unknown_key_is_non_fatal() {
        let (_dir, store, sink) = store_for("unknownkey = 1\r\na = 5\r\n");
        let mut registry = Registry::new();
        let a = registry.bind("a", 0_i32);

        store.load(&registry).expect("load despite unknown key");

        assert_eq!(*a.read().expect("read a"), 5);
        assert_eq!(sink.count(Severity::Notice), 1);
        let (severity, message) = sink.last().expect("recorded diagnostic");
        assert_eq!(severity, Severity::Notice);
        assert!(message.contains("unknownkey"));
    }

    #[test]
    fn test_missing_separator_at_end_of_stream_aborts() {
        let (_dir, store, _sink) = store_for("a\r\n");
        let mut registry = Registry::new();
        let a = registry.bind("a", 42_i32);

        let result = store.load(&registry);
        assert!(matches!(result, Err(StoreError::Separator { .. })));
        assert_eq!(*a.read().expect("read a"), 42);
    }

    #[test]
    fn test_garbage_separator_aborts_remainder() {
        let (_dir, store, sink) = store_for("a foo\r\nb = 2\r\n");
        let mut registry = Registry::new();
        let a = registry.bind("a", 0_i32);
        let b = registry.bind("b", 0_i32);

        let result = store.load(&registry);
        assert!(matches!(result, Err(StoreError::Separator { .. })));

        // Neither record applied; one warning for operability.
        assert_eq!(*a.read().expect("read a"), 0);
        assert_eq!(*b.read().expect("read b"), 0);
        assert_eq!(sink.count(Severity::Warning), 1);
    }

    #[test]
    fn test_records_before_separator_abort_stay_applied() {
        let (_dir, store, _sink) = store_for("a = 1\r\nb\r\nc = 3\r\n");
        let mut registry = Registry::new();
        let a = registry.bind("a", 0_i32);
        let b = registry.bind("b", 0_i32);
        let c = registry.bind("c", 0_i32);

        let result = store.load(&registry);
        assert!(matches!(result, Err(StoreError::Separator { .. })));

        assert_eq!(*a.read().expect("read a"), 1);
        assert_eq!(*b.read().expect("read b"), 0);
        assert_eq!(*c.read().expect("read c"), 0);
    }

    #[test]
    fn test_invalid_value_warns_and_keeps_previous() {
        let (_dir, store, sink) = store_for("port = not-a-number\r\nhost = example.com\r\n");
        let mut registry = Registry::new();
        let port = registry.bind("port", 8080_u16);
        let host = registry.bind("host", "localhost".to_string());

        store.load(&registry).expect("bad value is not fatal");

        assert_eq!(*port.read().expect("read port"), 8080);
        assert_eq!(*host.read().expect("read host"), "example.com");
        assert_eq!(sink.count(Severity::Warning), 1);
    }

    #[test]
    fn test_load_nonexistent_file_fails_and_keeps_values() {
        let dir = TempDir::new().expect("create temp dir");
        let sink = Arc::new(RecordingSink::default());
        let store = FileStore::with_diagnostics(
            dir.path().join("missing.cfg"),
            Arc::clone(&sink) as Arc<dyn DiagnosticSink>,
        );

        let mut registry = Registry::new();
        let x = registry.bind("x", 42_i32);

        let result = store.load(&registry);
        assert!(matches!(result, Err(StoreError::FileOpen { .. })));
        assert_eq!(sink.count(Severity::Error), 1);
        assert_eq!(*x.read().expect("read x"), 42);
    }

    #[test]
    fn test_save_to_writes_registration_order() {
        let mut registry = Registry::new();
        let _port = registry.bind("port", 8080_u16);
        let _host = registry.bind("host", "localhost".to_string());
        let _debug = registry.bind("debug", false);

        // Lookups must not disturb save order.
        let _ = registry.lookup("debug");
        let _ = registry.lookup("host");

        let store = FileStore::new("unused.cfg");
        let mut out = Vec::new();
        store.save_to(&registry, &mut out).expect("save to buffer");

        assert_eq!(
            String::from_utf8(out).expect("utf-8 output"),
            "port = 8080\r\nhost = localhost\r\ndebug = false\r\n"
        );
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("settings.cfg");

        let mut registry = Registry::new();
        let count = registry.bind("count", 0_i64);
        let ratio = registry.bind("ratio", 0.0_f64);
        let label = registry.bind("label", String::new());
        let active = registry.bind("active", false);

        *count.write().expect("write count") = -123_456;
        *ratio.write().expect("write ratio") = 0.125;
        *label.write().expect("write label") = "two words".to_string();
        *active.write().expect("write active") = true;

        let store = FileStore::new(&path);
        store.save(&registry).expect("save registry");

        // Identically shaped fresh registry.
        let mut fresh = Registry::new();
        let count2 = fresh.bind("count", 0_i64);
        let ratio2 = fresh.bind("ratio", 0.0_f64);
        let label2 = fresh.bind("label", String::new());
        let active2 = fresh.bind("active", false);

        FileStore::new(&path).load(&fresh).expect("load saved file");

        assert_eq!(*count2.read().expect("read count"), -123_456);
        assert!((*ratio2.read().expect("read ratio") - 0.125).abs() < f64::EPSILON);
        assert_eq!(*label2.read().expect("read label"), "two words");
        assert!(*active2.read().expect("read active"));
    }

    #[test]
    fn test_save_truncates_previous_content() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("settings.cfg");
        fs::write(&path, "stale = 1\r\nstale2 = 2\r\nstale3 = 3\r\n").expect("write stale file");

        let mut registry = Registry::new();
        let _a = registry.bind("a", 1_i32);

        FileStore::new(&path).save(&registry).expect("save registry");

        let contents = fs::read_to_string(&path).expect("read saved file");
        assert_eq!(contents, "a = 1\r\n");
    }

    #[test]
    fn test_open_loads_immediately() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("settings.cfg");
        fs::write(&path, "port = 9000\r\n").expect("write settings file");

        let mut registry = Registry::new();
        let port = registry.bind("port", 8080_u16);

        let store = FileStore::open(&path, &registry);
        assert_eq!(*port.read().expect("read port"), 9000);
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn test_open_missing_file_keeps_defaults() {
        let dir = TempDir::new().expect("create temp dir");

        let mut registry = Registry::new();
        let port = registry.bind("port", 8080_u16);

        let _store = FileStore::open(dir.path().join("missing.cfg"), &registry);
        assert_eq!(*port.read().expect("read port"), 8080);
    }

    /// Output framing for user enums bound through `ConfigValue`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum OutputFormat {
        Plain,
        Json,
    }

    impl ConfigValue for OutputFormat {
        fn parse_text(text: &str) -> std::result::Result<Self, ValueError> {
            match text.trim() {
                "plain" => Ok(Self::Plain),
                "json" => Ok(Self::Json),
                _ => Err(ValueError::new::<OutputFormat>(text)),
            }
        }

        fn format_text(&self) -> String {
            match self {
                Self::Plain => "plain".to_string(),
                Self::Json => "json".to_string(),
            }
        }
    }

    #[test]
    fn test_user_enum_round_trips() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("settings.cfg");

        let mut registry = Registry::new();
        let format = registry.bind("format", OutputFormat::Plain);
        *format.write().expect("write format") = OutputFormat::Json;

        let store = FileStore::new(&path);
        store.save(&registry).expect("save registry");

        let mut fresh = Registry::new();
        let format2 = fresh.bind("format", OutputFormat::Plain);
        store.load(&fresh).expect("load saved file");

        assert_eq!(*format2.read().expect("read format"), OutputFormat::Json);
    }
}
