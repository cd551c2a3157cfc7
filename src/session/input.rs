//! Nested input sources.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, IsTerminal};
use std::path::Path;

use tracing::debug;

use crate::error::ShellError;
use crate::Result;

/// One readable stream on the [`InputStack`].
///
/// Dropping the source releases the underlying stream (closing files).
pub struct InputSource {
    name: String,
    reader: Box<dyn BufRead + Send>,
    interactive: bool,
    primordial: bool,
    lines_read: u64,
}

impl InputSource {
    /// Wrap an arbitrary reader.
    pub fn from_reader(
        name: impl Into<String>,
        reader: impl BufRead + Send + 'static,
        interactive: bool,
    ) -> Self {
        Self {
            name: name.into(),
            reader: Box::new(reader),
            interactive,
            primordial: false,
            lines_read: 0,
        }
    }

    /// Open a script file as a non-interactive source.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ShellError::OpenInput {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(
            path.display().to_string(),
            BufReader::new(file),
            false,
        ))
    }

    /// Standard input, interactive when attached to a terminal.
    pub fn stdin() -> Self {
        let interactive = std::io::stdin().is_terminal();
        Self::from_reader("<stdin>", BufReader::new(std::io::stdin()), interactive)
    }

    /// Display name (file path or `<stdin>`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this source is a real terminal.
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Whether this is the first source pushed for the session.
    pub fn is_primordial(&self) -> bool {
        self.primordial
    }

    /// Number of lines handed out so far.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Record that a line was consumed from this source.
    pub fn note_line(&mut self) {
        self.lines_read += 1;
    }

    /// Access the underlying reader.
    pub fn reader_mut(&mut self) -> &mut (dyn BufRead + Send) {
        self.reader.as_mut()
    }
}

impl fmt::Debug for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSource")
            .field("name", &self.name)
            .field("interactive", &self.interactive)
            .field("primordial", &self.primordial)
            .field("lines_read", &self.lines_read)
            .finish_non_exhaustive()
    }
}

/// LIFO stack of nested input sources.
///
/// The stack exclusively owns every source on it. Popping releases the top
/// source before the next one becomes current.
#[derive(Debug, Default)]
pub struct InputStack {
    sources: Vec<InputSource>,
}

impl InputStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a source on top; it becomes the current read target.
    pub fn push(&mut self, mut source: InputSource, primordial: bool) {
        source.primordial = primordial;
        debug!(
            source = %source.name,
            primordial,
            interactive = source.interactive,
            depth = self.sources.len() + 1,
            "push input source"
        );
        self.sources.push(source);
    }

    /// Release the top source.
    ///
    /// Returns `true` if another source remains to continue from. Popping a
    /// primordial source drains anything beneath it and always returns
    /// `false`; callers must treat that as terminal.
    pub fn pop(&mut self) -> bool {
        let Some(top) = self.sources.pop() else {
            return false;
        };
        debug!(
            source = %top.name,
            lines = top.lines_read,
            depth = self.sources.len(),
            "pop input source"
        );
        let primordial = top.primordial;
        drop(top);

        if primordial {
            self.clear();
            return false;
        }
        !self.sources.is_empty()
    }

    /// The active source, if any.
    pub fn current(&self) -> Option<&InputSource> {
        self.sources.last()
    }

    /// The active source, mutably.
    pub fn current_mut(&mut self) -> Option<&mut InputSource> {
        self.sources.last_mut()
    }

    /// Number of sources on the stack.
    pub fn depth(&self) -> usize {
        self.sources.len()
    }

    /// Check if the stack holds no sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Release every source, top first.
    pub fn clear(&mut self) {
        while let Some(source) = self.sources.pop() {
            debug!(source = %source.name, "release input source");
        }
    }
}

impl Drop for InputStack {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn source(name: &str) -> InputSource {
        InputSource::from_reader(name, Cursor::new(Vec::new()), false)
    }

    /// Reader that records the order in which sources are released.
    struct Tracked {
        id: usize,
        log: Arc<std::sync::Mutex<Vec<usize>>>,
        drops: Arc<AtomicUsize>,
    }

    impl std::io::Read for Tracked {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Ok(0)
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
            self.log.lock().unwrap().push(self.id);
        }
    }

    fn tracked(
        id: usize,
        log: &Arc<std::sync::Mutex<Vec<usize>>>,
        drops: &Arc<AtomicUsize>,
    ) -> InputSource {
        let reader = Tracked {
            id,
            log: Arc::clone(log),
            drops: Arc::clone(drops),
        };
        InputSource::from_reader(format!("src-{id}"), BufReader::new(reader), false)
    }

    #[test]
    fn test_push_sets_current() {
        let mut stack = InputStack::new();
        assert!(stack.current().is_none());

        stack.push(source("a"), true);
        stack.push(source("b"), false);

        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current().unwrap().name(), "b");
        assert!(!stack.current().unwrap().is_primordial());
    }

    #[test]
    fn test_pop_as_many_as_pushed() {
        for nested in 0..5 {
            let mut stack = InputStack::new();
            stack.push(source("root"), true);
            for i in 0..nested {
                stack.push(source(&format!("inc-{i}")), false);
            }

            for _ in 0..nested {
                assert!(stack.pop());
            }
            assert!(!stack.pop());
            assert!(stack.is_empty());
        }
    }

    #[test]
    fn test_pop_primordial_reports_no_remaining() {
        let mut stack = InputStack::new();
        stack.push(source("root"), true);
        stack.push(source("inc"), false);

        assert!(stack.pop());
        assert_eq!(stack.current().unwrap().name(), "root");
        assert!(!stack.pop());
        assert!(stack.current().is_none());
    }

    #[test]
    fn test_pop_empty() {
        let mut stack = InputStack::new();
        assert!(!stack.pop());
    }

    #[test]
    fn test_pop_without_primordial() {
        let mut stack = InputStack::new();
        stack.push(source("a"), false);
        stack.push(source("b"), false);

        assert!(stack.pop());
        assert!(!stack.pop());
    }

    #[test]
    fn test_release_order_is_lifo() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let drops = Arc::new(AtomicUsize::new(0));

        let mut stack = InputStack::new();
        stack.push(tracked(0, &log, &drops), true);
        stack.push(tracked(1, &log, &drops), false);
        stack.push(tracked(2, &log, &drops), false);

        while stack.pop() {}

        assert_eq!(*log.lock().unwrap(), vec![2, 1, 0]);
        assert_eq!(drops.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_primordial_pop_drains_below() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let drops = Arc::new(AtomicUsize::new(0));

        let mut stack = InputStack::new();
        stack.push(tracked(0, &log, &drops), false);
        stack.push(tracked(1, &log, &drops), true);

        assert!(!stack.pop());
        assert!(stack.is_empty());
        assert_eq!(*log.lock().unwrap(), vec![1, 0]);
        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_drop_releases_once() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let drops = Arc::new(AtomicUsize::new(0));

        {
            let mut stack = InputStack::new();
            stack.push(tracked(0, &log, &drops), true);
            stack.push(tracked(1, &log, &drops), false);
            assert!(stack.pop());
        }

        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_open_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "show version").unwrap();

        let mut src = InputSource::open(file.path()).unwrap();
        assert!(!src.is_interactive());

        let mut line = String::new();
        src.reader_mut().read_line(&mut line).unwrap();
        assert_eq!(line.trim_end(), "show version");
    }

    #[test]
    fn test_open_missing_file() {
        let result = InputSource::open("/nonexistent/clish/script.txt");
        assert!(matches!(result, Err(ShellError::OpenInput { .. })));
    }
}
