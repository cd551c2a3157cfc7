//! Line-input collaborator.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};

use crate::session::InputSource;

/// Supplies one line at a time from the current input source.
pub trait LineInput: Send {
    /// Read the next line from `source`.
    ///
    /// Returns `Ok(None)` at end of input. The line excludes its terminator.
    fn read_line(&mut self, source: &mut InputSource) -> io::Result<Option<String>>;

    /// Whether `source` is a real terminal.
    ///
    /// Interactive sources are exempt from script-error auto-termination.
    fn is_interactive(&self, source: &InputSource) -> bool {
        source.is_interactive()
    }
}

/// Plain buffered line reader with an optional prompt for terminals.
#[derive(Debug, Clone)]
pub struct StdLineReader {
    prompt: String,
}

impl StdLineReader {
    /// Create a reader showing `prompt` before interactive reads.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    /// The prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

impl Default for StdLineReader {
    fn default() -> Self {
        Self::new("")
    }
}

impl LineInput for StdLineReader {
    fn read_line(&mut self, source: &mut InputSource) -> io::Result<Option<String>> {
        if source.is_interactive() && !self.prompt.is_empty() {
            let mut stdout = io::stdout().lock();
            stdout.write_all(self.prompt.as_bytes())?;
            stdout.flush()?;
        }

        read_raw_line(source)
    }
}

/// Read up to the next newline; invalid UTF-8 is replaced, not rejected.
fn read_raw_line(source: &mut InputSource) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if source.reader_mut().read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    let mut line = String::from_utf8_lossy(&buf).into_owned();
    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

thread_local! {
    // rustyline editors are bound to the thread that created them
    static EDITOR: RefCell<Option<DefaultEditor>> = const { RefCell::new(None) };
}

/// Line reader with history and editing on terminals.
///
/// Interactive sources are read through a `rustyline` editor; files and
/// includes go through the same buffered path as [`StdLineReader`]. When no
/// editor can be created the terminal is read as a plain stream.
#[derive(Debug, Clone)]
pub struct TerminalLineReader {
    plain: StdLineReader,
}

impl TerminalLineReader {
    /// Create a reader showing `prompt` on the terminal.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            plain: StdLineReader::new(prompt),
        }
    }

    /// The prompt text.
    pub fn prompt(&self) -> &str {
        self.plain.prompt()
    }

    fn read_terminal(&mut self, source: &mut InputSource) -> io::Result<Option<String>> {
        let prompt = self.plain.prompt();
        let edited = EDITOR.with(|cell| {
            let mut slot = cell.borrow_mut();
            if slot.is_none() {
                match DefaultEditor::new() {
                    Ok(editor) => *slot = Some(editor),
                    Err(e) => debug!("line editor unavailable: {}", e),
                }
            }
            slot.as_mut().map(|editor| {
                let line = editor.readline(prompt);
                if let Ok(ref text) = line {
                    if !text.trim().is_empty() {
                        if let Err(e) = editor.add_history_entry(text.as_str()) {
                            warn!("cannot record history: {}", e);
                        }
                    }
                }
                line
            })
        });

        match edited {
            Some(Ok(line)) => Ok(Some(line)),
            // Ctrl-C abandons the current line only
            Some(Err(ReadlineError::Interrupted)) => Ok(Some(String::new())),
            Some(Err(ReadlineError::Eof)) => Ok(None),
            Some(Err(ReadlineError::Io(e))) => Err(e),
            Some(Err(e)) => Err(io::Error::other(e.to_string())),
            None => self.plain.read_line(source),
        }
    }
}

impl Default for TerminalLineReader {
    fn default() -> Self {
        Self::new("")
    }
}

impl LineInput for TerminalLineReader {
    fn read_line(&mut self, source: &mut InputSource) -> io::Result<Option<String>> {
        if source.is_interactive() {
            self.read_terminal(source)
        } else {
            read_raw_line(source)
        }
    }
}
