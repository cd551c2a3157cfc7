//! Built-in command dispatcher.

use std::io::{self, Write};

use tracing::debug;

use super::CommandTable;
use crate::execution::{Dispatch, DispatchContext, Dispatcher};

/// Dispatches lines to built-in commands, then to a [`CommandTable`].
///
/// Built-ins:
/// - blank lines and `#` comments are ignored
/// - `source FILE` reads FILE before resuming the current input
/// - `echo WORDS...` prints its arguments
/// - `exit` / `quit` close the session
/// - `abort` stops the session as a fatal error
pub struct Builtins {
    table: CommandTable,
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

impl Builtins {
    /// Create a dispatcher printing to stdout and stderr.
    pub fn new(table: CommandTable) -> Self {
        Self::with_output(table, io::stdout(), io::stderr())
    }

    /// Create a dispatcher printing to the given writers.
    pub fn with_output(
        table: CommandTable,
        out: impl Write + Send + 'static,
        err: impl Write + Send + 'static,
    ) -> Self {
        Self {
            table,
            out: Box::new(out),
            err: Box::new(err),
        }
    }

    fn fail(&mut self, message: std::fmt::Arguments<'_>) -> Dispatch {
        let _ = writeln!(self.err, "Error: {}", message);
        let _ = self.err.flush();
        Dispatch::ScriptError
    }

    fn print(&mut self, text: &str) -> Dispatch {
        match writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            Ok(()) => Dispatch::Ok,
            Err(e) => self.fail(format_args!("cannot write output: {}", e)),
        }
    }
}

impl Dispatcher for Builtins {
    fn execute(&mut self, line: &str, ctx: &mut DispatchContext<'_>) -> Dispatch {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Dispatch::Ok;
        }

        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((line, ""));

        match command {
            "exit" | "quit" => {
                debug!("exit requested");
                ctx.close();
                Dispatch::Ok
            }
            "abort" => Dispatch::Fatal,
            "echo" => self.print(rest),
            "source" if rest.is_empty() => self.fail(format_args!("source: missing file name")),
            "source" => match ctx.include(rest) {
                Ok(()) => Dispatch::Ok,
                Err(e) => self.fail(format_args!("source: {}", e)),
            },
            _ => {
                let output = self.table.lookup(line).map(|(def, _)| def.output.clone());
                match output {
                    Some(text) if text.is_empty() => Dispatch::Ok,
                    Some(text) => self.print(&text),
                    None => self.fail(format_args!("unknown command: {}", line)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandDef;
    use crate::session::{InputSource, InputStack, SessionState, StateMachine};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    struct Harness {
        builtins: Builtins,
        out: Shared,
        err: Shared,
        inputs: InputStack,
        machine: StateMachine,
    }

    impl Harness {
        fn new() -> Self {
            let mut table = CommandTable::new();
            table
                .insert(CommandDef {
                    name: "show version".into(),
                    output: "clish 0.1".into(),
                })
                .unwrap();
            let out = Shared::default();
            let err = Shared::default();
            let mut inputs = InputStack::new();
            inputs.push(
                InputSource::from_reader("main", Cursor::new(Vec::new()), false),
                true,
            );
            Self {
                builtins: Builtins::with_output(table, out.clone(), err.clone()),
                out,
                err,
                inputs,
                machine: StateMachine::new(),
            }
        }

        fn run(&mut self, line: &str) -> Dispatch {
            let mut ctx = DispatchContext::new(&mut self.inputs, &mut self.machine);
            self.builtins.execute(line, &mut ctx)
        }
    }

    #[test]
    fn test_blank_and_comment() {
        let mut h = Harness::new();
        assert_eq!(h.run(""), Dispatch::Ok);
        assert_eq!(h.run("   # just a note"), Dispatch::Ok);
        assert!(h.out.text().is_empty());
    }

    #[test]
    fn test_echo() {
        let mut h = Harness::new();
        assert_eq!(h.run("echo hello   world"), Dispatch::Ok);
        assert_eq!(h.out.text(), "hello   world\n");
    }

    #[test]
    fn test_table_command() {
        let mut h = Harness::new();
        assert_eq!(h.run("show version"), Dispatch::Ok);
        assert_eq!(h.out.text(), "clish 0.1\n");
    }

    #[test]
    fn test_unknown_command() {
        let mut h = Harness::new();
        assert_eq!(h.run("reload now"), Dispatch::ScriptError);
        assert!(h.err.text().contains("unknown command: reload now"));
    }

    #[test]
    fn test_exit_closes() {
        let mut h = Harness::new();
        assert_eq!(h.run("quit"), Dispatch::Ok);
        assert_eq!(h.machine.state(), SessionState::Closing);
    }

    #[test]
    fn test_abort_is_fatal() {
        let mut h = Harness::new();
        assert_eq!(h.run("abort"), Dispatch::Fatal);
    }

    #[test]
    fn test_source_missing_file() {
        let mut h = Harness::new();
        assert_eq!(h.run("source /nonexistent/x.clish"), Dispatch::ScriptError);
        assert_eq!(h.run("source"), Dispatch::ScriptError);
        assert_eq!(h.inputs.depth(), 1);
        assert!(h.err.text().contains("source:"));
    }

    #[test]
    fn test_source_pushes_include() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut h = Harness::new();

        let line = format!("source {}", file.path().display());
        assert_eq!(h.run(&line), Dispatch::Ok);
        assert_eq!(h.inputs.depth(), 2);
    }
}
