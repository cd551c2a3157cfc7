//! Command-dispatch collaborator.

use std::path::Path;

use tracing::debug;

use crate::session::{InputSource, InputStack, StateMachine};
use crate::Result;

/// Result of executing one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The line succeeded; keep reading.
    Ok,
    /// The line failed; unwind non-interactive sources.
    ScriptError,
    /// Unrecoverable failure; the session shuts down.
    Fatal,
}

/// Executes a single command line.
pub trait Dispatcher: Send {
    /// Try to execute `line`.
    fn execute(&mut self, line: &str, ctx: &mut DispatchContext<'_>) -> Dispatch;
}

/// What a dispatcher may do to the running session.
pub struct DispatchContext<'a> {
    inputs: &'a mut InputStack,
    machine: &'a mut StateMachine,
}

impl<'a> DispatchContext<'a> {
    pub(crate) fn new(inputs: &'a mut InputStack, machine: &'a mut StateMachine) -> Self {
        Self { inputs, machine }
    }

    /// Open `path` and read from it before resuming the current source.
    pub fn include(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let source = InputSource::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "include script");
        self.push_source(source);
        Ok(())
    }

    /// Push an already-open nested source.
    pub fn push_source(&mut self, source: InputSource) {
        self.inputs.push(source, false);
    }

    /// Request shutdown once the current line returns.
    pub fn close(&mut self) {
        self.machine.close();
    }

    /// Number of sources currently on the stack.
    pub fn depth(&self) -> usize {
        self.inputs.depth()
    }
}
