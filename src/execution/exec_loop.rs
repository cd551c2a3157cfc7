//! The read-evaluate loop.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::dispatch::{Dispatch, DispatchContext};
use crate::session::{Decision, LoopEvent, Session, SessionState};

/// How a run of the execution loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The primordial source was exhausted, or shutdown was requested.
    Completed,
    /// A script error or fatal dispatch unwound the primordial source.
    StoppedOnError,
    /// The worker honoured a cancellation request at a checkpoint.
    Cancelled,
}

impl LoopOutcome {
    /// Whether the loop produced a result rather than being cancelled.
    pub fn is_normal(&self) -> bool {
        !matches!(self, LoopOutcome::Cancelled)
    }
}

/// Releases whatever is left on the input stack when the loop exits,
/// including early exits on cancellation and unwinding panics.
struct LoopGuard<'a> {
    session: &'a mut Session,
}

impl Drop for LoopGuard<'_> {
    fn drop(&mut self) {
        if !self.session.inputs.is_empty() {
            debug!(
                session = %self.session.id(),
                depth = self.session.inputs.depth(),
                "releasing remaining input sources"
            );
            self.session.inputs.clear();
        }
    }
}

/// Run the loop until the primordial source is unwound.
///
/// `checkpoint` is only given on the worker path; it is polled at the top
/// of every outer iteration, never mid-read or mid-dispatch.
pub(crate) fn run_loop(session: &mut Session, checkpoint: Option<&CancellationToken>) -> LoopOutcome {
    if session.machine.is_closing() {
        debug!(session = %session.id(), "session closing, loop not started");
        return LoopOutcome::Completed;
    }
    session.machine.recover();

    let primordial = session.take_primary_input();
    session.inputs.push(primordial, true);

    let mut guard = LoopGuard { session };
    let s = &mut *guard.session;

    let mut line = String::new();
    let mut fatal = false;
    let mut decision = Decision::Continue;

    loop {
        decision = match decision {
            Decision::Continue => {
                if checkpoint.is_some_and(CancellationToken::is_cancelled) {
                    info!(session = %s.id(), "cancellation honoured");
                    return LoopOutcome::Cancelled;
                }
                let Some(current) = s.inputs.current() else {
                    break;
                };
                let interactive = s.line_input.is_interactive(current);
                s.machine.observe(LoopEvent::IterationStarted { interactive })
            }
            Decision::Read => {
                let Some(source) = s.inputs.current_mut() else {
                    break;
                };
                match s.line_input.read_line(source) {
                    Ok(Some(text)) => {
                        source.note_line();
                        line = text;
                        s.machine.observe(LoopEvent::LineReadSucceeded)
                    }
                    Ok(None) => s.machine.observe(LoopEvent::LineReadFailed),
                    Err(e) => {
                        warn!(source = %source.name(), "read failed: {}", e);
                        s.machine.observe(LoopEvent::LineReadFailed)
                    }
                }
            }
            Decision::Dispatch => {
                let mut ctx = DispatchContext::new(&mut s.inputs, &mut s.machine);
                match s.dispatcher.execute(&line, &mut ctx) {
                    Dispatch::Ok => s.machine.observe(LoopEvent::LineSucceeded),
                    Dispatch::ScriptError => {
                        if let Some(source) = s.inputs.current() {
                            warn!(
                                source = %source.name(),
                                line = source.lines_read(),
                                "script error"
                            );
                        }
                        s.machine.observe(LoopEvent::ScriptLineFailed)
                    }
                    Dispatch::Fatal => {
                        warn!(session = %s.id(), "fatal command, closing session");
                        fatal = true;
                        s.machine.observe(LoopEvent::CloseRequested)
                    }
                }
            }
            Decision::Unwind => {
                let remaining = s.inputs.pop();
                s.machine.observe(LoopEvent::UnwindCompleted { remaining })
            }
            Decision::Stop => break,
        };
    }

    let outcome = if fatal || s.machine.state() == SessionState::ScriptError {
        LoopOutcome::StoppedOnError
    } else {
        LoopOutcome::Completed
    };
    debug!(session = %s.id(), ?outcome, "loop finished");
    outcome
}
