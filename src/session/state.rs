//! Session state machine.

use tracing::trace;

/// Represents the error-recovery state of a shell session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Normal operation; lines are read and dispatched.
    #[default]
    Ready,
    /// A dispatched line failed and non-interactive sources are unwinding.
    ScriptError,
    /// The session is shutting down; no further input is read.
    Closing,
}

impl SessionState {
    /// Check if this is a terminal state for the loop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closing)
    }
}

/// Something the execution loop reports to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// A new outer iteration begins on a source of the given kind.
    IterationStarted { interactive: bool },
    /// The current source produced a line.
    LineReadSucceeded,
    /// The current source is exhausted or could not be read.
    LineReadFailed,
    /// The dispatcher accepted the line.
    LineSucceeded,
    /// The dispatcher reported a script error for the line.
    ScriptLineFailed,
    /// Shutdown was requested from within the loop.
    CloseRequested,
    /// The current source was popped.
    UnwindCompleted { remaining: bool },
}

/// What the execution loop must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Read one line from the current source.
    Read,
    /// Hand the line just read to the dispatcher.
    Dispatch,
    /// Pop the current source.
    Unwind,
    /// Start the next outer iteration.
    Continue,
    /// Leave the loop.
    Stop,
}

/// Policy deciding how the loop reacts to each [`LoopEvent`].
///
/// The machine is only ever touched by the thread driving the loop, so it
/// carries no synchronization.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    state: SessionState,
}

impl StateMachine {
    /// Create a state machine in the `Ready` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Request shutdown. `Closing` is sticky.
    pub fn close(&mut self) {
        self.set(SessionState::Closing);
    }

    /// Check whether shutdown has been requested.
    pub fn is_closing(&self) -> bool {
        self.state.is_terminal()
    }

    /// Clear a script error left by a previous run. `Closing` is kept.
    pub fn recover(&mut self) {
        if self.state == SessionState::ScriptError {
            self.set(SessionState::Ready);
        }
    }

    fn set(&mut self, target: SessionState) {
        if self.state != target {
            trace!(from = ?self.state, to = ?target, "session state transition");
            self.state = target;
        }
    }

    /// Feed one loop event and get the next step.
    pub fn observe(&mut self, event: LoopEvent) -> Decision {
        use SessionState::*;

        if self.state == Closing {
            return match event {
                LoopEvent::UnwindCompleted { remaining: false } => Decision::Stop,
                _ => Decision::Unwind,
            };
        }

        match event {
            LoopEvent::IterationStarted { interactive } => match self.state {
                // an interactive session never auto-terminates on a script error
                ScriptError if interactive => {
                    self.set(Ready);
                    Decision::Read
                }
                ScriptError => Decision::Unwind,
                _ => Decision::Read,
            },
            LoopEvent::LineReadSucceeded => Decision::Dispatch,
            LoopEvent::LineReadFailed => Decision::Unwind,
            LoopEvent::LineSucceeded => Decision::Continue,
            LoopEvent::ScriptLineFailed => {
                self.set(ScriptError);
                Decision::Continue
            }
            LoopEvent::CloseRequested => {
                self.set(Closing);
                Decision::Unwind
            }
            LoopEvent::UnwindCompleted { remaining: true } => Decision::Continue,
            LoopEvent::UnwindCompleted { remaining: false } => Decision::Stop,
        }
    }
}
