//! The long-lived shell session.

use std::fmt;

use super::{InputSource, InputStack, SessionId, SessionState, StateMachine};
use crate::execution::{Dispatcher, LineInput};

/// A shell session: state machine, input stack and collaborators.
///
/// A session is driven by exactly one thread at a time, either the caller
/// (see [`Session::run`]) or a single worker (see [`Session::spawn`]).
pub struct Session {
    id: SessionId,
    pub(crate) machine: StateMachine,
    pub(crate) inputs: InputStack,
    pub(crate) line_input: Box<dyn LineInput>,
    pub(crate) dispatcher: Box<dyn Dispatcher>,
    primary: Option<InputSource>,
}

impl Session {
    /// Create a session reading through `line_input` and executing lines
    /// with `dispatcher`.
    ///
    /// Unless another primary input is set, the loop starts on stdin.
    pub fn new(line_input: impl LineInput + 'static, dispatcher: impl Dispatcher + 'static) -> Self {
        Self {
            id: SessionId::next(),
            machine: StateMachine::new(),
            inputs: InputStack::new(),
            line_input: Box::new(line_input),
            dispatcher: Box::new(dispatcher),
            primary: None,
        }
    }

    /// Builder-style variant of [`Session::set_primary_input`].
    pub fn with_primary_input(mut self, source: InputSource) -> Self {
        self.primary = Some(source);
        self
    }

    /// Set the source pushed as primordial when the loop starts.
    pub fn set_primary_input(&mut self, source: InputSource) {
        self.primary = Some(source);
    }

    /// Drop a primary input that was never consumed by the loop.
    pub fn release_primary_input(&mut self) {
        self.primary = None;
    }

    /// Check if a primary input is waiting to be consumed.
    pub fn has_primary_input(&self) -> bool {
        self.primary.is_some()
    }

    pub(crate) fn take_primary_input(&mut self) -> InputSource {
        self.primary.take().unwrap_or_else(InputSource::stdin)
    }

    /// Unique identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    /// Request shutdown. A closing session reads no further input.
    pub fn close(&mut self) {
        self.machine.close();
    }

    /// The input stack.
    pub fn inputs(&self) -> &InputStack {
        &self.inputs
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.machine.state())
            .field("inputs", &self.inputs)
            .field("primary", &self.primary)
            .finish_non_exhaustive()
    }
}
