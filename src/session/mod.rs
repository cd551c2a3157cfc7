//! Session management module.
//!
//! This module provides the long-lived shell session, its error-recovery
//! state machine, and the stack of nested input sources it reads from.

mod id;
mod input;
mod shell;
mod state;

pub use id::SessionId;
pub use input::{InputSource, InputStack};
pub use shell::Session;
pub use state::{Decision, LoopEvent, SessionState, StateMachine};
