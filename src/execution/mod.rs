//! Read-evaluate execution engine.
//!
//! This module drives a [`Session`](crate::Session):
//! - The collaborator seams: [`LineInput`] supplies lines, [`Dispatcher`]
//!   executes them
//! - The execution loop that unwinds nested sources on EOF or script error
//! - Inline and worker-thread drivers with cooperative cancellation
//!
//! # Example
//!
//! ```no_run
//! use clish_engine::execution::{Dispatch, DispatchContext, Dispatcher, StdLineReader};
//! use clish_engine::Session;
//!
//! struct Echo;
//!
//! impl Dispatcher for Echo {
//!     fn execute(&mut self, line: &str, _ctx: &mut DispatchContext<'_>) -> Dispatch {
//!         println!("{line}");
//!         Dispatch::Ok
//!     }
//! }
//!
//! let mut session = Session::new(StdLineReader::new("> "), Echo);
//! let outcome = session.run();
//! println!("session ended: {outcome:?}");
//! ```

mod dispatch;
mod driver;
mod exec_loop;
mod line_input;

pub use dispatch::{Dispatch, DispatchContext, Dispatcher};
pub use driver::{Completion, RunMode, ThreadConfig, Worker};
pub use exec_loop::LoopOutcome;
pub use line_input::{LineInput, StdLineReader, TerminalLineReader};
