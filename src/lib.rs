//! # clish-engine
//!
//! Execution engine for an interactive and scriptable command shell.
//!
//! A [`Session`] drives a read-evaluate loop over a stack of nested input
//! sources (a terminal, a script, the scripts it includes). A small state
//! machine decides when a script error aborts one include file, when it
//! unwinds the whole script, and when an interactive session simply
//! recovers. The loop runs inline or on a dedicated worker thread with
//! cooperative cancellation.
//!
//! ## Features
//!
//! - **Nested input**: LIFO input stack with exactly-once release of sources
//! - **Error recovery**: interactive sessions never exit on a script error
//! - **Worker threads**: deferred cancellation at loop checkpoints only
//! - **Definition discovery**: search-path driven loading of command files
//!
//! ## Quick Start
//!
//! ```no_run
//! use clish_engine::commands::{Builtins, CommandTable};
//! use clish_engine::execution::{RunMode, StdLineReader};
//! use clish_engine::{DefinitionDiscovery, Session};
//!
//! fn main() -> clish_engine::Result<()> {
//!     clish_engine::logging::try_init(None).ok();
//!
//!     let mut table = CommandTable::new();
//!     DefinitionDiscovery::default().load_all(&mut table);
//!
//!     let session = Session::new(StdLineReader::new("clish> "), Builtins::new(table));
//!     let completion = session.run_from_file("setup.clish", RunMode::Inline)?;
//!     println!("finished: {:?}", completion.outcome);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod definitions;
pub mod error;
pub mod execution;
pub mod logging;
pub mod session;

// Re-export commonly used types
pub use definitions::{DefinitionDiscovery, DefinitionLoader, DiscoveryReport};
pub use error::{Result, ShellError};
pub use execution::{
    Completion, Dispatch, DispatchContext, Dispatcher, LineInput, LoopOutcome, RunMode,
    StdLineReader, TerminalLineReader, ThreadConfig, Worker,
};
pub use session::{InputSource, InputStack, Session, SessionId, SessionState};
