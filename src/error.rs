//! Error types for clish-engine.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for shell engine operations.
///
/// Only resource failures cross the engine boundary. Errors raised by a
/// single dispatched line are absorbed by the session state machine.
#[derive(Error, Debug)]
pub enum ShellError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An input file could not be opened.
    #[error("cannot open input '{}': {source}", path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker thread could not be created.
    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    /// The worker thread exited without reporting a result.
    #[error("worker thread panicked before completing")]
    WorkerPanicked,

    /// A definition file was rejected by the loader.
    #[error("failed to load definitions from '{}': {reason}", path.display())]
    Definition { path: PathBuf, reason: String },

    /// Definition content is structurally invalid.
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),
}

/// Convenience Result type for shell engine operations.
pub type Result<T> = std::result::Result<T, ShellError>;
