//! Concrete collaborators used by the `clish` binary.
//!
//! - [`CommandTable`]: loads JSON command definitions
//! - [`Builtins`]: dispatches lines against the table plus built-in commands

mod builtins;
mod table;

pub use builtins::Builtins;
pub use table::{CommandDef, CommandTable, DefinitionFile};
