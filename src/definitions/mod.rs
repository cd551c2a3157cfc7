//! Definition-source discovery.
//!
//! Resolves the definition search path, expands `~`, enumerates matching
//! files and hands each to a [`DefinitionLoader`]. Runs once at startup.

mod discovery;

pub use discovery::{
    DefinitionDiscovery, DefinitionLoader, DiscoveryReport, DEFAULT_EXTENSION, DEFAULT_SEARCH_PATH,
};
