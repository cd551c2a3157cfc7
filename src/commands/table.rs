//! JSON command definitions.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::definitions::DefinitionLoader;
use crate::error::ShellError;
use crate::Result;

/// One command definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDef {
    /// Space-separated command words, e.g. `show version`.
    pub name: String,
    /// Text printed when the command runs.
    #[serde(default)]
    pub output: String,
}

/// Contents of one definition file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionFile {
    /// Commands declared by the file.
    pub commands: Vec<CommandDef>,
}

/// Registry of loaded commands keyed by normalized name.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    commands: BTreeMap<String, CommandDef>,
}

fn normalize(words: &str) -> String {
    words.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl CommandTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. A later definition with the same name wins.
    pub fn insert(&mut self, def: CommandDef) -> Result<()> {
        let key = normalize(&def.name);
        if key.is_empty() {
            return Err(ShellError::InvalidDefinition("empty command name".into()));
        }
        self.commands.insert(key, def);
        Ok(())
    }

    /// Register every command in a parsed definition file.
    ///
    /// All-or-nothing: a file with any invalid definition adds none.
    pub fn extend(&mut self, file: DefinitionFile) -> Result<()> {
        if file.commands.iter().any(|def| normalize(&def.name).is_empty()) {
            return Err(ShellError::InvalidDefinition("empty command name".into()));
        }
        for def in file.commands {
            self.insert(def)?;
        }
        Ok(())
    }

    /// Find the command whose words are the longest prefix of `line`.
    ///
    /// Returns the definition and the remaining argument words.
    pub fn lookup<'a>(&self, line: &'a str) -> Option<(&CommandDef, Vec<&'a str>)> {
        let words: Vec<&str> = line.split_whitespace().collect();
        (1..=words.len()).rev().find_map(|n| {
            self.commands
                .get(&words[..n].join(" "))
                .map(|def| (def, words[n..].to_vec()))
        })
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Registered command names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }
}

impl DefinitionLoader for CommandTable {
    fn load(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let file: DefinitionFile =
            serde_json::from_str(&content).map_err(|e| ShellError::Definition {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        self.extend(file)
    }
}
