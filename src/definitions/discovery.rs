//! Search-path resolution and definition file enumeration.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::Result;

/// Search path used when none is configured.
pub const DEFAULT_SEARCH_PATH: &str = "/etc/clish;~/.clish";

/// Extension recognized when none is configured.
pub const DEFAULT_EXTENSION: &str = "json";

/// Loads one definition file into whatever registry backs dispatch.
pub trait DefinitionLoader {
    /// Load the definitions at `path`.
    fn load(&mut self, path: &Path) -> Result<()>;
}

/// Summary of one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Files the loader accepted.
    pub loaded: Vec<PathBuf>,
    /// Files the loader rejected.
    pub failed: Vec<PathBuf>,
    /// Directories that could not be opened.
    pub skipped_dirs: Vec<PathBuf>,
}

/// Finds definition files along a semicolon-separated directory list.
///
/// All inputs are explicit; nothing is read from the environment here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionDiscovery {
    search_path: String,
    home: Option<PathBuf>,
    extension: String,
}

impl Default for DefinitionDiscovery {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_PATH)
    }
}

impl DefinitionDiscovery {
    /// Create a discovery over `search_path` with the default extension.
    pub fn new(search_path: impl Into<String>) -> Self {
        Self {
            search_path: search_path.into(),
            home: None,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Directory substituted for a leading `~`.
    pub fn home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// File extension to match, with or without the leading dot.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Expand a bare `~` or a leading `~/` of one search-path segment.
    ///
    /// `~name` is left untouched, as are all segments when no home
    /// directory is known.
    pub fn expand_home(&self, segment: &str) -> PathBuf {
        let Some(home) = &self.home else {
            return PathBuf::from(segment);
        };
        if segment == "~" {
            return home.clone();
        }
        match segment.strip_prefix("~/") {
            Some(rest) => home.join(rest.trim_start_matches('/')),
            None => PathBuf::from(segment),
        }
    }

    /// Directories named by the search path, in order.
    pub fn directories(&self) -> Vec<PathBuf> {
        self.search_path
            .split(';')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(|segment| self.expand_home(segment))
            .collect()
    }

    /// Definition files in one directory, sorted by name.
    fn files_in(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext == self.extension.as_str())
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Every matching file along the search path, directory by directory.
    ///
    /// Directories that cannot be opened are skipped.
    pub fn files(&self) -> Vec<PathBuf> {
        self.directories()
            .iter()
            .filter_map(|dir| self.files_in(dir).ok())
            .flatten()
            .collect()
    }

    /// Hand every matching file to `loader`.
    ///
    /// Unreadable directories and rejected files are recorded and skipped;
    /// neither stops the pass.
    pub fn load_all(&self, loader: &mut dyn DefinitionLoader) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        for dir in self.directories() {
            let files = match self.files_in(&dir) {
                Ok(files) => files,
                Err(e) => {
                    debug!(dir = %dir.display(), "skipping search directory: {}", e);
                    report.skipped_dirs.push(dir);
                    continue;
                }
            };

            for file in files {
                match loader.load(&file) {
                    Ok(()) => {
                        debug!(file = %file.display(), "loaded definitions");
                        report.loaded.push(file);
                    }
                    Err(e) => {
                        warn!("{}", e);
                        report.failed.push(file);
                    }
                }
            }
        }

        report
    }
}
