//! Command-line interface for clish.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Script to run instead of reading stdin.
    pub file: Option<PathBuf>,
    /// Run the session on a dedicated worker thread.
    pub thread: bool,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Definition search path (overrides config and `CLISH_PATH`).
    pub path: Option<String>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('f') | Long("file") => {
                result.file = Some(parser.value()?.parse()?);
            }
            Short('t') | Long("thread") => {
                result.thread = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('p') | Long("path") => {
                let value: String = parser.value()?.parse()?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidValue("path", value));
                }
                result.path = Some(value);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) if result.file.is_none() => {
                result.file = Some(PathBuf::from(val));
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"clish {version}
Interactive and scriptable command shell

USAGE:
    clish [OPTIONS] [SCRIPT]

OPTIONS:
    -f, --file <FILE>       Run commands from FILE instead of stdin
    -t, --thread            Run the session on a worker thread
    -c, --config <FILE>     Path to configuration file (JSON)
    -p, --path <PATH>       Definition search path (semicolon separated)
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    CLISH_PATH              Definition search path [default: /etc/clish;~/.clish]
    CLISH_LOG_LEVEL         Log level (overrides config)
    RUST_LOG                Alternative log level setting
    HOME                    Substituted for a leading '~' in the search path

EXAMPLES:
    # Interactive session
    clish

    # Run a script on a worker thread
    clish --thread -f setup.clish

    # Use a private definition directory
    clish -p ~/my-defs
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("clish {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
