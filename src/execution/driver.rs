//! Inline and worker-thread drivers for the execution loop.

use std::path::Path;
use std::thread::{self, JoinHandle};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::exec_loop::{run_loop, LoopOutcome};
use crate::error::ShellError;
use crate::session::{InputSource, Session};
use crate::Result;

/// Worker thread settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadConfig {
    /// Thread name; defaults to the session ID.
    pub name: Option<String>,
    /// Stack size in bytes; defaults to the platform default.
    pub stack_size: Option<usize>,
}

impl ThreadConfig {
    /// Create a default thread configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the stack size in bytes.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}

/// How [`Session::run_from_file`] executes the loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RunMode {
    /// On the calling thread.
    #[default]
    Inline,
    /// On a dedicated worker thread, waited for before returning.
    Threaded(ThreadConfig),
}

/// A finished session handed back to the caller.
#[derive(Debug)]
pub struct Completion {
    /// The session, ready to be inspected or run again.
    pub session: Session,
    /// How the loop ended.
    pub outcome: LoopOutcome,
}

impl Completion {
    /// True unless the worker was cancelled before producing a result.
    pub fn completed_normally(&self) -> bool {
        self.outcome.is_normal()
    }
}

/// Handle to a session running on its own thread.
///
/// Cancellation is deferred: the worker only stops at the top of a loop
/// iteration, so a request made while it is blocked on a read takes effect
/// once that read returns.
#[derive(Debug)]
pub struct Worker {
    name: String,
    cancel: CancellationToken,
    handle: JoinHandle<(Session, LoopOutcome)>,
}

impl Worker {
    /// Thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the worker to stop at its next checkpoint.
    pub fn cancel(&self) {
        debug!(worker = %self.name, "cancellation requested");
        self.cancel.cancel();
    }

    /// A token that cancels this worker when triggered.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Check if the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the worker exits and take the session back.
    pub fn wait(self) -> Result<Completion> {
        match self.handle.join() {
            Ok((session, outcome)) => {
                debug!(worker = %self.name, ?outcome, "worker joined");
                Ok(Completion { session, outcome })
            }
            Err(_) => {
                warn!(worker = %self.name, "worker panicked");
                Err(ShellError::WorkerPanicked)
            }
        }
    }
}

impl Session {
    /// Run the loop on the calling thread.
    pub fn run(&mut self) -> LoopOutcome {
        run_loop(self, None)
    }

    /// Move the session onto a new worker thread.
    ///
    /// If the thread cannot be created the session is dropped, releasing
    /// any input it owned, and the error is returned.
    pub fn spawn(self, config: &ThreadConfig) -> Result<Worker> {
        let name = config
            .name
            .clone()
            .unwrap_or_else(|| self.id().to_string());
        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(bytes) = config.stack_size {
            builder = builder.stack_size(bytes);
        }

        let cancel = CancellationToken::new();
        let checkpoint = cancel.clone();
        let handle = builder
            .spawn(move || {
                let mut session = self;
                debug!(session = %session.id(), "worker started");
                let outcome = run_loop(&mut session, Some(&checkpoint));
                (session, outcome)
            })
            .map_err(ShellError::ThreadSpawn)?;

        info!(worker = %name, "worker spawned");
        Ok(Worker {
            name,
            cancel,
            handle,
        })
    }

    /// Spawn a worker and block until it exits.
    pub fn spawn_and_wait(self, config: &ThreadConfig) -> Result<Completion> {
        self.spawn(config)?.wait()
    }

    /// Run a session whose primordial input is the file at `path`.
    ///
    /// A missing or unreadable file fails before any thread is spawned or
    /// the loop is entered. The file is released on every exit path.
    pub fn run_from_file(mut self, path: impl AsRef<Path>, mode: RunMode) -> Result<Completion> {
        let source = InputSource::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "running script");
        self.set_primary_input(source);

        let mut completion = match mode {
            RunMode::Inline => {
                let outcome = self.run();
                Completion {
                    session: self,
                    outcome,
                }
            }
            RunMode::Threaded(config) => self.spawn_and_wait(&config)?,
        };
        // a session that was already closing never consumed the file
        completion.session.release_primary_input();
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{Dispatch, DispatchContext, Dispatcher, StdLineReader};
    use crate::session::SessionState;
    use std::io::{Cursor, Read, Write};
    use std::sync::{Arc, Mutex};
    use tempfile::NamedTempFile;

    #[derive(Clone, Default)]
    struct Collect {
        lines: Arc<Mutex<Vec<String>>>,
        fail_on: Option<&'static str>,
    }

    impl Dispatcher for Collect {
        fn execute(&mut self, line: &str, _ctx: &mut DispatchContext<'_>) -> Dispatch {
            self.lines.lock().unwrap().push(line.to_string());
            if self.fail_on == Some(line) {
                Dispatch::ScriptError
            } else {
                Dispatch::Ok
            }
        }
    }

    fn script(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    /// Reader that records its release.
    struct Logged {
        name: &'static str,
        data: Cursor<Vec<u8>>,
        released: Arc<Mutex<Vec<&'static str>>>,
    }

    impl std::io::Read for Logged {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.data.read(buf)
        }
    }

    impl Drop for Logged {
        fn drop(&mut self) {
            self.released.lock().unwrap().push(self.name);
        }
    }

    fn logged(
        name: &'static str,
        text: &str,
        released: &Arc<Mutex<Vec<&'static str>>>,
    ) -> InputSource {
        let reader = Logged {
            name,
            data: Cursor::new(text.as_bytes().to_vec()),
            released: Arc::clone(released),
        };
        InputSource::from_reader(name, std::io::BufReader::new(reader), false)
    }

    /// Pushes an include, then panics mid-dispatch.
    struct Explode {
        released: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Dispatcher for Explode {
        fn execute(&mut self, _line: &str, ctx: &mut DispatchContext<'_>) -> Dispatch {
            ctx.push_source(logged("include", "never read\n", &self.released));
            panic!("dispatcher failed");
        }
    }

    #[test]
    fn test_panicking_worker_releases_inputs() {
        let released = Arc::new(Mutex::new(Vec::new()));
        let session = Session::new(
            StdLineReader::default(),
            Explode {
                released: Arc::clone(&released),
            },
        )
        .with_primary_input(logged("main", "go\n", &released));

        let worker = session.spawn(&ThreadConfig::new()).unwrap();
        let result = worker.wait();

        assert!(matches!(result, Err(ShellError::WorkerPanicked)));
        assert_eq!(*released.lock().unwrap(), vec!["include", "main"]);
    }

    #[test]
    fn test_thread_config_builder() {
        let config = ThreadConfig::new().name("clish-worker").stack_size(256 * 1024);
        assert_eq!(config.name.as_deref(), Some("clish-worker"));
        assert_eq!(config.stack_size, Some(256 * 1024));
        assert_eq!(RunMode::default(), RunMode::Inline);
    }

    #[test]
    fn test_spawn_and_wait_single_line() {
        let collect = Collect::default();
        let src = InputSource::from_reader("mem", Cursor::new(b"hello\n".to_vec()), false);
        let session = Session::new(StdLineReader::default(), collect.clone()).with_primary_input(src);

        let worker = session.spawn(&ThreadConfig::new()).unwrap();
        let completion = worker.wait().unwrap();

        assert!(completion.completed_normally());
        assert_eq!(completion.outcome, LoopOutcome::Completed);
        assert_eq!(*collect.lines.lock().unwrap(), vec!["hello"]);
    }

    #[test]
    fn test_worker_uses_configured_name() {
        let src = InputSource::from_reader("mem", Cursor::new(Vec::new()), false);
        let session =
            Session::new(StdLineReader::default(), Collect::default()).with_primary_input(src);

        let worker = session
            .spawn(&ThreadConfig::new().name("clish-test-worker"))
            .unwrap();
        assert_eq!(worker.name(), "clish-test-worker");
        worker.wait().unwrap();
    }

    #[test]
    fn test_default_worker_name_is_session_id() {
        let src = InputSource::from_reader("mem", Cursor::new(Vec::new()), false);
        let session =
            Session::new(StdLineReader::default(), Collect::default()).with_primary_input(src);
        let id = session.id().to_string();

        let worker = session.spawn(&ThreadConfig::new()).unwrap();
        assert_eq!(worker.name(), id);
        worker.wait().unwrap();
    }

    #[test]
    fn test_run_from_file_inline() {
        let file = script("one\ntwo\nthree\n");
        let collect = Collect::default();
        let session = Session::new(StdLineReader::default(), collect.clone());

        let completion = session.run_from_file(file.path(), RunMode::Inline).unwrap();

        assert_eq!(completion.outcome, LoopOutcome::Completed);
        assert_eq!(*collect.lines.lock().unwrap(), vec!["one", "two", "three"]);
        assert!(completion.session.inputs().is_empty());
        assert!(!completion.session.has_primary_input());
    }

    #[test]
    fn test_run_from_file_threaded_script_error() {
        let file = script("one\ntwo\nthree\n");
        let collect = Collect {
            fail_on: Some("two"),
            ..Collect::default()
        };
        let session = Session::new(StdLineReader::default(), collect.clone());

        let completion = session
            .run_from_file(file.path(), RunMode::Threaded(ThreadConfig::new()))
            .unwrap();

        assert_eq!(completion.outcome, LoopOutcome::StoppedOnError);
        assert!(completion.completed_normally());
        assert_eq!(completion.session.state(), SessionState::ScriptError);
        assert_eq!(*collect.lines.lock().unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn test_run_from_missing_file() {
        let collect = Collect::default();
        let session = Session::new(StdLineReader::default(), collect.clone());

        let result = session.run_from_file(
            "/nonexistent/clish/script.txt",
            RunMode::Threaded(ThreadConfig::new()),
        );

        assert!(matches!(result, Err(ShellError::OpenInput { .. })));
        assert!(collect.lines.lock().unwrap().is_empty());
    }

    #[test]
    fn test_run_from_file_on_closed_session() {
        let file = script("one\n");
        let collect = Collect::default();
        let mut session = Session::new(StdLineReader::default(), collect.clone());
        session.close();

        let completion = session.run_from_file(file.path(), RunMode::Inline).unwrap();

        assert_eq!(completion.outcome, LoopOutcome::Completed);
        assert!(!completion.session.has_primary_input());
        assert!(collect.lines.lock().unwrap().is_empty());
    }
}
