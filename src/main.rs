//! clish binary entry point.

use std::process::ExitCode;
use std::time::Duration;

use clish_engine::cli::{self, Args};
use clish_engine::commands::{Builtins, CommandTable};
use clish_engine::config::Config;
use clish_engine::{logging, Completion, LoopOutcome, RunMode, Session, TerminalLineReader};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How long a cancelled worker gets to reach its next checkpoint.
const CANCEL_GRACE: Duration = Duration::from_millis(500);

fn exit_code(outcome: LoopOutcome) -> ExitCode {
    match outcome {
        LoopOutcome::Completed => ExitCode::SUCCESS,
        LoopOutcome::StoppedOnError => ExitCode::from(1),
        LoopOutcome::Cancelled => ExitCode::from(130),
    }
}

/// Give a cancelled worker `grace` to stop; `None` if it is still running.
async fn settle(
    waiter: &mut JoinHandle<clish_engine::Result<Completion>>,
    grace: Duration,
) -> Option<LoopOutcome> {
    match tokio::time::timeout(grace, waiter).await {
        Ok(Ok(Ok(completion))) => Some(completion.outcome),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'clish --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    logging::init(Some(config.log_filter()));
    info!("clish v{}", env!("CARGO_PKG_VERSION"));

    let mut table = CommandTable::new();
    let report = config.discovery().load_all(&mut table);
    info!(
        loaded = report.loaded.len(),
        failed = report.failed.len(),
        commands = table.len(),
        "definitions loaded"
    );

    let session = Session::new(
        TerminalLineReader::new(config.shell.prompt.clone()),
        Builtins::new(table),
    );

    if let Some(path) = args.file {
        let mode = config.run_mode();
        let result =
            tokio::task::spawn_blocking(move || session.run_from_file(&path, mode)).await;
        return match result {
            Ok(Ok(completion)) => exit_code(completion.outcome),
            Ok(Err(e)) => {
                error!("{}", e);
                ExitCode::from(1)
            }
            Err(e) => {
                error!("session task failed: {}", e);
                ExitCode::from(1)
            }
        };
    }

    match config.run_mode() {
        RunMode::Inline => {
            let mut session = session;
            let outcome = tokio::task::block_in_place(|| session.run());
            exit_code(outcome)
        }
        RunMode::Threaded(thread_config) => {
            let worker = match session.spawn(&thread_config) {
                Ok(worker) => worker,
                Err(e) => {
                    error!("{}", e);
                    return ExitCode::from(1);
                }
            };
            let cancel = worker.cancel_token();
            let mut waiter = tokio::task::spawn_blocking(move || worker.wait());

            tokio::select! {
                joined = &mut waiter => match joined {
                    Ok(Ok(completion)) => exit_code(completion.outcome),
                    Ok(Err(e)) => {
                        error!("{}", e);
                        ExitCode::from(1)
                    }
                    Err(e) => {
                        error!("session task failed: {}", e);
                        ExitCode::from(1)
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    warn!("interrupted, cancelling session");
                    cancel.cancel();
                    match settle(&mut waiter, CANCEL_GRACE).await {
                        Some(outcome) => exit_code(outcome),
                        // still blocked on a read, so it never reached its checkpoint
                        None => std::process::exit(130),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clish_engine::{Dispatch, DispatchContext, Dispatcher, InputSource, LineInput, ThreadConfig};
    use std::io::{self, Cursor};
    use std::sync::mpsc;

    struct Accept;

    impl Dispatcher for Accept {
        fn execute(&mut self, _line: &str, _ctx: &mut DispatchContext<'_>) -> Dispatch {
            Dispatch::Ok
        }
    }

    struct Channel(mpsc::Receiver<String>);

    impl LineInput for Channel {
        fn read_line(&mut self, _source: &mut InputSource) -> io::Result<Option<String>> {
            Ok(self.0.recv().ok())
        }
    }

    fn pipe() -> InputSource {
        InputSource::from_reader("pipe", Cursor::new(Vec::new()), false)
    }

    #[tokio::test]
    async fn test_settle_reports_cancelled_worker() {
        let (tx, rx) = mpsc::channel();
        let worker = Session::new(Channel(rx), Accept)
            .with_primary_input(pipe())
            .spawn(&ThreadConfig::new())
            .unwrap();
        let cancel = worker.cancel_token();
        let mut waiter = tokio::task::spawn_blocking(move || worker.wait());

        cancel.cancel();
        tx.send("wake".to_string()).unwrap();

        let outcome = settle(&mut waiter, Duration::from_secs(5)).await;
        assert_eq!(outcome, Some(LoopOutcome::Cancelled));
    }

    #[tokio::test]
    async fn test_settle_gives_up_on_blocked_read() {
        let (tx, rx) = mpsc::channel::<String>();
        let worker = Session::new(Channel(rx), Accept)
            .with_primary_input(pipe())
            .spawn(&ThreadConfig::new())
            .unwrap();
        let mut waiter = tokio::task::spawn_blocking(move || worker.wait());

        assert_eq!(settle(&mut waiter, Duration::from_millis(50)).await, None);

        // closing the channel ends the read and lets the worker exit
        drop(tx);
        assert_eq!(
            settle(&mut waiter, Duration::from_secs(5)).await,
            Some(LoopOutcome::Completed)
        );
    }
}
