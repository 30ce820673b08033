//! Presentation thread
//!
//! Starts the worker, polls the progress channel on a fixed interval, turns
//! Ctrl-C into a cancellation request and offers the result for saving. A
//! second Ctrl-C, or one after the run ended, exits the process.

use anyhow::{anyhow, Context, Result};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::io::Write;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::browser::{ChromeSessionProvider, Credentials};
use crate::config::Config;
use crate::error::ExportError;
use crate::export::{ExportOutcome, Exporter, PathChooser};
use crate::models::{CollectionResult, FacilityCode};
use crate::orchestrator::{spawn_collection, CollectionOrchestrator, RunReport, RunState};
use crate::progress::{self, Progress, ProgressStream};
use crate::utils::logging::{log_startup, print_final_stats};
use crate::utils::{truncate_text, RunLog};

const STATUS_WIDTH: usize = 120;
/// Exit status after an interrupt, as shells report SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Ctrl-C presses for the rest of the process lifetime.
pub fn interrupts() -> BoxStream<'static, ()> {
    stream::unfold((), |()| async {
        tokio::signal::ctrl_c().await.ok().map(|_| ((), ()))
    })
    .fuse()
    .boxed()
}

/// What the presentation side saw during a run.
#[derive(Debug, Default)]
pub struct Watched {
    pub result: Option<CollectionResult>,
    pub authentication_failure: Option<String>,
    pub cancel_requested: bool,
    /// Interrupted again while waiting for the worker to stop
    pub forced_exit: bool,
}

/// Drains `stream` every `poll_interval` until the worker hangs up.
///
/// Status lines go to `out` and the run log. The first item of `interrupts`
/// sets `cancel`, and the worker notices it at its next checkpoint. A second
/// one stops watching with `forced_exit` set.
pub async fn watch_progress<W, I>(
    stream: &mut ProgressStream,
    poll_interval: Duration,
    cancel: &CancellationToken,
    run_log: &mut RunLog,
    out: &mut W,
    interrupts: &mut I,
) -> Watched
where
    W: Write,
    I: Stream<Item = ()> + Unpin,
{
    let mut watched = Watched::default();
    let mut ticker = tokio::time::interval(poll_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let drained = stream.drain();
                for message in drained.messages {
                    handle_message(message, &mut watched, run_log, out);
                }
                if drained.closed {
                    break;
                }
            }
            Some(()) = interrupts.next() => {
                if watched.cancel_requested {
                    error!("Interrupted again, exiting without waiting for the worker.");
                    run_log.append("Run interrupted by the operator.");
                    watched.forced_exit = true;
                    break;
                }
                watched.cancel_requested = true;
                warn!("Cancellation requested, stopping at the next checkpoint... (Ctrl-C again to quit)");
                run_log.append("Cancellation requested by the operator.");
                cancel.cancel();
            }
        }
    }
    watched
}

fn handle_message<W: Write>(
    message: Progress,
    watched: &mut Watched,
    run_log: &mut RunLog,
    out: &mut W,
) {
    match message {
        Progress::Status(line) => {
            run_log.append(&line);
            let _ = writeln!(out, "{}", truncate_text(&line, STATUS_WIDTH));
        }
        Progress::AuthenticationFailed(detail) => {
            run_log.append(&detail);
            let _ = writeln!(out, "{}", detail);
            watched.authentication_failure = Some(detail);
        }
        Progress::Completed(result) => {
            run_log.append("Collection result received.");
            watched.result = Some(result);
        }
    }
}

/// Main application structure
pub struct App {
    config: Config,
    facilities: Vec<FacilityCode>,
    credentials: Option<Credentials>,
    run_log: RunLog,
}

impl App {
    pub fn initialize(
        config: Config,
        facilities: Vec<FacilityCode>,
        credentials: Option<Credentials>,
    ) -> Self {
        let run_log = RunLog::create(&config.output_log_file);
        log_startup(&facilities);
        Self {
            config,
            facilities,
            credentials,
            run_log,
        }
    }

    /// Runs the collection and the export step; returns the final run state.
    pub async fn run(mut self, chooser: &mut dyn PathChooser) -> Result<RunState> {
        let (sink, mut stream) = progress::channel();
        let cancel = CancellationToken::new();
        let provider = ChromeSessionProvider::new(self.config.clone(), self.credentials.take());
        let orchestrator = CollectionOrchestrator::new(&self.config, provider, sink, cancel.clone());

        let worker = spawn_collection(orchestrator, self.facilities.clone())
            .context("could not start the collection worker")?;

        let mut stdout = std::io::stdout();
        let mut interrupts = interrupts();
        let watched = watch_progress(
            &mut stream,
            self.config.poll_interval(),
            &cancel,
            &mut self.run_log,
            &mut stdout,
            &mut interrupts,
        )
        .await;
        if watched.forced_exit {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
        self.exit_on_interrupt(interrupts);

        // The channel is closed, so the worker is past its last send.
        let report: RunReport = tokio::task::spawn_blocking(move || worker.join())
            .await
            .context("could not wait for the collection worker")?
            .map_err(|_| anyhow!("the collection worker panicked"))?;
        print_final_stats(&report, self.run_log.path());

        if let Some(detail) = watched.authentication_failure {
            error!("Run ended without data: {}", detail);
            return Ok(report.state);
        }

        match watched.result {
            Some(result) => self.offer_export(&result, chooser)?,
            None => warn!("The worker ended without a result"),
        }
        Ok(report.state)
    }

    /// From here on a Ctrl-C, at the save prompt included, ends the process.
    fn exit_on_interrupt(&self, mut interrupts: BoxStream<'static, ()>) {
        let mut run_log = self.run_log.try_clone();
        tokio::spawn(async move {
            if interrupts.next().await.is_some() {
                warn!("Interrupted, exiting without saving.");
                run_log.append("Run interrupted by the operator.");
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        });
    }

    fn offer_export(&mut self, result: &CollectionResult, chooser: &mut dyn PathChooser) -> Result<()> {
        let exporter = Exporter::new(&self.config);
        match exporter.export(result, chooser) {
            Ok(ExportOutcome::Saved(path)) => {
                let line = format!("File saved successfully: {}", path.display());
                info!("{}", line);
                self.run_log.append(&line);
            }
            Ok(ExportOutcome::Cancelled) => {
                warn!("The file was not saved.");
                self.run_log.append("The file was not saved.");
            }
            Err(ExportError::Empty) => {
                warn!("Nothing was collected, no file to save.");
                self.run_log.append("Nothing was collected, no file to save.");
            }
            Err(e) => {
                self.run_log.append(&format!("Export failed: {}", e));
                return Err(e).context("could not save the workbook");
            }
        }
        Ok(())
    }
}
