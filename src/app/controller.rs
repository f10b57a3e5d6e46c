// SPDX-License-Identifier: GPL-3.0-only

//! Session worker thread
//!
//! The [`CaptureSession`] lives on a dedicated worker thread. Operator
//! commands arrive over a channel and are handled between ticks, so a tick
//! and a command never run at the same time. Results flow back to the UI as
//! [`SessionEvent`]s.

use super::camera_preview::DisplayBuffer;
use super::session::{CaptureSession, SessionState, TickOutcome};
use crate::constants::timing::{IDLE_POLL_INTERVAL, tick_interval};
use crate::errors::{AppError, AppResult};
use crate::pipelines::archive::ArchiveReceipt;
use crate::storage::{self, OrderEntry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Previews allowed to wait in the event queue before new ones are dropped
const PREVIEW_BACKLOG: usize = 2;

/// Operator commands, handled in arrival order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    /// Ask the operator to confirm stopping the current scan
    ConfirmStop,
    /// Stop the current scan without archiving
    StopRecording,
    Shutdown,
}

/// Notifications from the worker to the UI
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    Preview(DisplayBuffer),
    /// A barcode was decoded; the archive result follows
    Detected { tracking_number: String },
    Archived(ArchiveReceipt),
    /// A scan is running and the operator asked to stop it
    ConfirmStopRequested,
    /// Something went wrong that the operator should see
    Notice(AppError),
    /// The worker released the camera and exited
    ShutDown,
}

/// Sending half of the event queue, with preview throttling
#[derive(Clone)]
struct EventSink {
    sender: Sender<SessionEvent>,
    queued_previews: Arc<AtomicUsize>,
}

impl EventSink {
    fn send(&self, event: SessionEvent) {
        // A closed queue means the UI is gone; the worker is about to stop
        let _ = self.sender.send(event);
    }

    fn preview(&self, buffer: DisplayBuffer) {
        if self.queued_previews.load(Ordering::Acquire) >= PREVIEW_BACKLOG {
            return;
        }
        self.force_preview(buffer);
    }

    fn force_preview(&self, buffer: DisplayBuffer) {
        self.queued_previews.fetch_add(1, Ordering::AcqRel);
        if self.sender.send(SessionEvent::Preview(buffer)).is_err() {
            self.queued_previews.fetch_sub(1, Ordering::AcqRel);
        }
    }

    fn publish(&self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Inactive | TickOutcome::ReadSkipped { .. } => {}
            TickOutcome::Preview(buffer) => self.preview(buffer),
            TickOutcome::Finalized {
                tracking_number,
                preview,
                result,
            } => {
                // The detection frame is always shown
                self.force_preview(preview);
                self.send(SessionEvent::Detected { tracking_number });
                match result {
                    Ok(receipt) => self.send(SessionEvent::Archived(receipt)),
                    Err(e) => self.send(SessionEvent::Notice(e.into())),
                }
            }
            TickOutcome::Aborted(e) => self.send(SessionEvent::Notice(e.into())),
        }
    }
}

/// Handle to the session worker
///
/// Dropping the handle shuts the worker down and releases the camera.
pub struct SessionController {
    commands: Sender<Command>,
    events: Receiver<SessionEvent>,
    queued_previews: Arc<AtomicUsize>,
    archive_dir: PathBuf,
    thread_handle: Option<JoinHandle<()>>,
}

impl SessionController {
    /// Move `session` onto a worker thread ticking at `tick_rate` per second
    pub fn spawn(mut session: CaptureSession, tick_rate: u32) -> AppResult<Self> {
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let queued_previews = Arc::new(AtomicUsize::new(0));
        let sink = EventSink {
            sender: event_tx,
            queued_previews: Arc::clone(&queued_previews),
        };

        let mut previous_hook = session.take_transition_hook();
        let hook_sink = sink.clone();
        session.set_transition_hook(Box::new(move |from, to| {
            if let Some(hook) = previous_hook.as_mut() {
                hook(from, to);
            }
            hook_sink.send(SessionEvent::StateChanged { from, to });
        }));

        let archive_dir = session.archiver().root().to_path_buf();
        let interval = tick_interval(tick_rate);

        info!(tick_rate, "Starting session worker");
        let thread_handle = thread::Builder::new()
            .name("session-worker".to_string())
            .spawn(move || run_worker(session, command_rx, sink, interval))
            .map_err(|e| AppError::Other(format!("cannot start session worker: {}", e)))?;

        Ok(Self {
            commands: command_tx,
            events: event_rx,
            queued_previews,
            archive_dir,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn start_scanning(&self) {
        self.send(Command::Start);
    }

    /// Request a stop; the worker answers with `ConfirmStopRequested`
    pub fn confirm_stop(&self) {
        self.send(Command::ConfirmStop);
    }

    /// Stop scanning once the operator has confirmed
    pub fn stop_recording(&self) {
        self.send(Command::StopRecording);
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Finished archives in the archive directory, newest first
    pub fn list_orders(&self) -> AppResult<Vec<OrderEntry>> {
        storage::list_orders(&self.archive_dir)
    }

    /// Show the archive directory in the file manager
    pub fn open_orders(&self) -> AppResult<()> {
        storage::open_orders_directory(&self.archive_dir)
    }

    /// Next queued event, if any
    pub fn try_recv_event(&self) -> Option<SessionEvent> {
        self.events.try_recv().ok().map(|event| self.received(event))
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<SessionEvent> {
        self.events
            .recv_timeout(timeout)
            .ok()
            .map(|event| self.received(event))
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Stop the worker, release the camera and wait for the thread to exit
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            self.send(Command::Shutdown);
            debug!("Waiting for session worker to finish");
            if let Err(e) = handle.join() {
                warn!("Session worker panicked: {:?}", e);
            }
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!(?command, "Session worker is not running");
        }
    }

    fn received(&self, event: SessionEvent) -> SessionEvent {
        if matches!(event, SessionEvent::Preview(_)) {
            let _ = self
                .queued_previews
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        }
        event
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!("SessionController dropped, stopping worker");
            self.shutdown();
        }
    }
}

fn run_worker(
    mut session: CaptureSession,
    commands: Receiver<Command>,
    sink: EventSink,
    interval: Duration,
) {
    debug!("Session worker started");
    let mut next_tick = Instant::now();

    loop {
        let wait = if session.is_scanning() {
            next_tick.saturating_duration_since(Instant::now())
        } else {
            IDLE_POLL_INTERVAL
        };

        match commands.recv_timeout(wait) {
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(command) => {
                handle_command(&mut session, command, &sink);
                if command == Command::Start {
                    next_tick = Instant::now();
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !session.is_scanning() {
                    continue;
                }
                sink.publish(session.tick());

                // Skip ticks that were missed instead of bursting to catch up
                let now = Instant::now();
                next_tick += interval;
                if next_tick < now {
                    next_tick = now;
                }
            }
        }
    }

    session.shutdown();
    sink.send(SessionEvent::ShutDown);
    info!("Session worker exiting");
}

fn handle_command(session: &mut CaptureSession, command: Command, sink: &EventSink) {
    debug!(?command, state = %session.state(), "Handling command");
    match command {
        Command::Start => {
            if let Err(e) = session.start() {
                sink.send(SessionEvent::Notice(e.into()));
            }
        }
        Command::ConfirmStop => {
            if session.is_scanning() {
                sink.send(SessionEvent::ConfirmStopRequested);
            } else {
                debug!("Nothing to stop");
            }
        }
        Command::StopRecording => {
            session.stop();
        }
        Command::Shutdown => {}
    }
}
