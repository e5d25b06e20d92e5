//! Backend Worker Thread Implementation
//!
//! This module contains the main worker loop that runs in a separate thread
//! and handles all transport reads. It communicates with the UI thread
//! through crossbeam channels.
//!
//! # Responsibilities
//!
//! The worker thread handles:
//!
//! - **Command processing**: Responds to UI commands (start, stop, stats, shutdown)
//! - **Frame processing**: Reads one line at a time and runs it through the pipeline
//! - **Result publishing**: Pushes a [`FrameUpdate`] per line, evicting stale ones
//! - **Statistics tracking**: Counts outcomes and dropped updates
//! - **Error handling**: A transport failure ends the session, never the thread
//!
//! # Delivery
//!
//! Nothing the worker sends can block it. Frame updates and status messages
//! both go to bounded queues; when a queue is full the oldest pending entry
//! is evicted. Statistics are dropped instead when the status queue is full.
//!
//! # Ordering
//!
//! Frames are processed strictly in arrival order, one at a time. Commands
//! and the running flag are checked between frames only, so a frame is never
//! left half processed.

use crate::backend::transport::Transport;
use crate::backend::{BackendCommand, BackendMessage};
use crate::config::AcquisitionConfig;
use crate::error::ResultExt;
use crate::pipeline::PipelineSession;
use crate::types::{AcquisitionStatus, FrameUpdate, PipelineResult, PipelineStats, StableLabel};
use chrono::Utc;
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The backend worker that runs the acquisition loop
pub struct BackendWorker {
    /// Command receiver from the UI
    command_rx: Receiver<BackendCommand>,
    /// Message sender to the UI
    message_tx: Sender<BackendMessage>,
    /// Second end of the message channel, used to evict the oldest message
    message_rx: Receiver<BackendMessage>,
    /// Frame update sender
    update_tx: Sender<FrameUpdate>,
    /// Second end of the update channel, used to evict the oldest update
    update_rx: Receiver<FrameUpdate>,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Line source
    transport: Box<dyn Transport>,
    /// Pipeline with its smoothing window and threshold
    session: PipelineSession,
    /// Current acquisition status
    status: AcquisitionStatus,
    /// Whether frames are being read
    acquiring: bool,
    /// Statistics for the current session
    stats: PipelineStats,
    /// Sequence number of the last published frame
    sequence: u64,
    /// Latest stable label of the session
    latest_stable: StableLabel,
    /// Last time stats were sent to UI
    last_stats_time: Instant,
    /// Sleep when idle or when no line is ready
    idle_poll: Duration,
    /// Interval between periodic stats messages
    stats_interval: Duration,
}

impl BackendWorker {
    /// Create a new backend worker
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &AcquisitionConfig,
        transport: Box<dyn Transport>,
        session: PipelineSession,
        command_rx: Receiver<BackendCommand>,
        message_tx: Sender<BackendMessage>,
        message_rx: Receiver<BackendMessage>,
        update_tx: Sender<FrameUpdate>,
        update_rx: Receiver<FrameUpdate>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            command_rx,
            message_tx,
            message_rx,
            update_tx,
            update_rx,
            running,
            transport,
            session,
            status: AcquisitionStatus::Stopped,
            acquiring: false,
            stats: PipelineStats::default(),
            sequence: 0,
            latest_stable: StableLabel::Unknown,
            last_stats_time: Instant::now(),
            idle_poll: Duration::from_millis(config.idle_poll_ms),
            stats_interval: Duration::from_millis(config.stats_interval_ms.max(1)),
        }
    }

    /// Run the main worker loop
    pub fn run(&mut self) {
        tracing::info!("Backend worker started ({})", self.transport.describe());

        while self.running.load(Ordering::SeqCst) {
            // Process pending commands
            self.process_commands();
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            let line_ready = self.acquiring && self.step();

            if self.acquiring && self.last_stats_time.elapsed() >= self.stats_interval {
                self.send_stats();
                self.last_stats_time = Instant::now();
            }

            if !line_ready {
                std::thread::sleep(self.idle_poll);
            }
        }

        // Cleanup
        self.transport.close();
        self.acquiring = false;

        self.send_message(BackendMessage::Shutdown);
        tracing::info!("Backend worker stopped");
    }

    /// Process pending commands from the UI
    fn process_commands(&mut self) {
        loop {
            match self.command_rx.try_recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    }

    /// Handle a single command
    fn handle_command(&mut self, cmd: BackendCommand) {
        match cmd {
            BackendCommand::Start => self.start_acquisition(),
            BackendCommand::Stop => self.stop_acquisition(),
            BackendCommand::RequestStats => self.send_stats(),
            BackendCommand::Shutdown => {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Open the transport and begin a fresh session
    fn start_acquisition(&mut self) {
        if self.acquiring {
            self.transport.close();
        }
        self.acquiring = false;
        self.update_status(AcquisitionStatus::Starting);

        let description = self.transport.describe();
        match self.transport.open().with_context(|| format!("Opening {}", description)) {
            Ok(()) => {
                self.session.reset();
                self.stats = PipelineStats::default();
                self.sequence = 0;
                self.latest_stable = StableLabel::Unknown;
                self.last_stats_time = Instant::now();
                self.acquiring = true;
                self.update_status(AcquisitionStatus::Acquiring);
                tracing::info!("Started acquisition from {}", description);
            }
            Err(e) => {
                let error_msg = format!("Failed to start: {}", e);
                tracing::error!("{}", error_msg);
                self.update_status(AcquisitionStatus::Error);
                self.send_message(BackendMessage::TransportError(error_msg));
            }
        }
    }

    /// Close the transport and stop reading
    fn stop_acquisition(&mut self) {
        if !self.acquiring && self.status == AcquisitionStatus::Stopped {
            return;
        }
        self.acquiring = false;
        self.transport.close();
        self.update_status(AcquisitionStatus::Stopped);
        tracing::info!("Stopped acquisition");
    }

    /// Read and process at most one line
    ///
    /// Returns `true` when a line was processed.
    fn step(&mut self) -> bool {
        match self.transport.read_line() {
            Ok(Some(line)) => {
                self.process_line(&line);
                true
            }
            Ok(None) => false,
            Err(e) if e.is_terminal() => {
                self.handle_transport_error(e.to_string());
                false
            }
            Err(e) => {
                tracing::warn!("Discarding unreadable line: {}", e);
                self.record(PipelineResult::Malformed);
                true
            }
        }
    }

    fn process_line(&mut self, line: &str) {
        let result = self.session.process(line);
        self.record(result);
    }

    /// Count a result and publish it with the session's latest stable label
    fn record(&mut self, result: PipelineResult) {
        self.stats.record(&result);
        if let Some(stable) = result.stable() {
            self.latest_stable = stable;
        }

        self.sequence += 1;
        self.publish(FrameUpdate {
            sequence: self.sequence,
            received_at: Utc::now(),
            result,
            latest_stable: self.latest_stable,
        });
    }

    /// End the session after a transport failure
    fn handle_transport_error(&mut self, error: String) {
        tracing::error!("Transport error, ending session: {}", error);
        self.acquiring = false;
        self.transport.close();
        self.send_stats();
        self.update_status(AcquisitionStatus::Error);
        self.send_message(BackendMessage::TransportError(error));
    }

    /// Publish an update, evicting the oldest pending one if the queue is full
    fn publish(&mut self, update: FrameUpdate) {
        let mut pending = update;
        loop {
            match self.update_tx.try_send(pending) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    if self.update_rx.try_recv().is_ok() {
                        self.stats.dropped_updates += 1;
                    }
                    pending = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    /// Update acquisition status and notify UI
    fn update_status(&mut self, status: AcquisitionStatus) {
        self.status = status;
        self.send_message(BackendMessage::Status(status));
    }

    /// Send a message without blocking, evicting the oldest if the queue is full
    fn send_message(&mut self, msg: BackendMessage) {
        let mut pending = msg;
        loop {
            match self.message_tx.try_send(pending) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    if let Ok(evicted) = self.message_rx.try_recv() {
                        tracing::trace!("Status queue full, evicted {:?}", evicted);
                    }
                    pending = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    /// Send statistics to UI (using try_send for backpressure)
    fn send_stats(&mut self) {
        let stats = self.stats.clone();
        self.try_send_message(BackendMessage::Stats(stats));
    }

    /// Try to send a message without blocking; statistics are best effort
    fn try_send_message(&mut self, msg: BackendMessage) {
        if self.message_tx.try_send(msg).is_err() {
            tracing::trace!("Status queue full, message dropped");
        }
    }
}
