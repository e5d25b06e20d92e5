//! Backend module for glove acquisition
//!
//! This module reads frames from the transport in a separate thread so that
//! a slow or idle link never blocks the presentation layer. It uses crossbeam
//! channels for thread-safe communication with the frontend.
//!
//! # Architecture
//!
//! The backend runs in a separate thread from the UI, communicating via channels:
//!
//! - [`BackendCommand`] - Messages sent from UI to backend (start, stop, shutdown)
//! - [`BackendMessage`] - Status messages sent from backend to UI
//! - [`FrameUpdate`] - Per-frame results on a lossy channel (newest wins)
//! - [`FrontendHandle`] - UI-side handle for commands, results and the threshold
//! - [`AcquisitionBackend`] - Main backend entry point run on the worker thread
//!
//! # Components
//!
//! - [`Transport`] - Line source abstraction
//! - [`DeviceTransport`] / [`ReplayTransport`] - Device node, capture file and in-memory sources
//! - [`MockGloveTransport`] - Synthetic glove for testing (feature-gated)
//! - [`BackendWorker`] - Worker loop that processes commands and frames
//!
//! # Example
//!
//! ```ignore
//! use gesture_rs::backend::{AcquisitionBackend, DeviceTransport};
//!
//! let (backend, frontend) =
//!     AcquisitionBackend::new(&config, Box::new(transport), preprocessor, classifier)?;
//! let handle = std::thread::spawn(move || backend.run());
//!
//! frontend.start();
//! frontend.set_threshold_percent(45.0);
//!
//! if let Some(update) = frontend.latest() {
//!     // Render update.latest_stable
//! }
//! ```

#[cfg(feature = "mock-glove")]
pub mod mock_glove;
pub mod transport;
pub mod worker;

#[cfg(feature = "mock-glove")]
pub use mock_glove::{MockGloveTransport, MockPose};
pub use transport::{DeviceTransport, ReplayTransport, Transport};
pub use worker::BackendWorker;

use crate::config::AppConfig;
use crate::error::{GestureError, Result};
use crate::pipeline::{ClassifierPort, FeaturePreprocessor, PipelineSession, SharedThreshold};
use crate::types::{AcquisitionStatus, FrameUpdate, PipelineStats};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Message sent from the UI to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCommand {
    /// Open the transport and start classifying frames
    Start,
    /// Stop classifying and close the transport
    Stop,
    /// Request current statistics
    RequestStats,
    /// Shutdown the backend
    Shutdown,
}

/// Status message sent from the backend to the UI
#[derive(Debug, Clone, PartialEq)]
pub enum BackendMessage {
    /// Acquisition status changed
    Status(AcquisitionStatus),
    /// The transport failed; the session has ended
    TransportError(String),
    /// Statistics update
    Stats(PipelineStats),
    /// Backend is shutting down
    Shutdown,
}

/// Frontend handle for the backend
pub struct FrontendHandle {
    /// Receiver for status messages
    pub receiver: Receiver<BackendMessage>,
    /// Receiver for frame updates
    pub updates: Receiver<FrameUpdate>,
    /// Sender for commands to the backend
    pub command_sender: Sender<BackendCommand>,
    /// Threshold read by the worker once per frame
    pub threshold: SharedThreshold,
}

impl FrontendHandle {
    /// Try to receive a status message without blocking
    pub fn try_recv(&self) -> Option<BackendMessage> {
        self.receiver.try_recv().ok()
    }

    /// Receive a status message, waiting at most `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Option<BackendMessage> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Receive all pending status messages
    pub fn drain(&self) -> Vec<BackendMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.receiver.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Receive all pending frame updates, oldest first
    pub fn drain_updates(&self) -> Vec<FrameUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = self.updates.try_recv() {
            updates.push(update);
        }
        updates
    }

    /// Newest pending frame update, discarding older ones
    pub fn latest(&self) -> Option<FrameUpdate> {
        let mut latest = None;
        while let Ok(update) = self.updates.try_recv() {
            latest = Some(update);
        }
        latest
    }

    /// Send a command to the backend
    pub fn send_command(&self, cmd: BackendCommand) -> bool {
        self.command_sender.send(cmd).is_ok()
    }

    /// Send a command, failing if the backend has exited
    pub fn try_send_command(&self, cmd: BackendCommand) -> Result<()> {
        self.command_sender
            .send(cmd)
            .map_err(|e| GestureError::Channel(format!("Backend is gone, {:?} not sent", e.0)))
    }

    /// Start acquisition
    pub fn start(&self) {
        let _ = self.command_sender.send(BackendCommand::Start);
    }

    /// Stop acquisition
    pub fn stop(&self) {
        let _ = self.command_sender.send(BackendCommand::Stop);
    }

    /// Request a statistics message
    pub fn request_stats(&self) {
        let _ = self.command_sender.send(BackendCommand::RequestStats);
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        let _ = self.command_sender.send(BackendCommand::Shutdown);
    }

    /// Set the confidence threshold from a percent value in [0, 100]
    pub fn set_threshold_percent(&self, percent: f64) {
        self.threshold.set_percent(percent);
    }

    /// Current confidence threshold in percent
    pub fn threshold_percent(&self) -> f64 {
        self.threshold.percent()
    }
}

/// The acquisition backend that runs in a separate thread
pub struct AcquisitionBackend {
    worker: BackendWorker,
    /// Running flag
    running: Arc<AtomicBool>,
}

impl AcquisitionBackend {
    /// Create a backend with its communication channels
    ///
    /// Fails when the smoothing settings in `config` are invalid.
    pub fn new(
        config: &AppConfig,
        transport: Box<dyn Transport>,
        preprocessor: Arc<dyn FeaturePreprocessor>,
        classifier: Arc<dyn ClassifierPort>,
    ) -> Result<(Self, FrontendHandle)> {
        let threshold = SharedThreshold::new(config.gate.threshold);
        let session =
            PipelineSession::from_config(config, preprocessor, classifier, threshold.clone())?;
        Ok(Self::with_session(config, transport, session))
    }

    /// Create a backend around an existing session
    ///
    /// The frontend's threshold handle is the one held by `session`.
    pub fn with_session(
        config: &AppConfig,
        transport: Box<dyn Transport>,
        session: PipelineSession,
    ) -> (Self, FrontendHandle) {
        let acquisition = &config.acquisition;
        let (cmd_tx, cmd_rx) = bounded(acquisition.command_buffer.max(1));
        // Lossy too: when full the worker evicts the oldest message
        let (msg_tx, msg_rx) = bounded(256);
        // Lossy: when full the worker evicts the oldest update
        let (update_tx, update_rx) = bounded(acquisition.update_buffer.max(1));

        let running = Arc::new(AtomicBool::new(true));
        let threshold = session.threshold().clone();

        let worker = BackendWorker::new(
            acquisition,
            transport,
            session,
            cmd_rx,
            msg_tx,
            msg_rx.clone(),
            update_tx,
            update_rx.clone(),
            running.clone(),
        );

        let frontend = FrontendHandle {
            receiver: msg_rx,
            updates: update_rx,
            command_sender: cmd_tx,
            threshold,
        };

        (Self { worker, running }, frontend)
    }

    /// Run the backend loop
    pub fn run(self) {
        let mut worker = self.worker;
        worker.run();
    }

    /// Get a handle to stop the backend
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}
