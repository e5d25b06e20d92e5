//! # Gesture-RS: Glove Gesture Interpreter
//!
//! A real-time interpreter for a sign-language data glove. The glove streams
//! one comma-separated line per reading cycle (5 flex sensors and a 3-axis
//! accelerometer); every line is turned into a smoothed gesture label.
//!
//! ## Architecture
//!
//! - **Pipeline**: Parse, preprocess, classify, gate and smooth one frame at a time
//! - **Backend**: Reads the transport on a dedicated thread so a slow link never
//!   blocks the consumer
//! - **Communication**: Crossbeam channels for commands, status and a lossy
//!   stream of per-frame results
//! - **Output**: Console and JSON renderings of each result
//!
//! ## Configuration
//!
//! Settings are stored as TOML in the platform-appropriate config directory
//! under `gesture-rs`:
//!
//! - **Linux**: `~/.config/gesture-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/gesture-rs/config.toml`
//! - **Windows**: `%APPDATA%\gesture-rs\config.toml`
//!
//! ## Example
//!
//! ```ignore
//! use gesture_rs::{
//!     backend::{AcquisitionBackend, DeviceTransport},
//!     config::AppConfig,
//!     pipeline::{build_preprocessor, CentroidClassifier, FeaturePreprocessor},
//! };
//! use std::sync::Arc;
//!
//! let config = AppConfig::load_or_default("config.toml");
//! let classifier = Arc::new(CentroidClassifier::from_config(&config.classifier)?);
//! let preprocessor: Arc<dyn FeaturePreprocessor> = build_preprocessor(&config.preprocessing).into();
//! let transport = Box::new(DeviceTransport::new("/dev/ttyUSB0"));
//!
//! let (backend, frontend) =
//!     AcquisitionBackend::new(&config, transport, preprocessor, classifier)?;
//! std::thread::spawn(move || backend.run());
//!
//! frontend.start();
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-export commonly used types
pub use backend::{AcquisitionBackend, BackendCommand, BackendMessage, FrontendHandle};
pub use config::AppConfig;
pub use error::{GestureError, Result};
pub use pipeline::{PipelineDriver, PipelineSession};
pub use types::{FrameUpdate, LabelDecision, LabelSet, PipelineResult, StableLabel};
