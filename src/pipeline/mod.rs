//! Real-time gesture classification pipeline
//!
//! Data flow per frame is strictly linear:
//!
//! ```text
//! line ─► FrameParser ─► FeaturePreprocessor ─► ClassifierPort ─► ConfidenceGate ─► SmoothingWindow ─► PipelineResult
//! ```
//!
//! - [`parser`] - Line validation and noise rejection
//! - [`preprocess`] - Pluggable feature preprocessing strategies
//! - [`classifier`] - Model port and the built-in centroid model
//! - [`gate`] - Arg-max + threshold decision, shared threshold handle
//! - [`smoothing`] - Majority vote over recent decisions
//! - [`driver`] - Orchestration of the stages above
//!
//! No stage depends on a later one, and only the smoothing window survives
//! from one frame to the next.

pub mod classifier;
pub mod driver;
pub mod gate;
pub mod parser;
pub mod preprocess;
pub mod smoothing;

pub use classifier::{CentroidClassifier, ClassifierPort};
pub use driver::{PipelineDriver, PipelineSession};
pub use gate::{ConfidenceGate, SharedThreshold};
pub use parser::{FrameParser, FrameRejection};
pub use preprocess::{
    build_preprocessor, FeaturePreprocessor, MinMaxNormalizer, NormalizeThenScale, RawFeatures,
    StandardScaler,
};
pub use smoothing::SmoothingWindow;
