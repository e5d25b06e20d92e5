//! Core data types for the gesture interpreter
//!
//! This module defines the data model shared by the pipeline stages, the
//! acquisition backend and the presentation consumers.
//!
//! # Main Types
//!
//! - [`RawFrame`] - Validated channel values from one line of glove output
//! - [`FeatureVector`] - Preprocessed values in the classifier's feature order
//! - [`ProbabilityDistribution`] - Classifier output over a fixed [`LabelSet`]
//! - [`LabelDecision`] - Single-frame decision after confidence gating
//! - [`StableLabel`] - Majority-vote output of the smoothing window
//! - [`PipelineResult`] - Per-frame outcome of the whole pipeline
//! - [`FrameUpdate`] - What the acquisition worker publishes per frame

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display name used for the `Unknown` sentinel
pub const UNKNOWN_LABEL: &str = "Unknown";

// ==================== Labels ====================

/// Identifier of a label: its position in the [`LabelSet`] enumeration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelId(pub usize);

impl LabelId {
    /// Position of this label in the label set
    pub fn index(self) -> usize {
        self.0
    }
}

/// The fixed, ordered set of gesture labels a classifier was trained on
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    /// Create a label set from names in training order
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of a label, if the id belongs to this set
    pub fn name(&self, id: LabelId) -> Option<&str> {
        self.names.get(id.0).map(String::as_str)
    }

    /// Look up a label id by name
    pub fn id_of(&self, name: &str) -> Option<LabelId> {
        self.names.iter().position(|n| n == name).map(LabelId)
    }

    /// Iterate over ids and names in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = (LabelId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (LabelId(i), n.as_str()))
    }

    /// Display name for an optional label (`None` is the `Unknown` sentinel)
    pub fn display(&self, label: Option<LabelId>) -> &str {
        label
            .and_then(|id| self.name(id))
            .unwrap_or(UNKNOWN_LABEL)
    }
}

// ==================== Frames and features ====================

/// One validated reading cycle of the glove: channel values in device order
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    values: Vec<f64>,
}

impl RawFrame {
    /// Wrap parsed channel values
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Channel values in device order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the frame has no channels
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Preprocessed features in the order the classifier was trained on
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Probabilities indexed by [`LabelId`], in label-set enumeration order
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityDistribution {
    probabilities: Vec<f64>,
}

impl ProbabilityDistribution {
    /// Create a distribution; entry `i` is the probability of `LabelId(i)`
    pub fn new(probabilities: Vec<f64>) -> Self {
        Self { probabilities }
    }

    /// Probability of a label (0 for ids outside the set)
    pub fn get(&self, label: LabelId) -> f64 {
        self.probabilities.get(label.0).copied().unwrap_or(0.0)
    }

    /// Iterate over (label, probability) in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = (LabelId, f64)> + '_ {
        self.probabilities
            .iter()
            .enumerate()
            .map(|(i, &p)| (LabelId(i), p))
    }

    /// Number of labels covered
    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Whether all entries lie in [0, 1] and sum to 1 within `tolerance`
    pub fn is_normalized(&self, tolerance: f64) -> bool {
        let in_range = self
            .probabilities
            .iter()
            .all(|p| (0.0..=1.0).contains(p));
        let sum: f64 = self.probabilities.iter().sum();
        in_range && (sum - 1.0).abs() <= tolerance
    }
}

// ==================== Decisions ====================

/// Single-frame decision produced by the confidence gate
///
/// The confidence of the top-ranked label is reported even when the decision
/// is `Unknown`, so a close miss can be told apart from no signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelDecision {
    /// Top label reached the threshold
    Label { label: LabelId, confidence: f64 },
    /// Top label stayed below the threshold
    Unknown { confidence: f64 },
}

impl LabelDecision {
    /// The decided label, `None` for `Unknown`
    pub fn label(&self) -> Option<LabelId> {
        match self {
            LabelDecision::Label { label, .. } => Some(*label),
            LabelDecision::Unknown { .. } => None,
        }
    }

    /// Confidence of the top-ranked label
    pub fn confidence(&self) -> f64 {
        match self {
            LabelDecision::Label { confidence, .. } | LabelDecision::Unknown { confidence } => {
                *confidence
            }
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, LabelDecision::Unknown { .. })
    }
}

/// Smoothed output of the majority vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StableLabel {
    /// A label with enough votes in the window
    Label { label: LabelId, votes: usize },
    /// No label reached the minimum support
    #[default]
    Unknown,
}

impl StableLabel {
    pub fn label(&self) -> Option<LabelId> {
        match self {
            StableLabel::Label { label, .. } => Some(*label),
            StableLabel::Unknown => None,
        }
    }

    /// Votes behind the label (0 for `Unknown`)
    pub fn votes(&self) -> usize {
        match self {
            StableLabel::Label { votes, .. } => *votes,
            StableLabel::Unknown => 0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, StableLabel::Unknown)
    }
}

/// Outcome of processing one line through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineResult {
    /// Noise line (banner, log text, blank)
    Ignored,
    /// Data line with bad fields or wrong arity
    Malformed,
    /// The classifier rejected the feature vector
    InferenceFailed,
    /// A decision was made and the smoothing window updated
    Decided {
        raw: LabelDecision,
        stable: StableLabel,
    },
}

impl PipelineResult {
    /// The stable label, when the frame reached the smoothing window
    pub fn stable(&self) -> Option<StableLabel> {
        match self {
            PipelineResult::Decided { stable, .. } => Some(*stable),
            _ => None,
        }
    }
}

/// Per-frame message published by the acquisition worker
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUpdate {
    /// Monotonic frame number within the session (starts at 1)
    pub sequence: u64,
    /// When the frame was processed
    pub received_at: DateTime<Utc>,
    /// Result for this frame
    pub result: PipelineResult,
    /// Latest stable label of the session, carried across ignored frames
    pub latest_stable: StableLabel,
}

// ==================== Status and statistics ====================

/// State of the acquisition session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquisitionStatus {
    /// Not reading from the transport
    #[default]
    Stopped,
    /// Opening the transport
    Starting,
    /// Reading and classifying frames
    Acquiring,
    /// The last session ended with a transport error
    Error,
}

impl fmt::Display for AcquisitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionStatus::Stopped => write!(f, "Stopped"),
            AcquisitionStatus::Starting => write!(f, "Starting..."),
            AcquisitionStatus::Acquiring => write!(f, "Acquiring"),
            AcquisitionStatus::Error => write!(f, "Error"),
        }
    }
}

/// Counters for one acquisition session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    /// Lines read from the transport
    pub frames_total: u64,
    /// Frames that produced a decision
    pub decided: u64,
    /// Noise lines
    pub ignored: u64,
    /// Malformed data lines
    pub malformed: u64,
    /// Frames skipped because inference failed
    pub inference_failed: u64,
    /// Decisions that were `Unknown`
    pub unknown_decisions: u64,
    /// Updates evicted because the consumer fell behind
    pub dropped_updates: u64,
}

impl PipelineStats {
    /// Count one pipeline result
    pub fn record(&mut self, result: &PipelineResult) {
        self.frames_total += 1;
        match result {
            PipelineResult::Ignored => self.ignored += 1,
            PipelineResult::Malformed => self.malformed += 1,
            PipelineResult::InferenceFailed => self.inference_failed += 1,
            PipelineResult::Decided { raw, .. } => {
                self.decided += 1;
                if raw.is_unknown() {
                    self.unknown_decisions += 1;
                }
            }
        }
    }

    /// Share of data-bearing frames that were malformed, as a percentage
    pub fn malformed_rate(&self) -> f64 {
        let data_frames = self.frames_total - self.ignored;
        if data_frames == 0 {
            0.0
        } else {
            (self.malformed as f64 / data_frames as f64) * 100.0
        }
    }
}
